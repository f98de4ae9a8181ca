// ─────────────────────────────────────────────────────────────────────
// Merger Profile — Composition
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Isotopic abundance reconstruction from passive tracers.
//!
//! Each tracer population (e.g. `primary`, `secondary`) carries a fixed
//! isotope mix. A bin's abundance vector is the tracer-weighted sum of
//! those mixes, and `abar`/`zbar` follow from `1/abar = Σ X/A`.

use std::path::Path;

use log::warn;
use merger_types::error::{ProfileError, ProfileResult};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Tolerance on population mass fractions summing to one.
const FRACTION_SUM_TOL: f64 = 1e-6;

/// Built-in networks compiled into the crate.
const BUILTIN_NETWORKS: &[(&str, &str)] = &[
    (
        "cno_extras_to_mg26",
        include_str!("../data/networks/cno_extras_to_mg26.json"),
    ),
    ("hot_cno", include_str!("../data/networks/hot_cno.json")),
    ("sagb", include_str!("../data/networks/sagb.json")),
    (
        "pp_cno_extras",
        include_str!("../data/networks/pp_cno_extras.json"),
    ),
    ("mesa_75", include_str!("../data/networks/mesa_75.json")),
    (
        "mesa_75_lowz",
        include_str!("../data/networks/mesa_75_lowz.json"),
    ),
    ("rcb", include_str!("../data/networks/rcb.json")),
    ("rcb_lowz", include_str!("../data/networks/rcb_lowz.json")),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Isotope {
    pub name: String,
    /// Mass number
    pub a: f64,
    /// Charge number
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Population {
    pub name: String,
    pub mass_fractions: Vec<f64>,
}

/// On-disk schema, shared by the built-in resources and user files.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TableFile {
    name: String,
    isotopes: Vec<Isotope>,
    populations: Vec<Population>,
}

/// Immutable isotope table: one mass-fraction row per tracer population.
#[derive(Debug, Clone)]
pub struct CompositionTable {
    name: String,
    isotopes: Vec<Isotope>,
    population_names: Vec<String>,
    /// `[n_populations, n_isotopes]`
    fractions: Array2<f64>,
}

impl CompositionTable {
    /// Names of the compiled-in networks.
    pub fn builtin_names() -> Vec<&'static str> {
        BUILTIN_NETWORKS.iter().map(|(name, _)| *name).collect()
    }

    pub fn builtin(name: &str) -> ProfileResult<Self> {
        let (_, json) = BUILTIN_NETWORKS
            .iter()
            .find(|(n, _)| *n == name)
            .ok_or_else(|| {
                ProfileError::ConfigError(format!(
                    "unknown network `{name}`, expected one of {:?}",
                    Self::builtin_names()
                ))
            })?;
        Self::from_json_str(json)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> ProfileResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(json: &str) -> ProfileResult<Self> {
        let raw: TableFile = serde_json::from_str(json)?;
        Self::from_parts(raw.name, raw.isotopes, raw.populations)
    }

    pub fn from_parts(
        name: String,
        isotopes: Vec<Isotope>,
        populations: Vec<Population>,
    ) -> ProfileResult<Self> {
        if isotopes.is_empty() {
            return Err(ProfileError::ConfigError(format!(
                "network `{name}` has no isotopes"
            )));
        }
        if populations.is_empty() {
            return Err(ProfileError::ConfigError(format!(
                "network `{name}` has no populations"
            )));
        }
        for iso in &isotopes {
            if !(iso.a.is_finite() && iso.a > 0.0 && iso.z.is_finite() && iso.z > 0.0) {
                return Err(ProfileError::ConfigError(format!(
                    "isotope `{}` in network `{name}` needs A > 0 and Z > 0, got A={} Z={}",
                    iso.name, iso.a, iso.z
                )));
            }
        }

        let n_iso = isotopes.len();
        let mut fractions = Array2::zeros((populations.len(), n_iso));
        let mut population_names = Vec::with_capacity(populations.len());
        for (p, pop) in populations.iter().enumerate() {
            if population_names.contains(&pop.name) {
                return Err(ProfileError::ConfigError(format!(
                    "population `{}` appears twice in network `{name}`",
                    pop.name
                )));
            }
            if pop.mass_fractions.len() != n_iso {
                return Err(ProfileError::ConfigError(format!(
                    "population `{}` has {} fractions, network `{name}` has {n_iso} isotopes",
                    pop.name,
                    pop.mass_fractions.len()
                )));
            }
            if pop
                .mass_fractions
                .iter()
                .any(|&x| !x.is_finite() || x < 0.0)
            {
                return Err(ProfileError::ConfigError(format!(
                    "population `{}` has a negative or non-finite mass fraction",
                    pop.name
                )));
            }
            let sum: f64 = pop.mass_fractions.iter().sum();
            if (sum - 1.0).abs() > FRACTION_SUM_TOL {
                warn!(
                    "population `{}` of network `{name}` sums to {sum:.9}, not 1",
                    pop.name
                );
            }
            fractions
                .row_mut(p)
                .assign(&ArrayView1::from(&pop.mass_fractions[..]));
            population_names.push(pop.name.clone());
        }

        Ok(CompositionTable {
            name,
            isotopes,
            population_names,
            fractions,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn isotopes(&self) -> &[Isotope] {
        &self.isotopes
    }

    pub fn n_isotopes(&self) -> usize {
        self.isotopes.len()
    }

    pub fn population_names(&self) -> &[String] {
        &self.population_names
    }

    /// Mass-fraction row of a named population.
    pub fn population(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.population_names
            .iter()
            .position(|n| n == name)
            .map(|p| self.fractions.row(p))
    }

    fn require_population(&self, name: &str) -> ProfileResult<ArrayView1<'_, f64>> {
        self.population(name).ok_or_else(|| {
            ProfileError::ConfigError(format!(
                "network `{}` has no population `{name}` (has {:?})",
                self.name, self.population_names
            ))
        })
    }
}

/// Per-bin isotope mass fractions with mean mass and charge numbers.
#[derive(Debug, Clone)]
pub struct Abundances {
    /// `[n_bins, n_isotopes]`
    abundance: Array2<f64>,
    abar: Array1<f64>,
    zbar: Array1<f64>,
}

impl Abundances {
    pub fn len(&self) -> usize {
        self.abar.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abar.is_empty()
    }

    pub fn abundance(&self) -> ArrayView2<'_, f64> {
        self.abundance.view()
    }

    pub fn abar(&self) -> ArrayView1<'_, f64> {
        self.abar.view()
    }

    pub fn zbar(&self) -> ArrayView1<'_, f64> {
        self.zbar.view()
    }

    /// Overwrite rows `..=split` with population `inner` and the rest with
    /// `outer`, then recompute `abar`/`zbar`.
    pub fn assign_split(
        &mut self,
        table: &CompositionTable,
        split: usize,
        inner: &str,
        outer: &str,
    ) -> ProfileResult<()> {
        let inner_row = table.require_population(inner)?;
        let outer_row = table.require_population(outer)?;
        for (i, mut row) in self.abundance.rows_mut().into_iter().enumerate() {
            if i <= split {
                row.assign(&inner_row);
            } else {
                row.assign(&outer_row);
            }
        }
        let (abar, zbar) = mean_numbers(self.abundance.view(), table)?;
        self.abar = abar;
        self.zbar = zbar;
        Ok(())
    }
}

/// `abundance[bin, iso] = Σ_t tracer[bin, t] · table[t, iso]`.
///
/// Tracer columns are matched to table populations by name. Whatever mass
/// fraction the tracers leave uncovered, `1 - Σ_t tracer[bin, t]`, is
/// untraced gas and takes the table row of population `untraced`.
pub fn reconstruct(
    tracers: ArrayView2<'_, f64>,
    tracer_names: &[String],
    table: &CompositionTable,
    untraced: &str,
) -> ProfileResult<Abundances> {
    if tracers.ncols() != tracer_names.len() {
        return Err(ProfileError::LengthMismatch {
            stage: "composition",
            column: "tracer_names".to_string(),
            expected: tracers.ncols(),
            found: tracer_names.len(),
        });
    }
    let n_bins = tracers.nrows();
    let mut abundance = Array2::zeros((n_bins, table.n_isotopes()));
    for (t, name) in tracer_names.iter().enumerate() {
        let row = table.require_population(name)?;
        for b in 0..n_bins {
            let w = tracers[[b, t]];
            abundance.row_mut(b).scaled_add(w, &row);
        }
    }

    let mut untraced_bins = 0;
    for (b, tr) in tracers.rows().into_iter().enumerate() {
        let s: f64 = tr.sum();
        if s > 1.0 + FRACTION_SUM_TOL {
            warn!("tracer fractions in bin {b} sum to {s:.6} > 1");
        }
        let remainder = 1.0 - s;
        if remainder > FRACTION_SUM_TOL {
            let row = table.require_population(untraced)?;
            abundance.row_mut(b).scaled_add(remainder, &row);
            untraced_bins += 1;
        }
    }
    if untraced_bins > 0 {
        warn!("{untraced_bins} bins hold untraced gas, filled with population `{untraced}`");
    }

    let (abar, zbar) = mean_numbers(abundance.view(), table)?;
    Ok(Abundances {
        abundance,
        abar,
        zbar,
    })
}

fn mean_numbers(
    abundance: ArrayView2<'_, f64>,
    table: &CompositionTable,
) -> ProfileResult<(Array1<f64>, Array1<f64>)> {
    let n_bins = abundance.nrows();
    let mut abar = Array1::zeros(n_bins);
    let mut zbar = Array1::zeros(n_bins);
    for (b, row) in abundance.rows().into_iter().enumerate() {
        let mut inv_a = 0.0;
        let mut inv_z = 0.0;
        for (x, iso) in row.iter().zip(table.isotopes()) {
            inv_a += x / iso.a;
            inv_z += x / iso.z;
        }
        if row.sum() <= 0.0 || inv_a <= 0.0 || inv_z <= 0.0 {
            return Err(ProfileError::malformed(
                "composition",
                b,
                "bin has zero total abundance",
            ));
        }
        abar[b] = 1.0 / inv_a;
        zbar[b] = 1.0 / inv_z;
    }
    Ok((abar, zbar))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn he_c_table() -> CompositionTable {
        CompositionTable::from_parts(
            "he_c".to_string(),
            vec![
                Isotope {
                    name: "he4".into(),
                    a: 4.0,
                    z: 2.0,
                },
                Isotope {
                    name: "c12".into(),
                    a: 12.0,
                    z: 6.0,
                },
            ],
            vec![
                Population {
                    name: "primary".into(),
                    mass_fractions: vec![0.0, 1.0],
                },
                Population {
                    name: "secondary".into(),
                    mass_fractions: vec![1.0, 0.0],
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_all_builtin_networks_load() {
        for name in CompositionTable::builtin_names() {
            let table = CompositionTable::builtin(name).unwrap();
            assert_eq!(table.name(), name);
            assert!(table.population("primary").is_some(), "{name}");
            assert!(table.population("secondary").is_some(), "{name}");
        }
        assert_eq!(CompositionTable::builtin("mesa_75").unwrap().n_isotopes(), 75);
    }

    #[test]
    fn test_unknown_network_is_config_error() {
        assert!(matches!(
            CompositionTable::builtin("not_a_net"),
            Err(ProfileError::ConfigError(_))
        ));
    }

    #[test]
    fn test_pure_helium_gives_abar_4_zbar_2() {
        let table = he_c_table();
        let tracers = array![[0.0, 1.0], [0.0, 1.0]];
        let names = vec!["primary".to_string(), "secondary".to_string()];
        let ab = reconstruct(tracers.view(), &names, &table, "secondary").unwrap();
        assert!((ab.abar()[0] - 4.0).abs() < 1e-12);
        assert!((ab.zbar()[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_pure_population_equals_table_row() {
        let table = CompositionTable::builtin("hot_cno").unwrap();
        let tracers = array![[1.0, 0.0]];
        let names = vec!["primary".to_string(), "secondary".to_string()];
        let ab = reconstruct(tracers.view(), &names, &table, "secondary").unwrap();
        let row = table.population("primary").unwrap();
        for (a, b) in ab.abundance().row(0).iter().zip(row.iter()) {
            assert!((a - b).abs() < 1e-15);
        }
    }

    #[test]
    fn test_mixture_is_linear() {
        let table = he_c_table();
        let tracers = array![[0.25, 0.75]];
        let names = vec!["primary".to_string(), "secondary".to_string()];
        let ab = reconstruct(tracers.view(), &names, &table, "secondary").unwrap();
        assert!((ab.abundance()[[0, 0]] - 0.75).abs() < 1e-15);
        assert!((ab.abundance()[[0, 1]] - 0.25).abs() < 1e-15);
        // 1/abar = 0.75/4 + 0.25/12
        let expected = 1.0 / (0.75 / 4.0 + 0.25 / 12.0);
        assert!((ab.abar()[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_missing_population_is_config_error() {
        let table = he_c_table();
        let tracers = array![[1.0]];
        let names = vec!["envelope".to_string()];
        let err = reconstruct(tracers.view(), &names, &table, "secondary").unwrap_err();
        match err {
            ProfileError::ConfigError(msg) => assert!(msg.contains("envelope")),
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_untraced_bin_takes_fallback_population() {
        let table = he_c_table();
        let tracers = array![[0.5, 0.5], [0.0, 0.0]];
        let names = vec!["primary".to_string(), "secondary".to_string()];
        let ab = reconstruct(tracers.view(), &names, &table, "primary").unwrap();
        assert_eq!(ab.abundance().row(1).to_vec(), vec![0.0, 1.0]);
        assert!((ab.abar()[1] - 12.0).abs() < 1e-12);
        assert!((ab.zbar()[1] - 6.0).abs() < 1e-12);
        // Traced bins keep the tracer-weighted mix
        assert_eq!(ab.abundance().row(0).to_vec(), vec![0.5, 0.5]);
    }

    #[test]
    fn test_partly_traced_bin_is_topped_up() {
        let table = he_c_table();
        let tracers = array![[0.25, 0.25]];
        let names = vec!["primary".to_string(), "secondary".to_string()];
        let ab = reconstruct(tracers.view(), &names, &table, "secondary").unwrap();
        // 0.25 C from primary, 0.25 + 0.5 He from secondary and the remainder
        assert!((ab.abundance()[[0, 0]] - 0.75).abs() < 1e-15);
        assert!((ab.abundance()[[0, 1]] - 0.25).abs() < 1e-15);
        assert!((ab.abundance().row(0).sum() - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_unknown_untraced_population_is_config_error() {
        let table = he_c_table();
        let names = vec!["primary".to_string(), "secondary".to_string()];
        let traced = array![[0.5, 0.5]];
        assert!(reconstruct(traced.view(), &names, &table, "ambient").is_ok());
        let untraced = array![[0.5, 0.5], [0.0, 0.0]];
        match reconstruct(untraced.view(), &names, &table, "ambient").unwrap_err() {
            ProfileError::ConfigError(msg) => assert!(msg.contains("ambient")),
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_zero_abundance_population_is_malformed() {
        let table = CompositionTable::from_parts(
            "empty".to_string(),
            vec![Isotope {
                name: "he4".into(),
                a: 4.0,
                z: 2.0,
            }],
            vec![Population {
                name: "secondary".into(),
                mass_fractions: vec![0.0],
            }],
        )
        .unwrap();
        let tracers = array![[1.0]];
        let names = vec!["secondary".to_string()];
        assert!(matches!(
            reconstruct(tracers.view(), &names, &table, "secondary"),
            Err(ProfileError::MalformedInput { index: 0, .. })
        ));
    }

    #[test]
    fn test_assign_split() {
        let table = he_c_table();
        let tracers = array![[0.5, 0.5], [0.5, 0.5], [0.5, 0.5]];
        let names = vec!["primary".to_string(), "secondary".to_string()];
        let mut ab = reconstruct(tracers.view(), &names, &table, "secondary").unwrap();
        ab.assign_split(&table, 0, "primary", "secondary").unwrap();
        assert!((ab.abar()[0] - 12.0).abs() < 1e-12);
        assert!((ab.abar()[1] - 4.0).abs() < 1e-12);
        assert!((ab.abar()[2] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_mismatched_population_length() {
        let err = CompositionTable::from_json_str(
            r#"{"name":"bad","isotopes":[{"name":"he4","a":4,"z":2}],
                "populations":[{"name":"primary","mass_fractions":[0.5,0.5]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ProfileError::ConfigError(_)));
    }
}
