// ─────────────────────────────────────────────────────────────────────
// Merger Profile — Core Policy
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Post-EOS treatment of the core temperature and composition.
//!
//! A merger remnant's core is often under-resolved and comes out of the EOS
//! colder than a stellar-evolution code can start from. The floor policy
//! raises cold dense bins; the isothermal-core policy pins the inner mass to
//! a fixed temperature, bridges the gap to the temperature peak linearly in
//! `q`, and switches the composition from the core to the envelope
//! population at a chosen bin.

use log::{debug, info};
use merger_math::interp::{argmax, interp1d};
use merger_types::config::{
    CoreMassTarget, CorePolicy, IsothermalCore, TemperatureFloor, TransitionPlacement,
};
use merger_types::constants::M_SUN;
use merger_types::error::{ProfileError, ProfileResult};
use ndarray::{Array1, ArrayView1};

use crate::composition::{Abundances, CompositionTable};
use crate::mass_coord::MassCoordinate;

/// What a policy changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoreReport {
    /// Bins whose temperature was replaced.
    pub adjusted_bins: usize,
    /// Last bin of the core composition, if the composition was rewritten.
    pub transition: Option<usize>,
}

pub fn apply_core_policy(
    policy: &CorePolicy,
    temperature: &mut Array1<f64>,
    density: ArrayView1<'_, f64>,
    mass: &MassCoordinate,
    abundances: &mut Abundances,
    table: &CompositionTable,
) -> ProfileResult<CoreReport> {
    let n = temperature.len();
    for (column, found) in [
        ("density", density.len()),
        ("q", mass.len()),
        ("abundance", abundances.len()),
    ] {
        if found != n {
            return Err(ProfileError::LengthMismatch {
                stage: "core policy",
                column: column.to_string(),
                expected: n,
                found,
            });
        }
    }

    let report = match policy {
        CorePolicy::None => CoreReport::default(),
        CorePolicy::Floor(floor) => apply_floor(floor, temperature, density),
        CorePolicy::IsothermalCore(core) => {
            apply_isothermal_core(core, temperature, mass, abundances, table)?
        }
    };
    if report.adjusted_bins > 0 {
        info!("core policy adjusted {} bin temperatures", report.adjusted_bins);
    }
    Ok(report)
}

fn apply_floor(
    floor: &TemperatureFloor,
    temperature: &mut Array1<f64>,
    density: ArrayView1<'_, f64>,
) -> CoreReport {
    let mut adjusted = 0;
    for (t, &rho) in temperature.iter_mut().zip(density.iter()) {
        if *t <= floor.temperature && rho > floor.min_density {
            *t = floor.temperature;
            adjusted += 1;
        }
    }
    CoreReport {
        adjusted_bins: adjusted,
        transition: None,
    }
}

fn apply_isothermal_core(
    core: &IsothermalCore,
    temperature: &mut Array1<f64>,
    mass: &MassCoordinate,
    abundances: &mut Abundances,
    table: &CompositionTable,
) -> ProfileResult<CoreReport> {
    let target = match core.target {
        CoreMassTarget::MassFraction(f) => f * mass.total_mass(),
        CoreMassTarget::SolarMasses(m) => m * M_SUN,
    };
    let i_iso = mass.nearest_to_mass(target).ok_or_else(|| {
        ProfileError::ConfigError("isothermal core needs a non-empty profile".to_string())
    })?;
    let floor = core.temperature;

    let mut adjusted = 0;
    for t in temperature.iter_mut().take(i_iso + 1) {
        if *t != floor {
            *t = floor;
            adjusted += 1;
        }
    }

    let i_peak = argmax(temperature.view()).unwrap_or(i_iso);
    if i_peak > i_iso + 1 {
        // Anchors: every bin up to the peak that already meets the floor
        let q = mass.q();
        let (xp, fp): (Vec<f64>, Vec<f64>) = (0..=i_peak)
            .filter(|&i| temperature[i] >= floor)
            .map(|i| (q[i], temperature[i]))
            .unzip();
        let xp = Array1::from(xp);
        let fp = Array1::from(fp);
        for i in (i_iso + 1)..i_peak {
            if temperature[i] < floor {
                temperature[i] = interp1d(xp.view(), fp.view(), q[i]);
                adjusted += 1;
            }
        }
    }

    let i_trans = match core.placement {
        TransitionPlacement::NearestMass => i_iso,
        TransitionPlacement::TemperaturePeak => i_peak,
    };
    abundances.assign_split(
        table,
        i_trans,
        &core.inner_population,
        &core.outer_population,
    )?;
    debug!(
        "isothermal core: i_iso = {i_iso}, i_peak = {i_peak}, transition at bin {i_trans} (q = {:.4})",
        mass.q()[i_trans]
    );

    Ok(CoreReport {
        adjusted_bins: adjusted,
        transition: Some(i_trans),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::{reconstruct, Isotope, Population};
    use ndarray::{array, Array2};

    fn table() -> CompositionTable {
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

    fn mixed(n: usize, table: &CompositionTable) -> Abundances {
        let tracers = Array2::from_elem((n, 2), 0.5);
        let names = vec!["primary".to_string(), "secondary".to_string()];
        reconstruct(tracers.view(), &names, table, "secondary").unwrap()
    }

    #[test]
    fn test_none_leaves_everything() {
        let table = table();
        let mut ab = mixed(3, &table);
        let mut t = array![1.0, 2.0, 3.0];
        let mass = MassCoordinate::from_masses(array![1.0, 1.0, 1.0].view()).unwrap();
        let rho = array![1e5, 1e5, 1e5];
        let report =
            apply_core_policy(&CorePolicy::None, &mut t, rho.view(), &mass, &mut ab, &table).unwrap();
        assert_eq!(report, CoreReport::default());
        assert_eq!(t.to_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_floor_raises_cold_dense_bins_only() {
        let table = table();
        let mut ab = mixed(4, &table);
        let mut t = array![5e6, 5e6, 2e7, 1e6];
        let rho = array![1e6, 1e3, 1e6, 1e5];
        let mass = MassCoordinate::from_masses(array![1.0, 1.0, 1.0, 1.0].view()).unwrap();
        let policy = CorePolicy::Floor(TemperatureFloor {
            temperature: 1e7,
            min_density: 1e4,
        });
        let report = apply_core_policy(&policy, &mut t, rho.view(), &mass, &mut ab, &table).unwrap();
        assert_eq!(report.adjusted_bins, 2);
        assert_eq!(t.to_vec(), vec![1e7, 5e6, 2e7, 1e7]);
    }

    #[test]
    fn test_isothermal_core_interpolates_to_peak() {
        let table = table();
        let mut ab = mixed(6, &table);
        // q = 5/6, 4/6, 3/6, 2/6, 1/6, 0
        let mass = MassCoordinate::from_masses(Array1::ones(6).view()).unwrap();
        let mut t = array![3e6, 4e6, 2e6, 1e6, 5e7, 1e7];
        let rho = Array1::from_elem(6, 1e5);
        let policy = CorePolicy::IsothermalCore(IsothermalCore {
            target: CoreMassTarget::MassFraction(2.0 / 6.0),
            temperature: 1e7,
            placement: TransitionPlacement::NearestMass,
            inner_population: "primary".into(),
            outer_population: "secondary".into(),
        });
        let report = apply_core_policy(&policy, &mut t, rho.view(), &mass, &mut ab, &table).unwrap();

        // i_iso = 1 (mr = 2), i_peak = 4
        assert_eq!(t[0], 1e7);
        assert_eq!(t[1], 1e7);
        let q = mass.q();
        for i in 2..4 {
            let frac = (q[i] - q[1]) / (q[4] - q[1]);
            let expected = 1e7 + frac * (5e7 - 1e7);
            assert!((t[i] - expected).abs() / expected < 1e-12, "bin {i}: {}", t[i]);
        }
        assert_eq!(t[4], 5e7);
        assert_eq!(report.transition, Some(1));
        assert!((ab.abar()[1] - 12.0).abs() < 1e-12);
        assert!((ab.abar()[2] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_isothermal_transition_at_peak() {
        let table = table();
        let mut ab = mixed(5, &table);
        let mass = MassCoordinate::from_masses(Array1::ones(5).view()).unwrap();
        let mut t = array![1e6, 1e6, 2e6, 8e7, 1e6];
        let rho = Array1::from_elem(5, 1e5);
        let policy = CorePolicy::IsothermalCore(IsothermalCore {
            target: CoreMassTarget::MassFraction(0.2),
            temperature: 1e7,
            placement: TransitionPlacement::TemperaturePeak,
            inner_population: "primary".into(),
            outer_population: "secondary".into(),
        });
        let report = apply_core_policy(&policy, &mut t, rho.view(), &mass, &mut ab, &table).unwrap();
        assert_eq!(report.transition, Some(3));
        assert!((ab.abar()[3] - 12.0).abs() < 1e-12);
        assert!((ab.abar()[4] - 4.0).abs() < 1e-12);
        // bins between the core and the peak no longer fall below the floor
        assert!(t.iter().take(4).all(|&v| v >= 1e7));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let table = table();
        let mut ab = mixed(2, &table);
        let mut t = array![1.0, 2.0, 3.0];
        let mass = MassCoordinate::from_masses(array![1.0, 1.0, 1.0].view()).unwrap();
        let rho = array![1.0, 1.0, 1.0];
        assert!(matches!(
            apply_core_policy(&CorePolicy::None, &mut t, rho.view(), &mass, &mut ab, &table),
            Err(ProfileError::LengthMismatch { .. })
        ));
    }
}
