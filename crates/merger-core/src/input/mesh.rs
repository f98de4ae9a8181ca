// ─────────────────────────────────────────────────────────────────────
// Merger Profile — Mesh Arrays
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Flattened AMR leaf-cell arrays, e.g. exported to a NumPy `.npz` archive.
//!
//! Positions and volumes are in the mesh length unit; densities, momenta,
//! `tau` and the optional total gas energy density `egas` are already cgs.
//! Tracer populations are sums of partial densities divided by the total
//! density.
//!
//! When `egas` is present the internal energy density is
//! `eint = egas - ek - edeg`, with `ek` the kinetic energy density in the
//! densest cell's rest frame and `edeg` the degenerate-electron energy
//! density. Cells where `eint < 1e-3 egas` fall back to `tau^(5/3)`, and the
//! result is stored back into `tau` as `eint^(3/5)`.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use log::{debug, info, warn};
use merger_types::config::TracerSource;
use merger_types::constants::{EINT_MIN_FRACTION, TAU_EXPONENT};
use merger_types::error::{ProfileError, ProfileResult};
use merger_types::state::{CellColumns, CellDataset, FrameShift};
use ndarray::{Array1, Array2};
use ndarray_npy::NpzReader;

use crate::eos::degenerate_electron_energy;

/// Source of named per-cell field arrays.
pub trait MeshFields {
    /// Field by name, one entry per leaf cell.
    fn field(&mut self, name: &str) -> ProfileResult<Array1<f64>>;

    /// Whether an optional field such as `egas` is present.
    fn contains(&mut self, name: &str) -> bool;

    /// Length unit [cm] of positions and cell widths.
    fn length_unit(&self) -> f64;
}

/// [`MeshFields`] backed by a `.npz` archive.
///
/// An optional one-element `length_unit` entry sets the length unit;
/// otherwise positions are taken as cm.
pub struct NpzMesh {
    npz: NpzReader<File>,
    length_unit: f64,
}

impl NpzMesh {
    pub fn open<P: AsRef<Path>>(path: P) -> ProfileResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut npz = NpzReader::new(file).map_err(|e| {
            ProfileError::ConfigError(format!("Failed to open npz '{}': {e}", path.display()))
        })?;
        let length_unit = match read_array1(&mut npz, "length_unit") {
            Ok(unit) => unit.first().copied().unwrap_or(1.0),
            Err(_) => 1.0,
        };
        if !length_unit.is_finite() || length_unit <= 0.0 {
            return Err(ProfileError::ConfigError(format!(
                "length_unit in '{}' must be finite and > 0, got {length_unit}",
                path.display()
            )));
        }
        Ok(NpzMesh { npz, length_unit })
    }
}

impl MeshFields for NpzMesh {
    fn field(&mut self, name: &str) -> ProfileResult<Array1<f64>> {
        read_array1(&mut self.npz, name)
    }

    fn contains(&mut self, name: &str) -> bool {
        let npy = format!("{name}.npy");
        self.npz
            .names()
            .map(|names| names.iter().any(|n| n == name || *n == npy))
            .unwrap_or(false)
    }

    fn length_unit(&self) -> f64 {
        self.length_unit
    }
}

fn read_array1(npz: &mut NpzReader<File>, key: &str) -> ProfileResult<Array1<f64>> {
    npz.by_name::<ndarray::OwnedRepr<f64>, ndarray::Ix1>(&format!("{key}.npy"))
        .or_else(|_| npz.by_name::<ndarray::OwnedRepr<f64>, ndarray::Ix1>(key))
        .map_err(|e| ProfileError::ConfigError(format!("Failed to read {key} from npz: {e}")))
}

/// In-memory [`MeshFields`], for tests and for hosts that already hold the
/// arrays.
#[derive(Debug, Clone, Default)]
pub struct MemoryMesh {
    fields: HashMap<String, Array1<f64>>,
    length_unit: f64,
}

impl MemoryMesh {
    pub fn new(length_unit: f64) -> Self {
        MemoryMesh {
            fields: HashMap::new(),
            length_unit,
        }
    }

    pub fn insert(&mut self, name: &str, values: Array1<f64>) {
        self.fields.insert(name.to_string(), values);
    }
}

impl MeshFields for MemoryMesh {
    fn field(&mut self, name: &str) -> ProfileResult<Array1<f64>> {
        self.fields
            .get(name)
            .cloned()
            .ok_or_else(|| ProfileError::ConfigError(format!("mesh has no field `{name}`")))
    }

    fn contains(&mut self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    fn length_unit(&self) -> f64 {
        self.length_unit
    }
}

/// Build uncentred cell columns from a mesh.
pub fn read_mesh<M: MeshFields>(
    mesh: &mut M,
    tracers: &[TracerSource],
) -> ProfileResult<CellColumns> {
    let l = mesh.length_unit();
    let x = mesh.field("x")? * l;
    let y = mesh.field("y")? * l;
    let z = mesh.field("z")? * l;
    let volume = mesh.field("cell_volume")? * l.powi(3);
    let density = mesh.field("density")?;
    let n = density.len();

    let mut fractions = Array2::zeros((n, tracers.len()));
    for (t, source) in tracers.iter().enumerate() {
        let mut partial = Array1::<f64>::zeros(n);
        for name in &source.fields {
            let f = mesh.field(name)?;
            if f.len() != n {
                return Err(ProfileError::LengthMismatch {
                    stage: "mesh reader",
                    column: name.clone(),
                    expected: n,
                    found: f.len(),
                });
            }
            partial += &f;
        }
        fractions.column_mut(t).assign(&(partial / &density));
    }
    let overfull = fractions
        .rows()
        .into_iter()
        .filter(|r| r.sum() > 1.0 + 1e-6)
        .count();
    if overfull > 0 {
        warn!("{overfull} cells have tracer fractions summing above 1");
    }

    let sx = mesh.field("sx")?;
    let sy = mesh.field("sy")?;
    let sz = mesh.field("sz")?;
    let mut tau = mesh.field("tau")?;
    if mesh.contains("egas") {
        let egas = mesh.field("egas")?;
        if egas.len() != n {
            return Err(ProfileError::LengthMismatch {
                stage: "mesh reader",
                column: "egas".to_string(),
                expected: n,
                found: egas.len(),
            });
        }
        tau = tau_from_gas_energy(&egas, &density, [&sx, &sy, &sz], &tau);
    }

    let columns = CellColumns {
        x,
        y,
        z,
        volume,
        density,
        sx,
        sy,
        sz,
        tau,
        tracers: fractions,
        tracer_names: tracers.iter().map(|s| s.population.clone()).collect(),
    };
    info!("read {n} cells from mesh (length unit {l:.4e} cm)");
    Ok(columns)
}

/// `tau` rebuilt from `eint = egas - ek - edeg`, keeping the input `tau`
/// wherever that difference is below `EINT_MIN_FRACTION * egas`.
fn tau_from_gas_energy(
    egas: &Array1<f64>,
    density: &Array1<f64>,
    momentum: [&Array1<f64>; 3],
    tau: &Array1<f64>,
) -> Array1<f64> {
    let n = density.len();
    if n == 0 {
        return tau.clone();
    }
    let centre = density
        .iter()
        .enumerate()
        .fold(0, |best, (i, &rho)| if rho > density[best] { i } else { best });
    let v0 = momentum.map(|s| s[centre] / density[centre]);

    let mut out = tau.clone();
    let mut fallback = 0;
    for i in 0..n {
        let rho = density[i];
        let ek: f64 = (0..3)
            .map(|k| {
                let s = momentum[k][i] - rho * v0[k];
                0.5 * s * s / rho
            })
            .sum();
        let eint = egas[i] - ek - degenerate_electron_energy(rho);
        if eint >= EINT_MIN_FRACTION * egas[i] && eint > 0.0 {
            out[i] = eint.powf(1.0 / TAU_EXPONENT);
        } else {
            fallback += 1;
        }
    }
    debug!("egas: {fallback} of {n} cells keep tau for their internal energy");
    out
}

/// Read a mesh and centre it on the densest cell, in that cell's rest frame.
pub fn load_mesh<M: MeshFields>(
    mesh: &mut M,
    tracers: &[TracerSource],
) -> ProfileResult<CellDataset> {
    let columns = read_mesh(mesh, tracers)?;
    CellDataset::centered_on_density_max(columns, FrameShift::CentralCell)
}
