// ─────────────────────────────────────────────────────────────────────
// Merger Profile — Columnar Dump Reader
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Whitespace-delimited cell dump in simulation units.
//!
//! One cell per line with 21 columns:
//! `ind xl xr yl yr zl zr vx vy vz sx sy sz dm rho eint tau he4 c12 pot phi`.
//! The simulation runs with G = 1; [`RescaleConstants`] maps it onto a white
//! dwarf of a chosen mass using the non-relativistic mass–radius relation.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::info;
use merger_types::constants::{G_CGS, M_SUN_RESCALE};
use merger_types::error::{ProfileError, ProfileResult};
use merger_types::state::{CellColumns, CellDataset, FrameShift};
use ndarray::{Array1, Array2};

pub const DUMP_COLUMNS: [&str; 21] = [
    "ind", "xl", "xr", "yl", "yr", "zl", "zr", "vx", "vy", "vz", "sx", "sy", "sz", "dm", "rho",
    "eint", "tau", "he4", "c12", "pot", "phi",
];

const STAGE: &str = "dump reader";

/// Reference mass [Msun] of the unscaled run.
const REFERENCE_MASS: f64 = 0.88;
/// Reference radius [cm] of the unscaled run.
const REFERENCE_RADIUS: f64 = 637.3e6 / 0.2;
/// Length unit [cm] of the dump.
const LENGTH_UNIT: f64 = 3.271e9;
/// Time unit of the dump in rescaled dynamical times.
const TIME_UNIT: f64 = 16.22;

/// Unit factors from simulation to rescaled cgs values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RescaleConstants {
    pub mass: f64,
    pub length: f64,
    pub time: f64,
}

impl RescaleConstants {
    /// Rescale to a white dwarf of `initial_mass` [Msun], assuming R ∝ M^(-1/3).
    pub fn from_initial_mass(initial_mass: f64) -> ProfileResult<Self> {
        if !initial_mass.is_finite() || initial_mass <= 0.0 {
            return Err(ProfileError::ConfigError(format!(
                "initial mass must be finite and > 0, got {initial_mass}"
            )));
        }
        let mass = initial_mass / REFERENCE_MASS;
        let length = (initial_mass * 0.6).powf(-1.0 / 3.0) * REFERENCE_RADIUS / LENGTH_UNIT;
        let time =
            ((length * LENGTH_UNIT).powi(3) / G_CGS / (mass * M_SUN_RESCALE)).sqrt() / TIME_UNIT;
        Ok(RescaleConstants { mass, length, time })
    }

    /// No rescaling; values are taken as already in cgs.
    pub fn identity() -> Self {
        RescaleConstants {
            mass: 1.0,
            length: 1.0,
            time: 1.0,
        }
    }

    fn momentum_density(&self) -> f64 {
        self.mass * self.length / self.time / self.length.powi(3)
    }

    fn density(&self) -> f64 {
        self.mass / self.length.powi(3)
    }

    fn tau(&self) -> f64 {
        (self.mass * self.length.powi(2) / self.time.powi(2) / self.length.powi(3)).powf(0.6)
    }
}

/// Parse a dump into raw, uncentred cell columns.
///
/// Tracers: `primary = 2·c12`, `secondary = he4`.
pub fn read_dump<R: BufRead>(reader: R, scale: &RescaleConstants) -> ProfileResult<CellColumns> {
    let mut rows: Vec<[f64; 21]> = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = i + 1;
        if line.trim().is_empty() {
            continue;
        }
        let mut row = [0.0; 21];
        let mut fields = line.split_whitespace();
        for (k, slot) in row.iter_mut().enumerate() {
            let token = fields.next().ok_or_else(|| {
                ProfileError::malformed(
                    STAGE,
                    line_no,
                    format!("missing column `{}` (expected {})", DUMP_COLUMNS[k], DUMP_COLUMNS.len()),
                )
            })?;
            *slot = token.parse::<f64>().map_err(|e| {
                ProfileError::malformed(
                    STAGE,
                    line_no,
                    format!("column `{}`: cannot parse `{token}`: {e}", DUMP_COLUMNS[k]),
                )
            })?;
        }
        rows.push(row);
    }
    if rows.is_empty() {
        return Err(ProfileError::malformed(STAGE, 0, "dump has no cells"));
    }

    let n = rows.len();
    let col = |name: &str| -> Array1<f64> {
        let k = DUMP_COLUMNS.iter().position(|c| *c == name).unwrap_or(0);
        rows.iter().map(|r| r[k]).collect()
    };
    let l = scale.length;
    let (xl, xr) = (col("xl") * l, col("xr") * l);
    let (yl, yr) = (col("yl") * l, col("yr") * l);
    let (zl, zr) = (col("zl") * l, col("zr") * l);

    let x = (&xl + &xr) / 2.0;
    let y = (&yl + &yr) / 2.0;
    let z = (&zl + &zr) / 2.0;
    let volume = ((&xl - &xr) * (&yl - &yr) * (&zl - &zr)).mapv(f64::abs);

    let mut tracers = Array2::zeros((n, 2));
    tracers.column_mut(0).assign(&(col("c12") * 2.0));
    tracers.column_mut(1).assign(&col("he4"));

    info!("read {n} cells from dump");
    Ok(CellColumns {
        x,
        y,
        z,
        volume,
        density: col("rho") * scale.density(),
        sx: col("sx") * scale.momentum_density(),
        sy: col("sy") * scale.momentum_density(),
        sz: col("sz") * scale.momentum_density(),
        tau: col("tau") * scale.tau(),
        tracers,
        tracer_names: vec!["primary".to_string(), "secondary".to_string()],
    })
}

pub fn read_dump_file<P: AsRef<Path>>(
    path: P,
    scale: &RescaleConstants,
) -> ProfileResult<CellColumns> {
    let file = File::open(path)?;
    read_dump(BufReader::new(file), scale)
}

/// Read a dump and centre it on the densest cell.
///
/// Momenta stay in the inertial frame.
pub fn load_dump_file<P: AsRef<Path>>(
    path: P,
    scale: &RescaleConstants,
) -> ProfileResult<CellDataset> {
    let columns = read_dump_file(path, scale)?;
    CellDataset::centered_on_density_max(columns, FrameShift::Inertial)
}
