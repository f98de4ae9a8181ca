// ─────────────────────────────────────────────────────────────────────
// Merger Profile — Binning
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Radial scatter-add binning of per-cell columns.
//!
//! Cells are assigned to a bin by their radial coordinate, then every column
//! is either summed or averaged with the sum of another column as weight.
//! The scatter is sharded across rayon workers; each shard owns a private
//! accumulator and shards are merged at the end, so sums agree with a serial
//! pass only up to floating-point reassociation.

use log::debug;
use merger_types::config::Spacing;
use merger_types::error::{ProfileError, ProfileResult};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rayon::prelude::*;

/// Bin edges along one radial axis.
#[derive(Debug, Clone)]
pub struct BinEdges {
    spacing: Spacing,
    r_max: f64,
    /// Constant spacing, in log10 space for logarithmic edges.
    dr: f64,
    edges: Array1<f64>,
}

impl BinEdges {
    /// Linear: `linspace(0, r_max, n)`. Logarithmic: `10^linspace(0, log10 r_max, n)`.
    pub fn new(spacing: Spacing, r_max: f64, n: usize) -> ProfileResult<Self> {
        if n < 2 {
            return Err(ProfileError::ConfigError(format!(
                "bin count must be >= 2, got {n}"
            )));
        }
        if !r_max.is_finite() || r_max <= 0.0 {
            return Err(ProfileError::ConfigError(format!(
                "cutoff radius must be finite and > 0, got {r_max}"
            )));
        }
        let (dr, edges) = match spacing {
            Spacing::Linear => (r_max / (n - 1) as f64, Array1::linspace(0.0, r_max, n)),
            Spacing::Logarithmic => {
                if r_max <= 1.0 {
                    return Err(ProfileError::ConfigError(format!(
                        "logarithmic binning needs a cutoff > 1, got {r_max}"
                    )));
                }
                let log_r_max = r_max.log10();
                (
                    log_r_max / (n - 1) as f64,
                    Array1::linspace(0.0, log_r_max, n).mapv(|e| 10f64.powf(e)),
                )
            }
        };
        Ok(BinEdges {
            spacing,
            r_max,
            dr,
            edges,
        })
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn r_max(&self) -> f64 {
        self.r_max
    }

    pub fn spacing(&self) -> Spacing {
        self.spacing
    }

    pub fn edges(&self) -> ArrayView1<'_, f64> {
        self.edges.view()
    }

    /// Bin index of radius `r`, or `None` if the cell lies beyond the cutoff.
    ///
    /// Logarithmic bins use `floor(log10(r + 1) / dr) + 1`, so bin 0 is never
    /// filled; linear bins round to the nearest edge.
    pub fn index_of(&self, r: f64) -> Option<usize> {
        let n = match self.spacing {
            Spacing::Logarithmic => {
                let lr = (r + 1.0).log10();
                if lr > self.r_max.log10() {
                    return None;
                }
                (lr / self.dr).floor() as usize + 1
            }
            Spacing::Linear => {
                if r > self.r_max {
                    return None;
                }
                (r / self.dr).round() as usize
            }
        };
        // n == len only happens exactly at the cutoff
        (n < self.edges.len()).then_some(n)
    }
}

/// How a column is reduced within a bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accumulation {
    /// Plain sum over the bin's cells.
    Summed,
    /// `Σ v·w / Σ w`, where `w` is the summed column at this index.
    Weighted(usize),
}

/// One per-cell input column.
#[derive(Debug, Clone)]
pub struct Column<'a> {
    pub name: &'a str,
    pub values: ArrayView1<'a, f64>,
    pub accumulation: Accumulation,
}

impl<'a> Column<'a> {
    pub fn summed(name: &'a str, values: ArrayView1<'a, f64>) -> Self {
        Column {
            name,
            values,
            accumulation: Accumulation::Summed,
        }
    }

    pub fn weighted(name: &'a str, values: ArrayView1<'a, f64>, weight: usize) -> Self {
        Column {
            name,
            values,
            accumulation: Accumulation::Weighted(weight),
        }
    }
}

/// Result of one binning pass, indexed `[bin]` per column.
#[derive(Debug, Clone)]
pub struct BinnedColumns {
    radius: Array1<f64>,
    values: Vec<Array1<f64>>,
    occupied: Vec<bool>,
    dropped_cells: usize,
}

impl BinnedColumns {
    pub fn len(&self) -> usize {
        self.radius.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radius.is_empty()
    }

    pub fn radius(&self) -> ArrayView1<'_, f64> {
        self.radius.view()
    }

    pub fn column(&self, k: usize) -> ArrayView1<'_, f64> {
        self.values[k].view()
    }

    pub fn occupied(&self) -> &[bool] {
        &self.occupied
    }

    /// Cells that fell beyond the cutoff or were masked out.
    pub fn dropped_cells(&self) -> usize {
        self.dropped_cells
    }

    /// Drop every empty bin from every column at once.
    pub fn retain_occupied(self) -> Self {
        let idx: Vec<usize> = self
            .occupied
            .iter()
            .enumerate()
            .filter_map(|(i, &o)| o.then_some(i))
            .collect();
        BinnedColumns {
            radius: self.radius.select(Axis(0), &idx),
            values: self
                .values
                .iter()
                .map(|v| v.select(Axis(0), &idx))
                .collect(),
            occupied: vec![true; idx.len()],
            dropped_cells: self.dropped_cells,
        }
    }

    /// Take ownership of the axis and the column arrays.
    pub fn into_parts(self) -> (Array1<f64>, Vec<Array1<f64>>) {
        (self.radius, self.values)
    }
}

/// Private per-shard accumulator: `sums[[column, bin]]`.
struct Shard {
    sums: Array2<f64>,
    dropped: usize,
}

impl Shard {
    fn new(n_columns: usize, n_bins: usize) -> Self {
        Shard {
            sums: Array2::zeros((n_columns, n_bins)),
            dropped: 0,
        }
    }

    fn merge(mut self, other: Shard) -> Shard {
        self.sums += &other.sums;
        self.dropped += other.dropped;
        self
    }
}

/// Scatter-add binner over a fixed set of edges.
#[derive(Debug, Clone)]
pub struct RadialBinner {
    edges: BinEdges,
}

impl RadialBinner {
    pub fn new(edges: BinEdges) -> Self {
        RadialBinner { edges }
    }

    pub fn edges(&self) -> &BinEdges {
        &self.edges
    }

    /// Bin `columns` by `coord`.
    ///
    /// `primary` names the summed column whose zero sum marks a bin empty.
    /// With a mask, only cells whose entry is `true` take part.
    pub fn bin(
        &self,
        coord: ArrayView1<'_, f64>,
        columns: &[Column<'_>],
        primary: usize,
        mask: Option<&[bool]>,
    ) -> ProfileResult<BinnedColumns> {
        const STAGE: &str = "radial binning";
        let n_cells = coord.len();
        for c in columns {
            if c.values.len() != n_cells {
                return Err(ProfileError::LengthMismatch {
                    stage: STAGE,
                    column: c.name.to_string(),
                    expected: n_cells,
                    found: c.values.len(),
                });
            }
            if let Accumulation::Weighted(w) = c.accumulation {
                match columns.get(w).map(|wc| wc.accumulation) {
                    Some(Accumulation::Summed) => {}
                    _ => {
                        return Err(ProfileError::ConfigError(format!(
                            "column `{}` must be weighted by a summed column, got index {w}",
                            c.name
                        )))
                    }
                }
            }
        }
        if !matches!(
            columns.get(primary).map(|c| c.accumulation),
            Some(Accumulation::Summed)
        ) {
            return Err(ProfileError::ConfigError(format!(
                "primary weight index {primary} is not a summed column"
            )));
        }
        if let Some(m) = mask {
            if m.len() != n_cells {
                return Err(ProfileError::LengthMismatch {
                    stage: STAGE,
                    column: "mask".to_string(),
                    expected: n_cells,
                    found: m.len(),
                });
            }
        }
        if let Some(i) = coord.iter().position(|&r| !r.is_finite() || r < 0.0) {
            return Err(ProfileError::malformed(
                STAGE,
                i,
                format!("radial coordinate must be finite and >= 0, got {}", coord[i]),
            ));
        }

        let n_bins = self.edges.len();
        let n_columns = columns.len();
        let shard = (0..n_cells)
            .into_par_iter()
            .fold(
                || Shard::new(n_columns, n_bins),
                |mut acc, i| {
                    let included = mask.map_or(true, |m| m[i]);
                    match self.edges.index_of(coord[i]).filter(|_| included) {
                        Some(bin) => {
                            for (k, c) in columns.iter().enumerate() {
                                let v = match c.accumulation {
                                    Accumulation::Summed => c.values[i],
                                    Accumulation::Weighted(w) => c.values[i] * columns[w].values[i],
                                };
                                acc.sums[[k, bin]] += v;
                            }
                        }
                        None => acc.dropped += 1,
                    }
                    acc
                },
            )
            .reduce(|| Shard::new(n_columns, n_bins), Shard::merge);

        let mut values = Vec::with_capacity(n_columns);
        for (k, c) in columns.iter().enumerate() {
            let row = shard.sums.row(k);
            let out = match c.accumulation {
                Accumulation::Summed => row.to_owned(),
                Accumulation::Weighted(w) => {
                    let weight = shard.sums.row(w);
                    let mut avg = Array1::zeros(n_bins);
                    for b in 0..n_bins {
                        if weight[b] != 0.0 {
                            avg[b] = row[b] / weight[b];
                        }
                    }
                    avg
                }
            };
            values.push(out);
        }
        let occupied: Vec<bool> = values[primary].iter().map(|&w| w != 0.0).collect();

        debug!(
            "binned {} cells into {} of {} bins ({} dropped)",
            n_cells - shard.dropped,
            occupied.iter().filter(|&&o| o).count(),
            n_bins,
            shard.dropped
        );

        Ok(BinnedColumns {
            radius: self.edges.edges().to_owned(),
            values,
            occupied,
            dropped_cells: shard.dropped,
        })
    }
}
