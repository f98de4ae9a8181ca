// ─────────────────────────────────────────────────────────────────────
// Merger Profile — Assembler
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Spherical and cylindrical profile assembly from a cell dataset.
//!
//! Spherical pass (bins by r, emptiness by volume):
//!
//! | column  | reduction          |
//! |---------|--------------------|
//! | dV, dm  | summed             |
//! | rho, tau, ek | volume-weighted |
//! | j, tracers | mass-weighted    |
//!
//! Cylindrical pass (bins by R, emptiness by mass): dV and dm summed, j
//! mass-weighted, restricted to cells inside the spherical cutoff.

use log::{debug, info};
use merger_math::binning::{BinEdges, Column, RadialBinner};
use merger_types::config::{RunConfig, Spacing};
use merger_types::error::{ProfileError, ProfileResult};
use merger_types::state::{
    CellDataset, CylindricalProfile, ProfileAxis, SphericalColumns, SphericalProfile,
};
use ndarray::{Array1, Array2};

const COL_VOLUME: usize = 0;
const COL_MASS: usize = 1;

/// Minimum number of non-empty bins for a usable profile.
const MIN_BINS: usize = 2;

#[derive(Debug, Clone, Copy)]
pub struct ProfileAssembler {
    spacing: Spacing,
    resolution: usize,
    cylindrical_resolution: usize,
}

/// Both profiles of one pass at a common cutoff.
#[derive(Debug, Clone)]
pub struct AssembledProfiles {
    pub spherical: SphericalProfile,
    pub cylindrical: CylindricalProfile,
    pub cutoff: f64,
}

impl ProfileAssembler {
    pub fn new(spacing: Spacing, resolution: usize, cylindrical_resolution: usize) -> Self {
        ProfileAssembler {
            spacing,
            resolution,
            cylindrical_resolution,
        }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(
            config.spacing,
            config.resolution,
            config.cylindrical_resolution(),
        )
    }

    pub fn assemble(&self, dataset: &CellDataset, r_max: f64) -> ProfileResult<AssembledProfiles> {
        let spherical = self.spherical(dataset, r_max)?;
        let cylindrical = self.cylindrical(dataset, r_max)?;
        info!(
            "assembled {} spherical and {} cylindrical bins at cutoff {:.4e} cm",
            spherical.len(),
            cylindrical.len(),
            r_max
        );
        Ok(AssembledProfiles {
            spherical,
            cylindrical,
            cutoff: r_max,
        })
    }

    pub fn spherical(&self, dataset: &CellDataset, r_max: f64) -> ProfileResult<SphericalProfile> {
        let binner = RadialBinner::new(BinEdges::new(self.spacing, r_max, self.resolution)?);
        let density = dataset.density();
        let tau = dataset.tau();
        let ek = dataset.kinetic_energy();
        let j = dataset.angular_momentum();

        let mut columns = vec![
            Column::summed("dV", dataset.volume()),
            Column::summed("dm", dataset.mass()),
            Column::weighted("rho", density, COL_VOLUME),
            Column::weighted("tau", tau, COL_VOLUME),
            Column::weighted("ek", ek, COL_VOLUME),
            Column::weighted("j", j, COL_MASS),
        ];
        let first_tracer = columns.len();
        for (k, name) in dataset.tracer_names().iter().enumerate() {
            columns.push(Column::weighted(name, dataset.tracer(k), COL_MASS));
        }

        let binned = binner.bin(dataset.radius(), &columns, COL_VOLUME, None)?;
        let total_bins = binned.len();
        let binned = binned.retain_occupied();
        debug!(
            "spherical pass: removed {} empty bins of {total_bins}",
            total_bins - binned.len()
        );
        if binned.len() < MIN_BINS {
            return Err(ProfileError::ProfileDegenerate {
                axis: ProfileAxis::Spherical,
                bins: binned.len(),
            });
        }

        let n_bins = binned.len();
        let n_tracers = dataset.tracer_names().len();
        let (radius, mut values) = binned.into_parts();
        let mut tracers = Array2::zeros((n_bins, n_tracers));
        for k in 0..n_tracers {
            let col = std::mem::replace(&mut values[first_tracer + k], Array1::zeros(0));
            tracers.column_mut(k).assign(&col);
        }
        let mut take = |k: usize| std::mem::replace(&mut values[k], Array1::zeros(0));

        SphericalProfile::new(SphericalColumns {
            radius,
            volume: take(COL_VOLUME),
            mass: take(COL_MASS),
            density: take(2),
            tau: take(3),
            ek: take(4),
            j: take(5),
            tracers,
            tracer_names: dataset.tracer_names().to_vec(),
        })
    }

    pub fn cylindrical(
        &self,
        dataset: &CellDataset,
        r_max: f64,
    ) -> ProfileResult<CylindricalProfile> {
        let spherical_edges = BinEdges::new(self.spacing, r_max, self.resolution)?;
        let inside: Vec<bool> = dataset
            .radius()
            .iter()
            .map(|&r| spherical_edges.index_of(r).is_some())
            .collect();

        let binner = RadialBinner::new(BinEdges::new(
            self.spacing,
            r_max,
            self.cylindrical_resolution,
        )?);
        let j = dataset.angular_momentum();
        let columns = [
            Column::summed("dV", dataset.volume()),
            Column::summed("dm", dataset.mass()),
            Column::weighted("j", j, COL_MASS),
        ];
        let binned = binner
            .bin(dataset.cylindrical_radius(), &columns, COL_MASS, Some(&inside))?
            .retain_occupied();
        if binned.len() < MIN_BINS {
            return Err(ProfileError::ProfileDegenerate {
                axis: ProfileAxis::Cylindrical,
                bins: binned.len(),
            });
        }

        let (radius, mut values) = binned.into_parts();
        let j = values.pop().unwrap_or_default();
        let mass = values.pop().unwrap_or_default();
        let volume = values.pop().unwrap_or_default();
        CylindricalProfile::new(radius, volume, mass, j)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use merger_types::state::CellColumns;

    /// Cubic lattice of cells of density `rho0` inside a sphere of `radius`.
    fn centred_sphere(radius: f64, n_side: usize, rho0: f64) -> CellDataset {
        let h = 2.0 * radius / n_side as f64;
        let (mut x, mut y, mut z) = (Vec::new(), Vec::new(), Vec::new());
        for i in 0..n_side {
            for j in 0..n_side {
                for k in 0..n_side {
                    let px = -radius + (i as f64 + 0.5) * h;
                    let py = -radius + (j as f64 + 0.5) * h;
                    let pz = -radius + (k as f64 + 0.5) * h;
                    if (px * px + py * py + pz * pz).sqrt() <= radius {
                        x.push(px);
                        y.push(py);
                        z.push(pz);
                    }
                }
            }
        }
        let n = x.len();
        CellDataset::new(CellColumns {
            x: Array1::from(x),
            y: Array1::from(y),
            z: Array1::from(z),
            volume: Array1::from_elem(n, h * h * h),
            density: Array1::from_elem(n, rho0),
            sx: Array1::zeros(n),
            sy: Array1::zeros(n),
            sz: Array1::zeros(n),
            tau: Array1::ones(n),
            tracers: Array2::from_elem((n, 2), 0.5),
            tracer_names: vec!["primary".into(), "secondary".into()],
        })
        .unwrap()
    }

    #[test]
    fn test_spherical_weighted_density_is_uniform() {
        let ds = centred_sphere(100.0, 20, 3.0);
        let asm = ProfileAssembler::new(Spacing::Linear, 30, 10);
        let p = asm.spherical(&ds, 400.0).unwrap();
        for &rho in p.density().iter() {
            assert!((rho - 3.0).abs() < 1e-9, "rho = {rho}");
        }
        for &x in p.tracers().iter() {
            assert!((x - 0.5).abs() < 1e-12);
        }
        assert!((p.mass().sum() - ds.total_mass()).abs() < 1e-9 * ds.total_mass());
    }

    #[test]
    fn test_profiles_are_aligned_and_innermost_first() {
        let ds = centred_sphere(100.0, 16, 1.0);
        let asm = ProfileAssembler::new(Spacing::Logarithmic, 60, 12);
        let out = asm.assemble(&ds, 200.0).unwrap();
        let s = &out.spherical;
        assert_eq!(s.volume().len(), s.len());
        assert_eq!(s.tracers().nrows(), s.len());
        for i in 1..s.len() {
            assert!(s.radius()[i] > s.radius()[i - 1]);
        }
        let c = &out.cylindrical;
        assert_eq!(c.angular_momentum().len(), c.len());
        assert!(c.mass().iter().all(|&m| m > 0.0));
    }

    #[test]
    fn test_degenerate_profile() {
        let ds = centred_sphere(100.0, 4, 1.0);
        // every cell lands in the first linear bin
        let asm = ProfileAssembler::new(Spacing::Linear, 2, 2);
        let err = asm.spherical(&ds, 1.0e6).unwrap_err();
        match err {
            ProfileError::ProfileDegenerate { axis, bins } => {
                assert_eq!(axis, ProfileAxis::Spherical);
                assert_eq!(bins, 1);
            }
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_cylindrical_pass_ignores_cells_outside_cutoff() {
        let ds = centred_sphere(100.0, 16, 1.0);
        let asm = ProfileAssembler::new(Spacing::Linear, 50, 10);
        let cut = 60.0;
        let c = asm.cylindrical(&ds, cut).unwrap();
        let inside: f64 = ds
            .radius()
            .iter()
            .zip(ds.mass().iter())
            .filter(|(&r, _)| r <= cut)
            .map(|(_, &m)| m)
            .sum();
        assert!((c.mass().sum() - inside).abs() < 1e-9 * inside);
    }
}
