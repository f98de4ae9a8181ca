// ─────────────────────────────────────────────────────────────────────
// Merger Profile — Binding Energy
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Specific binding energy of each spherical shell and the bound edge.
//!
//! The gravitational potential of a shell is that of the interior mass plus
//! the overlying shells, `u = -G mr/r - 4πG ∫_r^R r' ρ dr'`. The total
//! specific energy adds the kinetic and internal terms; the star's bound
//! edge is where it turns from negative to positive.

use std::f64::consts::PI;

use log::debug;
use merger_math::integrate::suffix_trapz;
use merger_types::constants::G_CGS;
use merger_types::error::{ProfileError, ProfileResult};
use merger_types::state::SphericalProfile;
use ndarray::{Array1, ArrayView1};

use crate::mass_coord::MassCoordinate;

/// First bin scanned for the bound edge unless configured otherwise.
pub const DEFAULT_SCAN_OFFSET: usize = 10;

#[derive(Debug, Clone)]
pub struct BindingEnergy {
    radius: Array1<f64>,
    interior_mass: Array1<f64>,
    potential: Array1<f64>, // u [erg/g]
    total: Array1<f64>,     // etot = ek + u + eint [erg/g]
}

/// Outermost shell that is still bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundEdge {
    pub index: usize,
    pub radius: f64,
    pub interior_mass: f64,
}

impl BindingEnergy {
    pub fn estimate(profile: &SphericalProfile, mass: &MassCoordinate) -> ProfileResult<Self> {
        if mass.len() != profile.len() {
            return Err(ProfileError::LengthMismatch {
                stage: "binding energy",
                column: "interior_mass".to_string(),
                expected: profile.len(),
                found: mass.len(),
            });
        }
        let radius = profile.radius().to_owned();
        let r_rho = &radius * &profile.density();
        let uint = suffix_trapz(r_rho.view(), radius.view());
        let mr = mass.interior_mass();

        let mut potential = Array1::zeros(radius.len());
        for i in 0..radius.len() {
            // rr == 0 only for the innermost linear bin
            let point = if radius[i] > 0.0 {
                -G_CGS * mr[i] / radius[i]
            } else {
                0.0
            };
            potential[i] = point - 4.0 * PI * G_CGS * uint[i];
        }
        let total = &profile.kinetic_energy() + &potential + &profile.internal_energy();

        Ok(BindingEnergy {
            radius,
            interior_mass: mr.to_owned(),
            potential,
            total,
        })
    }

    pub fn potential(&self) -> ArrayView1<'_, f64> {
        self.potential.view()
    }

    pub fn total(&self) -> ArrayView1<'_, f64> {
        self.total.view()
    }

    /// Outermost `i >= offset` with `etot[i] < 0 <= etot[i+1]`.
    pub fn bound_edge(&self, offset: usize) -> ProfileResult<BoundEdge> {
        let index = find_sign_change(self.total.view(), offset)?;
        debug!(
            "bound edge at bin {index}: r = {:.4e} cm, mr = {:.4e} g",
            self.radius[index], self.interior_mass[index]
        );
        Ok(BoundEdge {
            index,
            radius: self.radius[index],
            interior_mass: self.interior_mass[index],
        })
    }
}

/// Index of the last negative-to-non-negative transition at or beyond `offset`.
pub fn find_sign_change(etot: ArrayView1<'_, f64>, offset: usize) -> ProfileResult<usize> {
    let n = etot.len();
    let mut found = None;
    for i in offset..n.saturating_sub(1) {
        if etot[i] < 0.0 && etot[i + 1] >= 0.0 {
            found = Some(i);
        }
    }
    found.ok_or(ProfileError::BoundaryNotFound {
        scanned: n.saturating_sub(offset),
        offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use merger_types::state::SphericalColumns;
    use ndarray::{array, Array2};

    #[test]
    fn test_sign_change_found() {
        let mut e = Array1::from_elem(40, -1.0);
        for i in 25..40 {
            e[i] = 1.0;
        }
        assert_eq!(find_sign_change(e.view(), 10).unwrap(), 24);
    }

    #[test]
    fn test_sign_change_takes_outermost() {
        let e = array![-1.0, 1.0, -1.0, 1.0, -1.0, -1.0, 2.0];
        assert_eq!(find_sign_change(e.view(), 0).unwrap(), 5);
    }

    #[test]
    fn test_sign_change_ignores_bins_before_offset() {
        let e = array![-1.0, 1.0, 1.0, 1.0];
        let err = find_sign_change(e.view(), 2).unwrap_err();
        match err {
            ProfileError::BoundaryNotFound { scanned, offset } => {
                assert_eq!(scanned, 2);
                assert_eq!(offset, 2);
            }
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_all_positive_has_no_boundary() {
        let e = Array1::from_elem(30, 5.0);
        assert!(matches!(
            find_sign_change(e.view(), 10),
            Err(ProfileError::BoundaryNotFound { .. })
        ));
    }

    #[test]
    fn test_potential_of_single_shell_pair() {
        let profile = SphericalProfile::new(SphericalColumns {
            radius: array![1.0, 2.0],
            volume: array![1.0, 1.0],
            mass: array![3.0, 5.0],
            density: array![1.0, 1.0],
            tau: array![0.0, 0.0],
            ek: array![0.0, 0.0],
            j: array![0.0, 0.0],
            tracers: Array2::zeros((2, 0)),
            tracer_names: vec![],
        })
        .unwrap();
        let mass = MassCoordinate::from_masses(profile.mass()).unwrap();
        let be = BindingEnergy::estimate(&profile, &mass).unwrap();
        // uint[0] = 0.5*(1*1 + 2*1)*(2-1) = 1.5
        let expected0 = -G_CGS * 3.0 / 1.0 - 4.0 * PI * G_CGS * 1.5;
        let expected1 = -G_CGS * 8.0 / 2.0;
        assert!((be.potential()[0] - expected0).abs() < 1e-20);
        assert!((be.potential()[1] - expected1).abs() < 1e-20);
        assert!(be.total().iter().all(|&e| e < 0.0));
    }
}
