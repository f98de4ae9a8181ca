// ─────────────────────────────────────────────────────────────────────
// Merger Profile — Mass Coordinate
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Interior mass `mr` and exterior mass fraction `q = 1 - mr/M`.

use merger_math::interp::nearest_index;
use merger_types::error::{ProfileError, ProfileResult};
use ndarray::{Array1, ArrayView1};

#[derive(Debug, Clone)]
pub struct MassCoordinate {
    interior: Array1<f64>, // mr [g]
    q: Array1<f64>,
    total: f64,
}

impl MassCoordinate {
    /// Build from per-bin masses ordered innermost first.
    pub fn from_masses(dm: ArrayView1<'_, f64>) -> ProfileResult<Self> {
        const STAGE: &str = "mass coordinate";
        if let Some(i) = dm.iter().position(|&m| !m.is_finite() || m < 0.0) {
            return Err(ProfileError::malformed(
                STAGE,
                i,
                format!("bin mass must be finite and >= 0, got {}", dm[i]),
            ));
        }
        let mut interior = Array1::zeros(dm.len());
        let mut acc = 0.0;
        for (i, &m) in dm.iter().enumerate() {
            acc += m;
            interior[i] = acc;
        }
        let total = acc;
        if total <= 0.0 {
            return Err(ProfileError::malformed(
                STAGE,
                0,
                format!("total mass must be > 0, got {total}"),
            ));
        }
        // Clamp guards the last bin against 1 - (1 + ulp) < 0
        let q = interior.mapv(|mr| (1.0 - mr / total).clamp(0.0, 1.0));
        Ok(MassCoordinate { interior, q, total })
    }

    pub fn len(&self) -> usize {
        self.q.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }

    pub fn interior_mass(&self) -> ArrayView1<'_, f64> {
        self.interior.view()
    }

    pub fn q(&self) -> ArrayView1<'_, f64> {
        self.q.view()
    }

    pub fn total_mass(&self) -> f64 {
        self.total
    }

    /// Bin whose interior mass is closest to `target` [g].
    pub fn nearest_to_mass(&self, target: f64) -> Option<usize> {
        nearest_index(self.interior.view(), target)
    }

    /// Bin whose `q` is closest to `target`.
    pub fn nearest_to_q(&self, target: f64) -> Option<usize> {
        nearest_index(self.q.view(), target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_interior_mass_and_q() {
        let mc = MassCoordinate::from_masses(array![1.0, 2.0, 1.0].view()).unwrap();
        assert_eq!(mc.interior_mass().to_vec(), vec![1.0, 3.0, 4.0]);
        assert!((mc.total_mass() - 4.0).abs() < 1e-15);
        assert!((mc.q()[0] - 0.75).abs() < 1e-15);
        assert!((mc.q()[1] - 0.25).abs() < 1e-15);
        assert_eq!(mc.q()[2], 0.0);
    }

    #[test]
    fn test_nearest_lookups() {
        let mc = MassCoordinate::from_masses(array![1.0, 1.0, 1.0, 1.0].view()).unwrap();
        assert_eq!(mc.nearest_to_mass(2.2), Some(1));
        assert_eq!(mc.nearest_to_q(0.5), Some(1));
    }

    #[test]
    fn test_rejects_negative_mass() {
        let err = MassCoordinate::from_masses(array![1.0, -1.0].view()).unwrap_err();
        match err {
            ProfileError::MalformedInput { index, .. } => assert_eq!(index, 1),
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_zero_total() {
        assert!(MassCoordinate::from_masses(array![0.0, 0.0].view()).is_err());
        assert!(MassCoordinate::from_masses(Array1::zeros(0).view()).is_err());
    }
}
