// ─────────────────────────────────────────────────────────────────────
// Merger Profile — Entropy Stitch
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Core/envelope entropy stitching.
//!
//! The merger resolves the envelope well but not the degenerate core. The
//! stitched profile takes a 1D stellar model inside `q_transition` and the
//! merger profile outside it.

use std::path::Path;

use log::info;
use merger_math::interp::nearest_index;
use merger_types::error::{ProfileError, ProfileResult};
use ndarray::{Array1, ArrayView1};

use crate::output::Table;

/// `(q, s)` pairs ordered innermost first (q decreasing).
#[derive(Debug, Clone, PartialEq)]
pub struct EntropyProfile {
    q: Array1<f64>,
    entropy: Array1<f64>,
}

impl EntropyProfile {
    pub fn new(q: Array1<f64>, entropy: Array1<f64>) -> ProfileResult<Self> {
        if q.len() != entropy.len() {
            return Err(ProfileError::LengthMismatch {
                stage: "entropy profile",
                column: "entropy".to_string(),
                expected: q.len(),
                found: entropy.len(),
            });
        }
        if q.is_empty() {
            return Err(ProfileError::malformed(
                "entropy profile",
                0,
                "profile has no points",
            ));
        }
        Ok(EntropyProfile { q, entropy })
    }

    /// Read a two-column `(q, s)` table in any row order.
    pub fn from_table_file<P: AsRef<Path>>(path: P) -> ProfileResult<Self> {
        let table = Table::read_file(path)?;
        Self::from_table(&table)
    }

    pub fn from_table(table: &Table) -> ProfileResult<Self> {
        if table.rows().ncols() < 2 {
            return Err(ProfileError::malformed(
                "entropy profile",
                0,
                format!("need (q, s) columns, got {}", table.rows().ncols()),
            ));
        }
        let mut pairs: Vec<(f64, f64)> = table
            .column(0)
            .iter()
            .zip(table.column(1).iter())
            .map(|(&q, &s)| (q, s))
            .collect();
        if let Some(i) = pairs.iter().position(|(q, s)| !q.is_finite() || !s.is_finite()) {
            return Err(ProfileError::malformed(
                "entropy profile",
                i,
                "non-finite (q, s) pair",
            ));
        }
        pairs.sort_by(|a, b| b.0.total_cmp(&a.0));
        let (q, s): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
        Self::new(Array1::from(q), Array1::from(s))
    }

    pub fn len(&self) -> usize {
        self.q.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }

    pub fn q(&self) -> ArrayView1<'_, f64> {
        self.q.view()
    }

    pub fn entropy(&self) -> ArrayView1<'_, f64> {
        self.entropy.view()
    }
}

/// Splice `core` (1D model) and `envelope` (merger) at `q_transition`.
///
/// Keeps every core point from the centre out to the core point nearest the
/// seam, then every envelope point strictly outside the envelope point
/// nearest the seam.
pub fn stitch_entropy(
    core: &EntropyProfile,
    envelope: &EntropyProfile,
    q_transition: f64,
) -> ProfileResult<EntropyProfile> {
    if !(0.0..=1.0).contains(&q_transition) {
        return Err(ProfileError::ConfigError(format!(
            "q_transition must lie in [0, 1], got {q_transition}"
        )));
    }
    let i_core = nearest_index(core.q(), q_transition).unwrap_or(0);
    let i_env = nearest_index(envelope.q(), q_transition).unwrap_or(0);

    let mut q = Vec::with_capacity(i_core + 1 + envelope.len());
    let mut s = Vec::with_capacity(q.capacity());
    q.extend(core.q().iter().take(i_core + 1));
    s.extend(core.entropy().iter().take(i_core + 1));
    q.extend(envelope.q().iter().skip(i_env + 1));
    s.extend(envelope.entropy().iter().skip(i_env + 1));

    info!(
        "stitched entropy at q = {q_transition}: {} core + {} envelope points",
        i_core + 1,
        envelope.len().saturating_sub(i_env + 1)
    );
    EntropyProfile::new(Array1::from(q), Array1::from(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_stitch_splices_at_transition() {
        let core = EntropyProfile::new(
            array![1.0, 0.8, 0.6, 0.4, 0.2, 0.0],
            array![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        )
        .unwrap();
        let env = EntropyProfile::new(
            array![0.95, 0.7, 0.5, 0.3, 0.1],
            array![10.0, 20.0, 30.0, 40.0, 50.0],
        )
        .unwrap();
        let out = stitch_entropy(&core, &env, 0.52).unwrap();
        // core point nearest the seam is 0.6, envelope point nearest is 0.5
        assert_eq!(out.q().to_vec(), vec![1.0, 0.8, 0.6, 0.3, 0.1]);
        assert_eq!(out.entropy().to_vec(), vec![1.0, 2.0, 3.0, 40.0, 50.0]);
    }

    #[test]
    fn test_from_table_sorts_innermost_first() {
        // Surface-first file order, as written by the table writer
        let table = Table::new(vec![3], array![[0.0, 9.0], [0.5, 5.0], [1.0, 1.0]]).unwrap();
        let p = EntropyProfile::from_table(&table).unwrap();
        assert_eq!(p.q().to_vec(), vec![1.0, 0.5, 0.0]);
        assert_eq!(p.entropy().to_vec(), vec![1.0, 5.0, 9.0]);
    }

    #[test]
    fn test_rejects_bad_transition() {
        let p = EntropyProfile::new(array![1.0, 0.0], array![1.0, 2.0]).unwrap();
        assert!(matches!(
            stitch_entropy(&p, &p, 1.5),
            Err(ProfileError::ConfigError(_))
        ));
    }
}
