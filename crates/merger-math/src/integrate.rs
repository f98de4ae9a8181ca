// ─────────────────────────────────────────────────────────────────────
// Merger Profile — Integrate
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Trapezoid quadrature on non-uniform abscissae.

use ndarray::{Array1, ArrayView1};

/// Trapezoid rule `∫ y dx` over the sample points, like `numpy.trapz(y, x)`.
///
/// Fewer than two points integrate to zero.
pub fn trapz(y: ArrayView1<'_, f64>, x: ArrayView1<'_, f64>) -> f64 {
    let n = y.len().min(x.len());
    let mut acc = 0.0;
    for i in 1..n {
        acc += 0.5 * (y[i] + y[i - 1]) * (x[i] - x[i - 1]);
    }
    acc
}

/// Suffix integrals: `out[n] = trapz(y[n..], x[n..])`.
///
/// Built right-to-left in one pass, so `out[last] == 0`.
pub fn suffix_trapz(y: ArrayView1<'_, f64>, x: ArrayView1<'_, f64>) -> Array1<f64> {
    let n = y.len().min(x.len());
    let mut out = Array1::zeros(n);
    for i in (0..n.saturating_sub(1)).rev() {
        out[i] = out[i + 1] + 0.5 * (y[i] + y[i + 1]) * (x[i + 1] - x[i]);
    }
    out
}
