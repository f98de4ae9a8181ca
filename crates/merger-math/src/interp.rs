// ─────────────────────────────────────────────────────────────────────
// Merger Profile — Interp
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! 1D interpolation and index search helpers.

use ndarray::ArrayView1;

/// Piecewise-linear interpolation of `(xp, fp)` at `x`.
///
/// `xp` may be increasing or decreasing. Clamps to the end values outside
/// the sampled range, like `numpy.interp`.
pub fn interp1d(xp: ArrayView1<'_, f64>, fp: ArrayView1<'_, f64>, x: f64) -> f64 {
    let n = xp.len().min(fp.len());
    if n == 0 {
        return f64::NAN;
    }
    if n == 1 {
        return fp[0];
    }
    let increasing = xp[n - 1] >= xp[0];
    let (lo, hi) = if increasing { (0, n - 1) } else { (n - 1, 0) };
    if x <= xp[lo] {
        return fp[lo];
    }
    if x >= xp[hi] {
        return fp[hi];
    }
    for i in 0..n - 1 {
        let (a, b) = (xp[i], xp[i + 1]);
        let inside = if increasing {
            x >= a && x <= b
        } else {
            x <= a && x >= b
        };
        if inside {
            if b == a {
                return fp[i];
            }
            let t = (x - a) / (b - a);
            return (1.0 - t) * fp[i] + t * fp[i + 1];
        }
    }
    fp[hi]
}

/// Index of the entry closest to `target` (first one on ties).
pub fn nearest_index(values: ArrayView1<'_, f64>, target: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        let d = (v - target).abs();
        match best {
            Some((_, bd)) if d >= bd => {}
            _ => best = Some((i, d)),
        }
    }
    best.map(|(i, _)| i)
}

/// Index of the largest entry (first one on ties).
pub fn argmax(values: ArrayView1<'_, f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, bv)) if v <= bv => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_interp_increasing() {
        let xp = array![0.0, 1.0, 3.0];
        let fp = array![0.0, 10.0, 30.0];
        assert!((interp1d(xp.view(), fp.view(), 0.5) - 5.0).abs() < 1e-12);
        assert!((interp1d(xp.view(), fp.view(), 2.0) - 20.0).abs() < 1e-12);
        assert_eq!(interp1d(xp.view(), fp.view(), -1.0), 0.0);
        assert_eq!(interp1d(xp.view(), fp.view(), 9.0), 30.0);
    }

    #[test]
    fn test_interp_decreasing() {
        // q runs from 1 at the centre to 0 at the surface
        let q = array![1.0, 0.5, 0.0];
        let t = array![100.0, 50.0, 0.0];
        assert!((interp1d(q.view(), t.view(), 0.75) - 75.0).abs() < 1e-12);
        assert_eq!(interp1d(q.view(), t.view(), 2.0), 100.0);
    }

    #[test]
    fn test_nearest_and_argmax() {
        let v = array![0.1, 0.4, 0.9, 0.4];
        assert_eq!(nearest_index(v.view(), 0.5), Some(1));
        assert_eq!(argmax(v.view()), Some(2));
        let empty = ndarray::Array1::<f64>::zeros(0);
        assert_eq!(argmax(empty.view()), None);
        assert_eq!(nearest_index(empty.view(), 1.0), None);
    }
}
