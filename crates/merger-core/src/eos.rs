// ─────────────────────────────────────────────────────────────────────
// Merger Profile — Equation of State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Equation-of-state seam.
//!
//! The profile pipeline treats the EOS as an opaque, vectorised call from
//! (density, internal energy density, abar, zbar) to (temperature, entropy,
//! pressure). Production runs plug in a tabulated stellar EOS; [`IdealGasEos`]
//! is a fully ionised ideal gas for tests and quick looks.

use std::f64::consts::PI;

use merger_types::constants::{C_LIGHT, H_PLANCK, K_BOLTZMANN, MU_E, M_ELECTRON, M_PROTON};
use merger_types::error::{ProfileError, ProfileResult};
use ndarray::{Array1, ArrayView1};

/// Per-bin EOS inputs, all index-aligned.
#[derive(Debug, Clone, Copy)]
pub struct EosInput<'a> {
    pub density: ArrayView1<'a, f64>,        // [g/cm³]
    pub energy_density: ArrayView1<'a, f64>, // rho * eint [erg/cm³]
    pub abar: ArrayView1<'a, f64>,
    pub zbar: ArrayView1<'a, f64>,
}

impl EosInput<'_> {
    pub fn len(&self) -> usize {
        self.density.len()
    }

    pub fn is_empty(&self) -> bool {
        self.density.is_empty()
    }

    /// All columns must share the density column's length.
    pub fn check_aligned(&self) -> ProfileResult<()> {
        let n = self.density.len();
        for (column, found) in [
            ("energy_density", self.energy_density.len()),
            ("abar", self.abar.len()),
            ("zbar", self.zbar.len()),
        ] {
            if found != n {
                return Err(ProfileError::LengthMismatch {
                    stage: "eos",
                    column: column.to_string(),
                    expected: n,
                    found,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct EosOutput {
    pub temperature: Array1<f64>, // [K]
    pub entropy: Array1<f64>,     // [erg/g/K]
    pub pressure: Array1<f64>,    // [erg/cm³]
}

/// Density–energy inversion over a whole profile.
///
/// Implementations must be pure: the same input always yields the same
/// output, and a failure in any bin fails the call.
pub trait EquationOfState: Sync {
    fn name(&self) -> &str;

    fn evaluate(&self, input: &EosInput<'_>) -> ProfileResult<EosOutput>;
}

/// Fully ionised, non-degenerate ideal gas.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdealGasEos;

impl IdealGasEos {
    /// Sackur–Tetrode entropy of one species per unit volume.
    fn species_entropy(n: f64, mass: f64, temperature: f64) -> f64 {
        let thermal =
            (2.0 * PI * mass * K_BOLTZMANN * temperature / (H_PLANCK * H_PLANCK)).powf(1.5);
        n * K_BOLTZMANN * ((thermal / n).ln() + 2.5)
    }
}

impl EquationOfState for IdealGasEos {
    fn name(&self) -> &str {
        "ideal_gas"
    }

    fn evaluate(&self, input: &EosInput<'_>) -> ProfileResult<EosOutput> {
        input.check_aligned()?;
        let n = input.len();
        let mut temperature = Array1::zeros(n);
        let mut entropy = Array1::zeros(n);
        let mut pressure = Array1::zeros(n);

        for i in 0..n {
            let rho = input.density[i];
            let e = input.energy_density[i];
            let (abar, zbar) = (input.abar[i], input.zbar[i]);
            if !(rho > 0.0 && e > 0.0 && abar > 0.0 && zbar > 0.0) {
                return Err(ProfileError::EosConvergence {
                    bin: i,
                    message: format!(
                        "ideal gas needs positive inputs, got rho={rho:e} e={e:e} abar={abar} zbar={zbar}"
                    ),
                });
            }
            let n_ion = rho / (abar * M_PROTON);
            let n_e = zbar * n_ion;
            let n_tot = n_ion + n_e;
            let t = 2.0 * e / (3.0 * n_tot * K_BOLTZMANN);
            let s = (Self::species_entropy(n_ion, abar * M_PROTON, t)
                + Self::species_entropy(n_e, M_ELECTRON, t))
                / rho;
            if !(t.is_finite() && s.is_finite()) {
                return Err(ProfileError::EosConvergence {
                    bin: i,
                    message: format!("non-finite state T={t:e} s={s:e}"),
                });
            }
            temperature[i] = t;
            entropy[i] = s;
            pressure[i] = 2.0 * e / 3.0;
        }

        Ok(EosOutput {
            temperature,
            entropy,
            pressure,
        })
    }
}

/// Kinetic energy density [erg/cm³] of a zero-temperature, arbitrarily
/// relativistic electron gas at density `rho`.
///
/// With `x = p_F / (m_e c) = (rho / B)^(1/3)`:
/// `E = A [8x³(√(1+x²) - 1) - x(2x² - 3)√(1+x²) - 3 asinh x]`.
pub fn degenerate_electron_energy(rho: f64) -> f64 {
    if rho <= 0.0 {
        return 0.0;
    }
    let a = PI * M_ELECTRON.powi(4) * C_LIGHT.powi(5) / (3.0 * H_PLANCK.powi(3));
    let b = 8.0 * PI * M_PROTON * MU_E * (M_ELECTRON * C_LIGHT / H_PLANCK).powi(3) / 3.0;
    let x = (rho / b).cbrt();
    if x < 1.0e-2 {
        // Closed form cancels to O(x⁵); use the series
        let x2 = x * x;
        return a * x2 * x2 * x * (12.0 / 5.0 - x2 * (3.0 / 7.0 - x2 / 6.0));
    }
    let root = (1.0 + x * x).sqrt();
    a * (8.0 * x.powi(3) * (root - 1.0) - x * (2.0 * x * x - 3.0) * root - 3.0 * x.asinh())
}
