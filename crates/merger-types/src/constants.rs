// ─────────────────────────────────────────────────────────────────────
// Merger Profile — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Physical constants in cgs units.

/// Gravitational constant (cm³ g⁻¹ s⁻²).
/// Matches the value the merger runs were rescaled with, not CODATA.
pub const G_CGS: f64 = 6.67e-8;

/// Solar mass (g)
pub const M_SUN: f64 = 1.99e33;

/// Solar mass used by the white-dwarf time rescaling (g)
pub const M_SUN_RESCALE: f64 = 1.988e33;

/// Boltzmann constant (erg/K)
pub const K_BOLTZMANN: f64 = 1.3807e-16;

/// Atomic mass unit, taken as the proton mass (g)
pub const M_PROTON: f64 = 1.6726e-24;

/// Electron mass (g)
pub const M_ELECTRON: f64 = 9.1094e-28;

/// Planck constant (erg s)
pub const H_PLANCK: f64 = 6.626e-27;

/// Speed of light (cm/s)
pub const C_LIGHT: f64 = 2.99792458e10;

/// Mean molecular weight per electron of the degenerate component
pub const MU_E: f64 = 2.0;

/// Mesh internal energy `egas - ek - edeg` below this fraction of `egas` is
/// rejected in favour of `tau^(5/3)`.
pub const EINT_MIN_FRACTION: f64 = 1.0e-3;

/// Adiabatic index of the `tau` entropy tracer: e_int = tau^(5/3).
pub const TAU_EXPONENT: f64 = 5.0 / 3.0;
