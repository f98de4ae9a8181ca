// ─────────────────────────────────────────────────────────────────────
// Merger Profile — Core
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Post-processing of a merger snapshot into 1D stellar profiles.
//!
//! Stage 1: input adapters, binning, mass coordinate
//! Stage 2: binding energy, composition, EOS, core policy
//! Stage 3: stitching and output tables

pub mod assembler;
pub mod binding;
pub mod composition;
pub mod core_policy;
pub mod eos;
pub mod input;
pub mod mass_coord;
pub mod output;
pub mod pipeline;
pub mod stitch;
