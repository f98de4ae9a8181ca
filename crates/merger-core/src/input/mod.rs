// ─────────────────────────────────────────────────────────────────────
// Merger Profile — Input Adapters
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Adapters that turn simulation output into a centred [`CellDataset`].
//!
//! [`CellDataset`]: merger_types::state::CellDataset

pub mod dump;
pub mod mesh;
