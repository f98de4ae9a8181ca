// ─────────────────────────────────────────────────────────────────────
// Merger Profile — Errors
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use thiserror::Error;

use crate::state::ProfileAxis;

/// Every variant is terminal for a run. Nothing is retried or patched.
#[derive(Error, Debug)]
pub enum ProfileError {
    /// Non-physical or unparsable input value.
    #[error("Malformed input in {stage} at index {index}: {message}")]
    MalformedInput {
        stage: &'static str,
        index: usize,
        message: String,
    },

    /// Columns that must be index-aligned have different lengths.
    #[error("Malformed input in {stage}: column `{column}` has {found} entries, expected {expected}")]
    LengthMismatch {
        stage: &'static str,
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Degenerate {axis} profile: {bins} non-empty bins survived, need at least 2")]
    ProfileDegenerate { axis: ProfileAxis, bins: usize },

    #[error("No bound edge: total energy never turns positive beyond bin {offset} ({scanned} bins scanned)")]
    BoundaryNotFound { scanned: usize, offset: usize },

    #[error("EOS failed at bin {bin}: {message}")]
    EosConvergence { bin: usize, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ProfileResult<T> = Result<T, ProfileError>;

impl ProfileError {
    pub fn malformed(stage: &'static str, index: usize, message: impl Into<String>) -> Self {
        ProfileError::MalformedInput {
            stage,
            index,
            message: message.into(),
        }
    }
}
