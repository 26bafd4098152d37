//! Error types for field reconciliation.

use crate::validate::REQUIRED_FIELD_MESSAGE;

/// Errors surfaced by the field layer.
///
/// `Required` is the only domain error. Malformed record values, stale keys
/// and unparseable lookup ids never raise; they degrade to an empty or
/// best-effort selection instead.
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    /// A required field has an empty selection.
    #[error("{}", REQUIRED_FIELD_MESSAGE)]
    Required,

    /// A scenario file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A scenario file is not valid JSON for the expected shape.
    #[error("failed to parse {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FieldError {
    /// Whether this error is the user-facing required-field failure.
    pub fn is_required(&self) -> bool {
        matches!(self, Self::Required)
    }
}
