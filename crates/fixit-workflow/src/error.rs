//! Error types for workflow loading.

/// Errors raised while loading or serializing a workflow document.
///
/// Structural problems inside a parsed document are not errors; they are
/// reported as [`crate::WorkflowIssue`]s by [`crate::check_workflow`].
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("failed to read workflow {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse workflow {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize workflow: {0}")]
    Serialize(#[from] serde_json::Error),
}
