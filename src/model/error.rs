//! Model error types
//!
//! Errors raised while building query values or walking post-aggregation trees.

use thiserror::Error;

/// Errors that can occur while constructing or inspecting query values
#[derive(Error, Debug)]
pub enum ModelError {
    /// A caller-supplied raw JSON fragment did not parse into the expected shape
    #[error("Invalid {kind} fragment: {source}")]
    InvalidFragment {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A leaf post-aggregation was resolved without a parent name
    #[error("{kind} '{field}' has no parent post-aggregation to attach to")]
    MissingParent { kind: &'static str, field: String },
}

impl ModelError {
    pub(crate) fn fragment(kind: &'static str) -> impl FnOnce(serde_json::Error) -> Self {
        move |source| ModelError::InvalidFragment { kind, source }
    }
}

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;
