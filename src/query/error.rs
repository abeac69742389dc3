//! Query error types

use thiserror::Error;

/// A response body did not match the row shape of the query that produced it.
///
/// Decoding is all-or-nothing: no rows are returned alongside this error.
#[derive(Error, Debug)]
#[error("Failed to decode {query_type} response: {source}")]
pub struct DecodeError {
    /// Discriminant of the query whose response failed to decode
    pub query_type: &'static str,
    #[source]
    pub source: serde_json::Error,
}
