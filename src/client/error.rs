//! Client error types

use super::transport::TransportError;
use crate::query::DecodeError;
use thiserror::Error;

/// Errors returned by [`DruidClient::execute`](super::DruidClient::execute)
#[derive(Error, Debug)]
pub enum DruidError {
    /// The exchange with the broker failed; nothing was decoded
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The query could not be serialized
    #[error("Failed to encode {query_type} request: {source}")]
    Encode {
        query_type: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The broker answered with a body that does not fit the query's rows
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Result type for client operations
pub type DruidResult<T> = Result<T, DruidError>;
