//! Broker transport
//!
//! The dispatcher only needs "send these bytes to this URL, give me the
//! response bytes". [`HttpTransport`] does that with a single reqwest POST;
//! tests substitute their own [`Transport`].

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// One request/response exchange with the broker
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `body` to `url` and return the response body
    async fn send(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>, TransportError>;
}

/// Errors raised while talking to the broker
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Broker unavailable at {0}")]
    Unavailable(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Broker returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// HTTP transport: one POST per exchange, no retries
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a transport. Without a timeout, a request waits as long as the broker takes.
    pub fn new(timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| classify(e, url))?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| classify(e, url))?;

        if status.is_success() {
            Ok(bytes.to_vec())
        } else {
            Err(TransportError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            })
        }
    }
}

fn classify(error: reqwest::Error, url: &str) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_connect() {
        TransportError::Unavailable(url.to_string())
    } else {
        TransportError::Request(error)
    }
}
