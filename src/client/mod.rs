//! Query Dispatcher
//!
//! Sends a [`Query`] to the broker and decodes the answer:
//!
//! 1. serialize the query (pretty-printed in debug mode)
//! 2. one [`Transport`] exchange, no retries
//! 3. [`Query::decode`] into the variant's rows
//!
//! With `debug` enabled the client keeps the last raw request and response,
//! readable through [`DruidClient::last_exchange`].
//!
//! # Example
//!
//! ```rust,no_run
//! use druid_query::client::DruidClient;
//! use druid_query::config::BrokerConfig;
//! use druid_query::model::TopNMetric;
//! use druid_query::query::TopNQuery;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = DruidClient::new(BrokerConfig::default())?;
//!     let query = TopNQuery::new("events_agg", "device_os", TopNMetric::numeric("count"), 10)
//!         .interval("2016-05-01T00:00/2016-05-02T00:00");
//!     let results = client.execute(&query.into()).await?;
//!     println!("{} buckets", results.len());
//!     Ok(())
//! }
//! ```

mod error;
mod transport;

pub use error::{DruidError, DruidResult};
pub use transport::{HttpTransport, Transport, TransportError};

use crate::config::BrokerConfig;
use crate::query::{Query, QueryResults};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Raw request and response text of one exchange
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exchange {
    pub request: String,
    /// Absent when the transport failed
    pub response: Option<String>,
}

/// Broker client
pub struct DruidClient<T = HttpTransport> {
    transport: T,
    config: BrokerConfig,
    last_exchange: Mutex<Option<Exchange>>,
}

impl DruidClient<HttpTransport> {
    /// Client over HTTP using the configured URL and timeout
    pub fn new(config: BrokerConfig) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(config.request_timeout())?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> DruidClient<T> {
    /// Client over a caller-supplied transport
    pub fn with_transport(config: BrokerConfig, transport: T) -> Self {
        Self {
            transport,
            config,
            last_exchange: Mutex::new(None),
        }
    }

    /// Get the current configuration
    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Last raw exchange; only recorded in debug mode
    pub async fn last_exchange(&self) -> Option<Exchange> {
        self.last_exchange.lock().await.clone()
    }

    /// Run one query against the broker
    pub async fn execute(&self, query: &Query) -> DruidResult<QueryResults> {
        let query_type = query.tag();
        let request_id = Uuid::new_v4();

        let body = if self.config.debug {
            serde_json::to_vec_pretty(query)
        } else {
            serde_json::to_vec(query)
        }
        .map_err(|source| DruidError::Encode { query_type, source })?;

        tracing::debug!(
            request_id = %request_id,
            query_type,
            data_source = query.data_source(),
            bytes = body.len(),
            "Sending query to broker"
        );

        let request = self
            .config
            .debug
            .then(|| String::from_utf8_lossy(&body).into_owned());

        let sent = self.transport.send(&self.config.url, body).await;

        // Request and response land in the slot together so overlapping
        // dispatches never mix their halves.
        if let Some(request) = request {
            let response = sent
                .as_ref()
                .ok()
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned());
            *self.last_exchange.lock().await = Some(Exchange { request, response });
        }

        let response = match sent {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    request_id = %request_id,
                    query_type,
                    error = %e,
                    "Broker request failed"
                );
                return Err(e.into());
            }
        };

        let results = query.decode(&response).map_err(|e| {
            tracing::warn!(
                request_id = %request_id,
                query_type,
                bytes = response.len(),
                error = %e,
                "Broker response did not decode"
            );
            e
        })?;

        tracing::debug!(
            request_id = %request_id,
            query_type,
            rows = results.len(),
            "Query complete"
        );

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Aggregation, Filter};
    use crate::query::{GroupByQuery, TimeBoundaryQuery};
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;

    /// Replies with a fixed body, or fails, and records what it was sent
    struct ScriptedTransport {
        reply: Option<&'static str>,
        sent: std::sync::Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl ScriptedTransport {
        fn replying(body: &'static str) -> Self {
            Self {
                reply: Some(body),
                sent: std::sync::Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                sent: std::sync::Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>, TransportError> {
            self.sent.lock().unwrap().push((url.to_string(), body));
            match self.reply {
                Some(reply) => Ok(reply.as_bytes().to_vec()),
                None => Err(TransportError::Unavailable(url.to_string())),
            }
        }
    }

    /// Answers groupBy requests slowly and everything else at once
    struct SlowGroupByTransport;

    #[async_trait]
    impl Transport for SlowGroupByTransport {
        async fn send(&self, _url: &str, body: Vec<u8>) -> Result<Vec<u8>, TransportError> {
            if String::from_utf8_lossy(&body).contains("groupBy") {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok(GROUP_BY_BODY.as_bytes().to_vec())
            } else {
                Ok(b"[]".to_vec())
            }
        }
    }

    fn debug_config() -> BrokerConfig {
        BrokerConfig {
            debug: true,
            ..BrokerConfig::default()
        }
    }

    fn group_by() -> Query {
        GroupByQuery::new("events_agg")
            .interval("2016-05-01T00:00/2016-05-01T01")
            .dimension("attribution_network")
            .filter(Filter::and([Some(Filter::selector("app_id", "42")), None]))
            .aggregation(Aggregation::count("count"))
            .into()
    }

    const GROUP_BY_BODY: &str =
        r#"[{"version":"v1","timestamp":"2016-05-01T00:00:00.000Z","event":{"count":5}}]"#;

    #[tokio::test]
    async fn test_execute_sends_one_request_and_decodes() {
        let client = DruidClient::with_transport(
            BrokerConfig::default(),
            ScriptedTransport::replying(GROUP_BY_BODY),
        );

        let results = client.execute(&group_by()).await.unwrap();
        let rows = results.as_group_by().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].event["count"], json!(5));

        let sent = client.transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "http://localhost:8082/druid/v2");
        let request: serde_json::Value = serde_json::from_slice(&sent[0].1).unwrap();
        assert_eq!(request["queryType"], json!("groupBy"));
        assert_eq!(request["filter"]["type"], json!("selector"));
    }

    #[tokio::test]
    async fn test_debug_records_exchange() {
        let client = DruidClient::with_transport(
            debug_config(),
            ScriptedTransport::replying(GROUP_BY_BODY),
        );
        client.execute(&group_by()).await.unwrap();

        let exchange = client.last_exchange().await.unwrap();
        assert!(exchange.request.contains("\"queryType\": \"groupBy\""));
        assert_eq!(exchange.response.as_deref(), Some(GROUP_BY_BODY));
    }

    #[tokio::test]
    async fn test_no_exchange_recorded_without_debug() {
        let client = DruidClient::with_transport(
            BrokerConfig::default(),
            ScriptedTransport::replying(GROUP_BY_BODY),
        );
        client.execute(&group_by()).await.unwrap();
        assert!(client.last_exchange().await.is_none());
    }

    #[tokio::test]
    async fn test_transport_failure_is_surfaced_without_retry() {
        let client = DruidClient::with_transport(debug_config(), ScriptedTransport::failing());

        let err = client.execute(&group_by()).await.unwrap_err();
        assert!(matches!(err, DruidError::Transport(TransportError::Unavailable(_))));
        assert_eq!(client.transport.sent.lock().unwrap().len(), 1);

        let exchange = client.last_exchange().await.unwrap();
        assert!(!exchange.request.is_empty());
        assert!(exchange.response.is_none());
    }

    #[tokio::test]
    async fn test_mismatched_body_is_decode_error() {
        // A groupBy-shaped body does not satisfy a timeBoundary query.
        let client = DruidClient::with_transport(
            BrokerConfig::default(),
            ScriptedTransport::replying(GROUP_BY_BODY),
        );
        let query: Query = TimeBoundaryQuery::new("events_agg").into();

        match client.execute(&query).await {
            Err(DruidError::Decode(e)) => assert_eq!(e.query_type, "timeBoundary"),
            other => panic!("Expected decode error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_each_dispatch_replaces_previous_exchange() {
        let client = DruidClient::with_transport(debug_config(), ScriptedTransport::replying("[]"));

        client.execute(&group_by()).await.unwrap();
        let boundary: Query = TimeBoundaryQuery::new("other").into();
        let results = client.execute(&boundary).await.unwrap();
        assert!(results.is_empty());

        let exchange = client.last_exchange().await.unwrap();
        assert!(exchange.request.contains("timeBoundary"));
        assert!(!exchange.request.contains("groupBy"));
    }

    #[tokio::test]
    async fn test_overlapping_dispatches_keep_exchange_paired() {
        let client = DruidClient::with_transport(debug_config(), SlowGroupByTransport);
        let slow = group_by();
        let fast: Query = TimeBoundaryQuery::new("events_agg").into();

        let (slow_result, fast_result) = tokio::join!(client.execute(&slow), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            client.execute(&fast).await
        });
        assert_eq!(slow_result.unwrap().len(), 1);
        assert!(fast_result.unwrap().is_empty());

        // The groupBy finishes last, so its whole exchange is the one kept.
        let exchange = client.last_exchange().await.unwrap();
        assert!(exchange.request.contains("groupBy"));
        assert!(!exchange.request.contains("timeBoundary"));
        assert_eq!(exchange.response.as_deref(), Some(GROUP_BY_BODY));
    }
}
