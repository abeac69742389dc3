//! # druid-query
//!
//! Typed construction and execution of analytics queries against a
//! Druid-style broker over HTTP/JSON.
//!
//! ## Modules
//!
//! - [`model`]: granularities, dimension specs, extraction functions,
//!   filters, aggregations and post-aggregations
//! - [`query`]: the seven query variants and their result rows
//! - [`client`]: serialize, send and decode
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use druid_query::model::*;
//! use druid_query::query::GroupByQuery;
//! use druid_query::{Config, DruidClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let client = DruidClient::new(config.broker)?;
//!
//!     let query = GroupByQuery::new("events_agg")
//!         .interval("2016-05-01T00:00/2016-05-01T01")
//!         .granularity(Granularity::ALL)
//!         .dimension("attribution_network")
//!         .filter(Filter::and([
//!             Some(Filter::selector("app_id", "42")),
//!             None,
//!         ]))
//!         .aggregation(Aggregation::count("count"));
//!
//!     let results = client.execute(&query.into()).await?;
//!     for row in results.as_group_by().unwrap_or_default() {
//!         println!("{} {:?}", row.timestamp, row.event);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod model;
pub mod query;

// Re-export top-level types for convenience
pub use client::{
    DruidClient, DruidError, DruidResult, Exchange, HttpTransport, Transport, TransportError,
};

pub use config::{BrokerConfig, Config, ConfigError, LoggingConfig};

pub use model::{ModelError, ModelResult};

pub use query::{DecodeError, Query, QueryResults};
