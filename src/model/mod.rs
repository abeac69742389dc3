//! Query value model
//!
//! Immutable building blocks composed into queries:
//!
//! - **Granularity**: time bucketing
//! - **Dimension**: dimension specs, lookups and extraction function chains
//! - **Filter**: boolean filter algebra with absent-entry collapsing
//! - **Aggregation / PostAggregation**: aggregators and server-side expressions
//! - **Dependency**: references a post-aggregation tree needs
//! - **Spec**: limit, having, paging, search, toInclude and topN metric specs
//!
//! Every value serializes to the broker's JSON shape with optional fields
//! omitted.

mod aggregation;
pub mod dependency;
mod dimension;
mod error;
mod filter;
mod granularity;
mod post_aggregation;
mod spec;

pub use aggregation::Aggregation;
pub use dependency::{unresolved_references, Dependency};
pub use dimension::{DimensionSpec, ExtractionFn, LookupSpec, TypedDimension};
pub use error::{ModelError, ModelResult};
pub use filter::{BoundFilter, Filter};
pub use granularity::{BucketGranularity, Granularity, SimpleGranularity};
pub use post_aggregation::{ArithmeticFn, PostAggregation, ThetaFunc};
pub use spec::{
    Direction, Having, LimitSpec, OrderByColumn, PagingSpec, SearchQuerySpec, SearchSort,
    ToInclude, TopNMetric,
};
