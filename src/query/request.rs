//! Query request types
//!
//! One record per query variant. The `queryType` discriminant is not a field
//! of these records: it is written by [`Query`](super::Query) serialization
//! from the variant itself.

use crate::model::{
    Aggregation, DimensionSpec, Filter, Granularity, Having, LimitSpec, PagingSpec,
    PostAggregation, SearchQuerySpec, SearchSort, ToInclude, TopNMetric,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Free-form query context (`timeout`, `priority`, `queryId`, ...)
pub type Context = BTreeMap<String, Value>;

/// Format a half-open interval literal `start/end` with millisecond precision
pub fn interval(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format!(
        "{}/{}",
        start.to_rfc3339_opts(SecondsFormat::Millis, true),
        end.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

// Builder methods shared by several variants. Each expands inside an `impl`
// block of a struct that has the named fields.

macro_rules! interval_methods {
    () => {
        /// Add an interval literal such as `"2016-05-01T00:00/2016-05-01T01"`
        pub fn interval(mut self, interval: impl Into<String>) -> Self {
            self.intervals.push(interval.into());
            self
        }

        /// Add the interval `[start, end)`
        pub fn between(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
            self.intervals.push(interval(start, end));
            self
        }
    };
}

macro_rules! filter_methods {
    () => {
        /// Set the filter; `None` (e.g. from an all-absent `Filter::and`) clears it
        pub fn filter(mut self, filter: impl Into<Option<Filter>>) -> Self {
            self.filter = filter.into();
            self
        }
    };
}

macro_rules! granularity_methods {
    () => {
        pub fn granularity(mut self, granularity: Granularity) -> Self {
            self.granularity = granularity;
            self
        }
    };
}

macro_rules! aggregation_methods {
    () => {
        pub fn aggregation(mut self, aggregation: Aggregation) -> Self {
            self.aggregations.push(aggregation);
            self
        }

        pub fn post_aggregation(mut self, post_aggregation: PostAggregation) -> Self {
            self.post_aggregations.push(post_aggregation);
            self
        }
    };
}

macro_rules! context_methods {
    () => {
        pub fn context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
            self.context.insert(key.into(), value.into());
            self
        }
    };
}

// ============================================
// GroupBy
// ============================================

/// Aggregate rows grouped by a set of dimensions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupByQuery {
    pub data_source: String,
    pub dimensions: Vec<DimensionSpec>,
    pub granularity: Granularity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_spec: Option<LimitSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub having: Option<Having>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    pub aggregations: Vec<Aggregation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_aggregations: Vec<PostAggregation>,
    pub intervals: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: Context,
}

impl GroupByQuery {
    pub fn new(data_source: impl Into<String>) -> Self {
        Self {
            data_source: data_source.into(),
            ..Self::default()
        }
    }

    pub fn dimension(mut self, dimension: impl Into<DimensionSpec>) -> Self {
        self.dimensions.push(dimension.into());
        self
    }

    pub fn limit_spec(mut self, limit_spec: LimitSpec) -> Self {
        self.limit_spec = Some(limit_spec);
        self
    }

    pub fn having(mut self, having: impl Into<Option<Having>>) -> Self {
        self.having = having.into();
        self
    }

    interval_methods!();
    filter_methods!();
    granularity_methods!();
    aggregation_methods!();
    context_methods!();
}

// ============================================
// Search
// ============================================

/// Find dimension values matching a search spec
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub data_source: String,
    pub granularity: Granularity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    pub intervals: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_dimensions: Vec<String>,
    pub query: SearchQuerySpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SearchSort>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: Context,
}

impl SearchQuery {
    pub fn new(data_source: impl Into<String>, query: SearchQuerySpec) -> Self {
        Self {
            data_source: data_source.into(),
            granularity: Granularity::default(),
            filter: None,
            limit: None,
            intervals: Vec::new(),
            search_dimensions: Vec::new(),
            query,
            sort: None,
            context: Context::new(),
        }
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn search_dimension(mut self, dimension: impl Into<String>) -> Self {
        self.search_dimensions.push(dimension.into());
        self
    }

    pub fn sort(mut self, sort: SearchSort) -> Self {
        self.sort = Some(sort);
        self
    }

    interval_methods!();
    filter_methods!();
    granularity_methods!();
    context_methods!();
}

// ============================================
// SegmentMetadata
// ============================================

/// Column analyses a segmentMetadata query can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnalysisType {
    Cardinality,
    Size,
    Interval,
    Aggregators,
    MinMax,
    TimestampSpec,
    QueryGranularity,
    Rollup,
}

/// Describe the segments of a data source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentMetadataQuery {
    pub data_source: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub intervals: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_include: Option<ToInclude>,
    /// Merge all segments into a single result row
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge: Option<bool>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: Context,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub analysis_types: Vec<AnalysisType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lenient_aggregator_merge: Option<bool>,
}

impl SegmentMetadataQuery {
    pub fn new(data_source: impl Into<String>) -> Self {
        Self {
            data_source: data_source.into(),
            ..Self::default()
        }
    }

    pub fn to_include(mut self, to_include: ToInclude) -> Self {
        self.to_include = Some(to_include);
        self
    }

    pub fn merge(mut self, merge: bool) -> Self {
        self.merge = Some(merge);
        self
    }

    pub fn analysis_type(mut self, analysis_type: AnalysisType) -> Self {
        self.analysis_types.push(analysis_type);
        self
    }

    pub fn lenient_aggregator_merge(mut self, lenient: bool) -> Self {
        self.lenient_aggregator_merge = Some(lenient);
        self
    }

    interval_methods!();
    context_methods!();
}

// ============================================
// Select
// ============================================

/// Page through raw rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectQuery {
    pub data_source: String,
    pub intervals: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub descending: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dimensions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metrics: Vec<String>,
    pub paging_spec: PagingSpec,
    pub granularity: Granularity,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: Context,
}

impl SelectQuery {
    pub fn new(data_source: impl Into<String>, paging_spec: PagingSpec) -> Self {
        Self {
            data_source: data_source.into(),
            paging_spec,
            ..Self::default()
        }
    }

    pub fn descending(mut self, descending: bool) -> Self {
        self.descending = descending;
        self
    }

    pub fn dimension(mut self, dimension: impl Into<String>) -> Self {
        self.dimensions.push(dimension.into());
        self
    }

    pub fn metric(mut self, metric: impl Into<String>) -> Self {
        self.metrics.push(metric.into());
        self
    }

    /// Same query, asking for the page described by `paging_spec`
    pub fn with_paging(&self, paging_spec: PagingSpec) -> Self {
        Self {
            paging_spec,
            ..self.clone()
        }
    }

    interval_methods!();
    filter_methods!();
    granularity_methods!();
    context_methods!();
}

// ============================================
// TimeBoundary
// ============================================

/// Which end of the data a timeBoundary query reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Bound {
    MinTime,
    MaxTime,
}

/// Earliest and latest timestamps of a data source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBoundaryQuery {
    pub data_source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bound: Option<Bound>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: Context,
}

impl TimeBoundaryQuery {
    pub fn new(data_source: impl Into<String>) -> Self {
        Self {
            data_source: data_source.into(),
            ..Self::default()
        }
    }

    pub fn bound(mut self, bound: Bound) -> Self {
        self.bound = Some(bound);
        self
    }

    filter_methods!();
    context_methods!();
}

// ============================================
// Timeseries
// ============================================

/// Aggregate rows per time bucket
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeseriesQuery {
    pub data_source: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub descending: bool,
    pub intervals: Vec<String>,
    pub granularity: Granularity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    pub aggregations: Vec<Aggregation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_aggregations: Vec<PostAggregation>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: Context,
}

impl TimeseriesQuery {
    pub fn new(data_source: impl Into<String>) -> Self {
        Self {
            data_source: data_source.into(),
            ..Self::default()
        }
    }

    pub fn descending(mut self, descending: bool) -> Self {
        self.descending = descending;
        self
    }

    interval_methods!();
    filter_methods!();
    granularity_methods!();
    aggregation_methods!();
    context_methods!();
}

// ============================================
// TopN
// ============================================

/// Top values of one dimension ranked by a metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopNQuery {
    pub data_source: String,
    pub granularity: Granularity,
    pub dimension: DimensionSpec,
    pub threshold: u32,
    pub metric: TopNMetric,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    pub aggregations: Vec<Aggregation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_aggregations: Vec<PostAggregation>,
    pub intervals: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: Context,
}

impl TopNQuery {
    pub fn new(
        data_source: impl Into<String>,
        dimension: impl Into<DimensionSpec>,
        metric: TopNMetric,
        threshold: u32,
    ) -> Self {
        Self {
            data_source: data_source.into(),
            granularity: Granularity::default(),
            dimension: dimension.into(),
            threshold,
            metric,
            filter: None,
            aggregations: Vec::new(),
            post_aggregations: Vec::new(),
            intervals: Vec::new(),
            context: Context::new(),
        }
    }

    interval_methods!();
    filter_methods!();
    granularity_methods!();
    aggregation_methods!();
    context_methods!();
}
