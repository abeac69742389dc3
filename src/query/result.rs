//! Query result rows
//!
//! Each query variant decodes into its own row type. Field names follow the
//! broker's response shape; extra fields in a response are ignored.

use crate::model::PagingSpec;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Flat map of output name to value
pub type Event = Map<String, Value>;

/// One groupBy result row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupByRow {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub event: Event,
}

/// One search result bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRow {
    pub timestamp: DateTime<Utc>,
    pub result: Vec<SearchHit>,
}

/// A matching dimension value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub dimension: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

/// Analysis of one segment (or of all segments, when merged)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentMetadataRow {
    pub id: String,
    #[serde(default)]
    pub intervals: Option<Vec<String>>,
    pub columns: BTreeMap<String, ColumnAnalysis>,
    #[serde(default)]
    pub aggregators: Option<BTreeMap<String, AggregatorInfo>>,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub num_rows: i64,
}

/// Per-column analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnAnalysis {
    #[serde(rename = "type")]
    pub column_type: String,
    #[serde(default)]
    pub has_multiple_values: bool,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub cardinality: Option<u64>,
    #[serde(default)]
    pub min_value: Option<Value>,
    #[serde(default)]
    pub max_value: Option<Value>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Aggregator a segment was ingested with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatorInfo {
    #[serde(rename = "type")]
    pub aggregator_type: String,
    pub name: String,
    #[serde(default)]
    pub field_name: Option<String>,
}

/// One page of select results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectRow {
    pub timestamp: DateTime<Utc>,
    pub result: SelectResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectResult {
    pub paging_identifiers: BTreeMap<String, i64>,
    pub events: Vec<SelectEvent>,
}

/// A raw row with its position in the segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectEvent {
    pub segment_id: String,
    pub offset: i64,
    pub event: Event,
}

impl SelectRow {
    /// Paging spec requesting the page after this one
    pub fn next_paging_spec(&self, threshold: u32) -> PagingSpec {
        PagingSpec {
            paging_identifiers: self.result.paging_identifiers.clone(),
            threshold,
            from_next: Some(true),
        }
    }
}

/// Time boundary result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeBoundaryRow {
    pub timestamp: DateTime<Utc>,
    pub result: TimeBoundary,
}

/// Either side is absent when the query asked for only one bound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBoundary {
    #[serde(default)]
    pub min_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_time: Option<DateTime<Utc>>,
}

/// One timeseries bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesRow {
    pub timestamp: DateTime<Utc>,
    pub result: Event,
}

/// One topN bucket, ranked entries in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopNRow {
    pub timestamp: DateTime<Utc>,
    pub result: Vec<Event>,
}

/// Decoded response of a dispatched query, one variant per query type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResults {
    GroupBy(Vec<GroupByRow>),
    Search(Vec<SearchRow>),
    SegmentMetadata(Vec<SegmentMetadataRow>),
    Select(Vec<SelectRow>),
    TimeBoundary(Vec<TimeBoundaryRow>),
    Timeseries(Vec<TimeseriesRow>),
    TopN(Vec<TopNRow>),
}

impl QueryResults {
    /// Number of decoded rows
    pub fn len(&self) -> usize {
        match self {
            QueryResults::GroupBy(rows) => rows.len(),
            QueryResults::Search(rows) => rows.len(),
            QueryResults::SegmentMetadata(rows) => rows.len(),
            QueryResults::Select(rows) => rows.len(),
            QueryResults::TimeBoundary(rows) => rows.len(),
            QueryResults::Timeseries(rows) => rows.len(),
            QueryResults::TopN(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_group_by(&self) -> Option<&[GroupByRow]> {
        match self {
            QueryResults::GroupBy(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn as_search(&self) -> Option<&[SearchRow]> {
        match self {
            QueryResults::Search(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn as_segment_metadata(&self) -> Option<&[SegmentMetadataRow]> {
        match self {
            QueryResults::SegmentMetadata(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn as_select(&self) -> Option<&[SelectRow]> {
        match self {
            QueryResults::Select(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn as_time_boundary(&self) -> Option<&[TimeBoundaryRow]> {
        match self {
            QueryResults::TimeBoundary(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn as_timeseries(&self) -> Option<&[TimeseriesRow]> {
        match self {
            QueryResults::Timeseries(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn as_top_n(&self) -> Option<&[TopNRow]> {
        match self {
            QueryResults::TopN(rows) => Some(rows),
            _ => None,
        }
    }
}
