//! Auxiliary query specs
//!
//! Small structural specs shared by several query variants: result limiting,
//! having clauses, select paging, search matching, segment column selection,
//! topN ordering and search result ordering.

use super::filter::collapse;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================
// Limit spec
// ============================================

/// Ordering and truncation applied to groupBy results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum LimitSpec {
    Default {
        limit: u32,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        columns: Vec<OrderByColumn>,
    },
}

impl LimitSpec {
    /// Keep the first `limit` rows after ordering by `columns`
    pub fn default_limit(limit: u32, columns: impl IntoIterator<Item = OrderByColumn>) -> Self {
        LimitSpec::Default {
            limit,
            columns: columns.into_iter().collect(),
        }
    }
}

/// Column ordering entry of a limit spec
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderByColumn {
    pub dimension: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
}

impl OrderByColumn {
    pub fn new(dimension: impl Into<String>) -> Self {
        Self {
            dimension: dimension.into(),
            direction: None,
        }
    }

    pub fn ascending(dimension: impl Into<String>) -> Self {
        Self {
            dimension: dimension.into(),
            direction: Some(Direction::Ascending),
        }
    }

    pub fn descending(dimension: impl Into<String>) -> Self {
        Self {
            dimension: dimension.into(),
            direction: Some(Direction::Descending),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Ascending,
    Descending,
}

// ============================================
// Having spec
// ============================================

/// Predicate over aggregated groupBy rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Having {
    EqualTo { aggregation: String, value: f64 },
    GreaterThan { aggregation: String, value: f64 },
    LessThan { aggregation: String, value: f64 },
    DimSelector { dimension: String, value: String },
    And { having_specs: Vec<Having> },
    Or { having_specs: Vec<Having> },
    Not { having_spec: Box<Having> },
}

impl Having {
    pub fn equal_to(aggregation: impl Into<String>, value: f64) -> Self {
        Having::EqualTo {
            aggregation: aggregation.into(),
            value,
        }
    }

    pub fn greater_than(aggregation: impl Into<String>, value: f64) -> Self {
        Having::GreaterThan {
            aggregation: aggregation.into(),
            value,
        }
    }

    pub fn less_than(aggregation: impl Into<String>, value: f64) -> Self {
        Having::LessThan {
            aggregation: aggregation.into(),
            value,
        }
    }

    pub fn dim_selector(dimension: impl Into<String>, value: impl Into<String>) -> Self {
        Having::DimSelector {
            dimension: dimension.into(),
            value: value.into(),
        }
    }

    /// Conjunction with the same absent-entry collapsing as [`Filter::and`](super::Filter::and)
    pub fn and<I>(specs: I) -> Option<Having>
    where
        I: IntoIterator<Item = Option<Having>>,
    {
        collapse(specs, |having_specs| Having::And { having_specs })
    }

    /// Disjunction with the same absent-entry collapsing as [`Filter::or`](super::Filter::or)
    pub fn or<I>(specs: I) -> Option<Having>
    where
        I: IntoIterator<Item = Option<Having>>,
    {
        collapse(specs, |having_specs| Having::Or { having_specs })
    }

    pub fn not(spec: Having) -> Self {
        Having::Not {
            having_spec: Box::new(spec),
        }
    }
}

// ============================================
// Paging spec
// ============================================

/// Paging state for select queries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagingSpec {
    /// Per-segment offsets returned by the previous page; empty for the first page
    #[serde(default)]
    pub paging_identifiers: BTreeMap<String, i64>,
    pub threshold: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_next: Option<bool>,
}

impl PagingSpec {
    /// First page of `threshold` rows
    pub fn first_page(threshold: u32) -> Self {
        Self {
            paging_identifiers: BTreeMap::new(),
            threshold,
            from_next: None,
        }
    }
}

// ============================================
// Search query spec
// ============================================

/// How search queries and search filters match dimension values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum SearchQuerySpec {
    #[serde(rename = "insensitive_contains")]
    InsensitiveContains { value: String },
    #[serde(rename = "contains")]
    Contains {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        case_sensitive: Option<bool>,
    },
    #[serde(rename = "fragment")]
    Fragment {
        values: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        case_sensitive: Option<bool>,
    },
}

impl SearchQuerySpec {
    pub fn insensitive_contains(value: impl Into<String>) -> Self {
        SearchQuerySpec::InsensitiveContains {
            value: value.into(),
        }
    }

    pub fn contains(value: impl Into<String>) -> Self {
        SearchQuerySpec::Contains {
            value: value.into(),
            case_sensitive: None,
        }
    }

    pub fn fragment<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SearchQuerySpec::Fragment {
            values: values.into_iter().map(Into::into).collect(),
            case_sensitive: None,
        }
    }

    /// Set case sensitivity. `insensitive_contains` has no such option and is returned unchanged.
    pub fn case_sensitive(mut self, value: bool) -> Self {
        if let SearchQuerySpec::Contains { case_sensitive, .. }
        | SearchQuerySpec::Fragment { case_sensitive, .. } = &mut self
        {
            *case_sensitive = Some(value);
        }
        self
    }
}

// ============================================
// ToInclude
// ============================================

/// Columns analysed by a segmentMetadata query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ToInclude {
    All,
    None,
    List { columns: Vec<String> },
}

impl ToInclude {
    pub fn list<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ToInclude::List {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================
// TopN metric spec
// ============================================

/// Ordering of topN results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TopNMetric {
    /// Order by an aggregation or post-aggregation value
    Numeric { metric: String },
    Lexicographic {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        previous_stop: Option<String>,
    },
    AlphaNumeric {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        previous_stop: Option<String>,
    },
    /// Reverse of the wrapped ordering
    Inverted { metric: Box<TopNMetric> },
}

impl TopNMetric {
    pub fn numeric(metric: impl Into<String>) -> Self {
        TopNMetric::Numeric {
            metric: metric.into(),
        }
    }

    pub fn lexicographic() -> Self {
        TopNMetric::Lexicographic {
            previous_stop: None,
        }
    }

    pub fn alpha_numeric() -> Self {
        TopNMetric::AlphaNumeric {
            previous_stop: None,
        }
    }

    pub fn inverted(metric: TopNMetric) -> Self {
        TopNMetric::Inverted {
            metric: Box::new(metric),
        }
    }

    /// Resume after the given value. Only dimension orderings accept a stop value.
    pub fn previous_stop(mut self, value: impl Into<String>) -> Self {
        if let TopNMetric::Lexicographic { previous_stop }
        | TopNMetric::AlphaNumeric { previous_stop } = &mut self
        {
            *previous_stop = Some(value.into());
        }
        self
    }
}

// ============================================
// Search sort spec
// ============================================

/// Ordering of search query hits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SearchSort {
    Lexicographic,
    Strlen,
}
