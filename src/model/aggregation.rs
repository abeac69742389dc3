//! Aggregation specs
//!
//! Leaf aggregators computed by the broker for every result bucket. Each one
//! writes its value under a caller-chosen output name that post-aggregations
//! and topN metrics refer to.

use super::error::{ModelError, ModelResult};
use super::filter::Filter;
use serde::{Deserialize, Serialize};

/// An aggregator spec
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Aggregation {
    /// Number of rows
    Count { name: String },
    LongSum { name: String, field_name: String },
    DoubleSum { name: String, field_name: String },
    LongMin { name: String, field_name: String },
    LongMax { name: String, field_name: String },
    DoubleMin { name: String, field_name: String },
    DoubleMax { name: String, field_name: String },
    #[serde(rename = "javascript")]
    JavaScript {
        name: String,
        field_names: Vec<String>,
        fn_aggregate: String,
        fn_combine: String,
        fn_reset: String,
    },
    /// Approximate distinct count computed at query time
    Cardinality {
        name: String,
        field_names: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        by_row: Option<bool>,
    },
    /// Approximate distinct count over a pre-built hyperUnique column
    HyperUnique { name: String, field_name: String },
    /// `aggregator` only sees rows matching `filter`
    Filtered {
        filter: Filter,
        aggregator: Box<Aggregation>,
    },
    ThetaSketch {
        name: String,
        field_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<u32>,
    },
}

impl Aggregation {
    /// Parse a hand-written aggregator fragment
    pub fn from_json(raw: &str) -> ModelResult<Aggregation> {
        serde_json::from_str(raw).map_err(ModelError::fragment("aggregation"))
    }

    pub fn count(name: impl Into<String>) -> Self {
        Aggregation::Count { name: name.into() }
    }

    pub fn long_sum(name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Aggregation::LongSum {
            name: name.into(),
            field_name: field_name.into(),
        }
    }

    pub fn double_sum(name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Aggregation::DoubleSum {
            name: name.into(),
            field_name: field_name.into(),
        }
    }

    pub fn long_min(name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Aggregation::LongMin {
            name: name.into(),
            field_name: field_name.into(),
        }
    }

    pub fn long_max(name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Aggregation::LongMax {
            name: name.into(),
            field_name: field_name.into(),
        }
    }

    pub fn double_min(name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Aggregation::DoubleMin {
            name: name.into(),
            field_name: field_name.into(),
        }
    }

    pub fn double_max(name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Aggregation::DoubleMax {
            name: name.into(),
            field_name: field_name.into(),
        }
    }

    pub fn javascript<I, S>(
        name: impl Into<String>,
        fn_aggregate: impl Into<String>,
        fn_combine: impl Into<String>,
        fn_reset: impl Into<String>,
        field_names: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Aggregation::JavaScript {
            name: name.into(),
            field_names: field_names.into_iter().map(Into::into).collect(),
            fn_aggregate: fn_aggregate.into(),
            fn_combine: fn_combine.into(),
            fn_reset: fn_reset.into(),
        }
    }

    pub fn cardinality<I, S>(name: impl Into<String>, field_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Aggregation::Cardinality {
            name: name.into(),
            field_names: field_names.into_iter().map(Into::into).collect(),
            by_row: None,
        }
    }

    pub fn hyper_unique(name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Aggregation::HyperUnique {
            name: name.into(),
            field_name: field_name.into(),
        }
    }

    pub fn filtered(filter: Filter, aggregator: Aggregation) -> Self {
        Aggregation::Filtered {
            filter,
            aggregator: Box::new(aggregator),
        }
    }

    pub fn theta_sketch(name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Aggregation::ThetaSketch {
            name: name.into(),
            field_name: field_name.into(),
            size: None,
        }
    }

    /// Count distinct combinations across `field_names` instead of per field (cardinality only)
    pub fn by_row(mut self, value: bool) -> Self {
        if let Aggregation::Cardinality { by_row, .. } = &mut self {
            *by_row = Some(value);
        }
        self
    }

    /// Sketch size, a power of two (thetaSketch only)
    pub fn sketch_size(mut self, value: u32) -> Self {
        if let Aggregation::ThetaSketch { size, .. } = &mut self {
            *size = Some(value);
        }
        self
    }

    /// Output name; a filtered aggregator reports its inner aggregator's name
    pub fn name(&self) -> &str {
        match self {
            Aggregation::Count { name }
            | Aggregation::LongSum { name, .. }
            | Aggregation::DoubleSum { name, .. }
            | Aggregation::LongMin { name, .. }
            | Aggregation::LongMax { name, .. }
            | Aggregation::DoubleMin { name, .. }
            | Aggregation::DoubleMax { name, .. }
            | Aggregation::JavaScript { name, .. }
            | Aggregation::Cardinality { name, .. }
            | Aggregation::HyperUnique { name, .. }
            | Aggregation::ThetaSketch { name, .. } => name,
            Aggregation::Filtered { aggregator, .. } => aggregator.name(),
        }
    }
}
