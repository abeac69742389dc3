//! Post-aggregation expressions
//!
//! Expressions the broker evaluates over already-aggregated values. Leaves
//! refer to aggregation (or sibling post-aggregation) outputs by name; see
//! [`dependency`](super::dependency) for extracting those references.

use super::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};

/// A post-aggregation expression node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PostAggregation {
    /// `fields` combined left to right with `function`
    Arithmetic {
        name: String,
        #[serde(rename = "fn")]
        function: ArithmeticFn,
        fields: Vec<PostAggregation>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ordering: Option<String>,
    },
    /// Raw value of an aggregation output
    FieldAccess {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        field_name: String,
    },
    Constant { name: String, value: f64 },
    #[serde(rename = "javascript")]
    JavaScript {
        name: String,
        field_names: Vec<String>,
        function: String,
    },
    /// Cardinality estimate of a hyperUnique aggregation
    HyperUniqueCardinality {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        field_name: String,
    },
    ThetaSketchEstimate {
        name: String,
        field: Box<PostAggregation>,
    },
    ThetaSketchSetOp {
        name: String,
        func: ThetaFunc,
        fields: Vec<PostAggregation>,
    },
}

/// Arithmetic operators understood by the broker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithmeticFn {
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "-")]
    Minus,
    #[serde(rename = "*")]
    Multiply,
    /// Division that yields 0 when dividing by 0
    #[serde(rename = "/")]
    Divide,
    /// Plain floating point division
    #[serde(rename = "quotient")]
    Quotient,
}

/// Set operations over theta sketches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThetaFunc {
    Union,
    Intersect,
    Not,
}

impl PostAggregation {
    /// Parse a hand-written post-aggregation fragment
    pub fn from_json(raw: &str) -> ModelResult<PostAggregation> {
        serde_json::from_str(raw).map_err(ModelError::fragment("post-aggregation"))
    }

    pub fn arithmetic(
        name: impl Into<String>,
        function: ArithmeticFn,
        fields: impl IntoIterator<Item = PostAggregation>,
    ) -> Self {
        PostAggregation::Arithmetic {
            name: name.into(),
            function,
            fields: fields.into_iter().collect(),
            ordering: None,
        }
    }

    pub fn field_access(field_name: impl Into<String>) -> Self {
        PostAggregation::FieldAccess {
            name: None,
            field_name: field_name.into(),
        }
    }

    pub fn constant(name: impl Into<String>, value: f64) -> Self {
        PostAggregation::Constant {
            name: name.into(),
            value,
        }
    }

    pub fn javascript<I, S>(
        name: impl Into<String>,
        function: impl Into<String>,
        field_names: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PostAggregation::JavaScript {
            name: name.into(),
            field_names: field_names.into_iter().map(Into::into).collect(),
            function: function.into(),
        }
    }

    pub fn hyper_unique_cardinality(field_name: impl Into<String>) -> Self {
        PostAggregation::HyperUniqueCardinality {
            name: None,
            field_name: field_name.into(),
        }
    }

    pub fn theta_sketch_estimate(name: impl Into<String>, field: PostAggregation) -> Self {
        PostAggregation::ThetaSketchEstimate {
            name: name.into(),
            field: Box::new(field),
        }
    }

    pub fn theta_sketch_set_op(
        name: impl Into<String>,
        func: ThetaFunc,
        fields: impl IntoIterator<Item = PostAggregation>,
    ) -> Self {
        PostAggregation::ThetaSketchSetOp {
            name: name.into(),
            func,
            fields: fields.into_iter().collect(),
        }
    }

    /// Set the output name of a field accessor. Other variants take their name at construction.
    pub fn named(mut self, value: impl Into<String>) -> Self {
        match &mut self {
            PostAggregation::FieldAccess { name, .. }
            | PostAggregation::HyperUniqueCardinality { name, .. } => *name = Some(value.into()),
            _ => {}
        }
        self
    }

    /// Result ordering of an arithmetic node (e.g. `"numericFirst"`)
    pub fn ordering(mut self, value: impl Into<String>) -> Self {
        if let PostAggregation::Arithmetic { ordering, .. } = &mut self {
            *ordering = Some(value.into());
        }
        self
    }

    /// Output name, if this node has one
    pub fn name(&self) -> Option<&str> {
        match self {
            PostAggregation::Arithmetic { name, .. }
            | PostAggregation::Constant { name, .. }
            | PostAggregation::JavaScript { name, .. }
            | PostAggregation::ThetaSketchEstimate { name, .. }
            | PostAggregation::ThetaSketchSetOp { name, .. } => Some(name),
            PostAggregation::FieldAccess { name, .. }
            | PostAggregation::HyperUniqueCardinality { name, .. } => name.as_deref(),
        }
    }
}
