//! Filter algebra
//!
//! Boolean predicate trees over dimension values. `and`/`or` accept absent
//! entries (a conditional branch that contributed no filter) and collapse at
//! construction time:
//!
//! - absent entries are dropped, order of the rest is kept
//! - no survivors yields no filter at all (`None`)
//! - a single survivor is returned as-is, without a connective around it
//!
//! ```rust
//! use druid_query::model::Filter;
//!
//! let region: Option<Filter> = None;
//! let filter = Filter::and([Some(Filter::selector("app_id", "42")), region]);
//! assert_eq!(filter, Some(Filter::selector("app_id", "42")));
//! ```

use super::dimension::ExtractionFn;
use super::error::{ModelError, ModelResult};
use super::spec::SearchQuerySpec;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A filter tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Filter {
    /// Dimension equals `value` (a string or number); with no value, matches null/empty
    Selector {
        dimension: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
    },
    Regex {
        dimension: String,
        pattern: String,
    },
    #[serde(rename = "javascript")]
    JavaScript {
        dimension: String,
        function: String,
    },
    Search {
        dimension: String,
        query: SearchQuerySpec,
    },
    In {
        dimension: String,
        values: Vec<String>,
    },
    Bound(BoundFilter),
    /// Dimension value after `extraction_fn` equals `value`
    Extraction {
        dimension: String,
        value: String,
        extraction_fn: ExtractionFn,
    },
    And {
        fields: Vec<Filter>,
    },
    Or {
        fields: Vec<Filter>,
    },
    Not {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        field: Option<Box<Filter>>,
    },
}

/// Range filter over a dimension
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundFilter {
    pub dimension: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_strict: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_strict: Option<bool>,
    /// Compare as numbers instead of strings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha_numeric: Option<bool>,
}

impl BoundFilter {
    pub fn new(dimension: impl Into<String>) -> Self {
        Self {
            dimension: dimension.into(),
            ..Self::default()
        }
    }

    pub fn lower(mut self, value: impl Into<String>) -> Self {
        self.lower = Some(value.into());
        self
    }

    pub fn upper(mut self, value: impl Into<String>) -> Self {
        self.upper = Some(value.into());
        self
    }

    pub fn lower_strict(mut self, value: bool) -> Self {
        self.lower_strict = Some(value);
        self
    }

    pub fn upper_strict(mut self, value: bool) -> Self {
        self.upper_strict = Some(value);
        self
    }

    pub fn alpha_numeric(mut self, value: bool) -> Self {
        self.alpha_numeric = Some(value);
        self
    }
}

impl From<BoundFilter> for Filter {
    fn from(value: BoundFilter) -> Self {
        Filter::Bound(value)
    }
}

impl Filter {
    pub fn selector(dimension: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Selector {
            dimension: dimension.into(),
            value: Some(value.into()),
        }
    }

    /// Selector matching rows where the dimension is null
    pub fn selector_null(dimension: impl Into<String>) -> Self {
        Filter::Selector {
            dimension: dimension.into(),
            value: None,
        }
    }

    pub fn regex(dimension: impl Into<String>, pattern: impl Into<String>) -> Self {
        Filter::Regex {
            dimension: dimension.into(),
            pattern: pattern.into(),
        }
    }

    pub fn javascript(dimension: impl Into<String>, function: impl Into<String>) -> Self {
        Filter::JavaScript {
            dimension: dimension.into(),
            function: function.into(),
        }
    }

    pub fn search(dimension: impl Into<String>, query: SearchQuerySpec) -> Self {
        Filter::Search {
            dimension: dimension.into(),
            query,
        }
    }

    pub fn in_values<I, S>(dimension: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter::In {
            dimension: dimension.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Start a range filter; refine with the [`BoundFilter`] builder methods
    pub fn bound(dimension: impl Into<String>) -> BoundFilter {
        BoundFilter::new(dimension)
    }

    pub fn extraction(
        dimension: impl Into<String>,
        value: impl Into<String>,
        extraction_fn: ExtractionFn,
    ) -> Self {
        Filter::Extraction {
            dimension: dimension.into(),
            value: value.into(),
            extraction_fn,
        }
    }

    /// Conjunction of the present entries, collapsed as described in the module docs
    pub fn and<I>(filters: I) -> Option<Filter>
    where
        I: IntoIterator<Item = Option<Filter>>,
    {
        collapse(filters, |fields| Filter::And { fields })
    }

    /// Disjunction of the present entries, collapsed as described in the module docs
    pub fn or<I>(filters: I) -> Option<Filter>
    where
        I: IntoIterator<Item = Option<Filter>>,
    {
        collapse(filters, |fields| Filter::Or { fields })
    }

    /// Negation. Wraps whatever it is given, including nothing.
    pub fn not(filter: Option<Filter>) -> Self {
        Filter::Not {
            field: filter.map(Box::new),
        }
    }

    /// Parse a hand-written filter fragment
    pub fn from_json(raw: &str) -> ModelResult<Filter> {
        serde_json::from_str(raw).map_err(ModelError::fragment("filter"))
    }

    /// Re-apply the and/or collapsing rule throughout the tree.
    ///
    /// Trees built with [`Filter::and`]/[`Filter::or`] are already normal and come
    /// back unchanged; decoded trees may still hold empty or single-child
    /// connectives.
    pub fn normalize(self) -> Option<Filter> {
        match self {
            Filter::And { fields } => Filter::and(fields.into_iter().map(Filter::normalize)),
            Filter::Or { fields } => Filter::or(fields.into_iter().map(Filter::normalize)),
            Filter::Not { field } => Some(Filter::Not {
                field: field.and_then(|f| (*f).normalize()).map(Box::new),
            }),
            leaf => Some(leaf),
        }
    }
}

/// Drop absent entries, then return nothing, the single survivor, or `wrap(survivors)`.
pub(crate) fn collapse<T, I, F>(items: I, wrap: F) -> Option<T>
where
    I: IntoIterator<Item = Option<T>>,
    F: FnOnce(Vec<T>) -> T,
{
    let mut present: Vec<T> = items.into_iter().flatten().collect();
    match present.len() {
        0 => None,
        1 => present.pop(),
        _ => Some(wrap(present)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_and_drops_absent_entries() {
        let with_gap = Filter::and([
            Some(Filter::selector("app_id", "42")),
            None,
            Some(Filter::selector("region", "")),
        ]);
        let without_gap = Filter::and([
            Some(Filter::selector("app_id", "42")),
            Some(Filter::selector("region", "")),
        ]);
        assert_eq!(with_gap, without_gap);

        match with_gap {
            Some(Filter::And { fields }) => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0], Filter::selector("app_id", "42"));
                assert_eq!(fields[1], Filter::selector("region", ""));
            }
            other => panic!("Expected And, got {:?}", other),
        }
    }

    #[test]
    fn test_all_absent_yields_no_filter() {
        assert_eq!(Filter::and([None, None]), None);
        assert_eq!(Filter::or(Vec::<Option<Filter>>::new()), None);
    }

    #[test]
    fn test_single_survivor_is_unwrapped() {
        let filter = Filter::or([None, Some(Filter::regex("network", "^[Ss]")), None]);
        assert_eq!(filter, Some(Filter::regex("network", "^[Ss]")));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let built = Filter::and([
            Some(Filter::selector("a", "1")),
            Filter::or([Some(Filter::selector("b", "2")), Some(Filter::selector("c", "3"))]),
            None,
        ])
        .unwrap();

        let once = built.clone().normalize().unwrap();
        assert_eq!(once, built);
        let twice = once.clone().normalize().unwrap();
        assert_eq!(twice, once);
    }

    #[test]
    fn test_normalize_collapses_decoded_connectives() {
        let decoded = Filter::from_json(
            r#"{"type":"and","fields":[{"type":"or","fields":[]},{"type":"or","fields":[{"type":"selector","dimension":"x","value":"1"}]}]}"#,
        )
        .unwrap();
        assert_eq!(decoded.normalize(), Some(Filter::selector("x", "1")));
    }

    #[test]
    fn test_not_wraps_unconditionally() {
        assert_eq!(
            serde_json::to_value(Filter::not(None)).unwrap(),
            json!({"type": "not"})
        );
        assert_eq!(
            serde_json::to_value(Filter::not(Some(Filter::selector("a", "b")))).unwrap(),
            json!({"type": "not", "field": {"type": "selector", "dimension": "a", "value": "b"}})
        );
    }

    #[test]
    fn test_selector_value_handling() {
        assert_eq!(
            serde_json::to_value(Filter::selector_null("network_key")).unwrap(),
            json!({"type": "selector", "dimension": "network_key"})
        );
        assert_eq!(
            serde_json::to_value(Filter::selector("region", "")).unwrap(),
            json!({"type": "selector", "dimension": "region", "value": ""})
        );
    }

    #[test]
    fn test_selector_accepts_numeric_value() {
        let filter = Filter::from_json(r#"{"type":"selector","dimension":"x","value":5}"#).unwrap();
        assert_eq!(filter, Filter::selector("x", 5));
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({"type": "selector", "dimension": "x", "value": 5})
        );
        assert_ne!(filter, Filter::selector("x", "5"));
    }

    #[test]
    fn test_bound_and_in_serialize() {
        let bound: Filter = Filter::bound("age")
            .lower("18")
            .upper("65")
            .upper_strict(true)
            .alpha_numeric(true)
            .into();
        assert_eq!(
            serde_json::to_value(&bound).unwrap(),
            json!({
                "type": "bound",
                "dimension": "age",
                "lower": "18",
                "upper": "65",
                "upperStrict": true,
                "alphaNumeric": true
            })
        );

        assert_eq!(
            serde_json::to_value(Filter::in_values("days", ["0", "1"])).unwrap(),
            json!({"type": "in", "dimension": "days", "values": ["0", "1"]})
        );
    }

    #[test]
    fn test_extraction_and_search_filters() {
        let filter = Filter::extraction("hour", "01", ExtractionFn::substring(0).length(2));
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({
                "type": "extraction",
                "dimension": "hour",
                "value": "01",
                "extractionFn": {"type": "substring", "index": 0, "length": 2}
            })
        );

        let search = Filter::search("campaign", SearchQuerySpec::insensitive_contains("131"));
        assert_eq!(
            serde_json::to_value(&search).unwrap()["query"]["type"],
            json!("insensitive_contains")
        );
    }

    #[test]
    fn test_from_json_rejects_malformed_fragment() {
        let err = Filter::from_json(r#"{"type":"selector""#).unwrap_err();
        assert!(matches!(err, ModelError::InvalidFragment { kind: "filter", .. }));

        let err = Filter::from_json(r#"{"type":"nope"}"#).unwrap_err();
        assert!(err.to_string().contains("Invalid filter fragment"));
    }
}
