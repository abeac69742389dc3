//! Dimension specs and extraction functions
//!
//! A dimension spec names the column a query groups or filters on and,
//! optionally, an [`ExtractionFn`] pipeline that rewrites its values first.
//! The pipeline is evaluated by the broker; here it is only composed and
//! serialized.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================
// Dimension specs
// ============================================

/// A dimension as referenced by groupBy, topN and filtered extraction functions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DimensionSpec {
    /// Bare column name, output under the same name
    Name(String),
    /// Typed dimension spec
    Typed(TypedDimension),
}

/// Typed dimension specs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TypedDimension {
    Default {
        dimension: String,
        output_name: String,
    },
    Extraction {
        dimension: String,
        output_name: String,
        #[serde(alias = "dimExtractionFn")]
        extraction_fn: ExtractionFn,
    },
    Lookup {
        dimension: String,
        output_name: String,
        /// Inline lookup table
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lookup: Option<LookupSpec>,
        /// Registered lookup name
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        retain_missing_value: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        replace_missing_value_with: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        optimize: Option<bool>,
    },
}

impl DimensionSpec {
    /// Plain column reference
    pub fn name(dimension: impl Into<String>) -> Self {
        DimensionSpec::Name(dimension.into())
    }

    /// Column exposed under a different output name
    pub fn default_spec(dimension: impl Into<String>, output_name: impl Into<String>) -> Self {
        DimensionSpec::Typed(TypedDimension::Default {
            dimension: dimension.into(),
            output_name: output_name.into(),
        })
    }

    /// Column whose values pass through `extraction_fn` before use
    pub fn extraction(
        dimension: impl Into<String>,
        output_name: impl Into<String>,
        extraction_fn: ExtractionFn,
    ) -> Self {
        DimensionSpec::Typed(TypedDimension::Extraction {
            dimension: dimension.into(),
            output_name: output_name.into(),
            extraction_fn,
        })
    }

    /// Column mapped through an inline lookup table
    pub fn lookup_map(
        dimension: impl Into<String>,
        output_name: impl Into<String>,
        lookup: LookupSpec,
    ) -> Self {
        DimensionSpec::Typed(TypedDimension::Lookup {
            dimension: dimension.into(),
            output_name: output_name.into(),
            lookup: Some(lookup),
            name: None,
            retain_missing_value: None,
            replace_missing_value_with: None,
            optimize: None,
        })
    }

    /// Column mapped through a lookup registered on the broker
    pub fn lookup_namespace(
        dimension: impl Into<String>,
        output_name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        DimensionSpec::Typed(TypedDimension::Lookup {
            dimension: dimension.into(),
            output_name: output_name.into(),
            lookup: None,
            name: Some(namespace.into()),
            retain_missing_value: None,
            replace_missing_value_with: None,
            optimize: None,
        })
    }

    /// Keep unmapped values as-is (lookup dimensions only)
    pub fn retain_missing_value(mut self, value: bool) -> Self {
        if let DimensionSpec::Typed(TypedDimension::Lookup {
            retain_missing_value,
            ..
        }) = &mut self
        {
            *retain_missing_value = Some(value);
        }
        self
    }

    /// Replace unmapped values with a fixed string (lookup dimensions only)
    pub fn replace_missing_value_with(mut self, value: impl Into<String>) -> Self {
        if let DimensionSpec::Typed(TypedDimension::Lookup {
            replace_missing_value_with,
            ..
        }) = &mut self
        {
            *replace_missing_value_with = Some(value.into());
        }
        self
    }

    /// Allow the broker to rewrite filters through the lookup (lookup dimensions only)
    pub fn optimize(mut self, value: bool) -> Self {
        if let DimensionSpec::Typed(TypedDimension::Lookup { optimize, .. }) = &mut self {
            *optimize = Some(value);
        }
        self
    }

    /// Name the dimension appears under in results
    pub fn output_name(&self) -> &str {
        match self {
            DimensionSpec::Name(name) => name,
            DimensionSpec::Typed(
                TypedDimension::Default { output_name, .. }
                | TypedDimension::Extraction { output_name, .. }
                | TypedDimension::Lookup { output_name, .. },
            ) => output_name,
        }
    }
}

impl From<&str> for DimensionSpec {
    fn from(value: &str) -> Self {
        DimensionSpec::Name(value.to_string())
    }
}

impl From<String> for DimensionSpec {
    fn from(value: String) -> Self {
        DimensionSpec::Name(value)
    }
}

// ============================================
// Lookups
// ============================================

/// Value mapping used by lookup dimensions and lookup extraction functions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum LookupSpec {
    Map {
        map: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_one_to_one: Option<bool>,
    },
    Namespace {
        namespace: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_one_to_one: Option<bool>,
    },
}

impl LookupSpec {
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        LookupSpec::Map {
            map: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            is_one_to_one: None,
        }
    }

    pub fn namespace(namespace: impl Into<String>) -> Self {
        LookupSpec::Namespace {
            namespace: namespace.into(),
            is_one_to_one: None,
        }
    }

    pub fn one_to_one(mut self, value: bool) -> Self {
        match &mut self {
            LookupSpec::Map { is_one_to_one, .. } | LookupSpec::Namespace { is_one_to_one, .. } => {
                *is_one_to_one = Some(value)
            }
        }
        self
    }
}

// ============================================
// Extraction functions
// ============================================

/// Transform applied to dimension values before grouping or filtering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ExtractionFn {
    /// First capture group (or `index`) of a regular expression
    Regex {
        expr: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        replace_missing_value: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        replace_missing_value_with: Option<String>,
    },
    /// Value unchanged if it matches `expr`, otherwise null
    Partial { expr: String },
    /// Value unchanged if it matches the search spec, otherwise null
    SearchQuery { query: super::SearchQuerySpec },
    Substring {
        index: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        length: Option<u32>,
    },
    /// Reformat `__time` or a timestamp-valued dimension
    TimeFormat {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_zone: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        locale: Option<String>,
    },
    /// Parse with `time_format` and print with `result_format`
    Time {
        time_format: String,
        result_format: String,
    },
    #[serde(rename = "javascript")]
    JavaScript {
        function: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        injective: Option<bool>,
    },
    Lookup {
        lookup: LookupSpec,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        retain_missing_value: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        replace_missing_value_with: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        injective: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        optimize: Option<bool>,
    },
    /// Functions applied in order, each consuming the previous output
    Cascade { extraction_fns: Vec<ExtractionFn> },
    /// `printf`-style formatting of the value
    StringFormat { format: String },
    /// Keep (or drop, with `isWhitelist: false`) listed values of the delegate
    ListFiltered {
        delegate: Box<DimensionSpec>,
        values: Vec<String>,
        #[serde(
            rename = "isWhitelist",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        is_whitelist: Option<bool>,
    },
    /// Keep delegate values matching `pattern`
    RegexFiltered {
        delegate: Box<DimensionSpec>,
        pattern: String,
    },
    Upper {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        locale: Option<String>,
    },
    Lower {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        locale: Option<String>,
    },
}

impl ExtractionFn {
    pub fn regex(expr: impl Into<String>) -> Self {
        ExtractionFn::Regex {
            expr: expr.into(),
            index: None,
            replace_missing_value: None,
            replace_missing_value_with: None,
        }
    }

    pub fn partial(expr: impl Into<String>) -> Self {
        ExtractionFn::Partial { expr: expr.into() }
    }

    pub fn search_query(query: super::SearchQuerySpec) -> Self {
        ExtractionFn::SearchQuery { query }
    }

    pub fn substring(index: u32) -> Self {
        ExtractionFn::Substring {
            index,
            length: None,
        }
    }

    /// Time reformatting; empty strings leave the broker defaults in place
    pub fn time_format(format: &str, time_zone: &str, locale: &str) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        ExtractionFn::TimeFormat {
            format: non_empty(format),
            time_zone: non_empty(time_zone),
            locale: non_empty(locale),
        }
    }

    pub fn time(time_format: impl Into<String>, result_format: impl Into<String>) -> Self {
        ExtractionFn::Time {
            time_format: time_format.into(),
            result_format: result_format.into(),
        }
    }

    pub fn javascript(function: impl Into<String>) -> Self {
        ExtractionFn::JavaScript {
            function: function.into(),
            injective: None,
        }
    }

    pub fn lookup(lookup: LookupSpec) -> Self {
        ExtractionFn::Lookup {
            lookup,
            retain_missing_value: None,
            replace_missing_value_with: None,
            injective: None,
            optimize: None,
        }
    }

    pub fn cascade(extraction_fns: impl IntoIterator<Item = ExtractionFn>) -> Self {
        ExtractionFn::Cascade {
            extraction_fns: extraction_fns.into_iter().collect(),
        }
    }

    pub fn string_format(format: impl Into<String>) -> Self {
        ExtractionFn::StringFormat {
            format: format.into(),
        }
    }

    pub fn list_filtered<I, S>(delegate: DimensionSpec, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ExtractionFn::ListFiltered {
            delegate: Box::new(delegate),
            values: values.into_iter().map(Into::into).collect(),
            is_whitelist: None,
        }
    }

    pub fn regex_filtered(delegate: DimensionSpec, pattern: impl Into<String>) -> Self {
        ExtractionFn::RegexFiltered {
            delegate: Box::new(delegate),
            pattern: pattern.into(),
        }
    }

    pub fn upper() -> Self {
        ExtractionFn::Upper { locale: None }
    }

    pub fn lower() -> Self {
        ExtractionFn::Lower { locale: None }
    }

    // Options. Each applies only to the variants that carry the field and
    // leaves any other variant unchanged.

    pub fn index(mut self, value: u32) -> Self {
        if let ExtractionFn::Regex { index, .. } = &mut self {
            *index = Some(value);
        }
        self
    }

    pub fn length(mut self, value: u32) -> Self {
        if let ExtractionFn::Substring { length, .. } = &mut self {
            *length = Some(value);
        }
        self
    }

    pub fn replace_missing_value(mut self, value: bool) -> Self {
        if let ExtractionFn::Regex {
            replace_missing_value,
            ..
        } = &mut self
        {
            *replace_missing_value = Some(value);
        }
        self
    }

    pub fn replace_missing_value_with(mut self, value: impl Into<String>) -> Self {
        match &mut self {
            ExtractionFn::Regex {
                replace_missing_value_with,
                ..
            }
            | ExtractionFn::Lookup {
                replace_missing_value_with,
                ..
            } => *replace_missing_value_with = Some(value.into()),
            _ => {}
        }
        self
    }

    pub fn retain_missing_value(mut self, value: bool) -> Self {
        if let ExtractionFn::Lookup {
            retain_missing_value,
            ..
        } = &mut self
        {
            *retain_missing_value = Some(value);
        }
        self
    }

    pub fn injective(mut self, value: bool) -> Self {
        match &mut self {
            ExtractionFn::JavaScript { injective, .. } | ExtractionFn::Lookup { injective, .. } => {
                *injective = Some(value)
            }
            _ => {}
        }
        self
    }

    pub fn optimize(mut self, value: bool) -> Self {
        if let ExtractionFn::Lookup { optimize, .. } = &mut self {
            *optimize = Some(value);
        }
        self
    }

    pub fn whitelist(mut self, value: bool) -> Self {
        if let ExtractionFn::ListFiltered { is_whitelist, .. } = &mut self {
            *is_whitelist = Some(value);
        }
        self
    }

    pub fn locale(mut self, value: impl Into<String>) -> Self {
        match &mut self {
            ExtractionFn::Upper { locale }
            | ExtractionFn::Lower { locale }
            | ExtractionFn::TimeFormat { locale, .. } => *locale = Some(value.into()),
            _ => {}
        }
        self
    }
}
