//! Query Variant Registry
//!
//! The seven query shapes the broker understands, as one closed sum type:
//!
//! - **groupBy**: aggregates grouped by dimensions
//! - **search**: dimension values matching a search spec
//! - **segmentMetadata**: per-segment column analysis
//! - **select**: paged raw rows
//! - **timeBoundary**: earliest/latest timestamps
//! - **timeseries**: aggregates per time bucket
//! - **topN**: ranked values of one dimension
//!
//! Serializing a [`Query`] writes the `queryType` discriminant from the
//! variant; no request field can override it. [`Query::decode`] turns a
//! response body into the matching [`QueryResults`] variant.
//!
//! # Examples
//!
//! ```rust
//! use druid_query::model::{Aggregation, Filter, Granularity};
//! use druid_query::query::{Query, TimeseriesQuery};
//!
//! let query: Query = TimeseriesQuery::new("events_agg")
//!     .interval("2016-05-01T00:00/2016-05-01T05")
//!     .granularity(Granularity::period("PT1H"))
//!     .filter(Filter::and([Some(Filter::selector("app_id", "42")), None]))
//!     .aggregation(Aggregation::count("count"))
//!     .into();
//!
//! let body = serde_json::to_value(&query).unwrap();
//! assert_eq!(body["queryType"], "timeseries");
//! ```

mod error;
mod request;
mod result;

pub use error::DecodeError;
pub use request::{
    interval, AnalysisType, Bound, Context, GroupByQuery, SearchQuery, SegmentMetadataQuery,
    SelectQuery, TimeBoundaryQuery, TimeseriesQuery, TopNQuery,
};
pub use result::{
    AggregatorInfo, ColumnAnalysis, Event, GroupByRow, QueryResults, SearchHit, SearchRow,
    SegmentMetadataRow, SelectEvent, SelectResult, SelectRow, TimeBoundary, TimeBoundaryRow,
    TimeseriesRow, TopNRow,
};

use crate::model::{ModelError, ModelResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A query of any supported type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "queryType")]
pub enum Query {
    #[serde(rename = "groupBy")]
    GroupBy(GroupByQuery),
    #[serde(rename = "search")]
    Search(SearchQuery),
    #[serde(rename = "segmentMetadata")]
    SegmentMetadata(SegmentMetadataQuery),
    #[serde(rename = "select")]
    Select(SelectQuery),
    #[serde(rename = "timeBoundary")]
    TimeBoundary(TimeBoundaryQuery),
    #[serde(rename = "timeseries")]
    Timeseries(TimeseriesQuery),
    #[serde(rename = "topN")]
    TopN(TopNQuery),
}

impl Query {
    /// The `queryType` discriminant written for this variant
    pub fn tag(&self) -> &'static str {
        match self {
            Query::GroupBy(_) => "groupBy",
            Query::Search(_) => "search",
            Query::SegmentMetadata(_) => "segmentMetadata",
            Query::Select(_) => "select",
            Query::TimeBoundary(_) => "timeBoundary",
            Query::Timeseries(_) => "timeseries",
            Query::TopN(_) => "topN",
        }
    }

    /// Data source the query reads from
    pub fn data_source(&self) -> &str {
        match self {
            Query::GroupBy(q) => &q.data_source,
            Query::Search(q) => &q.data_source,
            Query::SegmentMetadata(q) => &q.data_source,
            Query::Select(q) => &q.data_source,
            Query::TimeBoundary(q) => &q.data_source,
            Query::Timeseries(q) => &q.data_source,
            Query::TopN(q) => &q.data_source,
        }
    }

    /// Parse a complete hand-written query, `queryType` included
    pub fn from_json(raw: &str) -> ModelResult<Query> {
        serde_json::from_str(raw).map_err(ModelError::fragment("query"))
    }

    /// Decode a response body into this query's row type.
    ///
    /// The body must be a JSON array of rows; any mismatch fails the whole
    /// decode.
    pub fn decode(&self, body: &[u8]) -> Result<QueryResults, DecodeError> {
        let query_type = self.tag();
        Ok(match self {
            Query::GroupBy(_) => QueryResults::GroupBy(decode_rows(body, query_type)?),
            Query::Search(_) => QueryResults::Search(decode_rows(body, query_type)?),
            Query::SegmentMetadata(_) => {
                QueryResults::SegmentMetadata(decode_rows(body, query_type)?)
            }
            Query::Select(_) => QueryResults::Select(decode_rows(body, query_type)?),
            Query::TimeBoundary(_) => QueryResults::TimeBoundary(decode_rows(body, query_type)?),
            Query::Timeseries(_) => QueryResults::Timeseries(decode_rows(body, query_type)?),
            Query::TopN(_) => QueryResults::TopN(decode_rows(body, query_type)?),
        })
    }
}

fn decode_rows<T: DeserializeOwned>(
    body: &[u8],
    query_type: &'static str,
) -> Result<Vec<T>, DecodeError> {
    serde_json::from_slice(body).map_err(|source| DecodeError { query_type, source })
}

impl From<GroupByQuery> for Query {
    fn from(value: GroupByQuery) -> Self {
        Query::GroupBy(value)
    }
}

impl From<SearchQuery> for Query {
    fn from(value: SearchQuery) -> Self {
        Query::Search(value)
    }
}

impl From<SegmentMetadataQuery> for Query {
    fn from(value: SegmentMetadataQuery) -> Self {
        Query::SegmentMetadata(value)
    }
}

impl From<SelectQuery> for Query {
    fn from(value: SelectQuery) -> Self {
        Query::Select(value)
    }
}

impl From<TimeBoundaryQuery> for Query {
    fn from(value: TimeBoundaryQuery) -> Self {
        Query::TimeBoundary(value)
    }
}

impl From<TimeseriesQuery> for Query {
    fn from(value: TimeseriesQuery) -> Self {
        Query::Timeseries(value)
    }
}

impl From<TopNQuery> for Query {
    fn from(value: TopNQuery) -> Self {
        Query::TopN(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Aggregation, ArithmeticFn, DimensionSpec, ExtractionFn, Filter, Granularity, Having,
        LimitSpec, LookupSpec, OrderByColumn, PagingSpec, PostAggregation, SearchQuerySpec,
        SearchSort, ThetaFunc, TopNMetric,
    };
    use serde_json::json;

    fn revenue_per_event() -> PostAggregation {
        PostAggregation::arithmetic(
            "Revenue/Event",
            ArithmeticFn::Divide,
            [
                PostAggregation::field_access("revenue"),
                PostAggregation::from_json(r#"{ "type" : "fieldAccess", "fieldName" : "count" }"#)
                    .unwrap(),
            ],
        )
    }

    fn all_queries() -> Vec<Query> {
        vec![
            GroupByQuery::new("events_agg").into(),
            SearchQuery::new("events_agg", SearchQuerySpec::contains("x")).into(),
            SegmentMetadataQuery::new("events_agg").into(),
            SelectQuery::new("events", PagingSpec::first_page(5)).into(),
            TimeBoundaryQuery::new("events_agg").into(),
            TimeseriesQuery::new("events_agg").into(),
            TopNQuery::new("events_agg", "device_os", TopNMetric::numeric("count"), 5).into(),
        ]
    }

    #[test]
    fn test_discriminant_matches_tag() {
        let tags: Vec<&str> = all_queries().iter().map(Query::tag).collect();
        assert_eq!(
            tags,
            vec![
                "groupBy",
                "search",
                "segmentMetadata",
                "select",
                "timeBoundary",
                "timeseries",
                "topN"
            ]
        );

        for query in all_queries() {
            let value = serde_json::to_value(&query).unwrap();
            assert_eq!(value["queryType"], json!(query.tag()));
            assert_eq!(query.data_source(), value["dataSource"].as_str().unwrap());
        }
    }

    #[test]
    fn test_group_by_request_shape() {
        let query: Query = GroupByQuery::new("events_agg")
            .interval("2016-05-01T00:00/2016-05-01T01")
            .filter(Filter::and([
                Some(Filter::selector("app_id", "42")),
                Some(Filter::selector_null("attribution_network_key")),
                None,
            ]))
            .limit_spec(LimitSpec::default_limit(
                5,
                [OrderByColumn::descending("revenue")],
            ))
            .having(Having::and([
                Some(Having::greater_than("revenue", 10000.0)),
                None,
            ]))
            .dimension("attribution_network")
            .aggregation(
                Aggregation::from_json(r#"{ "type" : "count", "name" : "count" }"#).unwrap(),
            )
            .aggregation(Aggregation::long_sum("revenue", "dimension_sum"))
            .aggregation(Aggregation::hyper_unique("unique_devices", "unique_devices"))
            .post_aggregation(revenue_per_event())
            .into();

        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({
                "queryType": "groupBy",
                "dataSource": "events_agg",
                "dimensions": ["attribution_network"],
                "granularity": "all",
                "limitSpec": {
                    "type": "default",
                    "limit": 5,
                    "columns": [{"dimension": "revenue", "direction": "Descending"}]
                },
                "having": {"type": "greaterThan", "aggregation": "revenue", "value": 10000.0},
                "filter": {
                    "type": "and",
                    "fields": [
                        {"type": "selector", "dimension": "app_id", "value": "42"},
                        {"type": "selector", "dimension": "attribution_network_key"}
                    ]
                },
                "aggregations": [
                    {"type": "count", "name": "count"},
                    {"type": "longSum", "name": "revenue", "fieldName": "dimension_sum"},
                    {"type": "hyperUnique", "name": "unique_devices", "fieldName": "unique_devices"}
                ],
                "postAggregations": [{
                    "type": "arithmetic",
                    "name": "Revenue/Event",
                    "fn": "/",
                    "fields": [
                        {"type": "fieldAccess", "fieldName": "revenue"},
                        {"type": "fieldAccess", "fieldName": "count"}
                    ]
                }],
                "intervals": ["2016-05-01T00:00/2016-05-01T01"]
            })
        );
    }

    #[test]
    fn test_round_trip_preserves_fields() {
        let queries: Vec<Query> = vec![
            TopNQuery::new(
                "events_agg",
                DimensionSpec::extraction(
                    "attribution_hours_since",
                    "since",
                    ExtractionFn::lookup(
                        LookupSpec::map([("1", "1"), ("2", "1"), ("5", "10")]).one_to_one(false),
                    )
                    .retain_missing_value(false)
                    .replace_missing_value_with("Somethin' else"),
                ),
                TopNMetric::alpha_numeric(),
                50,
            )
            .interval("2016-05-01T00:00/2016-05-03T01")
            .granularity(Granularity::HOUR)
            .filter(Filter::and([
                Some(Filter::selector("app_id", "42")),
                Some(Filter::in_values("attribution_days_since", ["0", "1"])),
            ]))
            .aggregation(Aggregation::count("count"))
            .post_aggregation(revenue_per_event())
            .into(),
            GroupByQuery::new("events_agg")
                .interval("2016-05-01T00:00/2016-05-02T00:00")
                .aggregation(Aggregation::filtered(
                    Filter::selector("event_name", "_Install"),
                    Aggregation::theta_sketch("Installs", "theta_devices"),
                ))
                .post_aggregation(PostAggregation::theta_sketch_set_op(
                    "InstallAndPurchase",
                    ThetaFunc::Intersect,
                    [PostAggregation::field_access("Installs")],
                ))
                .context("priority", 1)
                .into(),
            SearchQuery::new("events_agg", SearchQuerySpec::insensitive_contains("131"))
                .search_dimension("hour")
                .sort(SearchSort::Lexicographic)
                .into(),
        ];

        for query in queries {
            let text = serde_json::to_string(&query).unwrap();
            let parsed = Query::from_json(&text).unwrap();
            assert_eq!(parsed, query);
        }
    }

    #[test]
    fn test_caller_cannot_override_discriminant() {
        // The discriminant comes from the variant, never from a payload field.
        let parsed = Query::from_json(
            r#"{"queryType":"timeBoundary","dataSource":"events","bound":"minTime"}"#,
        )
        .unwrap();
        assert_eq!(parsed.tag(), "timeBoundary");

        let err = Query::from_json(r#"{"dataSource":"events"}"#).unwrap_err();
        assert!(matches!(err, ModelError::InvalidFragment { kind: "query", .. }));
    }

    #[test]
    fn test_decode_group_by() {
        let query: Query = GroupByQuery::new("events_agg").into();
        let body = br#"[{"version":"v1","timestamp":"2016-05-01T00:00:00.000Z","event":{"count":5}}]"#;

        let results = query.decode(body).unwrap();
        let rows = results.as_group_by().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].event["count"], json!(5));
        assert_eq!(rows[0].version, "v1");
    }

    #[test]
    fn test_decode_is_variant_specific() {
        let top_n: Query =
            TopNQuery::new("events", "device_os", TopNMetric::numeric("count"), 2).into();
        let body = br#"[{"timestamp":"2016-05-01T00:00:00.000Z","result":[{"device_os":"ios","count":9},{"device_os":"android","count":4}]}]"#;
        let results = top_n.decode(body).unwrap();
        let rows = results.as_top_n().unwrap();
        assert_eq!(rows[0].result.len(), 2);
        assert_eq!(rows[0].result[1]["device_os"], json!("android"));

        let search: Query = SearchQuery::new("events", SearchQuerySpec::contains("1")).into();
        let body = br#"[{"timestamp":"2016-05-01T00:00:00.000Z","result":[{"dimension":"hour","value":"13","count":2}]}]"#;
        let results = search.decode(body).unwrap();
        assert_eq!(results.as_search().unwrap()[0].result[0].value, "13");

        let timeseries: Query = TimeseriesQuery::new("events").into();
        let body = br#"[{"timestamp":"2016-05-01T00:00:00.000Z","result":{"count":3}},{"timestamp":"2016-05-01T01:00:00.000Z","result":{"count":7}}]"#;
        assert_eq!(timeseries.decode(body).unwrap().len(), 2);
    }

    #[test]
    fn test_decode_select() {
        let select: Query = SelectQuery::new("events", PagingSpec::first_page(2)).into();
        let body = br#"[{"timestamp":"2016-05-01T00:00:00.000Z","result":{"pagingIdentifiers":{"events_2016-05-01_v1":1},"events":[{"segmentId":"events_2016-05-01_v1","offset":0,"event":{"hour":"00","count":1}},{"segmentId":"events_2016-05-01_v1","offset":1,"event":{"hour":"01","count":4}}]}}]"#;

        let results = select.decode(body).unwrap();
        let rows = results.as_select().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].result.events.len(), 2);
        assert_eq!(rows[0].result.events[1].offset, 1);
        assert_eq!(rows[0].result.events[1].event["count"], json!(4));
        assert!(results.as_timeseries().is_none());

        let next = rows[0].next_paging_spec(2);
        assert_eq!(next.paging_identifiers["events_2016-05-01_v1"], 1);

        // A timeseries-shaped body has no select result inside it.
        let body = br#"[{"timestamp":"2016-05-01T00:00:00.000Z","result":{"count":3}}]"#;
        let err = select.decode(body).unwrap_err();
        assert_eq!(err.query_type, "select");
    }

    #[test]
    fn test_decode_failure_reports_query_type() {
        let query: Query = GroupByQuery::new("events_agg").into();

        // Second row lacks the required `event` field.
        let body = br#"[{"version":"v1","timestamp":"2016-05-01T00:00:00.000Z","event":{}},{"version":"v1","timestamp":"2016-05-01T00:00:00.000Z"}]"#;
        let err = query.decode(body).unwrap_err();
        assert_eq!(err.query_type, "groupBy");

        let err = query.decode(b"{\"error\":\"Unknown exception\"}").unwrap_err();
        assert!(err.to_string().starts_with("Failed to decode groupBy response"));
    }

    #[test]
    fn test_decode_time_boundary_and_metadata() {
        let boundary: Query = TimeBoundaryQuery::new("events").into();
        let body = br#"[{"timestamp":"2016-05-01T00:00:00.000Z","result":{"minTime":"2016-05-01T00:00:00.000Z","maxTime":"2016-05-03T10:00:00.000Z"}}]"#;
        let results = boundary.decode(body).unwrap();
        let row = &results.as_time_boundary().unwrap()[0];
        assert!(row.result.min_time.is_some());
        assert!(row.result.max_time.is_some());

        let metadata: Query = SegmentMetadataQuery::new("events").into();
        let body = br#"[{"id":"seg","intervals":["2016-05-01/2016-05-02"],"columns":{"__time":{"type":"LONG"}},"aggregators":{"count":{"type":"count","name":"count"}},"size":10,"numRows":3}]"#;
        let results = metadata.decode(body).unwrap();
        let row = &results.as_segment_metadata().unwrap()[0];
        assert_eq!(row.columns["__time"].column_type, "LONG");
        assert_eq!(
            row.aggregators.as_ref().unwrap()["count"].aggregator_type,
            "count"
        );
    }
}
