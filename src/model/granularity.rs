//! Query granularity
//!
//! A granularity is either a named bucket (`"hour"`, `"day"`, ...) or a
//! structured duration/period bucket with an optional origin and time zone.

use serde::{Deserialize, Serialize};

/// Bucket size used to roll up rows by time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Granularity {
    /// One of the broker's predefined bucket names
    Simple(SimpleGranularity),
    /// A duration or ISO-8601 period bucket
    Bucket(BucketGranularity),
}

/// Predefined granularity names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimpleGranularity {
    All,
    None,
    Second,
    Minute,
    FiveMinute,
    TenMinute,
    FifteenMinute,
    ThirtyMinute,
    Hour,
    SixHour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

/// Structured granularities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BucketGranularity {
    /// Fixed-size buckets of `duration` milliseconds
    Duration {
        duration: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        origin: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_zone: Option<String>,
    },
    /// Calendar-aware buckets described by an ISO-8601 period such as `PT1H`
    Period {
        period: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        origin: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_zone: Option<String>,
    },
}

impl Granularity {
    pub const ALL: Granularity = Granularity::Simple(SimpleGranularity::All);
    pub const NONE: Granularity = Granularity::Simple(SimpleGranularity::None);
    pub const MINUTE: Granularity = Granularity::Simple(SimpleGranularity::Minute);
    pub const FIFTEEN_MINUTE: Granularity = Granularity::Simple(SimpleGranularity::FifteenMinute);
    pub const THIRTY_MINUTE: Granularity = Granularity::Simple(SimpleGranularity::ThirtyMinute);
    pub const HOUR: Granularity = Granularity::Simple(SimpleGranularity::Hour);
    pub const DAY: Granularity = Granularity::Simple(SimpleGranularity::Day);

    /// Fixed buckets of the given length in milliseconds
    pub fn duration(millis: u64) -> Self {
        Granularity::Bucket(BucketGranularity::Duration {
            duration: millis,
            origin: None,
            time_zone: None,
        })
    }

    /// Calendar buckets for an ISO-8601 period (e.g. `"PT1H"`, `"P1D"`)
    pub fn period(period: impl Into<String>) -> Self {
        Granularity::Bucket(BucketGranularity::Period {
            period: period.into(),
            origin: None,
            time_zone: None,
        })
    }

    /// Set the bucket origin. Named granularities have no origin and are returned unchanged.
    pub fn with_origin(mut self, value: impl Into<String>) -> Self {
        if let Granularity::Bucket(
            BucketGranularity::Duration { origin, .. } | BucketGranularity::Period { origin, .. },
        ) = &mut self
        {
            *origin = Some(value.into());
        }
        self
    }

    /// Set the bucket time zone. Named granularities are returned unchanged.
    pub fn with_time_zone(mut self, value: impl Into<String>) -> Self {
        if let Granularity::Bucket(
            BucketGranularity::Duration { time_zone, .. }
            | BucketGranularity::Period { time_zone, .. },
        ) = &mut self
        {
            *time_zone = Some(value.into());
        }
        self
    }
}

impl Default for Granularity {
    fn default() -> Self {
        Granularity::ALL
    }
}

impl From<SimpleGranularity> for Granularity {
    fn from(value: SimpleGranularity) -> Self {
        Granularity::Simple(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_granularity_serializes_as_string() {
        assert_eq!(serde_json::to_value(Granularity::ALL).unwrap(), json!("all"));
        assert_eq!(
            serde_json::to_value(Granularity::FIFTEEN_MINUTE).unwrap(),
            json!("fifteen_minute")
        );
    }

    #[test]
    fn test_period_with_options() {
        let gran = Granularity::period("PT1H")
            .with_time_zone("America/Los_Angeles")
            .with_origin("2016-05-01T00:00:00Z");
        assert_eq!(
            serde_json::to_value(&gran).unwrap(),
            json!({
                "type": "period",
                "period": "PT1H",
                "origin": "2016-05-01T00:00:00Z",
                "timeZone": "America/Los_Angeles"
            })
        );
    }

    #[test]
    fn test_duration_omits_unset_fields() {
        let gran = Granularity::duration(3_600_000);
        assert_eq!(
            serde_json::to_value(&gran).unwrap(),
            json!({"type": "duration", "duration": 3600000})
        );
    }

    #[test]
    fn test_options_ignored_on_named_granularity() {
        assert_eq!(Granularity::DAY.with_time_zone("UTC"), Granularity::DAY);
    }

    #[test]
    fn test_granularity_deserialize_both_forms() {
        let simple: Granularity = serde_json::from_str("\"hour\"").unwrap();
        assert_eq!(simple, Granularity::HOUR);

        let bucket: Granularity =
            serde_json::from_str(r#"{"type":"period","period":"P1D"}"#).unwrap();
        assert_eq!(bucket, Granularity::period("P1D"));
    }
}
