// Time and axis coordinate helpers
use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use thiserror::Error;

const QUERY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Error, PartialEq)]
#[error("invalid timestamp '{0}', expected ISO-8601")]
pub struct TimeError(pub String);

/// Combine a calendar date with a time of day from a separate picker.
pub fn combine_date_and_time(date: NaiveDate, time: NaiveTime) -> NaiveDateTime {
    date.and_time(time)
}

/// Format a timestamp the way query parameters carry it (no zone suffix).
pub fn format_query_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format(QUERY_FORMAT).to_string()
}

/// Parse an RFC 3339 timestamp, or a zone-less ISO-8601 one read as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, TimeError> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
        .map(|naive| naive.and_utc())
        .ok_or_else(|| TimeError(raw.to_string()))
}

/// One tick per calendar day at midnight UTC, both ends inclusive, in epoch ms.
pub fn generate_x_axis_ticks(start: NaiveDate, end: NaiveDate) -> Vec<i64> {
    let mut ticks = Vec::new();
    let mut current = start;

    while current <= end {
        ticks.push(current.and_time(NaiveTime::MIN).and_utc().timestamp_millis());
        match current.checked_add_days(Days::new(1)) {
            Some(next) => current = next,
            None => break,
        }
    }

    ticks
}

/// Serde adapter for `DateTime<Utc>` fields that accepts naive ISO strings.
pub mod iso {
    use super::parse_timestamp;
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}
