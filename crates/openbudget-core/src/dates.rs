//! Timestamp parsing and storage format
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC text with millisecond
//! precision (`2024-01-01T00:00:00.000Z`), so lexical order in SQLite is
//! chronological order and range predicates can compare strings directly.
//! Years are limited to 0000..=9999 to keep that width, and values are held
//! at millisecond granularity from the moment they are parsed.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Deserializer};

/// Parse a user-supplied date or timestamp.
///
/// Accepts `YYYY-MM-DD` (midnight UTC), RFC 3339 with any offset, and naive
/// `YYYY-MM-DDTHH:MM:SS` / `YYYY-MM-DD HH:MM:SS` (read as UTC). Sub-millisecond
/// digits are dropped; years outside 0000..=9999 are rejected.
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    parse_any(input.trim())
        .filter(|dt| (0..=9999).contains(&dt.year()))
        .map(|dt| dt.trunc_subsecs(3))
}

fn parse_any(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.and_utc())
}

/// Format a timestamp for storage
pub fn to_db(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Read a stored timestamp column
pub(crate) fn from_db(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Serde adapter for required timestamp fields in request bodies
pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", raw)))
}

/// Serde adapter for optional timestamp fields in request bodies
pub fn deserialize_optional<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_date_only_is_midnight_utc() {
        let dt = parse_timestamp("2024-01-01").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let dt = parse_timestamp("2024-03-31T23:00:00-02:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 4, 1, 1, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_naive_datetime() {
        let a = parse_timestamp("2024-06-15 12:30:00").unwrap();
        let b = parse_timestamp("2024-06-15T12:30:00").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, Utc.with_ymd_and_hms(2024, 6, 15, 12, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_timestamp("not-a-date").is_none());
        assert!(parse_timestamp("2024-13-01").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_parse_rejects_years_beyond_storage_width() {
        assert!(parse_timestamp("+10000-01-01").is_none());
        assert!(parse_timestamp("-0001-06-01").is_none());
        assert!(parse_timestamp("+10000-01-01T00:00:00").is_none());
        assert!(parse_timestamp("9999-12-31T23:59:59.999Z").is_some());
        assert_eq!(
            to_db(&parse_timestamp("0000-01-01").unwrap()),
            "0000-01-01T00:00:00.000Z"
        );
    }

    #[test]
    fn test_parse_truncates_to_milliseconds() {
        let dt = parse_timestamp("2024-01-01T00:00:00.0009Z").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let dt = parse_timestamp("2024-01-01T00:00:00.123456Z").unwrap();
        assert_eq!(to_db(&dt), "2024-01-01T00:00:00.123Z");
        assert_eq!(dt.timestamp_subsec_nanos(), 123_000_000);
    }

    #[test]
    fn test_storage_format_sorts_chronologically() {
        let early = to_db(&Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
        let late = to_db(&Utc.with_ymd_and_hms(2024, 11, 2, 3, 4, 5).unwrap());
        assert_eq!(early, "2024-01-02T03:04:05.000Z");
        assert!(early < late);
    }
}
