//! Clock helpers.
//!
//! Every timestamp that crosses the wire is RFC 3339 (ISO-8601) in UTC with
//! millisecond precision, e.g. `2026-10-16T09:30:12.345Z`.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Current time as seconds since the Unix epoch.
pub fn unix_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Current time formatted for wire payloads.
pub fn now_iso8601() -> String {
    format_iso8601(Utc::now())
}

pub fn format_iso8601(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a caller-supplied timestamp. Offsets are normalised to UTC; a
/// local date-time without an offset is read as UTC.
pub fn parse_iso8601(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
