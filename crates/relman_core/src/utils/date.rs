//! Date and timestamp helpers.
//!
//! Release dates in a manifest are plain `YYYY-MM-DD` strings and the
//! `generated` stamp is an ISO-8601 UTC timestamp without fractional seconds.
//! Everything here works on strings so the data model never has to carry
//! chrono types through serde.

use chrono::{DateTime, Utc};

/// Format used for release dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format used for the manifest `generated` stamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Check that a string has the exact `YYYY-MM-DD` shape.
///
/// Only the shape is checked (four digit year, two digit month and day);
/// calendar validity is not, so `2024-13-40` passes.
pub fn is_iso_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Today's date in UTC as `YYYY-MM-DD`.
pub fn today_utc() -> String {
    Utc::now().format(DATE_FORMAT).to_string()
}

/// Format a timestamp truncated to whole seconds, e.g. `2024-01-02T03:04:05Z`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// The current UTC time as a manifest timestamp.
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}
