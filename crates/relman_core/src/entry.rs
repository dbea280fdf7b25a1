//! Release record normalization.
//!
//! History rows reach the core from hand-edited JSON and editor forms, so every
//! field may be missing, of the wrong type, or malformed. [`normalize`] turns any
//! such row into a well-formed [`HistoryEntry`] without ever failing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::manifest::{HistoryEntry, Track};
use crate::utils::is_iso_date;

/// A loosely-typed history row as entered by a user or read from disk.
///
/// Each field is an arbitrary JSON value; absent fields are `null`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawEntry {
    #[serde(default)]
    pub version: Value,
    #[serde(default)]
    pub code: Value,
    #[serde(default)]
    pub date: Value,
    #[serde(default)]
    pub url: Value,
}

impl RawEntry {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the version field.
    pub fn with_version(mut self, version: impl Into<Value>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the code field.
    pub fn with_code(mut self, code: impl Into<Value>) -> Self {
        self.code = code.into();
        self
    }

    /// Set the date field.
    pub fn with_date(mut self, date: impl Into<Value>) -> Self {
        self.date = date.into();
        self
    }

    /// Set the url field.
    pub fn with_url(mut self, url: impl Into<Value>) -> Self {
        self.url = url.into();
        self
    }
}

impl From<&HistoryEntry> for RawEntry {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            version: Value::String(entry.version.clone()),
            code: Value::from(entry.code),
            date: Value::String(entry.date.clone()),
            url: Value::String(entry.url.clone()),
        }
    }
}

impl From<HistoryEntry> for RawEntry {
    fn from(entry: HistoryEntry) -> Self {
        RawEntry::from(&entry)
    }
}

/// Normalize a raw history row.
///
/// - `version`: trimmed text, may be empty
/// - `code`: non-negative integer, 0 when absent or unparsable
/// - `date`: kept only when it is exactly `YYYY-MM-DD`
/// - `url`: trimmed text, format is left to the validator
pub fn normalize(raw: &RawEntry) -> HistoryEntry {
    let date = text_of(&raw.date);

    HistoryEntry {
        version: text_of(&raw.version),
        code: code_of(&raw.code),
        date: if is_iso_date(&date) { date } else { String::new() },
        url: text_of(&raw.url),
    }
}

/// Build the history row a stable track contributes during reconciliation.
///
/// The track's `url` is preferred, falling back to `download`.
pub fn entry_from_track(track: &Track) -> HistoryEntry {
    let url = track
        .url
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .or(track.download.as_deref())
        .unwrap_or_default();

    normalize(
        &RawEntry::new()
            .with_version(track.version.as_str())
            .with_code(track.code)
            .with_date(track.date.as_deref().unwrap_or_default())
            .with_url(url),
    )
}

/// Parse a free-form code value, clamping to zero.
pub fn parse_code(text: &str) -> u64 {
    let text = text.trim();
    if text.is_empty() {
        return 0;
    }
    if let Ok(n) = text.parse::<i64>() {
        return n.max(0) as u64;
    }
    if let Ok(n) = text.parse::<u64>() {
        return n;
    }
    match text.parse::<f64>() {
        Ok(f) if f.is_finite() && f > 0.0 => f.trunc() as u64,
        _ => 0,
    }
}

fn code_of(value: &Value) -> u64 {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                u
            } else if let Some(i) = n.as_i64() {
                i.max(0) as u64
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f > 0.0)
                    .map(|f| f.trunc() as u64)
                    .unwrap_or(0)
            }
        }
        Value::String(s) => parse_code(s),
        _ => 0,
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}
