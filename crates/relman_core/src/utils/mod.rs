//! Utility functions for dates and identifiers.

/// Date parsing and timestamp formatting.
pub mod date;

pub use date::{format_timestamp, is_iso_date, now_timestamp, today_utc};

/// Convert a display name to a lowercase, hyphenated slug.
///
/// Runs of non-alphanumeric characters collapse to a single `-`, and the
/// result never starts or ends with `-`. Non-ASCII letters are dropped since
/// app ids are restricted to `[a-z0-9-]`.
pub fn slugify(name: &str) -> String {
    let mut result = String::new();
    let mut last_was_hyphen = true; // Start true to avoid leading hyphen

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            result.push('-');
            last_was_hyphen = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("My App"), "my-app");
        assert_eq!(slugify("  Photo  Booth!! Pro "), "photo-booth-pro");
        assert_eq!(slugify("already-slugged"), "already-slugged");
        assert_eq!(slugify("Café Ünïcode"), "caf-n-code");
        assert_eq!(slugify("***"), "");
    }
}
