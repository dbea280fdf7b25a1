//! History reconciliation.
//!
//! Merges raw history rows with an app's current stable track into a single
//! deduplicated list ordered newest first. Reconciling an already reconciled
//! list against the same stable track returns it unchanged.

use std::cmp::Ordering;

use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::entry::{RawEntry, entry_from_track, normalize};
use crate::manifest::{HistoryEntry, Track};
use crate::utils::{is_iso_date, today_utc};

/// Reconcile history rows against the stable track, using today's UTC date
/// for rows that end up without a date.
pub fn reconcile(entries: &[RawEntry], stable: Option<&Track>) -> Vec<HistoryEntry> {
    reconcile_on(entries, stable, &today_utc())
}

/// Reconcile history rows with an explicit fallback date.
pub fn reconcile_on(
    entries: &[RawEntry],
    stable: Option<&Track>,
    today: &str,
) -> Vec<HistoryEntry> {
    let mut by_key: IndexMap<String, HistoryEntry> = IndexMap::new();

    for raw in entries {
        let entry = normalize(raw);
        if entry.is_blank() {
            continue;
        }
        match by_key.entry(entry.merge_key()) {
            Entry::Occupied(mut slot) => fill_missing(slot.get_mut(), &entry),
            Entry::Vacant(slot) => {
                slot.insert(entry);
            }
        }
    }

    let stable_date = stable
        .and_then(|track| track.date.as_deref())
        .map(str::trim)
        .filter(|date| is_iso_date(date));

    if let Some(track) = stable.filter(|track| !track.version.trim().is_empty()) {
        let current = entry_from_track(track);
        match by_key.entry(current.merge_key()) {
            Entry::Occupied(mut slot) => overlay(slot.get_mut(), &current),
            Entry::Vacant(slot) => {
                slot.insert(current);
            }
        }
    }

    let fallback = stable_date.unwrap_or(today);
    let mut history: Vec<HistoryEntry> = by_key
        .into_values()
        .map(|mut entry| {
            if entry.date.is_empty() {
                entry.date = fallback.to_string();
            }
            entry
        })
        .collect();

    sort_history(&mut history);
    log::debug!(
        "reconciled {} history rows into {} entries",
        entries.len(),
        history.len()
    );
    history
}

/// Sort history newest first: descending code, then descending version.
///
/// The sort is stable, so entries that compare equal keep their order.
pub fn sort_history(history: &mut [HistoryEntry]) {
    history.sort_by(|a, b| {
        b.code
            .cmp(&a.code)
            .then_with(|| match (a.version.is_empty(), b.version.is_empty()) {
                (false, false) => compare_versions(&b.version, &a.version),
                (false, true) => Ordering::Less,
                (true, false) => Ordering::Greater,
                (true, true) => Ordering::Equal,
            })
    });
}

/// Compare two version strings the way release numbers are read.
///
/// Digit runs compare numerically (`10.0 > 9.0`), text compares
/// case-insensitively, a pre-release ranks below its release
/// (`2.0.0-beta < 2.0.0`) and `+build` metadata is ignored.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let (a_core, a_pre) = split_version(a);
    let (b_core, b_pre) = split_version(b);

    compare_chunks(a_core, b_core).then_with(|| match (a_pre, b_pre) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a_pre), Some(b_pre)) => compare_chunks(a_pre, b_pre),
    })
}

fn split_version(version: &str) -> (&str, Option<&str>) {
    let version = version.trim();
    let version = version.split_once('+').map_or(version, |(core, _)| core);
    match version.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (version, None),
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Chunk {
    // Declared first so numbers rank below text at the same position.
    Number(usize, String),
    Text(String),
}

fn chunks(s: &str) -> Vec<Chunk> {
    let mut out = Vec::new();
    let mut chars = s.chars().peekable();

    while let Some(&c) = chars.peek() {
        let is_digit = c.is_ascii_digit();
        let mut run = String::new();
        while let Some(&next) = chars.peek() {
            if next.is_ascii_digit() != is_digit {
                break;
            }
            run.push(next);
            chars.next();
        }

        if is_digit {
            let digits = run.trim_start_matches('0').to_string();
            out.push(Chunk::Number(digits.len(), digits));
        } else {
            out.push(Chunk::Text(run.to_lowercase()));
        }
    }

    out
}

fn compare_chunks(a: &str, b: &str) -> Ordering {
    chunks(a).cmp(&chunks(b))
}

fn fill_missing(existing: &mut HistoryEntry, later: &HistoryEntry) {
    if existing.code == 0 {
        existing.code = later.code;
    }
    if existing.date.is_empty() {
        existing.date = later.date.clone();
    }
    if existing.url.is_empty() {
        existing.url = later.url.clone();
    }
}

fn overlay(existing: &mut HistoryEntry, current: &HistoryEntry) {
    if current.code != 0 {
        existing.code = current.code;
    }
    if !current.date.is_empty() {
        existing.date = current.date.clone();
    }
    if !current.url.is_empty() {
        existing.url = current.url.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TODAY: &str = "2024-06-01";

    fn row(version: &str, code: u64) -> RawEntry {
        RawEntry::new().with_version(version).with_code(code)
    }

    fn versions(history: &[HistoryEntry]) -> Vec<(u64, &str)> {
        history
            .iter()
            .map(|e| (e.code, e.version.as_str()))
            .collect()
    }

    #[test]
    fn test_sort_order_example() {
        let rows = vec![
            row("1.0.5", 5),
            row("2.0.0", 12),
            row("2.0.0-beta", 12),
            row("0.1", 0),
        ];
        let history = reconcile_on(&rows, None, TODAY);
        assert_eq!(
            versions(&history),
            vec![(12, "2.0.0"), (12, "2.0.0-beta"), (5, "1.0.5"), (0, "0.1")]
        );
    }

    #[test]
    fn test_numeric_version_order() {
        let rows = vec![row("9.0", 1), row("10.0", 1), row("9.10", 1), row("9.9", 1)];
        let history = reconcile_on(&rows, None, TODAY);
        assert_eq!(
            versions(&history),
            vec![(1, "10.0"), (1, "9.10"), (1, "9.9"), (1, "9.0")]
        );
    }

    #[test]
    fn test_versionless_sorts_last_among_ties() {
        let rows = vec![
            RawEntry::new().with_code(3).with_url("https://example.com/a"),
            row("1.0", 3),
        ];
        let history = reconcile_on(&rows, None, TODAY);
        assert_eq!(versions(&history), vec![(3, "1.0"), (3, "")]);
    }

    #[test]
    fn test_blank_rows_are_dropped() {
        let rows = vec![
            RawEntry::new(),
            RawEntry::new().with_date("2024-01-01"),
            RawEntry::new().with_code("-2"),
            row("1.0", 1),
        ];
        let history = reconcile_on(&rows, None, TODAY);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_duplicates_merge_first_seen_wins() {
        let rows = vec![
            RawEntry::new().with_version("1.0").with_url("https://a.example"),
            RawEntry::new()
                .with_version("1.0")
                .with_code(4)
                .with_date("2024-01-01")
                .with_url("https://b.example"),
        ];
        let history = reconcile_on(&rows, None, TODAY);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].code, 4);
        assert_eq!(history[0].date, "2024-01-01");
        assert_eq!(history[0].url, "https://a.example");
    }

    #[test]
    fn test_versionless_rows_share_code_slot() {
        let rows = vec![
            RawEntry::new().with_url("https://a.example"),
            RawEntry::new().with_url("https://b.example"),
        ];
        let history = reconcile_on(&rows, None, TODAY);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].url, "https://a.example");
    }

    #[test]
    fn test_stable_track_wins_and_is_inserted() {
        let stable = Track {
            version: "2.0.0".to_string(),
            code: 20,
            date: Some("2024-05-01".to_string()),
            url: None,
            download: Some("https://example.com/2.0.0.zip".to_string()),
            notes: None,
        };
        let rows = vec![
            RawEntry::new()
                .with_version("2.0.0")
                .with_code(19)
                .with_url("https://old.example"),
            row("1.0.0", 10),
        ];
        let history = reconcile_on(&rows, Some(&stable), TODAY);

        assert_eq!(versions(&history), vec![(20, "2.0.0"), (10, "1.0.0")]);
        assert_eq!(history[0].url, "https://example.com/2.0.0.zip");
        assert_eq!(history[0].date, "2024-05-01");
        // Rows without a date inherit the stable date
        assert_eq!(history[1].date, "2024-05-01");

        let history = reconcile_on(&[row("1.0.0", 10)], Some(&stable), TODAY);
        assert_eq!(versions(&history), vec![(20, "2.0.0"), (10, "1.0.0")]);
    }

    #[test]
    fn test_stable_zero_code_keeps_history_code() {
        let stable = Track {
            version: "1.1".to_string(),
            ..Track::default()
        };
        let history = reconcile_on(&[row("1.1", 9)], Some(&stable), TODAY);
        assert_eq!(history[0].code, 9);
    }

    #[test]
    fn test_dates_fall_back_to_today() {
        let history = reconcile_on(&[row("1.0", 1)], None, TODAY);
        assert_eq!(history[0].date, TODAY);

        let stable = Track {
            version: String::new(),
            date: Some("bogus".to_string()),
            ..Track::default()
        };
        let history = reconcile_on(&[row("1.0", 1)], Some(&stable), TODAY);
        assert_eq!(history[0].date, TODAY);
    }

    #[test]
    fn test_reconcile_from_json_rows() {
        let rows: Vec<RawEntry> = serde_json::from_value(json!([
            { "version": "1.0", "code": "3", "date": "2024/01/01" },
            { "version": " 1.0 ", "date": "2024-01-05" },
            { "code": -1 },
        ]))
        .unwrap();
        let history = reconcile_on(&rows, None, TODAY);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].code, 3);
        assert_eq!(history[0].date, "2024-01-05");
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let stable = Track {
            version: "3.0".to_string(),
            code: 30,
            ..Track::default()
        };
        let rows = vec![row("1.0", 10), row("3.0", 0), RawEntry::new().with_code(2)];
        let once = reconcile_on(&rows, Some(&stable), TODAY);
        let raw: Vec<RawEntry> = once.iter().map(RawEntry::from).collect();
        let twice = reconcile_on(&raw, Some(&stable), TODAY);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_compare_versions() {
        assert_eq!(compare_versions("10.0", "9.0"), Ordering::Greater);
        assert_eq!(compare_versions("2.0.0", "2.0.0-beta"), Ordering::Greater);
        assert_eq!(compare_versions("2.0.0-beta.2", "2.0.0-beta.10"), Ordering::Less);
        assert_eq!(compare_versions("1.0-RC1", "1.0-rc1"), Ordering::Equal);
        assert_eq!(compare_versions("1.0+build5", "1.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.01", "1.1"), Ordering::Equal);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_raw() -> impl Strategy<Value = RawEntry> {
        (
            prop_oneof!["", "[0-9]{1,2}(\\.[0-9]{1,2}){0,2}(-[a-zA-Z]{1,3})?", " [0-9]\\.[0-9] "],
            prop_oneof![
                Just(serde_json::Value::Null),
                (0u64..30).prop_map(serde_json::Value::from),
                "-?[0-9]{0,2}".prop_map(serde_json::Value::from),
            ],
            prop_oneof!["", "2024-0[1-9]-[12][0-9]", "bad-date"],
            prop_oneof!["", "https://example.com/[a-z]{1,3}"],
        )
            .prop_map(|(version, code, date, url)| {
                RawEntry::new()
                    .with_version(version)
                    .with_code(code)
                    .with_date(date)
                    .with_url(url)
            })
    }

    fn arb_stable() -> impl Strategy<Value = Option<Track>> {
        proptest::option::of(
            (
                prop_oneof!["", "[0-9]{1,2}\\.[0-9]{1,2}"],
                0u64..30,
                proptest::option::of("2023-1[0-2]-0[1-9]"),
            )
                .prop_map(|(version, code, date)| Track {
                    version,
                    code,
                    date,
                    ..Track::default()
                }),
        )
    }

    proptest! {
        #[test]
        fn prop_reconcile_idempotent(
            rows in proptest::collection::vec(arb_raw(), 0..12),
            stable in arb_stable(),
        ) {
            let once = reconcile_on(&rows, stable.as_ref(), "2024-06-01");
            let raw: Vec<RawEntry> = once.iter().map(RawEntry::from).collect();
            let twice = reconcile_on(&raw, stable.as_ref(), "2024-06-01");
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_reconcile_keys_unique(
            rows in proptest::collection::vec(arb_raw(), 0..12),
            stable in arb_stable(),
        ) {
            let history = reconcile_on(&rows, stable.as_ref(), "2024-06-01");
            let mut keys: Vec<String> = history.iter().map(HistoryEntry::merge_key).collect();
            let total = keys.len();
            keys.sort();
            keys.dedup();
            prop_assert_eq!(keys.len(), total);
            prop_assert!(history.iter().all(|e| !e.date.is_empty()));
        }
    }
}
