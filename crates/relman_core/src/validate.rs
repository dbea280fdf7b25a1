//! Manifest validation.
//!
//! Validation never fails: it returns every issue it finds as a
//! human-readable line, in a fixed order, so the same manifest always yields
//! the same list. An empty list is the only state in which a remote commit is
//! allowed to proceed.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::manifest::{App, Manifest, Track, TrackKind};
use crate::session::AppDraft;
use crate::utils::is_iso_date;

static APP_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]{1,}$").expect("valid app id regex"));

static SEMVER_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+(\.\d+)+(-[0-9A-Za-z][0-9A-Za-z.-]*)?(\+[0-9A-Za-z.-]+)?$")
        .expect("valid version regex")
});

/// Check an app id against the slug pattern (`^[a-z0-9][a-z0-9-]{1,}$`).
pub fn is_valid_app_id(id: &str) -> bool {
    APP_ID.is_match(id)
}

/// Check that a version looks like `1.2`, `1.2.3`, `1.2.3-beta.1`, ...
pub fn is_semver_like(version: &str) -> bool {
    SEMVER_LIKE.is_match(version)
}

/// Check that a link starts with `http://` or `https://`.
pub fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Validate a whole manifest and return all issues found.
pub fn validate(manifest: &Manifest) -> Vec<String> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();

    for (index, app) in manifest.apps.iter().enumerate() {
        check_app_id(app, &mut issues);
        if !seen.insert(app.id.as_str()) {
            issues.push(format!(
                "Duplicate app id '{}' (app #{}).",
                app.id,
                index + 1
            ));
        }
        check_tracks(app, &mut issues);
    }

    if manifest.apps.is_empty() {
        issues.push("No apps defined.".to_string());
    }

    issues
}

/// Validate a single draft as if it were applied to `manifest`.
///
/// The id must not collide with any app other than the one being edited.
pub fn validate_draft(manifest: &Manifest, draft: &AppDraft) -> Vec<String> {
    let mut issues = Vec::new();

    for (kind, fields) in [(TrackKind::Stable, &draft.stable), (TrackKind::Beta, &draft.beta)] {
        let code = fields.code.trim();
        if !code.is_empty() && code.parse::<u64>().is_err() {
            issues.push(format!(
                "{} track code '{}' is not a non-negative integer.",
                kind.label(),
                code
            ));
        }
    }

    let app = draft.to_patch().into_app();
    check_app_id(&app, &mut issues);

    let collides = manifest
        .apps
        .iter()
        .filter(|other| draft.original_id.as_deref() != Some(other.id.as_str()))
        .any(|other| other.id == app.id);
    if collides {
        issues.push(format!("Duplicate app id '{}'.", app.id));
    }

    check_tracks(&app, &mut issues);
    issues
}

fn check_app_id(app: &App, issues: &mut Vec<String>) {
    if !is_valid_app_id(&app.id) {
        issues.push(format!(
            "Invalid app id '{}'. Use lowercase letters, digits and hyphens (at least 2 characters).",
            app.id
        ));
    }
}

fn check_tracks(app: &App, issues: &mut Vec<String>) {
    for (kind, track) in app.tracks.iter() {
        check_track(app, kind, track, issues);
    }

    if app.tracks.stable.is_none() {
        issues.push(format!("App '{}' is missing a stable track.", app.id));
    }
}

fn check_track(app: &App, kind: TrackKind, track: &Track, issues: &mut Vec<String>) {
    let prefix = format!("App '{}' {} track", app.id, kind);

    let version = track.version.trim();
    if !version.is_empty() && !is_semver_like(version) {
        issues.push(format!(
            "{}: version '{}' is not a semantic version (e.g. 1.2.3).",
            prefix, version
        ));
    }

    if let Some(date) = present(&track.date)
        && !is_iso_date(date)
    {
        issues.push(format!(
            "{}: date '{}' must be YYYY-MM-DD.",
            prefix, date
        ));
    }

    for (field, value) in [("url", &track.url), ("download", &track.download)] {
        if let Some(link) = present(value)
            && !is_http_url(link)
        {
            issues.push(format!(
                "{}: {} '{}' must start with http:// or https://.",
                prefix, field, link
            ));
        }
    }
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{HistoryEntry, Tracks};
    use crate::session::TrackFields;

    fn app(id: &str, stable: Option<Track>) -> App {
        App {
            id: id.to_string(),
            name: id.to_string(),
            tracks: Tracks { stable, beta: None },
            history: Vec::<HistoryEntry>::new(),
        }
    }

    fn release(version: &str) -> Track {
        Track {
            version: version.to_string(),
            code: 1,
            date: Some("2024-01-02".to_string()),
            url: Some("https://example.com".to_string()),
            ..Track::default()
        }
    }

    #[test]
    fn test_valid_manifest() {
        let manifest = Manifest {
            apps: vec![app("tool", Some(release("1.0.0")))],
            ..Manifest::default()
        };
        assert!(validate(&manifest).is_empty());
    }

    #[test]
    fn test_no_apps() {
        assert_eq!(validate(&Manifest::default()), vec!["No apps defined."]);
    }

    #[test]
    fn test_completeness_and_determinism() {
        let mut bad_url = release("1.0.0");
        bad_url.url = Some("ftp://x".to_string());
        let manifest = Manifest {
            apps: vec![
                app("Bad_ID", Some(release("1.0.0"))),
                app("dup", Some(release("1.0.0"))),
                app("dup", Some(bad_url)),
            ],
            ..Manifest::default()
        };

        let first = validate(&manifest);
        let second = validate(&manifest);
        assert_eq!(first, second);

        let distinct: HashSet<&String> = first.iter().collect();
        assert!(distinct.len() >= 3, "issues: {:?}", first);
        assert!(first[0].starts_with("Invalid app id 'Bad_ID'"));
        assert!(first.iter().any(|i| i.starts_with("Duplicate app id 'dup'")));
        assert!(first.iter().any(|i| i.contains("url 'ftp://x'")));
    }

    #[test]
    fn test_track_checks_are_independent() {
        let track = Track {
            version: "v1".to_string(),
            code: 0,
            date: Some("01/02/2024".to_string()),
            url: Some("example.com".to_string()),
            download: Some("file:///tmp/app".to_string()),
            notes: None,
        };
        let mut subject = app("tool", Some(release("1.0")));
        subject.tracks.beta = Some(track);
        let manifest = Manifest {
            apps: vec![subject],
            ..Manifest::default()
        };

        let issues = validate(&manifest);
        assert_eq!(issues.len(), 4, "issues: {:?}", issues);
        assert!(issues.iter().all(|i| i.starts_with("App 'tool' beta track")));
    }

    #[test]
    fn test_missing_stable_track() {
        let manifest = Manifest {
            apps: vec![app("tool", None)],
            ..Manifest::default()
        };
        assert_eq!(
            validate(&manifest),
            vec!["App 'tool' is missing a stable track."]
        );
    }

    #[test]
    fn test_empty_fields_are_not_checked() {
        let manifest = Manifest {
            apps: vec![app("tool", Some(Track::default()))],
            ..Manifest::default()
        };
        assert!(validate(&manifest).is_empty());
    }

    #[test]
    fn test_semver_like() {
        for ok in ["1.0", "1.2.3", "10.0.0-beta", "1.2.3-rc.1", "2.0.0+42", "1.0.0.1"] {
            assert!(is_semver_like(ok), "{}", ok);
        }
        for bad in ["1", "v1.0", "1.0.", "1..0", "1.0-", "latest"] {
            assert!(!is_semver_like(bad), "{}", bad);
        }
    }

    #[test]
    fn test_app_id_pattern() {
        assert!(is_valid_app_id("ab"));
        assert!(is_valid_app_id("0-day"));
        assert!(is_valid_app_id("my-app-2"));
        assert!(!is_valid_app_id("a"));
        assert!(!is_valid_app_id("-app"));
        assert!(!is_valid_app_id("My-App"));
        assert!(!is_valid_app_id("my_app"));
    }

    #[test]
    fn test_validate_draft() {
        let manifest = Manifest {
            apps: vec![
                app("tool", Some(release("1.0.0"))),
                app("other", Some(release("1.0.0"))),
            ],
            ..Manifest::default()
        };

        let mut draft = AppDraft::from_app(manifest.find_app("tool").unwrap());
        assert!(validate_draft(&manifest, &draft).is_empty());

        draft.id = "other".to_string();
        draft.stable = TrackFields {
            code: "twelve".to_string(),
            ..draft.stable.clone()
        };
        let issues = validate_draft(&manifest, &draft);
        assert_eq!(issues.len(), 2, "issues: {:?}", issues);
        assert!(issues[0].starts_with("Stable track code 'twelve'"));
        assert_eq!(issues[1], "Duplicate app id 'other'.");
    }

    #[test]
    fn test_added_app_passes_both_validators() {
        let mut manifest = Manifest::default();
        manifest.add_app(Some("Foo"));
        assert!(validate(&manifest).is_empty());

        let mut draft = AppDraft::from_app(manifest.find_app("foo").unwrap());
        draft.name = "Bar".to_string();
        assert!(validate_draft(&manifest, &draft).is_empty());

        assert!(manifest.update_app("foo", draft.to_patch()));
        assert!(validate(&manifest).is_empty());
        assert!(manifest.find_app("foo").unwrap().tracks.stable.is_some());
    }

    #[test]
    fn test_validate_new_draft_against_existing_id() {
        let manifest = Manifest {
            apps: vec![app("tool", Some(release("1.0.0")))],
            ..Manifest::default()
        };
        let mut draft = AppDraft::default();
        draft.id = "tool".to_string();
        draft.stable.version = "1.0.0".to_string();
        let issues = validate_draft(&manifest, &draft);
        assert_eq!(issues, vec!["Duplicate app id 'tool'."]);
    }
}
