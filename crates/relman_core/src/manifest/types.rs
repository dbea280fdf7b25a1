//! Manifest data types.
//!
//! These types mirror the JSON document stored in the remote repository. Field
//! names are camelCase on the wire and optional track fields are omitted when
//! absent, so a parsed manifest serializes back to the same shape.

use serde::{Deserialize, Serialize};

/// The root release manifest document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Version of the manifest schema
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// When the manifest was last persisted (`YYYY-MM-DDTHH:MM:SSZ`)
    #[serde(default)]
    pub generated: String,

    /// Contact address published with the manifest
    #[serde(default)]
    pub contact: String,

    /// Tracked applications, in display order
    #[serde(default)]
    pub apps: Vec<App>,
}

fn default_schema_version() -> u32 {
    Manifest::CURRENT_SCHEMA_VERSION
}

impl Manifest {
    /// Current manifest schema version
    pub const CURRENT_SCHEMA_VERSION: u32 = 1;
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            schema_version: Self::CURRENT_SCHEMA_VERSION,
            generated: String::new(),
            contact: String::new(),
            apps: Vec::new(),
        }
    }
}

/// One application and its release metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct App {
    /// Slug identifier, unique within the manifest
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Current stable/beta release channels
    #[serde(default)]
    pub tracks: Tracks,

    /// Previously shipped versions, newest first
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

/// The two release channels of an app.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tracks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stable: Option<Track>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<Track>,
}

/// Which release channel a track belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Stable,
    Beta,
}

impl TrackKind {
    /// Capitalized label used in validation messages.
    pub fn label(&self) -> &'static str {
        match self {
            TrackKind::Stable => "Stable",
            TrackKind::Beta => "Beta",
        }
    }
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackKind::Stable => write!(f, "stable"),
            TrackKind::Beta => write!(f, "beta"),
        }
    }
}

impl std::str::FromStr for TrackKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stable" => Ok(TrackKind::Stable),
            "beta" => Ok(TrackKind::Beta),
            other => Err(format!("unknown track '{}' (expected stable or beta)", other)),
        }
    }
}

impl Tracks {
    /// Get a track by kind
    pub fn get(&self, kind: TrackKind) -> Option<&Track> {
        match kind {
            TrackKind::Stable => self.stable.as_ref(),
            TrackKind::Beta => self.beta.as_ref(),
        }
    }

    /// Present tracks in check order: stable, then beta.
    pub fn iter(&self) -> impl Iterator<Item = (TrackKind, &Track)> {
        [
            (TrackKind::Stable, self.stable.as_ref()),
            (TrackKind::Beta, self.beta.as_ref()),
        ]
        .into_iter()
        .filter_map(|(kind, track)| track.map(|t| (kind, t)))
    }
}

/// The current release on one channel.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub code: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Track {
    /// True when nothing was entered: no version, zero code, no optional field.
    pub fn is_empty(&self) -> bool {
        fn blank(field: &Option<String>) -> bool {
            field.as_deref().is_none_or(|s| s.trim().is_empty())
        }

        self.version.trim().is_empty()
            && self.code == 0
            && blank(&self.date)
            && blank(&self.url)
            && blank(&self.download)
            && blank(&self.notes)
    }

    /// Trim every field and turn blank optional fields into `None`.
    pub fn tidy(self) -> Self {
        fn tidy_opt(field: Option<String>) -> Option<String> {
            field
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        }

        Self {
            version: self.version.trim().to_string(),
            code: self.code,
            date: tidy_opt(self.date),
            url: tidy_opt(self.url),
            download: tidy_opt(self.download),
            notes: tidy_opt(self.notes),
        }
    }

    /// Tidy the track, mapping an all-empty track to `None`.
    pub fn into_present(self) -> Option<Self> {
        let track = self.tidy();
        (!track.is_empty()).then_some(track)
    }
}

/// A previously shipped version of an app.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub code: u64,

    #[serde(default)]
    pub date: String,

    #[serde(default)]
    pub url: String,
}

impl HistoryEntry {
    /// Identity key used for selection tracking: `version::code::date::url`.
    pub fn key(&self) -> String {
        format!(
            "{}::{}::{}::{}",
            self.version, self.code, self.date, self.url
        )
    }

    /// Deduplication key: the version, or `code:<code>` when there is none.
    pub fn merge_key(&self) -> String {
        if self.version.is_empty() {
            format!("code:{}", self.code)
        } else {
            self.version.clone()
        }
    }

    /// True when the entry carries no version, code or url.
    pub fn is_blank(&self) -> bool {
        self.version.is_empty() && self.code == 0 && self.url.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_is_empty() {
        assert!(Track::default().is_empty());
        assert!(
            Track {
                url: Some("   ".to_string()),
                ..Track::default()
            }
            .is_empty()
        );
        assert!(
            !Track {
                code: 3,
                ..Track::default()
            }
            .is_empty()
        );
    }

    #[test]
    fn test_track_into_present() {
        let track = Track {
            version: " 1.2.0 ".to_string(),
            notes: Some("".to_string()),
            ..Track::default()
        };
        let present = track.into_present().unwrap();
        assert_eq!(present.version, "1.2.0");
        assert!(present.notes.is_none());

        assert!(Track::default().into_present().is_none());
    }

    #[test]
    fn test_history_entry_keys() {
        let entry = HistoryEntry {
            version: "1.0".to_string(),
            code: 4,
            date: "2024-01-02".to_string(),
            url: "https://example.com".to_string(),
        };
        assert_eq!(entry.key(), "1.0::4::2024-01-02::https://example.com");
        assert_eq!(entry.merge_key(), "1.0");

        let versionless = HistoryEntry {
            code: 7,
            ..HistoryEntry::default()
        };
        assert_eq!(versionless.merge_key(), "code:7");
    }

    #[test]
    fn test_manifest_json_shape() {
        let manifest = Manifest {
            generated: "2024-01-02T03:04:05Z".to_string(),
            contact: "ops@example.com".to_string(),
            apps: vec![App {
                id: "app".to_string(),
                name: "App".to_string(),
                tracks: Tracks {
                    stable: Some(Track {
                        version: "1.0.0".to_string(),
                        code: 1,
                        ..Track::default()
                    }),
                    beta: None,
                },
                history: Vec::new(),
            }],
            ..Manifest::default()
        };

        let value = serde_json::to_value(&manifest).unwrap();
        assert_eq!(value["schemaVersion"], 1);
        assert_eq!(value["generated"], "2024-01-02T03:04:05Z");
        assert!(value["apps"][0]["tracks"].get("beta").is_none());
        assert!(value["apps"][0]["tracks"]["stable"].get("url").is_none());
    }

    #[test]
    fn test_track_kind_from_str() {
        assert_eq!("Stable".parse::<TrackKind>(), Ok(TrackKind::Stable));
        assert_eq!("beta".parse::<TrackKind>(), Ok(TrackKind::Beta));
        assert!("nightly".parse::<TrackKind>().is_err());
    }
}
