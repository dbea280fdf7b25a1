//! The in-memory manifest and its mutation operations.
//!
//! All operations assume their preconditions were checked by the caller (the
//! session confirms a selection exists before removing or updating it), so a
//! missing id is a no-op rather than an error.

mod types;

pub use types::{App, HistoryEntry, Manifest, Track, TrackKind, Tracks};

use serde::{Deserialize, Serialize};

use crate::entry::RawEntry;
use crate::error::{RelmanError, Result};
use crate::history::reconcile;
use crate::utils::{now_timestamp, slugify, today_utc};

/// Base used for generated app ids when no usable name is given.
pub const DEFAULT_APP_ID: &str = "app";

/// Display name given to apps added without a name.
pub const DEFAULT_APP_NAME: &str = "New App";

/// A full replacement for one app's editable fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppPatch {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub stable: Option<Track>,
    #[serde(default)]
    pub beta: Option<Track>,
    #[serde(default)]
    pub history: Vec<RawEntry>,
}

impl AppPatch {
    /// Build a patch that reproduces an existing app.
    pub fn from_app(app: &App) -> Self {
        Self {
            id: app.id.clone(),
            name: app.name.clone(),
            stable: app.tracks.stable.clone(),
            beta: app.tracks.beta.clone(),
            history: app.history.iter().map(RawEntry::from).collect(),
        }
    }

    /// Materialize the patch into an app: blank tracks are dropped and the
    /// history is reconciled against the resulting stable track.
    pub fn into_app(self) -> App {
        let stable = self.stable.and_then(Track::into_present);
        let beta = self.beta.and_then(Track::into_present);
        let history = reconcile(&self.history, stable.as_ref());

        App {
            id: self.id.trim().to_string(),
            name: self.name.trim().to_string(),
            tracks: Tracks { stable, beta },
            history,
        }
    }
}

impl Manifest {
    /// Parse a manifest from JSON text. `origin` names the input in errors.
    pub fn from_json(text: &str, origin: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|source| RelmanError::Parse {
            origin: origin.to_string(),
            source,
        })
    }

    /// Serialize as 2-space indented JSON with a trailing newline.
    pub fn to_json(&self) -> Result<String> {
        let mut text = serde_json::to_string_pretty(self).map_err(RelmanError::Serialize)?;
        text.push('\n');
        Ok(text)
    }

    /// Find an app by id
    pub fn find_app(&self, id: &str) -> Option<&App> {
        self.apps.iter().find(|app| app.id == id)
    }

    /// All app ids in order
    pub fn app_ids(&self) -> Vec<&str> {
        self.apps.iter().map(|app| app.id.as_str()).collect()
    }

    /// Check whether an id is taken
    pub fn contains_app(&self, id: &str) -> bool {
        self.find_app(id).is_some()
    }

    /// Append a new app with no history and a stable track that is blank
    /// apart from today's date.
    ///
    /// The date keeps the track present through a form round trip, where an
    /// all-empty track becomes absent. The id is the slug of `name` (or [`DEFAULT_APP_ID`]), suffixed with
    /// `-2`, `-3`, ... until it is unique.
    pub fn add_app(&mut self, name: Option<&str>) -> &App {
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        let base = name
            .map(slugify)
            .filter(|slug| slug.len() >= 2)
            .unwrap_or_else(|| DEFAULT_APP_ID.to_string());
        let id = self.unique_id(&base, "-");

        log::debug!("adding app '{}'", id);
        self.apps.push(App {
            id,
            name: name.unwrap_or(DEFAULT_APP_NAME).to_string(),
            tracks: Tracks {
                stable: Some(Track {
                    date: Some(today_utc()),
                    ..Track::default()
                }),
                beta: None,
            },
            history: Vec::new(),
        });
        &self.apps[self.apps.len() - 1]
    }

    /// Deep-copy an app under a new id (`<id>-copy`, `<id>-copy-2`, ...).
    ///
    /// Returns `None` when the source does not exist.
    pub fn duplicate_app(&mut self, id: &str) -> Option<&App> {
        let source = self.find_app(id)?.clone();
        let new_id = self.unique_id(&format!("{}-copy", source.id), "-");

        log::debug!("duplicating app '{}' as '{}'", id, new_id);
        self.apps.push(App {
            id: new_id,
            name: format!("{} (copy)", source.name),
            ..source
        });
        self.apps.last()
    }

    /// Remove an app by id. Returns false (and does nothing) when missing.
    pub fn remove_app(&mut self, id: &str) -> bool {
        let before = self.apps.len();
        self.apps.retain(|app| app.id != id);
        before != self.apps.len()
    }

    /// Replace an app's id, name, tracks and history in one step.
    ///
    /// Returns false (and does nothing) when `id` is not found.
    pub fn update_app(&mut self, id: &str, patch: AppPatch) -> bool {
        let Some(index) = self.apps.iter().position(|app| app.id == id) else {
            return false;
        };
        self.apps[index] = patch.into_app();
        true
    }

    /// Set `generated` to the current UTC time and return it.
    pub fn stamp_generated(&mut self) -> String {
        self.generated = now_timestamp();
        self.generated.clone()
    }

    fn unique_id(&self, base: &str, separator: &str) -> String {
        if !self.contains_app(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{}{}{}", base, separator, n))
            .find(|candidate| !self.contains_app(candidate))
            .unwrap_or_else(|| base.to_string())
    }
}
