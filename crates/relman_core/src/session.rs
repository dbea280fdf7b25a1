//! Editing session.
//!
//! A [`Session`] owns everything an editor front end needs between user
//! actions: the manifest being edited, which app is selected, a staged form
//! draft and whether anything is unsaved. Front ends pass it around explicitly
//! instead of keeping that state in globals.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::entry::{RawEntry, parse_code};
use crate::error::{RelmanError, Result};
use crate::fs::FileSystem;
use crate::manifest::{App, AppPatch, Manifest, Track};
use crate::sync::{CommitReceipt, RemoteFileProvider, RemoteRef, SyncCoordinator};

/// Raw text of one track as entered in an editor form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackFields {
    pub version: String,
    pub code: String,
    pub date: String,
    pub url: String,
    pub download: String,
    pub notes: String,
}

impl TrackFields {
    /// Form fields showing `track`, or blank fields when there is none.
    pub fn from_track(track: Option<&Track>) -> Self {
        let Some(track) = track else {
            return Self::default();
        };
        Self {
            version: track.version.clone(),
            code: track.code.to_string(),
            date: track.date.clone().unwrap_or_default(),
            url: track.url.clone().unwrap_or_default(),
            download: track.download.clone().unwrap_or_default(),
            notes: track.notes.clone().unwrap_or_default(),
        }
    }

    /// Convert to a track. Unparsable codes become 0.
    pub fn to_track(&self) -> Track {
        let optional = |text: &str| Some(text.trim().to_string()).filter(|t| !t.is_empty());
        Track {
            version: self.version.trim().to_string(),
            code: parse_code(&self.code),
            date: optional(&self.date),
            url: optional(&self.url),
            download: optional(&self.download),
            notes: optional(&self.notes),
        }
    }
}

/// An app as shown in an editor form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppDraft {
    /// Id of the app being edited; `None` for a draft that creates a new app
    pub original_id: Option<String>,
    pub id: String,
    pub name: String,
    pub stable: TrackFields,
    pub beta: TrackFields,
    pub history: Vec<RawEntry>,
}

impl AppDraft {
    /// Start editing an existing app.
    pub fn from_app(app: &App) -> Self {
        Self {
            original_id: Some(app.id.clone()),
            id: app.id.clone(),
            name: app.name.clone(),
            stable: TrackFields::from_track(app.tracks.stable.as_ref()),
            beta: TrackFields::from_track(app.tracks.beta.as_ref()),
            history: app.history.iter().map(RawEntry::from).collect(),
        }
    }

    /// Convert the form into a full app replacement.
    pub fn to_patch(&self) -> AppPatch {
        AppPatch {
            id: self.id.clone(),
            name: self.name.clone(),
            stable: Some(self.stable.to_track()),
            beta: Some(self.beta.to_track()),
            history: self.history.clone(),
        }
    }
}

/// Everything not yet persisted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PendingChanges {
    /// Form edits not yet applied to the manifest
    pub draft: Option<AppDraft>,
    /// Manifest changes not yet saved or committed
    pub unsaved: bool,
}

impl PendingChanges {
    /// Whether there is anything to lose
    pub fn is_dirty(&self) -> bool {
        self.unsaved || self.draft.is_some()
    }
}

/// The editing context of one manifest.
#[derive(Debug, Clone, Default)]
pub struct Session {
    manifest: Manifest,
    selected: Option<String>,
    pending: PendingChanges,
}

impl Session {
    /// Start with an empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing manifest, with nothing unsaved.
    pub fn from_manifest(manifest: Manifest) -> Self {
        Self {
            manifest,
            ..Self::default()
        }
    }

    /// The manifest being edited
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// The selected app, if any
    pub fn selected(&self) -> Option<&App> {
        self.selected
            .as_deref()
            .and_then(|id| self.manifest.find_app(id))
    }

    /// Id of the selected app
    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Select an app by id.
    pub fn select(&mut self, id: &str) -> Result<&App> {
        if !self.manifest.contains_app(id) {
            return Err(RelmanError::AppNotFound(id.to_string()));
        }
        self.selected = Some(id.to_string());
        self.find(id)
    }

    /// Pending draft and dirty flag
    pub fn pending(&self) -> &PendingChanges {
        &self.pending
    }

    /// Whether a draft is staged or the manifest has unsaved changes
    pub fn has_unsaved_changes(&self) -> bool {
        self.pending.is_dirty()
    }

    /// Add a new app and select it.
    pub fn add_app(&mut self, name: Option<&str>) -> &App {
        let id = self.manifest.add_app(name).id.clone();
        self.pending.unsaved = true;
        self.selected = Some(id);
        &self.manifest.apps[self.manifest.apps.len() - 1]
    }

    /// Duplicate an app and select the copy.
    pub fn duplicate_app(&mut self, id: &str) -> Result<&App> {
        let new_id = self
            .manifest
            .duplicate_app(id)
            .map(|app| app.id.clone())
            .ok_or_else(|| RelmanError::AppNotFound(id.to_string()))?;
        self.pending.unsaved = true;
        self.selected = Some(new_id);
        Ok(&self.manifest.apps[self.manifest.apps.len() - 1])
    }

    /// Remove an app, dropping its selection and any draft editing it.
    pub fn remove_app(&mut self, id: &str) -> Result<()> {
        if !self.manifest.remove_app(id) {
            return Err(RelmanError::AppNotFound(id.to_string()));
        }
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        let edits_removed = self
            .pending
            .draft
            .as_ref()
            .is_some_and(|draft| draft.original_id.as_deref() == Some(id));
        if edits_removed {
            self.pending.draft = None;
        }
        self.pending.unsaved = true;
        Ok(())
    }

    /// Set the manifest contact address.
    pub fn set_contact(&mut self, contact: &str) {
        let contact = contact.trim();
        if self.manifest.contact != contact {
            self.manifest.contact = contact.to_string();
            self.pending.unsaved = true;
        }
    }

    /// Record form edits without touching the manifest.
    pub fn stage(&mut self, draft: AppDraft) {
        self.pending.draft = Some(draft);
    }

    /// Drop staged form edits, returning them.
    pub fn discard(&mut self) -> Option<AppDraft> {
        self.pending.draft.take()
    }

    /// Apply the staged draft to the manifest and return the app's id.
    ///
    /// The draft is not validated; run [`crate::validate::validate_draft`]
    /// first when the caller wants to refuse bad input. A draft without an
    /// original id appends a new app.
    pub fn apply(&mut self) -> Result<String> {
        let draft = self.pending.draft.take().ok_or(RelmanError::NoDraft)?;
        let patch = draft.to_patch();

        let id = match draft.original_id.clone() {
            Some(original) => {
                if !self.manifest.update_app(&original, patch) {
                    self.pending.draft = Some(draft);
                    return Err(RelmanError::AppNotFound(original));
                }
                let id = draft.id.trim().to_string();
                if self.selected.as_deref() == Some(original.as_str()) {
                    self.selected = Some(id.clone());
                }
                id
            }
            None => {
                let app = patch.into_app();
                let id = app.id.clone();
                self.manifest.apps.push(app);
                self.selected = Some(id.clone());
                id
            }
        };

        log::debug!("applied draft to app '{}'", id);
        self.pending.unsaved = true;
        Ok(id)
    }

    /// Replace the manifest with one parsed from `text`.
    ///
    /// A parse error leaves the session untouched. A session that also syncs
    /// should use [`Session::open_text_detached`].
    pub fn open_text(&mut self, text: &str, origin: &str) -> Result<()> {
        let manifest = Manifest::from_json(text, origin)?;
        self.replace(manifest);
        Ok(())
    }

    /// Replace the manifest with the contents of a local file.
    pub fn open_file(&mut self, fs: &dyn FileSystem, path: &Path) -> Result<()> {
        let text = fs.read_to_string(path).map_err(|source| RelmanError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        self.open_text(&text, &path.display().to_string())
    }

    /// Open local text in place of the manifest `coordinator` last synced.
    ///
    /// On success the coordinator forgets its revision, so the next push
    /// creates the remote file instead of writing over a revision this
    /// manifest was never based on.
    pub fn open_text_detached<P: RemoteFileProvider>(
        &mut self,
        text: &str,
        origin: &str,
        coordinator: &SyncCoordinator<P>,
    ) -> Result<()> {
        self.open_text(text, origin)?;
        coordinator.detach();
        Ok(())
    }

    /// [`Session::open_file`] that also detaches `coordinator`.
    pub fn open_file_detached<P: RemoteFileProvider>(
        &mut self,
        fs: &dyn FileSystem,
        path: &Path,
        coordinator: &SyncCoordinator<P>,
    ) -> Result<()> {
        self.open_file(fs, path)?;
        coordinator.detach();
        Ok(())
    }

    /// Apply any staged draft, stamp `generated` and serialize.
    pub fn prepare_for_save(&mut self) -> Result<String> {
        if self.pending.draft.is_some() {
            self.apply()?;
        }
        self.manifest.stamp_generated();
        self.manifest.to_json()
    }

    /// Write the manifest to a local file and mark the session clean.
    pub fn save_to_file(&mut self, fs: &dyn FileSystem, path: &Path) -> Result<()> {
        let text = self.prepare_for_save()?;
        fs.write_file(path, &text)
            .map_err(|source| RelmanError::FileWrite {
                path: path.to_path_buf(),
                source,
            })?;
        log::info!("saved manifest to {}", path.display());
        self.pending.unsaved = false;
        Ok(())
    }

    /// Fetch the remote manifest and make it the session's manifest.
    ///
    /// Returns the fetched SHA. On failure nothing changes.
    pub async fn pull<P: RemoteFileProvider>(
        &mut self,
        coordinator: &SyncCoordinator<P>,
        target: &RemoteRef,
    ) -> Result<String> {
        let fetched = coordinator.fetch(target).await?;
        self.replace(fetched.manifest);
        Ok(fetched.sha)
    }

    /// Apply any staged draft and commit the manifest.
    ///
    /// The commit carries a freshly stamped copy; the stamp is adopted and the
    /// session marked clean only when the commit succeeds.
    pub async fn push<P: RemoteFileProvider>(
        &mut self,
        coordinator: &SyncCoordinator<P>,
        target: &RemoteRef,
        message: &str,
    ) -> Result<CommitReceipt> {
        if self.pending.draft.is_some() {
            self.apply()?;
        }

        let mut stamped = self.manifest.clone();
        stamped.stamp_generated();
        let receipt = coordinator.commit(target, &stamped, message).await?;

        self.manifest.generated = stamped.generated;
        self.pending.unsaved = false;
        Ok(receipt)
    }

    fn replace(&mut self, manifest: Manifest) {
        self.manifest = manifest;
        self.pending = PendingChanges::default();
        if !self
            .selected
            .as_deref()
            .is_some_and(|id| self.manifest.contains_app(id))
        {
            self.selected = None;
        }
    }

    fn find(&self, id: &str) -> Result<&App> {
        self.manifest
            .find_app(id)
            .ok_or_else(|| RelmanError::AppNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFileSystem;

    const SAMPLE: &str = r#"{
  "schemaVersion": 1,
  "generated": "2024-01-01T00:00:00Z",
  "contact": "team@example.com",
  "apps": [
    {
      "id": "tool",
      "name": "Tool",
      "tracks": { "stable": { "version": "1.0.0", "code": 10, "date": "2024-01-01" } },
      "history": [ { "version": "1.0.0", "code": 10, "date": "2024-01-01", "url": "" } ]
    }
  ]
}"#;

    fn session() -> Session {
        let mut session = Session::new();
        session.open_text(SAMPLE, "sample").unwrap();
        session
    }

    #[test]
    fn test_open_text_marks_clean() {
        let session = session();
        assert!(!session.has_unsaved_changes());
        assert_eq!(session.manifest().apps.len(), 1);
    }

    #[test]
    fn test_open_text_parse_error_keeps_state() {
        let mut session = session();
        session.add_app(Some("Other"));
        let err = session.open_text("{", "broken.json").unwrap_err();
        assert!(err.to_string().contains("broken.json"));
        assert_eq!(session.manifest().apps.len(), 2);
        assert!(session.has_unsaved_changes());
    }

    #[test]
    fn test_stage_and_apply_draft() {
        let mut session = session();
        session.select("tool").unwrap();

        let mut draft = AppDraft::from_app(session.selected().unwrap());
        assert_eq!(draft.stable.code, "10");
        draft.id = "tool-pro".to_string();
        draft.stable.version = "1.1.0".to_string();
        draft.stable.code = "11".to_string();
        draft.stable.date = "2024-02-01".to_string();
        session.stage(draft);
        assert!(session.has_unsaved_changes());
        assert!(session.manifest().contains_app("tool"));

        assert_eq!(session.apply().unwrap(), "tool-pro");
        assert_eq!(session.selected_id(), Some("tool-pro"));
        let app = session.selected().unwrap();
        assert_eq!(app.history.len(), 2);
        assert_eq!(app.history[0].version, "1.1.0");
        assert!(session.pending().draft.is_none());
        assert!(session.pending().unsaved);
    }

    #[test]
    fn test_blank_beta_fields_drop_the_track() {
        let mut session = session();
        let app = session.manifest().find_app("tool").unwrap();
        let draft = AppDraft::from_app(app);
        assert_eq!(draft.beta, TrackFields::default());
        session.stage(draft);
        session.apply().unwrap();
        assert!(session.manifest().apps[0].tracks.beta.is_none());
    }

    #[test]
    fn test_apply_without_draft() {
        let mut session = session();
        assert!(matches!(session.apply(), Err(RelmanError::NoDraft)));
    }

    #[test]
    fn test_apply_new_app_draft() {
        let mut session = session();
        let mut draft = AppDraft::default();
        draft.id = "viewer".to_string();
        draft.name = "Viewer".to_string();
        draft.stable.version = "0.1.0".to_string();
        session.stage(draft);
        assert_eq!(session.apply().unwrap(), "viewer");
        assert_eq!(session.manifest().app_ids(), vec!["tool", "viewer"]);
    }

    #[test]
    fn test_apply_to_removed_app_keeps_draft() {
        let mut session = session();
        let mut draft = AppDraft::from_app(session.manifest().find_app("tool").unwrap());
        draft.original_id = Some("gone".to_string());
        session.stage(draft);
        assert!(matches!(session.apply(), Err(RelmanError::AppNotFound(_))));
        assert!(session.pending().draft.is_some());
    }

    #[test]
    fn test_discard() {
        let mut session = session();
        session.stage(AppDraft::from_app(session.manifest().find_app("tool").unwrap()));
        assert!(session.discard().is_some());
        assert!(!session.has_unsaved_changes());
    }

    #[test]
    fn test_remove_selected_app_clears_selection_and_draft() {
        let mut session = session();
        session.select("tool").unwrap();
        session.stage(AppDraft::from_app(session.selected().unwrap()));

        session.remove_app("tool").unwrap();
        assert!(session.selected().is_none());
        assert!(session.pending().draft.is_none());
        assert!(session.pending().unsaved);
        assert!(matches!(
            session.remove_app("tool"),
            Err(RelmanError::AppNotFound(_))
        ));
    }

    #[test]
    fn test_add_and_duplicate_select_new_app() {
        let mut session = Session::new();
        assert_eq!(session.add_app(Some("Photo Booth")).id, "photo-booth");
        assert_eq!(session.selected_id(), Some("photo-booth"));
        assert_eq!(session.duplicate_app("photo-booth").unwrap().id, "photo-booth-copy");
        assert_eq!(session.selected_id(), Some("photo-booth-copy"));
        assert!(session.duplicate_app("missing").is_err());
    }

    #[test]
    fn test_prepare_for_save_applies_draft_and_stamps() {
        let mut session = session();
        let mut draft = AppDraft::from_app(session.manifest().find_app("tool").unwrap());
        draft.name = "Renamed".to_string();
        session.stage(draft);

        let json = session.prepare_for_save().unwrap();
        assert!(json.contains("\"Renamed\""));
        assert_ne!(session.manifest().generated, "2024-01-01T00:00:00Z");
        assert!(session.pending().draft.is_none());
    }

    #[test]
    fn test_save_and_open_file() {
        let fs = InMemoryFileSystem::new();
        let path = Path::new("/work/release-manifest.json");
        let mut session = session();
        session.set_contact("ops@example.com");
        assert!(session.has_unsaved_changes());

        session.save_to_file(&fs, path).unwrap();
        assert!(!session.has_unsaved_changes());

        let mut reopened = Session::new();
        reopened.open_file(&fs, path).unwrap();
        assert_eq!(reopened.manifest(), session.manifest());
    }

    #[test]
    fn test_open_missing_file() {
        let fs = InMemoryFileSystem::new();
        let mut session = Session::new();
        let err = session.open_file(&fs, Path::new("/nope.json")).unwrap_err();
        assert!(matches!(err, RelmanError::FileRead { .. }));
    }
}
