//! Command pattern API for front ends.
//!
//! Every synchronous session operation is reachable through one serializable
//! [`Command`] so that a GUI shell, an IPC bridge or a script can drive the
//! editor without linking against individual methods.
//!
//! # Usage
//!
//! ```ignore
//! use relman_core::{Command, Response, Session};
//!
//! let mut session = Session::new();
//! let response = session.execute(Command::AddApp { name: Some("Viewer".into()) })?;
//!
//! if let Response::App(app) = response {
//!     println!("Added {}", app.id);
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::entry::RawEntry;
use crate::manifest::{App, HistoryEntry, Manifest, Track};
use crate::session::{AppDraft, PendingChanges};

// ============================================================================
// Command Types
// ============================================================================

/// All commands that can be executed against a [`crate::Session`].
///
/// Commands are serializable for cross-runtime usage (IPC, scripting).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "params")]
pub enum Command {
    // === Manifest ===
    /// Get the whole manifest.
    GetManifest,

    /// List apps with their current versions.
    ListApps,

    /// Replace the manifest with parsed JSON text.
    OpenText {
        /// Manifest JSON.
        text: String,
        /// Name of the input, used in parse errors.
        #[serde(default)]
        origin: Option<String>,
    },

    /// Apply any draft, stamp `generated` and return the JSON text.
    PrepareSave,

    // === Apps ===
    /// Select an app for editing.
    SelectApp {
        /// App id.
        id: String,
    },

    /// Add a new app.
    AddApp {
        /// Display name; the id is derived from it.
        #[serde(default)]
        name: Option<String>,
    },

    /// Duplicate an app.
    DuplicateApp {
        /// Id of the app to copy.
        id: String,
    },

    /// Remove an app.
    RemoveApp {
        /// App id.
        id: String,
    },

    // === Drafts ===
    /// Stage form edits.
    StageDraft {
        /// The edited form.
        draft: AppDraft,
    },

    /// Drop staged form edits.
    DiscardDraft,

    /// Apply staged form edits to the manifest.
    ApplyDraft,

    /// Get the staged draft and dirty flag.
    GetPending,

    // === Checks ===
    /// Validate the whole manifest.
    Validate,

    /// Validate a draft as if it were applied.
    ValidateDraft {
        /// The edited form.
        draft: AppDraft,
    },

    /// Normalize, merge and sort history rows against a stable track.
    ReconcileHistory {
        /// Raw history rows.
        entries: Vec<RawEntry>,
        /// The stable track to merge in.
        #[serde(default)]
        stable: Option<Track>,
    },
}

// ============================================================================
// Response Types
// ============================================================================

/// Responses from command execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Response {
    /// Command completed successfully with no data.
    Ok,

    /// String response.
    String(String),

    /// Whole manifest response.
    Manifest(Manifest),

    /// Single app response.
    App(App),

    /// App list response.
    Apps(Vec<AppSummary>),

    /// Validation issues (empty when valid).
    Issues(Vec<String>),

    /// Reconciled history response.
    History(Vec<HistoryEntry>),

    /// Pending changes response.
    Pending(PendingChanges),
}

// ============================================================================
// Helper Types
// ============================================================================

/// One row of an app list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSummary {
    /// App id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Stable version, if the track exists.
    pub stable: Option<String>,
    /// Beta version, if the track exists.
    pub beta: Option<String>,
    /// Number of history entries.
    pub releases: usize,
}

impl From<&App> for AppSummary {
    fn from(app: &App) -> Self {
        Self {
            id: app.id.clone(),
            name: app.name.clone(),
            stable: app.tracks.stable.as_ref().map(|t| t.version.clone()),
            beta: app.tracks.beta.as_ref().map(|t| t.version.clone()),
            releases: app.history.len(),
        }
    }
}
