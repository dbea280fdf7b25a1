//! Sync record for resuming the optimistic concurrency baseline.
//!
//! The record is stored next to the local working copy so that a later run
//! commits on top of the revision this copy was fetched from, instead of
//! blindly overwriting whatever the remote holds now.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{RemoteRef, compute_content_hash};
use crate::error::{RelmanError, Result};
use crate::fs::FileSystem;

/// Suffix appended to the working file name to locate its record.
pub const RECORD_SUFFIX: &str = ".sync.json";

/// Which remote revision a local working copy corresponds to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRecord {
    /// Version of the record format for future compatibility
    pub version: u32,

    /// The remote file the working copy belongs to
    pub remote: RemoteRef,

    /// SHA of the remote revision last fetched or committed
    #[serde(default)]
    pub sha: Option<String>,

    /// When the last fetch or commit succeeded
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,

    /// Hash of the working copy as written by the last fetch or commit
    #[serde(default)]
    pub content_hash: Option<String>,
}

impl SyncRecord {
    /// Current record format version
    pub const CURRENT_VERSION: u32 = 1;

    /// Create a record with no baseline
    pub fn new(remote: RemoteRef) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            remote,
            sha: None,
            last_sync: None,
            content_hash: None,
        }
    }

    /// Record a successful fetch or commit that left `content` in the working copy
    pub fn mark_synced(&mut self, sha: impl Into<String>, content: &str) {
        self.sha = Some(sha.into());
        self.last_sync = Some(Utc::now());
        self.content_hash = Some(compute_content_hash(content.as_bytes()));
    }

    /// Check if the working copy changed since the last fetch or commit
    pub fn is_modified(&self, content: &str) -> bool {
        match &self.content_hash {
            None => true,
            Some(hash) => *hash != compute_content_hash(content.as_bytes()),
        }
    }

    /// Path of the record belonging to `working_file`
    pub fn path_for(working_file: &Path) -> PathBuf {
        let mut name = working_file.as_os_str().to_owned();
        name.push(RECORD_SUFFIX);
        PathBuf::from(name)
    }

    /// Load record from JSON string
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize record to JSON string
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load the record for `working_file`; `Ok(None)` when there is none.
    pub fn load_for(fs: &dyn FileSystem, working_file: &Path) -> Result<Option<Self>> {
        let path = Self::path_for(working_file);
        if !fs.exists(&path) {
            return Ok(None);
        }
        let content = fs.read_to_string(&path).map_err(|source| RelmanError::FileRead {
            path: path.clone(),
            source,
        })?;
        let record = Self::from_json(&content).map_err(|source| RelmanError::Parse {
            origin: path.display().to_string(),
            source,
        })?;
        Ok(Some(record))
    }

    /// Save the record next to `working_file`
    pub fn save_for(&self, fs: &dyn FileSystem, working_file: &Path) -> Result<()> {
        let path = Self::path_for(working_file);
        let content = self.to_json().map_err(RelmanError::Serialize)?;
        fs.write_file(&path, &content)
            .map_err(|source| RelmanError::FileWrite { path, source })
    }
}
