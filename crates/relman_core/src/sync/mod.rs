//! Remote synchronization of the manifest file.
//!
//! # Architecture
//!
//! ```text
//! GitHub contents API (or any RemoteFileProvider)
//!         ↑↓  get_file / put_file(base_sha)
//!    SyncCoordinator (phase + recorded SHA)
//!         ↑↓
//!    Session (manifest, draft, dirty state)
//! ```
//!
//! # Key Components
//!
//! - [`RemoteRef`] - Addresses one file: `owner/repo[@branch]:path`
//! - [`RemoteFileProvider`] - Transport seam implemented by the front end
//! - [`SyncCoordinator`] - Fetch/commit with optimistic concurrency
//! - [`SyncRecord`] - Persisted baseline SHA between runs
//! - [`InMemoryRemote`] - Provider for tests and offline use

mod coordinator;
mod memory;
/// Remote provider trait and wire types
pub mod provider;
/// Persisted sync baseline
pub mod record;

pub use coordinator::{CommitReceipt, FetchedManifest, SyncCoordinator};
pub use memory::InMemoryRemote;
pub use provider::{
    BoxFuture, ContentEncoding, PutFile, RemoteError, RemoteFile, RemoteFileProvider,
};
pub use record::SyncRecord;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RelmanError;

/// Branch used when a remote reference does not name one.
pub const DEFAULT_BRANCH: &str = "main";

/// What the sync coordinator is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    /// No remote call in flight
    #[default]
    Idle,
    /// Reading the remote file
    Fetching,
    /// Writing the remote file
    Committing,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SyncPhase::Idle => "idle",
            SyncPhase::Fetching => "fetch",
            SyncPhase::Committing => "commit",
        })
    }
}

/// One file in one branch of one repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteRef {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// Path inside the repository, without a leading slash
    pub path: String,
}

impl RemoteRef {
    /// Create a reference on [`DEFAULT_BRANCH`].
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            branch: DEFAULT_BRANCH.to_string(),
            path: path.into(),
        }
    }

    /// Set the branch
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }
}

impl FromStr for RemoteRef {
    type Err = RelmanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RelmanError::InvalidRemoteRef(s.to_string());

        let (repo_part, path) = s.trim().split_once(':').ok_or_else(invalid)?;
        let path = path.trim().trim_start_matches('/');
        let (repo_part, branch) = match repo_part.split_once('@') {
            Some((repo_part, branch)) => (repo_part, branch.trim()),
            None => (repo_part, DEFAULT_BRANCH),
        };
        let (owner, repo) = repo_part.split_once('/').ok_or_else(invalid)?;
        let (owner, repo) = (owner.trim(), repo.trim());

        let bad = |part: &str| part.is_empty() || part.contains(char::is_whitespace);
        if bad(owner) || bad(repo) || repo.contains('/') || bad(branch) || path.is_empty() {
            return Err(invalid());
        }

        Ok(RemoteRef::new(owner, repo, path).with_branch(branch))
    }
}

impl fmt::Display for RemoteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}:{}", self.owner, self.repo, self.branch, self.path)
    }
}

impl Serialize for RemoteRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RemoteRef {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Compute a content hash usable as a revision id.
pub fn compute_content_hash(content: &[u8]) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}
