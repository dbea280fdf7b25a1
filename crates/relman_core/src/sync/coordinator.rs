//! Fetch/commit orchestration with SHA-based optimistic concurrency.

use std::sync::{Mutex, MutexGuard};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::provider::{ContentEncoding, PutFile, RemoteFile, RemoteFileProvider};
use super::{RemoteRef, SyncPhase};
use crate::error::{RelmanError, Result};
use crate::manifest::Manifest;
use crate::validate::validate;

/// A manifest read from the remote together with its revision.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedManifest {
    pub manifest: Manifest,
    pub sha: String,
}

/// Outcome of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    /// Revision created by the commit, now the recorded baseline
    pub sha: String,
}

#[derive(Debug, Default)]
struct SyncState {
    phase: SyncPhase,
    sha: Option<String>,
}

/// Coordinates reads and writes of one remote manifest file.
///
/// The coordinator remembers the SHA of the last revision it fetched or
/// committed and sends it as the base of the next write, so the remote
/// rejects a commit when someone else changed the file in between.
/// Only one fetch or commit runs at a time; overlapping requests fail with
/// [`RelmanError::SyncBusy`] without side effects.
pub struct SyncCoordinator<P: RemoteFileProvider> {
    provider: P,
    state: Mutex<SyncState>,
}

impl<P: RemoteFileProvider> SyncCoordinator<P> {
    /// Create a coordinator that is not associated with any remote revision.
    pub fn new(provider: P) -> Self {
        Self::with_sha(provider, None)
    }

    /// Create a coordinator resuming from a previously recorded revision.
    pub fn with_sha(provider: P, sha: Option<String>) -> Self {
        Self {
            provider,
            state: Mutex::new(SyncState {
                phase: SyncPhase::Idle,
                sha,
            }),
        }
    }

    /// The underlying provider
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The recorded revision, if any
    pub fn sha(&self) -> Option<String> {
        self.lock().sha.clone()
    }

    /// The current phase
    pub fn phase(&self) -> SyncPhase {
        self.lock().phase
    }

    /// Forget the recorded revision, e.g. after opening a local file.
    pub fn detach(&self) {
        self.lock().sha = None;
    }

    /// Read and parse the remote manifest, recording its SHA on success.
    pub async fn fetch(&self, target: &RemoteRef) -> Result<FetchedManifest> {
        let _phase = self.begin(SyncPhase::Fetching)?;
        log::debug!("fetching {} via {}", target, self.provider.name());

        let file = self
            .provider
            .get_file(target)
            .await
            .map_err(|e| e.into_error(target))?;
        let text = decode_content(&file)?;
        let manifest = Manifest::from_json(&text, &target.to_string())?;

        self.lock().sha = Some(file.sha.clone());
        log::info!(
            "fetched {} ({} apps, sha {})",
            target,
            manifest.apps.len(),
            file.sha
        );

        Ok(FetchedManifest {
            manifest,
            sha: file.sha,
        })
    }

    /// Validate, serialize and write the manifest on top of the recorded SHA.
    ///
    /// Nothing is sent when validation reports any issue.
    pub async fn commit(
        &self,
        target: &RemoteRef,
        manifest: &Manifest,
        message: &str,
    ) -> Result<CommitReceipt> {
        let _phase = self.begin(SyncPhase::Committing)?;

        let issues = validate(manifest);
        if !issues.is_empty() {
            log::warn!("refusing to commit {}: {} issue(s)", target, issues.len());
            return Err(RelmanError::ValidationFailed(issues));
        }

        let content = manifest.to_json()?;
        let base_sha = self.sha();
        let request = PutFile {
            content: &content,
            base_sha: base_sha.as_deref(),
            message,
        };

        let sha = match self.provider.put_file(target, request).await {
            Ok(sha) => sha,
            Err(e) => {
                let err = e.into_error(target);
                if err.is_conflict() {
                    log::warn!(
                        "commit to {} rejected: remote changed since {}",
                        target,
                        base_sha.as_deref().unwrap_or("(none)")
                    );
                }
                return Err(err);
            }
        };

        self.lock().sha = Some(sha.clone());
        log::info!("committed {} (sha {})", target, sha);
        Ok(CommitReceipt { sha })
    }

    fn begin(&self, phase: SyncPhase) -> Result<PhaseGuard<'_>> {
        let mut state = self.lock();
        if state.phase != SyncPhase::Idle {
            return Err(RelmanError::SyncBusy(state.phase));
        }
        state.phase = phase;
        Ok(PhaseGuard { state: &self.state })
    }

    fn lock(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Resets the phase to idle when the operation ends, however it ends.
struct PhaseGuard<'a> {
    state: &'a Mutex<SyncState>,
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.phase = SyncPhase::Idle;
    }
}

/// Decode a remote file body to text.
pub(crate) fn decode_content(file: &RemoteFile) -> Result<String> {
    let text = match file.encoding {
        ContentEncoding::Utf8 => file.content.clone(),
        ContentEncoding::Base64 => {
            let compact: String = file
                .content
                .chars()
                .filter(|c| !c.is_ascii_whitespace())
                .collect();
            let bytes = STANDARD
                .decode(compact)
                .map_err(|e| RelmanError::Decode(format!("invalid base64: {}", e)))?;
            String::from_utf8(bytes)
                .map_err(|e| RelmanError::Decode(format!("content is not UTF-8: {}", e)))?
        }
        ContentEncoding::None => {
            return Err(RelmanError::Decode(
                "the remote did not include the file content (file too large?)".to_string(),
            ));
        }
    };

    Ok(match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}
