//! In-memory remote for tests and offline use.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::provider::{BoxFuture, ContentEncoding, PutFile, RemoteError, RemoteFile, RemoteFileProvider};
use super::{RemoteRef, compute_content_hash};

/// Line width GitHub uses when wrapping base64 content.
const BASE64_LINE_WIDTH: usize = 60;

#[derive(Debug, Clone)]
struct StoredFile {
    content: String,
    sha: String,
}

/// A [`RemoteFileProvider`] backed by a map, with GitHub-like semantics.
///
/// Content is served base64-encoded and wrapped, writes are rejected with
/// [`RemoteError::Conflict`] when their base SHA is stale, and every call is
/// counted so tests can assert which requests were made.
#[derive(Debug, Default)]
pub struct InMemoryRemote {
    files: Mutex<HashMap<RemoteRef, StoredFile>>,
    failures: Mutex<VecDeque<RemoteError>>,
    get_calls: AtomicUsize,
    put_calls: AtomicUsize,
    put_bases: Mutex<Vec<Option<String>>>,
}

impl InMemoryRemote {
    /// Create an empty remote
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `content` at `target` as a third party would, returning its SHA.
    pub fn seed(&self, target: &RemoteRef, content: &str) -> String {
        let sha = compute_content_hash(content.as_bytes());
        self.lock_files().insert(
            target.clone(),
            StoredFile {
                content: content.to_string(),
                sha: sha.clone(),
            },
        );
        sha
    }

    /// Current plain-text content at `target`
    pub fn content(&self, target: &RemoteRef) -> Option<String> {
        self.lock_files().get(target).map(|f| f.content.clone())
    }

    /// Current SHA at `target`
    pub fn sha(&self, target: &RemoteRef) -> Option<String> {
        self.lock_files().get(target).map(|f| f.sha.clone())
    }

    /// Make the next call (get or put) fail with `error`.
    pub fn fail_next(&self, error: RemoteError) {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(error);
    }

    /// Number of `get_file` calls so far
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    /// Number of `put_file` calls so far
    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    /// Base SHA sent with each `put_file` call, oldest first
    pub fn put_bases(&self) -> Vec<Option<String>> {
        self.put_bases
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn take_failure(&self) -> Option<RemoteError> {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
    }

    fn lock_files(&self) -> MutexGuard<'_, HashMap<RemoteRef, StoredFile>> {
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read(&self, target: &RemoteRef) -> Result<RemoteFile, RemoteError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.take_failure() {
            return Err(error);
        }

        let files = self.lock_files();
        let stored = files.get(target).ok_or(RemoteError::NotFound)?;
        Ok(RemoteFile {
            content: wrap_base64(&STANDARD.encode(&stored.content)),
            encoding: ContentEncoding::Base64,
            sha: stored.sha.clone(),
        })
    }

    fn write(&self, target: &RemoteRef, request: PutFile<'_>) -> Result<String, RemoteError> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        self.put_bases
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.base_sha.map(str::to_string));
        if let Some(error) = self.take_failure() {
            return Err(error);
        }

        let mut files = self.lock_files();
        let current = files.get(target).map(|f| f.sha.as_str());
        match (current, request.base_sha) {
            (Some(current), Some(base)) if current == base => {}
            (None, None) => {}
            _ => return Err(RemoteError::Conflict),
        }

        let sha = compute_content_hash(request.content.as_bytes());
        log::debug!("in-memory commit to {}: {}", target, request.message);
        files.insert(
            target.clone(),
            StoredFile {
                content: request.content.to_string(),
                sha: sha.clone(),
            },
        );
        Ok(sha)
    }
}

impl RemoteFileProvider for InMemoryRemote {
    fn name(&self) -> &str {
        "in-memory"
    }

    fn get_file<'a>(&'a self, target: &'a RemoteRef) -> BoxFuture<'a, Result<RemoteFile, RemoteError>> {
        Box::pin(async move { self.read(target) })
    }

    fn put_file<'a>(
        &'a self,
        target: &'a RemoteRef,
        request: PutFile<'a>,
    ) -> BoxFuture<'a, Result<String, RemoteError>> {
        Box::pin(async move { self.write(target, request) })
    }
}

fn wrap_base64(encoded: &str) -> String {
    encoded
        .as_bytes()
        .chunks(BASE64_LINE_WIDTH)
        .map(|line| String::from_utf8_lossy(line).into_owned() + "\n")
        .collect()
}
