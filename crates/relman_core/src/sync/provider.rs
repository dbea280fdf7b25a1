//! Remote file endpoint abstraction.
//!
//! The core never speaks HTTP itself. A provider exposes one remote file with
//! read-by-ref and compare-and-swap write semantics, the way the GitHub
//! contents API does.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use super::RemoteRef;
use crate::error::RelmanError;

/// A boxed future for object-safe async methods.
///
/// On native targets, futures are `Send` for compatibility with multi-threaded runtimes.
#[cfg(not(target_arch = "wasm32"))]
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A boxed future for object-safe async methods.
///
/// WASM version without `Send` requirement - JavaScript is single-threaded.
#[cfg(target_arch = "wasm32")]
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// How a provider encoded the file content it returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentEncoding {
    /// Base64, possibly wrapped with newlines
    Base64,
    /// Plain UTF-8 text
    #[serde(alias = "utf8", rename = "utf-8")]
    Utf8,
    /// Content omitted by the provider (e.g. files over the API size limit)
    None,
}

/// A file as returned by the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Encoded content
    pub content: String,
    /// Encoding of `content`
    pub encoding: ContentEncoding,
    /// Content hash identifying this revision
    pub sha: String,
}

/// A whole-file write request.
#[derive(Debug, Clone, Copy)]
pub struct PutFile<'a> {
    /// Plain-text content; providers apply their own transport encoding
    pub content: &'a str,
    /// Hash the write is based on; `None` creates the file
    pub base_sha: Option<&'a str>,
    /// Commit message
    pub message: &'a str,
}

/// Failures reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The base hash no longer matches the remote file
    Conflict,
    /// Missing or rejected credential
    Unauthorized(String),
    /// Credential lacks permission for the file
    Forbidden(String),
    /// Repository, branch or path does not exist
    NotFound,
    /// Any other non-success response
    Status { code: u16, message: String },
    /// Network, DNS or protocol failure
    Transport(String),
}

impl RemoteError {
    /// Convert to a core error, naming the file for conflicts.
    pub fn into_error(self, target: &RemoteRef) -> RelmanError {
        match self {
            RemoteError::Conflict => RelmanError::Conflict {
                path: target.path.clone(),
            },
            RemoteError::Unauthorized(message) => RelmanError::Unauthorized(message),
            RemoteError::Forbidden(message) => {
                RelmanError::Unauthorized(format!("insufficient permissions ({})", message))
            }
            RemoteError::NotFound => RelmanError::Remote(format!("{} not found", target)),
            RemoteError::Status { code, message } => {
                RelmanError::Remote(format!("HTTP {}: {}", code, message))
            }
            RemoteError::Transport(message) => RelmanError::Remote(message),
        }
    }
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteError::Conflict => write!(f, "conflict"),
            RemoteError::Unauthorized(m) => write!(f, "unauthorized: {}", m),
            RemoteError::Forbidden(m) => write!(f, "forbidden: {}", m),
            RemoteError::NotFound => write!(f, "not found"),
            RemoteError::Status { code, message } => write!(f, "HTTP {}: {}", code, message),
            RemoteError::Transport(m) => write!(f, "{}", m),
        }
    }
}

/// A single-file remote endpoint with optimistic concurrency.
pub trait RemoteFileProvider: Send + Sync {
    /// Human-readable name for this provider
    fn name(&self) -> &str;

    /// Read the file at `target`.
    fn get_file<'a>(&'a self, target: &'a RemoteRef) -> BoxFuture<'a, Result<RemoteFile, RemoteError>>;

    /// Replace the file at `target`, returning the new content hash.
    ///
    /// Must fail with [`RemoteError::Conflict`] when `request.base_sha` is stale.
    fn put_file<'a>(
        &'a self,
        target: &'a RemoteRef,
        request: PutFile<'a>,
    ) -> BoxFuture<'a, Result<String, RemoteError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_mapping() {
        let target: RemoteRef = "acme/site:releases.json".parse().unwrap();
        assert!(RemoteError::Conflict.into_error(&target).is_conflict());
        assert!(matches!(
            RemoteError::Forbidden("read-only token".to_string()).into_error(&target),
            RelmanError::Unauthorized(_)
        ));
        let err = RemoteError::NotFound.into_error(&target);
        assert!(err.to_string().contains("acme/site@main:releases.json"));
    }

    #[test]
    fn test_content_encoding_names() {
        let enc: ContentEncoding = serde_json::from_str("\"base64\"").unwrap();
        assert_eq!(enc, ContentEncoding::Base64);
        let enc: ContentEncoding = serde_json::from_str("\"utf-8\"").unwrap();
        assert_eq!(enc, ContentEncoding::Utf8);
        let enc: ContentEncoding = serde_json::from_str("\"none\"").unwrap();
        assert_eq!(enc, ContentEncoding::None);
    }
}
