use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::sync::SyncPhase;

/// Unified error type for relman operations
#[derive(Debug, Error)]
pub enum RelmanError {
    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    // Manifest (de)serialization errors
    #[error("Failed to parse manifest from {origin}: {source}")]
    Parse {
        origin: String,
        source: serde_json::Error,
    },

    #[error("Failed to serialize manifest: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Failed to decode remote content: {0}")]
    Decode(String),

    // Validation gate
    #[error("Manifest has {} validation issue(s); fix them before committing", .0.len())]
    ValidationFailed(Vec<String>),

    // Remote errors
    #[error(
        "Remote file '{path}' changed since it was last fetched. Fetch the latest manifest, then retry the commit"
    )]
    Conflict { path: String },

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Remote request failed: {0}")]
    Remote(String),

    #[error("A {0} is already in progress")]
    SyncBusy(SyncPhase),

    #[error("Invalid remote reference '{0}'. Expected owner/repo[@branch]:path")]
    InvalidRemoteRef(String),

    #[error("No remote configured. Run 'relman init owner/repo[@branch]:path' or pass --remote")]
    RemoteNotConfigured,

    #[error("No GitHub token found. Set RELMAN_GITHUB_TOKEN or run 'relman auth set-token'")]
    MissingCredential,

    // Config errors
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,

    // Session errors
    #[error("App '{0}' not found")]
    AppNotFound(String),

    #[error("No pending draft to apply")]
    NoDraft,
}

/// Result type alias for relman operations
pub type Result<T> = std::result::Result<T, RelmanError>;

/// A serializable representation of RelmanError for IPC (e.g., a desktop shell)
#[derive(Debug, Clone, Serialize)]
pub struct SerializableError {
    /// Error kind/variant name
    pub kind: String,
    /// Human-readable error message
    pub message: String,
    /// Itemized validation issues (only for `ValidationFailed`)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

impl From<&RelmanError> for SerializableError {
    fn from(err: &RelmanError) -> Self {
        let kind = match err {
            RelmanError::Io(_) => "Io",
            RelmanError::FileRead { .. } => "FileRead",
            RelmanError::FileWrite { .. } => "FileWrite",
            RelmanError::Parse { .. } => "Parse",
            RelmanError::Serialize(_) => "Serialize",
            RelmanError::Decode(_) => "Decode",
            RelmanError::ValidationFailed(_) => "ValidationFailed",
            RelmanError::Conflict { .. } => "Conflict",
            RelmanError::Unauthorized(_) => "Unauthorized",
            RelmanError::Remote(_) => "Remote",
            RelmanError::SyncBusy(_) => "SyncBusy",
            RelmanError::InvalidRemoteRef(_) => "InvalidRemoteRef",
            RelmanError::RemoteNotConfigured => "RemoteNotConfigured",
            RelmanError::MissingCredential => "MissingCredential",
            RelmanError::ConfigParse(_) => "ConfigParse",
            RelmanError::ConfigSerialize(_) => "ConfigSerialize",
            RelmanError::NoConfigDir => "NoConfigDir",
            RelmanError::AppNotFound(_) => "AppNotFound",
            RelmanError::NoDraft => "NoDraft",
        }
        .to_string();

        let issues = match err {
            RelmanError::ValidationFailed(issues) => issues.clone(),
            _ => Vec::new(),
        };

        Self {
            kind,
            message: err.to_string(),
            issues,
        }
    }
}

impl From<RelmanError> for SerializableError {
    fn from(err: RelmanError) -> Self {
        SerializableError::from(&err)
    }
}

impl RelmanError {
    /// Convert to a serializable representation for IPC
    pub fn to_serializable(&self) -> SerializableError {
        SerializableError::from(self)
    }

    /// True when the caller should re-fetch before retrying.
    pub fn is_conflict(&self) -> bool {
        matches!(self, RelmanError::Conflict { .. })
    }
}
