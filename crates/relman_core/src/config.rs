//! Configuration types for relman.
//!
//! This module provides the [`Config`] struct which stores the remote the
//! manifest lives in and user preferences. Configuration is persisted as TOML
//! (typically at `~/.config/relman/config.toml` on Unix systems).
//!
//! # Key Configuration Fields
//!
//! - `remote`: The manifest file, as `owner/repo[@branch]:path`
//! - `api_base_url`: GitHub API root (override for GitHub Enterprise)
//! - `github_token`: Stored token, used when no environment token is set
//! - `working_file`: Local working copy of the manifest
//!
//! # Example
//!
//! ```ignore
//! use relman_core::config::Config;
//!
//! let mut config = Config::load()?;
//! config.remote = Some("acme/site:releases.json".parse()?);
//! config.save()?;
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RelmanError, Result};
use crate::fs::FileSystem;
use crate::sync::RemoteRef;

/// Default GitHub REST API root
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// Default commit message for manifest commits
pub const DEFAULT_COMMIT_MESSAGE: &str = "Update release manifest";

/// Default local working copy name
pub const DEFAULT_WORKING_FILE: &str = "release-manifest.json";

/// `Config` represents the parts of relman that the user can configure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// The remote manifest file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteRef>,

    /// GitHub API root URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Personal access token (environment variables take precedence)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,

    /// Contact written into new manifests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_contact: Option<String>,

    /// Message used for commits when none is given
    #[serde(default = "default_commit_message")]
    pub commit_message: String,

    /// Local working copy of the manifest
    #[serde(default = "default_working_file")]
    pub working_file: PathBuf,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_commit_message() -> String {
    DEFAULT_COMMIT_MESSAGE.to_string()
}

fn default_working_file() -> PathBuf {
    PathBuf::from(DEFAULT_WORKING_FILE)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote: None,
            api_base_url: default_api_base_url(),
            github_token: None,
            default_contact: None,
            commit_message: default_commit_message(),
            working_file: default_working_file(),
        }
    }
}

impl Config {
    /// Create a config pointing at `remote`
    pub fn new(remote: RemoteRef) -> Self {
        Self {
            remote: Some(remote),
            ..Self::default()
        }
    }

    /// The configured remote, or an error telling the user to set one.
    pub fn require_remote(&self) -> Result<&RemoteRef> {
        self.remote
            .as_ref()
            .ok_or(RelmanError::RemoteNotConfigured)
    }

    /// Load config from a specific path using a FileSystem.
    pub fn load_from(fs: &dyn FileSystem, path: &Path) -> Result<Self> {
        let contents = fs
            .read_to_string(path)
            .map_err(|e| RelmanError::FileRead {
                path: path.to_path_buf(),
                source: e,
            })?;

        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to a specific path using a FileSystem.
    pub fn save_to(&self, fs: &dyn FileSystem, path: &Path) -> Result<()> {
        // Create parent directory if needed
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs.create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs.write_file(path, &contents)
            .map_err(|e| RelmanError::FileWrite {
                path: path.to_path_buf(),
                source: e,
            })?;
        Ok(())
    }

    /// Load config from a FileSystem, returning default if not found.
    pub fn load_from_or_default(fs: &dyn FileSystem, path: &Path) -> Result<Self> {
        if !fs.exists(path) {
            return Ok(Self::default());
        }
        Self::load_from(fs, path)
    }
}

// ============================================================================
// Native-only implementation (not available in WASM)
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
impl Config {
    /// Get the config file path (~/.config/relman/config.toml)
    /// Only available on native platforms
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("relman").join("config.toml"))
    }

    /// Load config from default location, or return default if file doesn't exist
    /// Only available on native platforms
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from_or_default(&crate::fs::RealFileSystem, &path),
            None => Ok(Config::default()),
        }
    }

    /// Save config to default location
    /// Only available on native platforms
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or(RelmanError::NoConfigDir)?;
        self.save_to(&crate::fs::RealFileSystem, &path)
    }
}
