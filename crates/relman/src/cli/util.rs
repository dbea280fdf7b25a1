//! Shared utilities for CLI commands

use std::path::{Path, PathBuf};

use relman_core::config::Config;
use relman_core::credentials::{
    ConfigCredentials, Credential, EnvCredentials, resolve_credential,
};
use relman_core::error::{RelmanError, Result};
use relman_core::fs::{FileSystem, RealFileSystem};
use relman_core::sync::SyncRecord;
use relman_core::{RemoteRef, Session};

use crate::cli::github::GitHubContents;

/// Settings every command resolves the same way: config file plus overrides.
pub struct CliContext {
    pub config: Config,
    pub file: PathBuf,
    remote_override: Option<String>,
}

impl CliContext {
    /// Combine the loaded config with `--file` / `--remote` overrides.
    pub fn new(config: Config, file: Option<PathBuf>, remote: Option<String>) -> Self {
        let file = file.unwrap_or_else(|| config.working_file.clone());
        Self {
            config,
            file,
            remote_override: remote,
        }
    }

    /// The remote to talk to
    pub fn remote(&self) -> Result<RemoteRef> {
        match &self.remote_override {
            Some(text) => text.parse(),
            None => self.config.require_remote().cloned(),
        }
    }

    /// Whether a working copy exists
    pub fn has_working_copy(&self) -> bool {
        RealFileSystem.exists(&self.file)
    }

    /// Read the working copy text
    pub fn read_working_copy(&self) -> Result<String> {
        RealFileSystem
            .read_to_string(&self.file)
            .map_err(|source| RelmanError::FileRead {
                path: self.file.clone(),
                source,
            })
    }

    /// Open the working copy in a session.
    pub fn open_session(&self) -> Result<Session> {
        let mut session = Session::new();
        session.open_file(&RealFileSystem, &self.file)?;
        Ok(session)
    }

    /// Save the session to the working copy.
    pub fn save_session(&self, session: &mut Session) -> Result<()> {
        ensure_parent(&self.file)?;
        session.save_to_file(&RealFileSystem, &self.file)
    }

    /// Write `content` to the working copy as-is.
    pub fn write_working_copy(&self, content: &str) -> Result<()> {
        ensure_parent(&self.file)?;
        RealFileSystem
            .write_file(&self.file, content)
            .map_err(|source| RelmanError::FileWrite {
                path: self.file.clone(),
                source,
            })
    }

    /// Load the sync record of the working copy
    pub fn load_record(&self) -> Result<Option<SyncRecord>> {
        SyncRecord::load_for(&RealFileSystem, &self.file)
    }

    /// Save the sync record of the working copy
    pub fn save_record(&self, record: &SyncRecord) -> Result<()> {
        record.save_for(&RealFileSystem, &self.file)
    }

    /// The token to use, from the environment or the config file.
    pub fn credential(&self) -> Result<Credential> {
        let mut config = self.config.clone();
        let env = EnvCredentials::new();
        let stored = ConfigCredentials::new(&mut config);
        resolve_credential(&[&env, &stored])
    }

    /// A GitHub provider authenticated with [`CliContext::credential`].
    pub fn provider(&self) -> Result<GitHubContents> {
        let credential = self.credential()?;
        log::debug!("using token from {}", credential.source);
        GitHubContents::new(&self.config.api_base_url, &credential.token)
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        RealFileSystem.create_dir_all(parent)?;
    }
    Ok(())
}

/// Load config, reporting failure to the user.
pub fn load_config() -> Option<Config> {
    match Config::load() {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("✗ Error loading config: {}", e);
            None
        }
    }
}

/// Print an error with follow-up hints for the common cases.
pub fn report_error(context: &str, err: &RelmanError) {
    eprintln!("✗ {}: {}", context, err);
    match err {
        RelmanError::ValidationFailed(issues) => print_issues(issues),
        RelmanError::Conflict { .. } => {
            eprintln!();
            eprintln!("The remote file changed since your last fetch.");
            eprintln!("Save your edits elsewhere, run 'relman fetch --force', reapply them and commit again.");
        }
        RelmanError::MissingCredential | RelmanError::Unauthorized(_) => {
            eprintln!();
            eprintln!("Set a token with 'relman auth set-token' or the RELMAN_GITHUB_TOKEN variable.");
        }
        RelmanError::FileRead { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
            eprintln!();
            eprintln!("Run 'relman fetch' to download the manifest first.");
        }
        _ => {}
    }
}

/// Print validation issues, one per line.
pub fn print_issues(issues: &[String]) {
    for issue in issues {
        eprintln!("  - {}", issue);
    }
}

/// Read a single line from stdin (for secrets not passed as arguments).
pub fn read_line(prompt: &str) -> Option<String> {
    use std::io::{self, Write};

    eprint!("{}", prompt);
    io::stderr().flush().ok()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input).ok()?;
    Some(input.trim().to_string()).filter(|s| !s.is_empty())
}
