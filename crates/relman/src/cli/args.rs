//! Command-line argument structures and enums

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use relman_core::TrackKind;

#[derive(Parser)]
#[command(name = "relman")]
#[command(version)]
#[command(about = "Edit a release manifest and commit it to a GitHub repository", long_about = None)]
pub struct Cli {
    /// Local working copy (default: config's working_file)
    #[arg(short, long, global = true)]
    pub file: Option<PathBuf>,

    /// Remote manifest as owner/repo[@branch]:path (default: config's remote)
    #[arg(short, long, global = true)]
    pub remote: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize relman configuration
    Init {
        /// Remote manifest as owner/repo[@branch]:path
        remote: String,

        /// Contact written into new manifests
        #[arg(short, long)]
        contact: Option<String>,

        /// GitHub API root (for GitHub Enterprise)
        #[arg(long)]
        api_base_url: Option<String>,

        /// Local working copy path
        #[arg(short, long)]
        working_file: Option<PathBuf>,
    },

    /// Show or change configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },

    /// Manage the GitHub token
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },

    /// Download the remote manifest into the working copy
    Fetch {
        /// Overwrite a working copy that has local edits
        #[arg(long)]
        force: bool,
    },

    /// Show working copy, remote and validation status
    Status,

    /// Validate the working copy
    Validate,

    /// Manage apps in the working copy
    #[command(alias = "a")]
    App {
        #[command(subcommand)]
        command: AppCommands,
    },

    /// Validate and commit the working copy to the remote
    Commit {
        /// Commit message (default: config's commit_message)
        #[arg(short, long)]
        message: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// One of: remote, api-base-url, contact, commit-message, working-file
        key: String,

        /// New value (empty to unset optional values)
        value: String,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Store a token in the config file (reads stdin when omitted)
    SetToken {
        /// GitHub personal access token
        token: Option<String>,
    },

    /// Show which token is used and who it belongs to
    Status,
}

#[derive(Subcommand)]
pub enum AppCommands {
    /// List apps
    #[command(alias = "ls")]
    List,

    /// Add an app
    Add {
        /// Display name (the id is derived from it)
        name: Option<String>,
    },

    /// Duplicate an app
    Duplicate {
        /// Id of the app to copy
        id: String,
    },

    /// Remove an app
    #[command(alias = "rm")]
    Remove {
        /// App id
        id: String,
    },

    /// Show an app's tracks and history
    Show {
        /// App id
        id: String,
    },

    /// Change an app's id or name
    Edit {
        /// App id
        id: String,

        /// New id
        #[arg(long = "id")]
        new_id: Option<String>,

        /// New display name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Set fields of a release track
    Track {
        /// App id
        id: String,

        /// Which track to edit
        #[arg(value_enum)]
        track: TrackArg,

        /// Version (e.g. 1.2.3)
        #[arg(short, long)]
        version: Option<String>,

        /// Build code
        #[arg(short, long)]
        code: Option<String>,

        /// Release date (YYYY-MM-DD, or "today")
        #[arg(short, long)]
        date: Option<String>,

        /// Release notes / landing page URL
        #[arg(short, long)]
        url: Option<String>,

        /// Direct download URL
        #[arg(long)]
        download: Option<String>,

        /// Release notes text
        #[arg(long)]
        notes: Option<String>,

        /// Remove the track entirely
        #[arg(long, conflicts_with_all = ["version", "code", "date", "url", "download", "notes"])]
        clear: bool,
    },

    /// Show or edit an app's release history
    History {
        /// App id
        id: String,

        #[command(subcommand)]
        command: Option<HistoryCommands>,
    },
}

#[derive(Subcommand)]
pub enum HistoryCommands {
    /// Add a past release
    Add {
        /// Version
        version: String,

        /// Build code
        #[arg(short, long)]
        code: Option<String>,

        /// Release date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,

        /// Release URL
        #[arg(short, long)]
        url: Option<String>,
    },

    /// Remove a past release by version
    #[command(alias = "rm")]
    Remove {
        /// Version to remove
        version: String,
    },
}

/// Release track selector
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TrackArg {
    Stable,
    Beta,
}

impl From<TrackArg> for TrackKind {
    fn from(arg: TrackArg) -> Self {
        match arg {
            TrackArg::Stable => TrackKind::Stable,
            TrackArg::Beta => TrackKind::Beta,
        }
    }
}
