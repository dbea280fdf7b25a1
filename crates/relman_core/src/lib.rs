#![doc = include_str!("../README.md")]

/// Command pattern API (serializable operations for front ends)
pub mod command;

mod command_handler;

/// Configuration options
pub mod config;

/// Credential lookup (environment, config file)
pub mod credentials;

/// Entry normalization (single history rows)
pub mod entry;

/// Error (common error types)
pub mod error;

/// Filesystem abstraction
pub mod fs;

/// History reconciliation (merge, dedupe, sort)
pub mod history;

/// Manifest model and mutation operations
pub mod manifest;

/// Editing session (selection, drafts, dirty state)
pub mod session;

/// Remote sync (fetch/commit with optimistic concurrency)
pub mod sync;

/// Shared utilities
pub mod utils;

/// Validate (identifiers, versions, dates, links)
pub mod validate;

pub use command::{Command, Response};
pub use error::{RelmanError, Result, SerializableError};
pub use manifest::{App, HistoryEntry, Manifest, Track, TrackKind, Tracks};
pub use session::{AppDraft, PendingChanges, Session, TrackFields};
pub use sync::{RemoteRef, SyncCoordinator};
