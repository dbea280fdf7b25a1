//! Command execution handler.
//!
//! This module contains the implementation of the `execute()` method for
//! [`Session`]. It handles all command types and returns appropriate responses.

use crate::command::{AppSummary, Command, Response};
use crate::error::Result;
use crate::history::reconcile;
use crate::session::Session;
use crate::validate::{validate, validate_draft};

impl Session {
    /// Execute a command and return the response.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use relman_core::{Command, Response, Session};
    ///
    /// let response = session.execute(Command::Validate)?;
    /// if let Response::Issues(issues) = response {
    ///     for issue in issues {
    ///         println!("{}", issue);
    ///     }
    /// }
    /// ```
    pub fn execute(&mut self, command: Command) -> Result<Response> {
        match command {
            // === Manifest ===
            Command::GetManifest => Ok(Response::Manifest(self.manifest().clone())),

            Command::ListApps => Ok(Response::Apps(
                self.manifest().apps.iter().map(AppSummary::from).collect(),
            )),

            Command::OpenText { text, origin } => {
                self.open_text(&text, origin.as_deref().unwrap_or("input"))?;
                Ok(Response::Ok)
            }

            Command::PrepareSave => Ok(Response::String(self.prepare_for_save()?)),

            // === Apps ===
            Command::SelectApp { id } => Ok(Response::App(self.select(&id)?.clone())),

            Command::AddApp { name } => Ok(Response::App(self.add_app(name.as_deref()).clone())),

            Command::DuplicateApp { id } => Ok(Response::App(self.duplicate_app(&id)?.clone())),

            Command::RemoveApp { id } => {
                self.remove_app(&id)?;
                Ok(Response::Ok)
            }

            // === Drafts ===
            Command::StageDraft { draft } => {
                self.stage(draft);
                Ok(Response::Ok)
            }

            Command::DiscardDraft => {
                self.discard();
                Ok(Response::Ok)
            }

            Command::ApplyDraft => Ok(Response::String(self.apply()?)),

            Command::GetPending => Ok(Response::Pending(self.pending().clone())),

            // === Checks ===
            Command::Validate => Ok(Response::Issues(validate(self.manifest()))),

            Command::ValidateDraft { draft } => {
                Ok(Response::Issues(validate_draft(self.manifest(), &draft)))
            }

            Command::ReconcileHistory { entries, stable } => {
                Ok(Response::History(reconcile(&entries, stable.as_ref())))
            }
        }
    }
}
