//! App command handlers.
//!
//! Every edit goes through an [`AppDraft`], is checked with
//! [`validate_draft`] and only then applied and saved, the same path an
//! editor form takes.

use serde_json::Value;

use relman_core::command::AppSummary;
use relman_core::entry::RawEntry;
use relman_core::error::RelmanError;
use relman_core::utils::today_utc;
use relman_core::validate::validate_draft;
use relman_core::{App, AppDraft, Session, TrackFields, TrackKind};

use crate::cli::args::{AppCommands, HistoryCommands, TrackArg};
use crate::cli::util::{self, CliContext};

/// Field values given to `app track`.
struct TrackUpdate {
    version: Option<String>,
    code: Option<String>,
    date: Option<String>,
    url: Option<String>,
    download: Option<String>,
    notes: Option<String>,
    clear: bool,
}

pub fn handle_app_command(command: AppCommands, ctx: &CliContext) -> bool {
    match command {
        AppCommands::List => handle_list(ctx),
        AppCommands::Add { name } => handle_add(ctx, name.as_deref()),
        AppCommands::Duplicate { id } => handle_duplicate(ctx, &id),
        AppCommands::Remove { id } => handle_remove(ctx, &id),
        AppCommands::Show { id } => handle_show(ctx, &id),
        AppCommands::Edit { id, new_id, name } => {
            if new_id.is_none() && name.is_none() {
                eprintln!("⚠ Nothing to change (use --id or --name)");
                return false;
            }
            edit_app(ctx, &id, |draft| {
                if let Some(new_id) = new_id {
                    draft.id = new_id;
                }
                if let Some(name) = name {
                    draft.name = name;
                }
                Ok(())
            })
        }
        AppCommands::Track {
            id,
            track,
            version,
            code,
            date,
            url,
            download,
            notes,
            clear,
        } => {
            let update = TrackUpdate {
                version,
                code,
                date,
                url,
                download,
                notes,
                clear,
            };
            handle_track(ctx, &id, track, update)
        }
        AppCommands::History { id, command } => match command {
            None => handle_show_history(ctx, &id),
            Some(HistoryCommands::Add {
                version,
                code,
                date,
                url,
            }) => edit_app(ctx, &id, |draft| {
                add_history_row(draft, version, code, date, url);
                Ok(())
            }),
            Some(HistoryCommands::Remove { version }) => {
                edit_app(ctx, &id, |draft| remove_history_rows(draft, &version))
            }
        },
    }
}

fn open(ctx: &CliContext) -> Option<Session> {
    match ctx.open_session() {
        Ok(session) => Some(session),
        Err(e) => {
            util::report_error("Could not read working copy", &e);
            None
        }
    }
}

fn save(ctx: &CliContext, session: &mut Session) -> bool {
    match ctx.save_session(session) {
        Ok(()) => true,
        Err(e) => {
            util::report_error("Could not save working copy", &e);
            false
        }
    }
}

fn handle_list(ctx: &CliContext) -> bool {
    let Some(session) = open(ctx) else {
        return false;
    };
    let apps = &session.manifest().apps;
    if apps.is_empty() {
        println!("No apps. Add one with 'relman app add <name>'.");
        return true;
    }

    for summary in apps.iter().map(AppSummary::from) {
        let mut line = format!("{}  {}", summary.id, summary.name);
        if let Some(stable) = summary.stable {
            line.push_str(&format!("  stable {}", display_version(&stable)));
        }
        if let Some(beta) = summary.beta {
            line.push_str(&format!("  beta {}", display_version(&beta)));
        }
        println!("{}  ({} release(s))", line, summary.releases);
    }
    true
}

/// Add an app. Starts a new manifest when there is no working copy yet.
fn handle_add(ctx: &CliContext, name: Option<&str>) -> bool {
    let mut session = if ctx.has_working_copy() {
        match open(ctx) {
            Some(s) => s,
            None => return false,
        }
    } else {
        let mut session = Session::new();
        if let Some(contact) = &ctx.config.default_contact {
            session.set_contact(contact);
        }
        println!("Starting a new manifest at {}", ctx.file.display());
        session
    };

    let id = session.add_app(name).id.clone();
    if !save(ctx, &mut session) {
        return false;
    }
    println!("✓ Added app '{}'", id);
    true
}

fn handle_duplicate(ctx: &CliContext, id: &str) -> bool {
    let Some(mut session) = open(ctx) else {
        return false;
    };
    let new_id = match session.duplicate_app(id) {
        Ok(app) => app.id.clone(),
        Err(e) => {
            util::report_error("Cannot duplicate", &e);
            return false;
        }
    };
    if !save(ctx, &mut session) {
        return false;
    }
    println!("✓ Duplicated '{}' as '{}'", id, new_id);
    true
}

fn handle_remove(ctx: &CliContext, id: &str) -> bool {
    let Some(mut session) = open(ctx) else {
        return false;
    };
    if let Err(e) = session.remove_app(id) {
        util::report_error("Cannot remove", &e);
        return false;
    }
    if !save(ctx, &mut session) {
        return false;
    }
    println!("✓ Removed app '{}'", id);
    true
}

fn handle_show(ctx: &CliContext, id: &str) -> bool {
    let Some(session) = open(ctx) else {
        return false;
    };
    let Some(app) = find(&session, id) else {
        return false;
    };

    println!("{} ({})", app.name, app.id);
    for kind in [TrackKind::Stable, TrackKind::Beta] {
        match app.tracks.get(kind) {
            Some(track) => {
                println!("  {}: {} (code {})", kind, display_version(&track.version), track.code);
                for (label, value) in [
                    ("date", &track.date),
                    ("url", &track.url),
                    ("download", &track.download),
                    ("notes", &track.notes),
                ] {
                    if let Some(value) = value {
                        println!("    {}: {}", label, value);
                    }
                }
            }
            None => println!("  {}: (none)", kind),
        }
    }
    print_history(app);
    true
}

fn handle_show_history(ctx: &CliContext, id: &str) -> bool {
    let Some(session) = open(ctx) else {
        return false;
    };
    let Some(app) = find(&session, id) else {
        return false;
    };
    print_history(app);
    true
}

fn handle_track(ctx: &CliContext, id: &str, track: TrackArg, update: TrackUpdate) -> bool {
    let kind = TrackKind::from(track);
    let unchanged = !update.clear
        && update.version.is_none()
        && update.code.is_none()
        && update.date.is_none()
        && update.url.is_none()
        && update.download.is_none()
        && update.notes.is_none();
    if unchanged {
        eprintln!("⚠ Nothing to change (give at least one field, or --clear)");
        return false;
    }

    edit_app(ctx, id, |draft| {
        let fields = match kind {
            TrackKind::Stable => &mut draft.stable,
            TrackKind::Beta => &mut draft.beta,
        };
        apply_track_update(fields, update);
        Ok(())
    })
}

/// Load the app into a draft, let `change` edit it, validate, apply and save.
fn edit_app(
    ctx: &CliContext,
    id: &str,
    change: impl FnOnce(&mut AppDraft) -> Result<(), String>,
) -> bool {
    let Some(mut session) = open(ctx) else {
        return false;
    };
    let Some(app) = find(&session, id) else {
        return false;
    };

    let mut draft = AppDraft::from_app(app);
    if let Err(message) = change(&mut draft) {
        eprintln!("✗ {}", message);
        return false;
    }

    let issues = validate_draft(session.manifest(), &draft);
    if !issues.is_empty() {
        eprintln!("✗ Not saved, {} issue(s):", issues.len());
        util::print_issues(&issues);
        return false;
    }

    session.stage(draft);
    let new_id = match session.apply() {
        Ok(id) => id,
        Err(e) => {
            util::report_error("Cannot apply changes", &e);
            return false;
        }
    };
    if !save(ctx, &mut session) {
        return false;
    }
    println!("✓ Updated app '{}'", new_id);
    true
}

fn apply_track_update(fields: &mut TrackFields, update: TrackUpdate) {
    if update.clear {
        *fields = TrackFields::default();
        return;
    }
    let targets = [
        (&mut fields.version, update.version),
        (&mut fields.code, update.code),
        (&mut fields.url, update.url),
        (&mut fields.download, update.download),
        (&mut fields.notes, update.notes),
    ];
    for (field, value) in targets {
        if let Some(value) = value {
            *field = value;
        }
    }
    if let Some(date) = update.date {
        fields.date = if date.eq_ignore_ascii_case("today") {
            today_utc()
        } else {
            date
        };
    }
}

fn add_history_row(
    draft: &mut AppDraft,
    version: String,
    code: Option<String>,
    date: Option<String>,
    url: Option<String>,
) {
    let text = |value: Option<String>| value.map(Value::String).unwrap_or(Value::Null);
    draft.history.push(RawEntry {
        version: Value::String(version),
        code: text(code),
        date: text(date),
        url: text(url),
    });
}

fn remove_history_rows(draft: &mut AppDraft, version: &str) -> Result<(), String> {
    let version = version.trim();
    if !version.is_empty() && draft.stable.version.trim() == version {
        return Err(format!(
            "Release '{}' is the current stable version; change the stable track before removing it from history",
            version
        ));
    }
    let before = draft.history.len();
    draft
        .history
        .retain(|row| row.version.as_str().map(str::trim) != Some(version));
    if draft.history.len() == before {
        return Err(format!("No release '{}' in history", version));
    }
    Ok(())
}

fn find<'a>(session: &'a Session, id: &str) -> Option<&'a App> {
    let app = session.manifest().find_app(id);
    if app.is_none() {
        util::report_error("Unknown app", &RelmanError::AppNotFound(id.to_string()));
    }
    app
}

fn print_history(app: &App) {
    if app.history.is_empty() {
        println!("  history: (empty)");
        return;
    }
    println!("  history:");
    for entry in &app.history {
        let mut line = format!("    {}", display_version(&entry.version));
        if entry.code > 0 {
            line.push_str(&format!("  code {}", entry.code));
        }
        if !entry.date.is_empty() {
            line.push_str(&format!("  {}", entry.date));
        }
        if !entry.url.is_empty() {
            line.push_str(&format!("  {}", entry.url));
        }
        println!("{}", line);
    }
}

fn display_version(version: &str) -> &str {
    if version.is_empty() { "(no version)" } else { version }
}
