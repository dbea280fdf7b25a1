//! Remote sync command handlers.
//!
//! `fetch` and `commit` keep a sync record next to the working copy so the
//! next commit is checked against the revision the copy came from.

use chrono::Local;

use relman_core::sync::{SyncCoordinator, SyncRecord};
use relman_core::validate::validate;
use relman_core::{RemoteRef, Session};

use crate::cli::block_on;
use crate::cli::util::{self, CliContext};

/// Handle the fetch command
/// Returns true on success, false on error
pub fn handle_fetch(ctx: &CliContext, force: bool) -> bool {
    let remote = match ctx.remote() {
        Ok(r) => r,
        Err(e) => {
            util::report_error("No remote", &e);
            return false;
        }
    };

    if !force && has_local_changes(ctx, &remote) {
        eprintln!(
            "✗ {} has changes that were not committed",
            ctx.file.display()
        );
        eprintln!("  Commit them first, or run 'relman fetch --force' to discard them.");
        return false;
    }

    let provider = match ctx.provider() {
        Ok(p) => p,
        Err(e) => {
            util::report_error("Cannot fetch", &e);
            return false;
        }
    };
    let coordinator = SyncCoordinator::new(provider);
    let mut session = Session::new();

    println!("Fetching {}...", remote);
    let sha = match block_on(session.pull(&coordinator, &remote)) {
        Ok(sha) => sha,
        Err(e) => {
            util::report_error("Fetch failed", &e);
            return false;
        }
    };

    let text = match session.manifest().to_json() {
        Ok(t) => t,
        Err(e) => {
            util::report_error("Fetch failed", &e);
            return false;
        }
    };
    if let Err(e) = ctx.write_working_copy(&text) {
        util::report_error("Could not write working copy", &e);
        return false;
    }

    let mut record = SyncRecord::new(remote);
    record.mark_synced(&sha, &text);
    if let Err(e) = ctx.save_record(&record) {
        eprintln!("⚠ Could not save sync record: {}", e);
    }

    println!("✓ Fetched {} app(s) at {}", session.manifest().apps.len(), short_sha(&sha));
    println!("  Saved to {}", ctx.file.display());
    true
}

/// Handle the status command
pub fn handle_status(ctx: &CliContext) -> bool {
    match ctx.remote() {
        Ok(remote) => println!("Remote: {}", remote),
        Err(_) => println!("Remote: (not set, run 'relman init')"),
    }
    println!("Working copy: {}", ctx.file.display());

    if !ctx.has_working_copy() {
        println!("  (missing, run 'relman fetch')");
        return true;
    }

    let session = match ctx.open_session() {
        Ok(s) => s,
        Err(e) => {
            util::report_error("Could not read working copy", &e);
            return false;
        }
    };
    let manifest = session.manifest();
    println!("  Apps: {}", manifest.apps.len());
    if !manifest.generated.is_empty() {
        println!("  Generated: {}", manifest.generated);
    }

    match ctx.load_record() {
        Ok(Some(record)) => {
            match &record.sha {
                Some(sha) => println!("  Based on: {} ({})", short_sha(sha), record.remote),
                None => println!("  Based on: (nothing)"),
            }
            if let Some(last) = record.last_sync {
                println!(
                    "  Last sync: {}",
                    last.with_timezone(&Local).format("%Y-%m-%d %H:%M")
                );
            }
            let modified = ctx
                .read_working_copy()
                .map(|text| record.is_modified(&text))
                .unwrap_or(true);
            println!(
                "  Local changes: {}",
                if modified { "yes" } else { "none" }
            );
        }
        Ok(None) => println!("  Based on: (never fetched)"),
        Err(e) => eprintln!("⚠ Could not read sync record: {}", e),
    }

    let issues = validate(manifest);
    if issues.is_empty() {
        println!("✓ Valid");
    } else {
        println!("✗ {} validation issue(s), run 'relman validate'", issues.len());
    }
    true
}

/// Handle the validate command
/// Returns true when the working copy is valid
pub fn handle_validate(ctx: &CliContext) -> bool {
    let session = match ctx.open_session() {
        Ok(s) => s,
        Err(e) => {
            util::report_error("Could not read working copy", &e);
            return false;
        }
    };

    let issues = validate(session.manifest());
    if issues.is_empty() {
        println!(
            "✓ {} is valid ({} app(s))",
            ctx.file.display(),
            session.manifest().apps.len()
        );
        true
    } else {
        eprintln!("✗ {} issue(s) in {}", issues.len(), ctx.file.display());
        util::print_issues(&issues);
        false
    }
}

/// Handle the commit command
/// Returns true on success, false on error
pub fn handle_commit(ctx: &CliContext, message: Option<String>) -> bool {
    let remote = match ctx.remote() {
        Ok(r) => r,
        Err(e) => {
            util::report_error("No remote", &e);
            return false;
        }
    };
    let mut session = match ctx.open_session() {
        Ok(s) => s,
        Err(e) => {
            util::report_error("Could not read working copy", &e);
            return false;
        }
    };

    let baseline = match ctx.load_record() {
        Ok(record) => record.filter(|r| r.remote == remote).and_then(|r| r.sha),
        Err(e) => {
            util::report_error("Could not read sync record", &e);
            return false;
        }
    };
    if baseline.is_none() {
        println!("No fetched revision recorded; the commit will only succeed if {} does not exist yet.", remote.path);
    }

    if let Some(contact) = &ctx.config.default_contact
        && session.manifest().contact.is_empty()
    {
        session.set_contact(contact);
    }

    let provider = match ctx.provider() {
        Ok(p) => p,
        Err(e) => {
            util::report_error("Cannot commit", &e);
            return false;
        }
    };
    let coordinator = SyncCoordinator::with_sha(provider, baseline);
    let message = message.unwrap_or_else(|| ctx.config.commit_message.clone());

    println!("Committing to {}...", remote);
    let receipt = match block_on(session.push(&coordinator, &remote, &message)) {
        Ok(r) => r,
        Err(e) => {
            util::report_error("Commit failed", &e);
            return false;
        }
    };

    println!("✓ Committed {}", short_sha(&receipt.sha));
    finish_commit(ctx, &session, remote, &receipt.sha)
}

/// Write the stamped manifest back and move the baseline to the new revision.
fn finish_commit(ctx: &CliContext, session: &Session, remote: RemoteRef, sha: &str) -> bool {
    let text = match session.manifest().to_json() {
        Ok(t) => t,
        Err(e) => {
            util::report_error("Could not update working copy", &e);
            return false;
        }
    };
    if let Err(e) = ctx.write_working_copy(&text) {
        util::report_error("Could not update working copy", &e);
        return false;
    }

    let mut record = SyncRecord::new(remote);
    record.mark_synced(sha, &text);
    if let Err(e) = ctx.save_record(&record) {
        eprintln!("⚠ Could not save sync record: {}", e);
        eprintln!("  Run 'relman fetch --force' before the next commit.");
    }
    true
}

/// Whether the working copy differs from what the last fetch/commit wrote.
fn has_local_changes(ctx: &CliContext, remote: &RemoteRef) -> bool {
    if !ctx.has_working_copy() {
        return false;
    }
    let Ok(text) = ctx.read_working_copy() else {
        return true;
    };
    match ctx.load_record() {
        Ok(Some(record)) => record.remote != *remote || record.is_modified(&text),
        _ => true,
    }
}

fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use relman_core::config::Config;

    #[test]
    fn test_short_sha() {
        assert_eq!(short_sha("0123456789abcdef"), "0123456");
        assert_eq!(short_sha("abc"), "abc");
    }

    #[test]
    fn test_local_changes_detection() {
        let dir = tempfile::tempdir().unwrap();
        let remote: RemoteRef = "acme/site:releases.json".parse().unwrap();
        let ctx = CliContext::new(
            Config::new(remote.clone()),
            Some(dir.path().join("m.json")),
            None,
        );
        assert!(!has_local_changes(&ctx, &remote));

        ctx.write_working_copy("{}\n").unwrap();
        assert!(has_local_changes(&ctx, &remote));

        let mut record = SyncRecord::new(remote.clone());
        record.mark_synced("abc", "{}\n");
        ctx.save_record(&record).unwrap();
        assert!(!has_local_changes(&ctx, &remote));

        let other: RemoteRef = "acme/other:releases.json".parse().unwrap();
        assert!(has_local_changes(&ctx, &other));

        ctx.write_working_copy("{ }\n").unwrap();
        assert!(has_local_changes(&ctx, &remote));
    }
}
