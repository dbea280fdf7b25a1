//! Authentication command handlers.
//!
//! Handles storing a GitHub token and checking which account it belongs to.

use relman_core::credentials::{ConfigCredentials, CredentialProvider, TOKEN_ENV_VARS};

use crate::cli::args::AuthCommands;
use crate::cli::util::{self, CliContext};

/// Scope a classic token needs to commit to a repository.
const REQUIRED_SCOPE: &str = "repo";

pub fn handle_auth_command(command: AuthCommands, ctx: &mut CliContext) -> bool {
    match command {
        AuthCommands::SetToken { token } => handle_set_token(ctx, token),
        AuthCommands::Status => handle_status(ctx),
    }
}

/// Store a token in the config file.
fn handle_set_token(ctx: &mut CliContext, token: Option<String>) -> bool {
    let Some(token) = token.or_else(|| util::read_line("GitHub token: ")) else {
        eprintln!("✗ No token given");
        return false;
    };

    let mut store = ConfigCredentials::new(&mut ctx.config);
    if let Err(e) = store.set(&token) {
        eprintln!("✗ {}", e);
        return false;
    }

    if let Err(e) = ctx.config.save() {
        eprintln!("✗ Error saving config: {}", e);
        return false;
    }

    println!("✓ Token stored in config file");
    if TOKEN_ENV_VARS.iter().any(|var| std::env::var_os(var).is_some()) {
        println!("  Note: a token in the environment takes precedence over the stored one.");
    }
    true
}

/// Show which token is in use and who it belongs to.
fn handle_status(ctx: &CliContext) -> bool {
    let credential = match ctx.credential() {
        Ok(c) => c,
        Err(e) => {
            util::report_error("Not authenticated", &e);
            return false;
        }
    };

    println!("Token: {} (from {})", credential.masked(), credential.source);

    let provider = match ctx.provider() {
        Ok(p) => p,
        Err(e) => {
            util::report_error("Could not create client", &e);
            return false;
        }
    };

    match provider.token_info() {
        Ok(info) => {
            match info.name {
                Some(name) => println!("✓ Authenticated as {} ({})", info.login, name),
                None => println!("✓ Authenticated as {}", info.login),
            }
            match info.scopes {
                Some(scopes) => {
                    let listed = if scopes.is_empty() {
                        "(none)".to_string()
                    } else {
                        scopes.join(", ")
                    };
                    println!("  Scopes: {}", listed);
                    if !scopes.iter().any(|s| s == REQUIRED_SCOPE || s == "public_repo") {
                        println!("  ⚠ Committing needs the '{}' scope", REQUIRED_SCOPE);
                    }
                }
                None => println!("  Scopes: fine-grained token (check repository permissions)"),
            }
            true
        }
        Err(e) => {
            eprintln!("✗ Token check failed: {}", e);
            false
        }
    }
}
