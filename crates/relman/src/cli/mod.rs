/// Clap argument definitions
mod args;

/// `app` command family (edit apps in the working copy)
mod app;

/// `auth` token management
mod auth;

/// `init` and `config` command handlers
mod config;

/// GitHub contents API provider
mod github;

/// `fetch`, `status`, `validate` and `commit` commands
mod sync;

/// Shared CLI utilities
mod util;

use clap::Parser;

pub use args::Cli;
use args::Commands;
use util::CliContext;

/// Helper to run async operations in sync context
fn block_on<F: std::future::Future>(f: F) -> F::Output {
    futures_lite::future::block_on(f)
}

/// Main entry point for the CLI
pub fn run_cli() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let (file, remote) = (cli.file, cli.remote);

    // Execute commands and track success
    let success = match cli.command {
        Commands::Init {
            remote,
            contact,
            api_base_url,
            working_file,
        } => config::handle_init(&remote, contact, api_base_url, working_file),

        Commands::Config { command } => with_context(file, remote, |ctx| {
            config::handle_config_command(command, ctx)
        }),

        Commands::Auth { command } => with_context(file, remote, |ctx| {
            auth::handle_auth_command(command, ctx)
        }),

        Commands::Fetch { force } => with_context(file, remote, |ctx| sync::handle_fetch(ctx, force)),

        Commands::Status => with_context(file, remote, |ctx| sync::handle_status(ctx)),

        Commands::Validate => with_context(file, remote, |ctx| sync::handle_validate(ctx)),

        Commands::App { command } => with_context(file, remote, |ctx| {
            app::handle_app_command(command, ctx)
        }),

        Commands::Commit { message } => {
            with_context(file, remote, |ctx| sync::handle_commit(ctx, message))
        }
    };

    if !success {
        std::process::exit(1);
    }
}

/// Load config and run a handler that needs it.
/// Returns true on success, false on error
fn with_context(
    file: Option<std::path::PathBuf>,
    remote: Option<String>,
    handler: impl FnOnce(&mut CliContext) -> bool,
) -> bool {
    let Some(config) = util::load_config() else {
        return false;
    };
    let mut ctx = CliContext::new(config, file, remote);
    handler(&mut ctx)
}
