//! `relman`: edit a release manifest locally and commit it back to GitHub.

/// CLI module - command-line interface for relman
mod cli;

fn main() {
    cli::run_cli();
}
