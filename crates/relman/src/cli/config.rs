//! Config command handlers

use std::path::PathBuf;

use relman_core::RemoteRef;
use relman_core::config::Config;

use crate::cli::args::ConfigCommands;
use crate::cli::util::CliContext;

/// Handle the init command
/// Returns true on success, false on error
pub fn handle_init(
    remote: &str,
    contact: Option<String>,
    api_base_url: Option<String>,
    working_file: Option<PathBuf>,
) -> bool {
    let remote: RemoteRef = match remote.parse() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };

    // Keep a stored token and other settings from an earlier init
    let mut config = match Config::load() {
        Ok(existing) => existing,
        Err(e) => {
            eprintln!("⚠ Ignoring unreadable config: {}", e);
            Config::default()
        }
    };
    config.remote = Some(remote.clone());
    if let Some(contact) = contact {
        config.default_contact = Some(contact);
    }
    if let Some(url) = api_base_url {
        config.api_base_url = url;
    }
    if let Some(file) = working_file {
        config.working_file = file;
    }

    match config.save() {
        Ok(()) => {
            println!("✓ Initialized relman configuration");
            println!("  Remote: {}", remote);
            println!("  Working file: {}", config.working_file.display());
            if let Some(config_path) = Config::config_path() {
                println!("  Config file: {}", config_path.display());
            }
            println!();
            println!("Next: 'relman auth set-token', then 'relman fetch'.");
            true
        }
        Err(e) => {
            eprintln!("✗ Error saving config: {}", e);
            false
        }
    }
}

pub fn handle_config_command(command: Option<ConfigCommands>, ctx: &mut CliContext) -> bool {
    match command {
        None | Some(ConfigCommands::Show) => {
            show_config(&ctx.config);
            true
        }
        Some(ConfigCommands::Set { key, value }) => {
            if let Err(message) = set_value(&mut ctx.config, &key, &value) {
                eprintln!("✗ {}", message);
                return false;
            }
            match ctx.config.save() {
                Ok(()) => {
                    println!("✓ Set {}", key);
                    true
                }
                Err(e) => {
                    eprintln!("✗ Error saving config: {}", e);
                    false
                }
            }
        }
    }
}

/// Show relman configuration
fn show_config(config: &Config) {
    println!("relman Configuration");
    println!("====================");
    match &config.remote {
        Some(remote) => println!("Remote: {}", remote),
        None => println!("Remote: (not set, run 'relman init')"),
    }
    println!("API base URL: {}", config.api_base_url);
    println!("Working file: {}", config.working_file.display());
    println!("Commit message: {}", config.commit_message);
    if let Some(ref contact) = config.default_contact {
        println!("Default contact: {}", contact);
    }
    println!(
        "GitHub token: {}",
        if config.github_token.is_some() {
            "stored"
        } else {
            "not stored"
        }
    );
    if let Some(config_path) = Config::config_path() {
        println!("Config file: {}", config_path.display());
    }
}

/// Apply `key = value` to the config.
fn set_value(config: &mut Config, key: &str, value: &str) -> Result<(), String> {
    let value = value.trim();
    let optional = || Some(value.to_string()).filter(|v| !v.is_empty());

    match key {
        "remote" => {
            config.remote = match optional() {
                Some(text) => Some(text.parse::<RemoteRef>().map_err(|e| e.to_string())?),
                None => None,
            };
        }
        "api-base-url" | "api_base_url" => {
            config.api_base_url = optional().ok_or("api-base-url cannot be empty")?;
        }
        "contact" | "default_contact" => config.default_contact = optional(),
        "commit-message" | "commit_message" => {
            config.commit_message = optional().ok_or("commit-message cannot be empty")?;
        }
        "working-file" | "working_file" => {
            config.working_file = optional()
                .map(PathBuf::from)
                .ok_or("working-file cannot be empty")?;
        }
        other => {
            return Err(format!(
                "Unknown config key '{}'. Use one of: remote, api-base-url, contact, commit-message, working-file",
                other
            ));
        }
    }
    Ok(())
}
