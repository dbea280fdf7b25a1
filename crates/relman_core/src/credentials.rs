//! GitHub credential lookup.
//!
//! Where a token is kept is up to the front end. The core only defines the
//! [`CredentialProvider`] seam and the two sources every front end shares:
//! environment variables and the config file.

use std::fmt;

use crate::config::Config;
use crate::error::{RelmanError, Result};

/// Environment variables checked for a token, in order.
pub const TOKEN_ENV_VARS: [&str; 2] = ["RELMAN_GITHUB_TOKEN", "GITHUB_TOKEN"];

/// Where a credential came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Named environment variable
    Env(&'static str),
    /// The config file
    Config,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Env(var) => write!(f, "${}", var),
            CredentialSource::Config => write!(f, "config file"),
        }
    }
}

/// An access token and its origin.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub source: CredentialSource,
}

impl Credential {
    /// The token with all but its last four characters hidden.
    pub fn masked(&self) -> String {
        let count = self.token.chars().count();
        if count <= 4 {
            return "*".repeat(count);
        }
        let tail: String = self.token.chars().skip(count - 4).collect();
        format!("{}{}", "*".repeat(count - 4), tail)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &self.masked())
            .field("source", &self.source)
            .finish()
    }
}

/// A place a token can be read from and, optionally, stored to.
pub trait CredentialProvider {
    /// The stored credential, if any
    fn get(&self) -> Option<Credential>;

    /// Store a new token
    fn set(&mut self, token: &str) -> Result<()>;
}

/// Reads tokens from environment variables. Read-only.
#[derive(Debug, Default)]
pub struct EnvCredentials {
    lookup: Option<fn(&str) -> Option<String>>,
}

impl EnvCredentials {
    /// Read from the process environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Read through a custom lookup instead of the process environment.
    pub fn with_lookup(lookup: fn(&str) -> Option<String>) -> Self {
        Self {
            lookup: Some(lookup),
        }
    }

    fn var(&self, name: &str) -> Option<String> {
        match self.lookup {
            Some(lookup) => lookup(name),
            None => std::env::var(name).ok(),
        }
    }
}

impl CredentialProvider for EnvCredentials {
    fn get(&self) -> Option<Credential> {
        TOKEN_ENV_VARS.iter().find_map(|&name| {
            let token = self.var(name)?.trim().to_string();
            (!token.is_empty()).then_some(Credential {
                token,
                source: CredentialSource::Env(name),
            })
        })
    }

    fn set(&mut self, _token: &str) -> Result<()> {
        Err(RelmanError::Unauthorized(
            "environment credentials are read-only".to_string(),
        ))
    }
}

/// Stores the token in the `github_token` field of a [`Config`].
///
/// `set` updates the in-memory config; saving it is the caller's job.
#[derive(Debug)]
pub struct ConfigCredentials<'a> {
    config: &'a mut Config,
}

impl<'a> ConfigCredentials<'a> {
    pub fn new(config: &'a mut Config) -> Self {
        Self { config }
    }
}

impl CredentialProvider for ConfigCredentials<'_> {
    fn get(&self) -> Option<Credential> {
        let token = self.config.github_token.as_deref()?.trim();
        (!token.is_empty()).then(|| Credential {
            token: token.to_string(),
            source: CredentialSource::Config,
        })
    }

    fn set(&mut self, token: &str) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(RelmanError::MissingCredential);
        }
        self.config.github_token = Some(token.to_string());
        Ok(())
    }
}

/// First credential found among `providers`, in order.
pub fn resolve_credential(providers: &[&dyn CredentialProvider]) -> Result<Credential> {
    providers
        .iter()
        .find_map(|provider| provider.get())
        .ok_or(RelmanError::MissingCredential)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only_generic(name: &str) -> Option<String> {
        (name == "GITHUB_TOKEN").then(|| "ghp_generic".to_string())
    }

    fn both(name: &str) -> Option<String> {
        match name {
            "RELMAN_GITHUB_TOKEN" => Some("ghp_specific".to_string()),
            "GITHUB_TOKEN" => Some("ghp_generic".to_string()),
            _ => None,
        }
    }

    fn blank(_: &str) -> Option<String> {
        Some("   ".to_string())
    }

    #[test]
    fn test_env_precedence() {
        let cred = EnvCredentials::with_lookup(both).get().unwrap();
        assert_eq!(cred.token, "ghp_specific");
        assert_eq!(cred.source, CredentialSource::Env("RELMAN_GITHUB_TOKEN"));

        let cred = EnvCredentials::with_lookup(only_generic).get().unwrap();
        assert_eq!(cred.source, CredentialSource::Env("GITHUB_TOKEN"));

        assert!(EnvCredentials::with_lookup(blank).get().is_none());
    }

    #[test]
    fn test_config_credentials_set_and_get() {
        let mut config = Config::default();
        let mut creds = ConfigCredentials::new(&mut config);
        assert!(creds.get().is_none());
        assert!(creds.set("  ").is_err());
        creds.set(" ghp_stored ").unwrap();
        assert_eq!(creds.get().unwrap().token, "ghp_stored");
        assert_eq!(config.github_token.as_deref(), Some("ghp_stored"));
    }

    #[test]
    fn test_resolve_order() {
        let mut config = Config {
            github_token: Some("ghp_stored".to_string()),
            ..Config::default()
        };
        let env = EnvCredentials::with_lookup(both);
        let stored = ConfigCredentials::new(&mut config);
        let cred = resolve_credential(&[&env, &stored]).unwrap();
        assert_eq!(cred.token, "ghp_specific");

        let env = EnvCredentials::with_lookup(|_| None);
        let cred = resolve_credential(&[&env, &stored]).unwrap();
        assert_eq!(cred.source, CredentialSource::Config);

        assert!(matches!(
            resolve_credential(&[&env]),
            Err(RelmanError::MissingCredential)
        ));
    }

    #[test]
    fn test_masked_debug() {
        let cred = Credential {
            token: "ghp_abcdef1234".to_string(),
            source: CredentialSource::Config,
        };
        assert_eq!(cred.masked(), "**********1234");
        assert!(!format!("{:?}", cred).contains("abcdef"));
    }
}
