//! Router credential resolution.
//!
//! # Precedence
//!
//! Credentials are resolved in this order (highest priority first):
//! 1. User input (typed on the command line)
//! 2. Persisted from a previous session
//! 3. `MIKROTIK_HOST` / `MIKROTIK_USER` / `MIKROTIK_PASS` environment variables
//!
//! A source only wins if it is configured (non-empty host and user).

use guardian_core::credentials::Credentials;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Environment variable holding the router address.
pub const ENV_HOST: &str = "MIKROTIK_HOST";
/// Environment variable holding the API user.
pub const ENV_USER: &str = "MIKROTIK_USER";
/// Environment variable holding the API password.
pub const ENV_PASS: &str = "MIKROTIK_PASS";

/// Where a credential triple came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialSource {
    /// Loaded from the `MIKROTIK_*` environment variables
    Environment,
    /// Restored from the credential store
    Persisted,
    /// Supplied by the user for this run
    UserInput,
}

impl CredentialSource {
    /// Resolution priority (higher = preferred).
    #[must_use]
    pub fn priority(self) -> u8 {
        match self {
            Self::Environment => 1,
            Self::Persisted => 2,
            Self::UserInput => 3,
        }
    }

    /// Short label for display.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Environment => "env",
            Self::Persisted => "saved",
            Self::UserInput => "user",
        }
    }
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Environment => write!(f, "Environment ({ENV_HOST}/{ENV_USER}/{ENV_PASS})"),
            Self::Persisted => write!(f, "Saved from previous session"),
            Self::UserInput => write!(f, "User input"),
        }
    }
}

/// Credentials tagged with their origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCredentials {
    /// The login triple
    pub credentials: Credentials,
    /// Where it came from
    pub source: CredentialSource,
}

/// Read credentials from the `MIKROTIK_*` environment variables.
///
/// Returns `None` unless host and user are both set and non-empty.
pub fn credentials_from_env() -> Option<Credentials> {
    let host = std::env::var(ENV_HOST).unwrap_or_default();
    let user = std::env::var(ENV_USER).unwrap_or_default();
    let pass = std::env::var(ENV_PASS).unwrap_or_default();
    let creds = Credentials::new(host.trim(), user.trim(), pass);
    creds.is_configured().then_some(creds)
}

/// Pick the highest-priority configured credentials.
pub fn resolve_credentials(
    user_input: Option<&Credentials>,
    persisted: Option<&Credentials>,
) -> Option<ResolvedCredentials> {
    if let Some(creds) = user_input.filter(|c| c.is_configured()) {
        return Some(ResolvedCredentials {
            credentials: creds.clone(),
            source: CredentialSource::UserInput,
        });
    }

    if let Some(creds) = persisted.filter(|c| c.is_configured()) {
        return Some(ResolvedCredentials {
            credentials: creds.clone(),
            source: CredentialSource::Persisted,
        });
    }

    credentials_from_env().map(|credentials| ResolvedCredentials {
        credentials,
        source: CredentialSource::Environment,
    })
}
