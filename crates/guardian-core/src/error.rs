//! Error taxonomy shared by every guardian crate.
//!
//! Errors fall into three families, and none of them is fatal to the process:
//!
//! 1. **Configuration** - missing host/user, missing AI credential, bad config
//!    values. Surfaced inline, not retried until the user acts.
//! 2. **Transient link failures** - [`LinkError`] with a
//!    [`LinkErrorKind::Communication`] or [`LinkErrorKind::Timeout`] kind.
//!    These drive the reconnect cycle.
//! 3. **Analysis** - defined in `guardian-analysis`, terminal for a single
//!    request.
//!
//! [`GuardianError`] consolidates the first two (plus storage failures) so that
//! callers can use `?` across crate boundaries.

use thiserror::Error;

// =============================================================================
// Link Errors
// =============================================================================

/// Classification of a router link failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkErrorKind {
    /// Credentials are incomplete (host or user missing).
    Configuration,
    /// The router rejected the credentials.
    Authentication,
    /// Network-level failure (unreachable, reset, dropped).
    Communication,
    /// The router did not answer in time.
    Timeout,
}

impl std::fmt::Display for LinkErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LinkErrorKind::Configuration => "configuration",
            LinkErrorKind::Authentication => "authentication",
            LinkErrorKind::Communication => "communication",
            LinkErrorKind::Timeout => "timeout",
        };
        write!(f, "{}", label)
    }
}

/// Failure talking to the router, either while connecting or while polling.
///
/// `message` is the user-facing text; the connection manager shows it verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} error: {message}")]
pub struct LinkError {
    /// Failure classification
    pub kind: LinkErrorKind,
    /// Human-readable message
    pub message: String,
}

impl LinkError {
    /// Create a link error of the given kind.
    pub fn new(kind: LinkErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Incomplete credentials.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(LinkErrorKind::Configuration, message)
    }

    /// Network-level failure.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::new(LinkErrorKind::Communication, message)
    }

    /// No answer in time.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(LinkErrorKind::Timeout, message)
    }

    /// Whether an automatic reconnect makes sense for this failure.
    ///
    /// Configuration and authentication failures need the user to change
    /// something first.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            LinkErrorKind::Communication | LinkErrorKind::Timeout
        )
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Failure reading or writing the persisted credential record.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading or writing the backing file failed
    #[error("Credential store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backing file holds malformed JSON
    #[error("Credential store is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Platform has no config directory
    #[error("No configuration directory available on this platform")]
    NoConfigDir,
}

// =============================================================================
// Umbrella
// =============================================================================

/// Convenience alias for results using the guardian error type.
pub type GuardianResult<T> = std::result::Result<T, GuardianError>;

/// Primary error type shared across the guardian crates.
#[derive(Error, Debug)]
pub enum GuardianError {
    /// Invalid or missing settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Router link failure
    #[error("Router link error: {0}")]
    Link(#[from] LinkError),

    /// Credential persistence failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl GuardianError {
    /// Whether the operation that produced this error can be retried without
    /// user intervention.
    #[must_use]
    pub fn can_recover(&self) -> bool {
        match self {
            GuardianError::Link(err) => err.is_retriable(),
            GuardianError::Configuration(_) | GuardianError::Store(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retriable_kinds() {
        assert!(LinkError::communication("reset").is_retriable());
        assert!(LinkError::timeout("slow").is_retriable());
        assert!(!LinkError::configuration("missing host").is_retriable());
        assert!(!LinkError::new(LinkErrorKind::Authentication, "denied").is_retriable());
    }

    #[test]
    fn link_error_display_includes_kind() {
        let err = LinkError::timeout("router did not answer");
        assert_eq!(err.to_string(), "timeout error: router did not answer");
    }

    #[test]
    fn umbrella_recoverability() {
        let transient: GuardianError = LinkError::communication("dropped").into();
        assert!(transient.can_recover());

        let config = GuardianError::Configuration("no host".into());
        assert!(!config.can_recover());

        let store: GuardianError = StoreError::NoConfigDir.into();
        assert!(!store.can_recover());
    }
}
