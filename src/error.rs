//! Application error type.
//!
//! Library crates each own their error enums; [`AppError`] gathers the ones
//! that can escape the binary's setup and command handlers. Everything that
//! happens while monitoring is converted to state instead.

use guardian_analysis::AnalysisError;
use guardian_core::error::StoreError;
use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, AppError>;

/// Failures surfaced by the `guardian` binary.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration could not be parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// Configuration parsed but holds bad values.
    #[error("Configuration validation error: {0}")]
    Validation(String),

    /// Credential storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Analysis backend could not be created or called.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// Must be called from inside a tokio runtime.
    #[error("No async runtime available: {0}")]
    Runtime(#[from] tokio::runtime::TryCurrentError),

    /// Logging could not be initialized.
    #[error("Logging error: {0}")]
    Logging(String),

    /// Terminal or file I/O.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for AppError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}
