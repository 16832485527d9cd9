//! MikroTik Guardian: router telemetry monitor with automatic reconnect and
//! AI-assisted health analysis.
//!
//! The workspace is split by concern:
//! - `guardian-core`: telemetry model, credential store, scheduler port, errors
//! - `guardian-client`: connection state machine and telemetry poller
//! - `guardian-driver-mock`: simulated router and login handshake
//! - `guardian-analysis`: Gemini-backed analysis reports
//!
//! This crate adds configuration, logging and the [`app::Guardian`] wiring
//! used by the `guardian` binary.

pub mod app;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod logging;

pub use app::Guardian;
pub use config::GuardianConfig;
pub use error::{AppError, AppResult};
