//! Core types for mikrotik-guardian.
//!
//! This crate holds everything the other guardian crates agree on:
//!
//! - [`telemetry`]: router snapshot, device and history data model, plus the
//!   [`TelemetryProvider`] trait.
//! - [`credentials`]: the router login triple and its [`CredentialStore`].
//! - [`connector`]: the login handshake port.
//! - [`scheduler`]: the timer port the reconnect state machine is driven by.
//! - [`error`]: the link, storage and umbrella error types.

pub mod connector;
pub mod credentials;
pub mod error;
pub mod scheduler;
pub mod telemetry;

pub use connector::Connector;
pub use credentials::{
    CredentialStore, Credentials, FileCredentialStore, MemoryCredentialStore,
    STORAGE_KEY_CREDENTIALS,
};
pub use error::{GuardianError, GuardianResult, LinkError, LinkErrorKind, StoreError};
pub use scheduler::{ManualScheduler, Scheduler, TimerCallback, TimerHandle, TimerId, TokioScheduler};
pub use telemetry::{
    DeviceService, DeviceStatus, HistoricalDataPoint, HistoryWindow, InterfaceTraffic, LogEntry,
    LogLevel, RouterDevice, RouterSnapshot, ServiceStatus, TelemetryProvider,
};
