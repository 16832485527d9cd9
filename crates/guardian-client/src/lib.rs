//! Router connection lifecycle and telemetry polling for mikrotik-guardian.
//!
//! - [`reconnect`]: the [`ConnectionManager`] state machine with capped
//!   exponential backoff
//! - [`poller`]: the [`TelemetryPoller`] that fetches while connected
//! - [`connection`]: credential source resolution
//!
//! # Wiring
//!
//! ```rust,ignore
//! let mut manager = ConnectionManager::new(connector, store, scheduler);
//! let poller = TelemetryPoller::new(provider, PollerConfig::default())
//!     .with_observer(Arc::new(manager.observer()));
//! tokio::spawn(poller.run(manager.subscribe(), shutdown_rx));
//!
//! manager.initialize().await;
//! while let Some(event) = manager.next_event().await {
//!     manager.handle_event(event).await;
//! }
//! ```

pub mod connection;
pub mod poller;
pub mod reconnect;

pub use connection::{resolve_credentials, CredentialSource, ResolvedCredentials};
pub use poller::{DashboardState, PollerConfig, TelemetryPoller, MSG_FETCH_FAILED};
pub use reconnect::{
    ConnectionEvent, ConnectionHandle, ConnectionManager, ConnectionObserver, ConnectionSnapshot,
    ConnectionStatus, ReconnectConfig, MSG_CREDENTIALS_REQUIRED, MSG_NOT_CONFIGURED,
};
