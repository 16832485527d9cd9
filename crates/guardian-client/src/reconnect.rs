//! Connection state machine and auto-reconnect logic.
//!
//! The [`ConnectionManager`] owns the router connection lifecycle:
//! - Explicit state machine with a single current [`ConnectionStatus`]
//! - Auto-reconnect with capped exponential backoff after a reported loss
//! - At most one pending retry timer, cancelled before any new attempt
//! - Credential persistence through a [`CredentialStore`]
//!
//! # State Machine
//!
//! ```text
//! Disconnected ──connect()──> Connecting
//!      ▲                          │
//!      │                    success/failure
//!      │                          ▼
//!      │                   Connected / Error
//!      │                          │
//!      │              connection lost (retry timer)
//!      │                          ▼
//!      └──disconnect()──── Error ──delay──> Connecting
//! ```
//!
//! Timer expiries and loss reports arrive as [`ConnectionEvent`]s on an
//! internal channel. The owner drives the manager by feeding those events
//! back in, either with [`ConnectionManager::poll`] from a UI loop or with
//! [`ConnectionManager::next_event`] from an async task.

use std::sync::Arc;
use std::time::{Duration, Instant};

use guardian_core::connector::Connector;
use guardian_core::credentials::{CredentialStore, Credentials};
use guardian_core::error::LinkError;
use guardian_core::scheduler::{Scheduler, TimerHandle, TimerId};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};

/// Validation message for incomplete credentials.
pub const MSG_CREDENTIALS_REQUIRED: &str = "Host and username are required.";

/// Error shown when nothing usable is stored at startup.
pub const MSG_NOT_CONFIGURED: &str = "Router API credentials are not configured.";

/// Connection status to the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// Not connected, no attempt in flight.
    Disconnected,
    /// A connect attempt is in flight.
    Connecting,
    /// Router reachable, telemetry may be polled.
    Connected,
    /// Last attempt failed or the link dropped.
    Error,
}

impl ConnectionStatus {
    /// Returns true if connected.
    #[must_use]
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Short status label for display.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting...",
            Self::Connected => "Connected",
            Self::Error => "Error",
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Observable view of the manager, published on every transition.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionSnapshot {
    /// Current status
    pub status: ConnectionStatus,
    /// User-facing error text, if any
    pub error: Option<String>,
    /// Retry counter (0 = no active retry cycle)
    pub retry_attempt: u32,
    /// Whether saved credentials are configured
    pub configured: bool,
    /// Time left until the pending retry fires
    pub next_retry_in: Option<Duration>,
}

impl Default for ConnectionSnapshot {
    fn default() -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            error: None,
            retry_attempt: 0,
            configured: false,
            next_retry_in: None,
        }
    }
}

/// Configuration for auto-reconnect behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectConfig {
    /// Delay before the first reconnect attempt.
    pub initial_delay: Duration,
    /// Maximum delay between reconnect attempts.
    pub max_delay: Duration,
    /// Backoff multiplier (e.g., 2.0 for doubling).
    pub backoff_multiplier: f64,
    /// Maximum number of reconnect attempts (0 = unlimited).
    pub max_attempts: u32,
    /// Whether auto-reconnect is enabled.
    pub enabled: bool,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            max_attempts: 0,
            enabled: true,
        }
    }
}

impl ReconnectConfig {
    /// Delay for a given attempt number (1-based), capped at `max_delay`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let base_ms = self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        let capped_ms = base_ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped_ms.round() as u64)
    }

    /// Check if another reconnect attempt should be made.
    #[must_use]
    pub fn should_retry(&self, attempt: u32) -> bool {
        self.enabled && (self.max_attempts == 0 || attempt <= self.max_attempts)
    }
}

/// Message delivered to the manager's event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// A retry timer fired.
    RetryDue {
        /// Timer that fired; stale ids are ignored
        timer: TimerId,
    },
    /// A consumer observed the link dropping.
    ConnectionLost {
        /// What the consumer saw
        reason: String,
    },
}

/// Receiver of connection-loss reports from telemetry consumers.
pub trait ConnectionObserver: Send + Sync {
    /// Report that the router stopped answering.
    fn connection_lost(&self, reason: &str);
}

/// Cloneable handle that forwards loss reports into a manager.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    events: mpsc::UnboundedSender<ConnectionEvent>,
}

impl ConnectionObserver for ConnectionHandle {
    fn connection_lost(&self, reason: &str) {
        let event = ConnectionEvent::ConnectionLost {
            reason: reason.to_string(),
        };
        if self.events.send(event).is_err() {
            tracing::debug!("Connection manager gone, dropping loss report");
        }
    }
}

/// Manages connection state, credential persistence and reconnection.
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    store: Arc<dyn CredentialStore>,
    scheduler: Arc<dyn Scheduler>,
    config: ReconnectConfig,

    credentials: Option<Credentials>,
    status: ConnectionStatus,
    error: Option<String>,
    /// Current reconnect attempt (0 if not reconnecting)
    retry_attempt: u32,
    retry_timer: Option<TimerHandle>,
    /// Token carried by the pending timer's event
    retry_token: TimerId,
    next_retry_at: Option<Instant>,

    events_tx: mpsc::UnboundedSender<ConnectionEvent>,
    events_rx: mpsc::UnboundedReceiver<ConnectionEvent>,
    publisher: watch::Sender<ConnectionSnapshot>,
}

impl ConnectionManager {
    /// Create a manager with the default reconnect configuration.
    pub fn new(
        connector: Arc<dyn Connector>,
        store: Arc<dyn CredentialStore>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self::with_config(connector, store, scheduler, ReconnectConfig::default())
    }

    /// Create with custom reconnect configuration.
    pub fn with_config(
        connector: Arc<dyn Connector>,
        store: Arc<dyn CredentialStore>,
        scheduler: Arc<dyn Scheduler>,
        config: ReconnectConfig,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (publisher, _) = watch::channel(ConnectionSnapshot::default());
        Self {
            connector,
            store,
            scheduler,
            config,
            credentials: None,
            status: ConnectionStatus::Disconnected,
            error: None,
            retry_attempt: 0,
            retry_timer: None,
            retry_token: 0,
            next_retry_at: None,
            events_tx,
            events_rx,
            publisher,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Current connection status.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Current user-facing error text.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Current retry counter (0 = no active cycle).
    #[must_use]
    pub fn retry_attempt(&self) -> u32 {
        self.retry_attempt
    }

    /// Last saved credentials.
    #[must_use]
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Whether saved credentials have a host and user.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.credentials
            .as_ref()
            .is_some_and(Credentials::is_configured)
    }

    /// Reconnect configuration.
    #[must_use]
    pub fn config(&self) -> &ReconnectConfig {
        &self.config
    }

    /// Whether a retry timer is pending.
    #[must_use]
    pub fn has_pending_retry(&self) -> bool {
        self.retry_timer.is_some()
    }

    /// Seconds until the pending retry fires, if any.
    #[must_use]
    pub fn seconds_until_retry(&self) -> Option<f64> {
        self.time_until_retry().map(|d| d.as_secs_f64())
    }

    fn time_until_retry(&self) -> Option<Duration> {
        let at = self.next_retry_at?;
        Some(at.saturating_duration_since(self.scheduler.now()))
    }

    /// Watch channel carrying a [`ConnectionSnapshot`] per transition.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionSnapshot> {
        self.publisher.subscribe()
    }

    /// Handle for telemetry consumers to report a dropped link.
    #[must_use]
    pub fn observer(&self) -> ConnectionHandle {
        ConnectionHandle {
            events: self.events_tx.clone(),
        }
    }

    /// Current state as a snapshot.
    #[must_use]
    pub fn snapshot(&self) -> ConnectionSnapshot {
        ConnectionSnapshot {
            status: self.status,
            error: self.error.clone(),
            retry_attempt: self.retry_attempt,
            configured: self.is_configured(),
            next_retry_in: self.time_until_retry(),
        }
    }

    fn publish(&self) {
        self.publisher.send_replace(self.snapshot());
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Load stored credentials and connect if they are usable.
    ///
    /// Returns the outcome of the initial connect, or `false` if nothing
    /// usable was stored.
    pub async fn initialize(&mut self) -> bool {
        let stored = match self.store.load() {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read stored router credentials");
                None
            }
        };

        match stored.filter(Credentials::is_configured) {
            Some(creds) => {
                tracing::info!(host = %creds.host, "Restoring saved router credentials");
                self.credentials = Some(creds.clone());
                self.connect(&creds, false).await
            }
            None => {
                self.credentials = None;
                self.status = ConnectionStatus::Disconnected;
                self.error = Some(MSG_NOT_CONFIGURED.to_string());
                self.publish();
                false
            }
        }
    }

    /// Attempt a connection.
    ///
    /// Cancels any pending retry timer first. A successful non-test attempt
    /// resets the retry counter.
    pub async fn connect(&mut self, credentials: &Credentials, is_test: bool) -> bool {
        self.try_connect(credentials, is_test).await.is_ok()
    }

    async fn try_connect(&mut self, credentials: &Credentials, is_test: bool) -> Result<(), LinkError> {
        self.status = ConnectionStatus::Connecting;
        self.cancel_retry_timer();
        self.error = None;
        self.publish();

        if !credentials.is_configured() {
            self.status = ConnectionStatus::Error;
            self.error = Some(MSG_CREDENTIALS_REQUIRED.to_string());
            self.publish();
            return Err(LinkError::configuration(MSG_CREDENTIALS_REQUIRED));
        }

        tracing::info!(host = %credentials.host, is_test, "Connecting to router");

        match self.connector.connect(credentials).await {
            Ok(()) => {
                self.status = ConnectionStatus::Connected;
                if !is_test {
                    self.retry_attempt = 0;
                }
                tracing::info!(host = %credentials.host, "Connected to router");
                self.publish();
                Ok(())
            }
            Err(e) => {
                tracing::warn!(host = %credentials.host, error = %e, "Router connection failed");
                self.status = ConnectionStatus::Error;
                self.error = Some(e.message.clone());
                self.publish();
                Err(e)
            }
        }
    }

    /// Persist new credentials and connect with them.
    ///
    /// A persistence failure is logged and does not prevent the attempt.
    pub async fn save_credentials(&mut self, credentials: Credentials) -> bool {
        if let Err(e) = self.store.save(&credentials) {
            tracing::error!(error = %e, "Failed to persist router credentials");
        }
        self.credentials = Some(credentials.clone());
        self.retry_attempt = 0;
        self.cancel_retry_timer();
        self.connect(&credentials, false).await
    }

    /// Try credentials without saving them.
    pub async fn test_connection(&mut self, credentials: &Credentials) -> bool {
        self.retry_attempt = 0;
        self.cancel_retry_timer();
        self.connect(credentials, true).await
    }

    /// Report that the link dropped. Only meaningful while connected.
    pub fn report_connection_lost(&mut self, reason: &str) {
        if self.status != ConnectionStatus::Connected {
            tracing::debug!(status = %self.status, reason, "Ignoring loss report");
            return;
        }

        tracing::warn!(reason, "Router connection lost");
        self.status = ConnectionStatus::Error;
        self.error = Some(reason.to_string());

        if self.retry_attempt == 0 {
            self.retry_attempt = 1;
            self.schedule_retry();
        }
        self.publish();
    }

    /// Forget the stored credentials and go idle.
    pub fn disconnect(&mut self) {
        if let Err(e) = self.store.clear() {
            tracing::error!(error = %e, "Failed to clear stored router credentials");
        }
        self.credentials = None;
        self.cancel_retry_timer();
        self.retry_attempt = 0;
        self.status = ConnectionStatus::Disconnected;
        self.error = None;
        tracing::info!("Disconnected from router");
        self.publish();
    }

    /// Cancel any pending retry. Called on drop as well.
    pub fn shutdown(&mut self) {
        if self.retry_timer.is_some() {
            tracing::debug!("Cancelling pending reconnect on shutdown");
        }
        self.cancel_retry_timer();
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Apply one event.
    pub async fn handle_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::RetryDue { timer } => {
                if self.retry_timer.is_none() || timer != self.retry_token {
                    tracing::debug!(timer, current = self.retry_token, "Ignored stale retry timer");
                    return;
                }
                self.retry_timer = None;
                self.next_retry_at = None;
                self.run_retry().await;
            }
            ConnectionEvent::ConnectionLost { reason } => {
                self.report_connection_lost(&reason);
            }
        }
    }

    /// Apply every queued event without waiting. Call this in a UI loop.
    ///
    /// Returns the number of events handled.
    pub async fn poll(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event).await;
            handled += 1;
        }
        handled
    }

    /// Wait for the next event.
    ///
    /// Never returns `None` while the manager is alive, since it holds a
    /// sender itself.
    pub async fn next_event(&mut self) -> Option<ConnectionEvent> {
        self.events_rx.recv().await
    }

    // =========================================================================
    // Retry cycle
    // =========================================================================

    fn cancel_retry_timer(&mut self) {
        if let Some(timer) = self.retry_timer.take() {
            timer.cancel();
        }
        self.next_retry_at = None;
    }

    fn schedule_retry(&mut self) {
        self.cancel_retry_timer();

        if !self.config.should_retry(self.retry_attempt) {
            let reason = self.error.take().unwrap_or_else(|| "Connection lost".to_string());
            tracing::warn!(
                max_attempts = self.config.max_attempts,
                "Giving up on automatic reconnect"
            );
            self.error = Some(format!("{} (max retries exceeded)", reason));
            self.retry_attempt = 0;
            return;
        }

        let delay = self.config.delay_for_attempt(self.retry_attempt);
        self.error = Some(format!(
            "Connection lost. Retrying in {}s (attempt {})...",
            delay.as_millis().div_ceil(1000),
            self.retry_attempt
        ));

        self.retry_token += 1;
        let timer = self.retry_token;
        let events = self.events_tx.clone();
        let handle = self.scheduler.schedule(
            delay,
            Box::new(move || {
                let _ = events.send(ConnectionEvent::RetryDue { timer });
            }),
        );

        tracing::info!(
            attempt = self.retry_attempt,
            delay_ms = delay.as_millis() as u64,
            "Scheduled reconnect"
        );
        self.next_retry_at = Some(self.scheduler.now() + delay);
        self.retry_timer = Some(handle);
    }

    async fn run_retry(&mut self) {
        let credentials = self.credentials.clone().unwrap_or_default();
        tracing::info!(attempt = self.retry_attempt, "Attempting reconnect");

        match self.try_connect(&credentials, false).await {
            Ok(()) => {}
            Err(e) if e.is_retriable() => {
                self.retry_attempt += 1;
                self.schedule_retry();
                self.publish();
            }
            Err(e) => {
                tracing::warn!(kind = %e.kind, "Reconnect failed with a non-retriable error, stopping");
                self.retry_attempt = 0;
                self.publish();
            }
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.cancel_retry_timer();
    }
}
