//! Periodic telemetry fetching tied to the connection status.
//!
//! The poller is active exactly while the connection status is
//! [`ConnectionStatus::Connected`]. Becoming active triggers an immediate
//! refresh plus a one-off history load; every `interval` afterwards the
//! snapshot and device list are fetched again. Leaving `Connected` discards
//! everything cached.
//!
//! A failed refresh keeps the last good data, sets a fixed error message and
//! reports the loss through the [`ConnectionObserver`] so the connection
//! manager can start its retry cycle.

use chrono::{DateTime, Local};
use guardian_core::telemetry::{
    HistoricalDataPoint, HistoryWindow, RouterDevice, RouterSnapshot, TelemetryProvider,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::time::MissedTickBehavior;

use crate::reconnect::{ConnectionObserver, ConnectionSnapshot, ConnectionStatus};

/// Error shown when a snapshot or device fetch fails.
pub const MSG_FETCH_FAILED: &str = "Failed to fetch MikroTik data.";

/// Poller configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    /// Time between refreshes while connected.
    pub interval: Duration,
    /// Report fetch failures to the connection observer.
    pub report_loss_on_failure: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            report_loss_on_failure: true,
        }
    }
}

/// Everything the dashboard shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    /// Latest router snapshot
    pub snapshot: Option<RouterSnapshot>,
    /// Latest device list
    pub devices: Vec<RouterDevice>,
    /// Hourly traffic for the last day
    pub history_24h: Vec<HistoricalDataPoint>,
    /// Daily traffic for the last week
    pub history_7d: Vec<HistoricalDataPoint>,
    /// When `snapshot` and `devices` were last replaced
    pub last_updated: Option<DateTime<Local>>,
    /// Error from the last refresh
    pub error: Option<String>,
    /// A refresh is in flight
    pub loading: bool,
}

impl DashboardState {
    /// Whether any telemetry is cached.
    #[must_use]
    pub fn has_data(&self) -> bool {
        self.snapshot.is_some() || !self.devices.is_empty()
    }
}

/// Fetches telemetry while connected and publishes a [`DashboardState`].
pub struct TelemetryPoller {
    provider: Arc<dyn TelemetryProvider>,
    observer: Option<Arc<dyn ConnectionObserver>>,
    config: PollerConfig,
    state: DashboardState,
    active: bool,
    publisher: watch::Sender<DashboardState>,
}

impl TelemetryPoller {
    /// Poller with no loss observer.
    pub fn new(provider: Arc<dyn TelemetryProvider>, config: PollerConfig) -> Self {
        let (publisher, _) = watch::channel(DashboardState::default());
        Self {
            provider,
            observer: None,
            config,
            state: DashboardState::default(),
            active: false,
            publisher,
        }
    }

    /// Attach the observer that receives loss reports.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ConnectionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Current dashboard state.
    #[must_use]
    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Whether the poller is fetching (status is `Connected`).
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Watch channel carrying the dashboard state after every change.
    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.publisher.subscribe()
    }

    fn publish(&self) {
        self.publisher.send_replace(self.state.clone());
    }

    /// React to a connection status change.
    pub async fn on_status(&mut self, status: ConnectionStatus) {
        match (status.is_connected(), self.active) {
            (true, false) => {
                tracing::info!("Router connected, starting telemetry polling");
                self.active = true;
                self.refresh().await;
                self.load_history().await;
            }
            (false, true) => {
                tracing::info!(%status, "Router not connected, discarding telemetry");
                self.active = false;
                self.state = DashboardState::default();
                self.publish();
            }
            _ => {}
        }
    }

    /// Fetch snapshot and device list concurrently.
    ///
    /// Returns `true` if both fetches succeeded.
    pub async fn refresh(&mut self) -> bool {
        self.state.loading = true;
        self.publish();

        let result = futures::future::try_join(
            self.provider.fetch_snapshot(),
            self.provider.fetch_devices(),
        )
        .await;

        let ok = match result {
            Ok((snapshot, devices)) => {
                tracing::debug!(
                    cpu = snapshot.cpu_load,
                    devices = devices.len(),
                    "Telemetry refreshed"
                );
                self.state.snapshot = Some(snapshot);
                self.state.devices = devices;
                self.state.last_updated = Some(Local::now());
                self.state.error = None;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Telemetry refresh failed");
                self.state.error = Some(MSG_FETCH_FAILED.to_string());
                if self.config.report_loss_on_failure {
                    if let Some(observer) = &self.observer {
                        observer.connection_lost(&e.message);
                    }
                }
                false
            }
        };

        self.state.loading = false;
        self.publish();
        ok
    }

    /// Load both history windows. Failures are logged only.
    pub async fn load_history(&mut self) {
        let (day, week) = futures::future::join(
            self.provider.fetch_historical(HistoryWindow::Last24h),
            self.provider.fetch_historical(HistoryWindow::Last7d),
        )
        .await;

        match day {
            Ok(points) => self.state.history_24h = points,
            Err(e) => tracing::warn!(window = %HistoryWindow::Last24h, error = %e, "History fetch failed"),
        }
        match week {
            Ok(points) => self.state.history_7d = points,
            Err(e) => tracing::warn!(window = %HistoryWindow::Last7d, error = %e, "History fetch failed"),
        }
        self.publish();
    }

    /// Drive the poller until `shutdown` fires or the status channel closes.
    pub async fn run(
        mut self,
        mut status_rx: watch::Receiver<ConnectionSnapshot>,
        mut shutdown: oneshot::Receiver<()>,
    ) -> DashboardState {
        let interval = self.config.interval;
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let initial = status_rx.borrow_and_update().status;
        self.on_status(initial).await;
        ticker.reset();

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::debug!("Telemetry poller shutting down");
                    break;
                }
                changed = status_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let status = status_rx.borrow_and_update().status;
                    let was_active = self.active;
                    self.on_status(status).await;
                    if !was_active && self.active {
                        ticker.reset();
                    }
                }
                _ = ticker.tick(), if self.active => {
                    self.refresh().await;
                }
            }
        }
        self.state
    }
}
