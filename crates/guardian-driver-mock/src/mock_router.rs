//! Simulated RouterOS telemetry endpoint.
//!
//! # Example
//!
//! ```rust,ignore
//! use guardian_driver_mock::{MockMode, MockRouter};
//!
//! // Instant answers, reproducible numbers
//! let router = MockRouter::builder().seed(7).build();
//! let snapshot = router.fetch_snapshot().await?;
//!
//! // API-like latency, 10% random link drops
//! let router = MockRouter::builder()
//!     .mode(MockMode::Chaos)
//!     .chaos_failure_rate(0.1)
//!     .build();
//! ```

use async_trait::async_trait;
use chrono::Local;
use guardian_core::error::LinkError;
use guardian_core::telemetry::{
    HistoricalDataPoint, HistoryWindow, RouterDevice, RouterSnapshot, TelemetryProvider,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::common::{ErrorConfig, LatencyRange, MockMode, MockRng, TimingConfig};
use crate::generators::{self, LogBuffer};

/// Per-call counters, mostly for assertions in tests.
#[derive(Debug, Default)]
struct CallCounters {
    snapshot: AtomicU64,
    devices: AtomicU64,
    historical: AtomicU64,
}

/// Simulated router.
///
/// Owns its rolling log buffer, so one instance corresponds to one router
/// session. Cloning is not supported; share it behind an `Arc`.
pub struct MockRouter {
    rng: Arc<MockRng>,
    mode: MockMode,
    timing: TimingConfig,
    error_config: ErrorConfig,
    chaos_failure_rate: f64,
    logs: Mutex<LogBuffer>,
    calls: CallCounters,
}

impl MockRouter {
    /// Router with default settings (instant, unseeded, no faults).
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Builder for advanced configuration.
    pub fn builder() -> MockRouterBuilder {
        MockRouterBuilder::default()
    }

    /// Operational mode.
    #[must_use]
    pub fn mode(&self) -> MockMode {
        self.mode
    }

    /// Fault injection handle shared with any clones of the config.
    #[must_use]
    pub fn error_config(&self) -> &ErrorConfig {
        &self.error_config
    }

    /// Current contents of the rolling log.
    #[must_use]
    pub fn log_entries(&self) -> Vec<guardian_core::telemetry::LogEntry> {
        self.logs.lock().to_vec()
    }

    /// Number of snapshot fetches served or attempted.
    #[must_use]
    pub fn snapshot_calls(&self) -> u64 {
        self.calls.snapshot.load(Ordering::SeqCst)
    }

    /// Number of device list fetches served or attempted.
    #[must_use]
    pub fn device_calls(&self) -> u64 {
        self.calls.devices.load(Ordering::SeqCst)
    }

    /// Number of history fetches served or attempted.
    #[must_use]
    pub fn historical_calls(&self) -> u64 {
        self.calls.historical.load(Ordering::SeqCst)
    }

    async fn simulate(&self, operation: &'static str, latency: LatencyRange) -> Result<(), LinkError> {
        if self.mode.simulates_latency() {
            tokio::time::sleep(latency.sample(&self.rng)).await;
        }

        self.error_config.check_operation(operation)?;

        if self.mode == MockMode::Chaos && self.rng.should_fail(self.chaos_failure_rate) {
            tracing::debug!(operation, "Chaos mode dropped the request");
            return Err(LinkError::communication(format!(
                "Router connection reset during '{}'",
                operation
            )));
        }
        Ok(())
    }
}

impl Default for MockRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MockRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockRouter")
            .field("mode", &self.mode)
            .field("timing", &self.timing)
            .field("logs", &self.logs.lock().len())
            .finish()
    }
}

#[async_trait]
impl TelemetryProvider for MockRouter {
    async fn fetch_snapshot(&self) -> Result<RouterSnapshot, LinkError> {
        self.calls.snapshot.fetch_add(1, Ordering::SeqCst);
        self.simulate("snapshot", self.timing.snapshot).await?;

        let now = Local::now();
        let mut logs = self.logs.lock();
        Ok(generators::generate_snapshot(&self.rng, &mut logs, &now))
    }

    async fn fetch_devices(&self) -> Result<Vec<RouterDevice>, LinkError> {
        self.calls.devices.fetch_add(1, Ordering::SeqCst);
        self.simulate("devices", self.timing.devices).await?;

        Ok(generators::generate_devices(&self.rng, &Local::now()))
    }

    async fn fetch_historical(
        &self,
        window: HistoryWindow,
    ) -> Result<Vec<HistoricalDataPoint>, LinkError> {
        self.calls.historical.fetch_add(1, Ordering::SeqCst);
        self.simulate("historical", self.timing.historical).await?;

        Ok(generators::generate_history(&self.rng, window, &Local::now()))
    }
}

// =============================================================================
// Builder Pattern
// =============================================================================

/// Builder for [`MockRouter`].
#[derive(Debug, Clone)]
pub struct MockRouterBuilder {
    mode: MockMode,
    timing: TimingConfig,
    error_config: ErrorConfig,
    chaos_failure_rate: f64,
    rng_seed: Option<u64>,
}

impl Default for MockRouterBuilder {
    fn default() -> Self {
        Self {
            mode: MockMode::default(),
            timing: TimingConfig::default(),
            error_config: ErrorConfig::default(),
            chaos_failure_rate: 0.1,
            rng_seed: None,
        }
    }
}

impl MockRouterBuilder {
    /// Set operational mode
    pub fn mode(mut self, mode: MockMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set latency profile (only used outside instant mode)
    pub fn timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Set fault injection
    pub fn error_config(mut self, config: ErrorConfig) -> Self {
        self.error_config = config;
        self
    }

    /// Failure probability per call in chaos mode
    pub fn chaos_failure_rate(mut self, rate: f64) -> Self {
        self.chaos_failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Seed the RNG for reproducible telemetry
    pub fn seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Build the router, seeding its log buffer.
    pub fn build(self) -> MockRouter {
        let rng = Arc::new(MockRng::new(self.rng_seed));
        let logs = LogBuffer::seeded(&rng, &Local::now());
        MockRouter {
            rng,
            mode: self.mode,
            timing: self.timing,
            error_config: self.error_config,
            chaos_failure_rate: self.chaos_failure_rate,
            logs: Mutex::new(logs),
            calls: CallCounters::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorScenario;
    use guardian_core::error::LinkErrorKind;
    use std::time::Duration;

    #[tokio::test]
    async fn test_snapshot_grows_log_buffer() {
        let router = MockRouter::builder().seed(1).build();
        assert_eq!(router.log_entries().len(), 5);

        let first = router.fetch_snapshot().await.unwrap();
        assert_eq!(first.log_entries.len(), 6);
        let second = router.fetch_snapshot().await.unwrap();
        assert_eq!(second.log_entries.len(), 7);
        assert_eq!(second.log_entries[..6], first.log_entries[..]);
        assert_eq!(router.snapshot_calls(), 2);
    }

    #[tokio::test]
    async fn test_independent_routers_have_independent_logs() {
        let a = MockRouter::builder().seed(1).build();
        let b = MockRouter::builder().seed(1).build();
        for _ in 0..3 {
            a.fetch_snapshot().await.unwrap();
        }
        assert_eq!(a.log_entries().len(), 8);
        assert_eq!(b.log_entries().len(), 5);
    }

    #[tokio::test]
    async fn test_history_bucket_counts() {
        let router = MockRouter::new();
        let day = router.fetch_historical(HistoryWindow::Last24h).await.unwrap();
        let week = router.fetch_historical(HistoryWindow::Last7d).await.unwrap();
        assert_eq!(day.len(), 24);
        assert_eq!(week.len(), 7);
    }

    #[tokio::test]
    async fn test_injected_timeout() {
        let router = MockRouter::builder()
            .error_config(ErrorConfig::scenario(ErrorScenario::Timeout {
                operation: "devices",
            }))
            .build();

        let err = router.fetch_devices().await.unwrap_err();
        assert_eq!(err.kind, LinkErrorKind::Timeout);
        assert!(router.fetch_snapshot().await.is_ok());
    }

    #[tokio::test]
    async fn test_failed_snapshot_does_not_touch_logs() {
        let config = ErrorConfig::none();
        let router = MockRouter::builder().error_config(config.clone()).build();
        config.drop_link();

        assert!(router.fetch_snapshot().await.is_err());
        assert_eq!(router.log_entries().len(), 5);
    }

    #[tokio::test]
    async fn test_chaos_mode_always_failing() {
        let router = MockRouter::builder()
            .mode(MockMode::Chaos)
            .timing(TimingConfig::zero())
            .chaos_failure_rate(1.0)
            .build();
        let err = router.fetch_snapshot().await.unwrap_err();
        assert!(err.is_retriable());
    }

    #[tokio::test(start_paused = true)]
    async fn test_realistic_mode_latency() {
        let router = MockRouter::builder().mode(MockMode::Realistic).seed(2).build();

        let start = tokio::time::Instant::now();
        router.fetch_snapshot().await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(200), "took {:?}", elapsed);
        assert!(elapsed <= Duration::from_millis(850), "took {:?}", elapsed);
    }
}
