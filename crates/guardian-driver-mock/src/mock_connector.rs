//! Simulated login handshake.
//!
//! Any configured credential triple is accepted; failures only come from the
//! injected [`ErrorConfig`] or from chaos mode.

use async_trait::async_trait;
use guardian_core::connector::Connector;
use guardian_core::credentials::Credentials;
use guardian_core::error::LinkError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::common::{ErrorConfig, MockMode, MockRng, TimingConfig};

/// Mock router login.
#[derive(Debug)]
pub struct MockConnector {
    rng: Arc<MockRng>,
    mode: MockMode,
    timing: TimingConfig,
    error_config: ErrorConfig,
    chaos_failure_rate: f64,
    attempts: AtomicU64,
}

impl MockConnector {
    /// Connector that accepts everything instantly.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Builder for advanced configuration.
    pub fn builder() -> MockConnectorBuilder {
        MockConnectorBuilder::default()
    }

    /// Handshakes attempted so far.
    #[must_use]
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Fault injection handle.
    #[must_use]
    pub fn error_config(&self) -> &ErrorConfig {
        &self.error_config
    }
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, credentials: &Credentials) -> Result<(), LinkError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(host = %credentials.host, attempt, "Simulating router login");

        if self.mode.simulates_latency() {
            tokio::time::sleep(self.timing.connect.sample(&self.rng)).await;
        }

        self.error_config.check_operation("connect")?;

        if self.mode == MockMode::Chaos && self.rng.should_fail(self.chaos_failure_rate) {
            return Err(LinkError::timeout(format!(
                "No answer from {}",
                credentials.host
            )));
        }
        Ok(())
    }
}

/// Builder for [`MockConnector`].
#[derive(Debug, Clone)]
pub struct MockConnectorBuilder {
    mode: MockMode,
    timing: TimingConfig,
    error_config: ErrorConfig,
    chaos_failure_rate: f64,
    rng_seed: Option<u64>,
}

impl Default for MockConnectorBuilder {
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

impl MockConnectorBuilder {
    /// Set operational mode
    pub fn mode(mut self, mode: MockMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set latency profile
    pub fn timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Set fault injection
    pub fn error_config(mut self, config: ErrorConfig) -> Self {
        self.error_config = config;
        self
    }

    /// Failure probability per handshake in chaos mode
    pub fn chaos_failure_rate(mut self, rate: f64) -> Self {
        self.chaos_failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Seed the RNG
    pub fn seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Build the connector.
    pub fn build(self) -> MockConnector {
        MockConnector {
            rng: Arc::new(MockRng::new(self.rng_seed)),
            mode: self.mode,
            timing: self.timing,
            error_config: self.error_config,
            chaos_failure_rate: self.chaos_failure_rate,
            attempts: AtomicU64::new(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorScenario;
    use guardian_core::error::LinkErrorKind;
    use std::time::Duration;

    fn creds() -> Credentials {
        Credentials::new("103.172.204.153:8728", "apiuser", "secret")
    }

    #[tokio::test]
    async fn test_accepts_any_credentials() {
        let connector = MockConnector::new();
        assert!(connector.connect(&creds()).await.is_ok());
        assert!(connector
            .connect(&Credentials::new("x", "y", ""))
            .await
            .is_ok());
        assert_eq!(connector.attempts(), 2);
    }

    #[tokio::test]
    async fn test_auth_rejection() {
        let connector = MockConnector::builder()
            .error_config(ErrorConfig::scenario(ErrorScenario::AuthenticationRejected))
            .build();
        let err = connector.connect(&creds()).await.unwrap_err();
        assert_eq!(err.kind, LinkErrorKind::Authentication);
    }

    #[tokio::test(start_paused = true)]
    async fn test_realistic_handshake_takes_one_second() {
        let connector = MockConnector::builder().mode(MockMode::Realistic).build();
        let start = tokio::time::Instant::now();
        connector.connect(&creds()).await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(1000));
    }
}
