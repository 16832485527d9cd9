//! Link fault injection for the simulated router.
//!
//! An [`ErrorConfig`] is cheap to clone and all clones share state, so the
//! same config handed to a `MockConnector` and a `MockRouter` behaves like one
//! physical link: dropping it makes both the handshake and the telemetry
//! calls fail until [`ErrorConfig::restore_link`] is called.

use super::rng::MockRng;
use guardian_core::error::{LinkError, LinkErrorKind};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Fault injection settings shared by the mock connector and mock router.
#[derive(Clone, Debug)]
pub struct ErrorConfig {
    /// Per-operation failure rate (0.0 to 1.0), `"*"` matches any operation
    failure_rates: Arc<HashMap<&'static str, f64>>,
    /// Scripted failures
    scenarios: Arc<Vec<ErrorScenario>>,
    rng: Arc<MockRng>,
    state: Arc<Mutex<ErrorState>>,
}

/// A scripted failure.
#[derive(Debug, Clone)]
pub enum ErrorScenario {
    /// Succeed `count` times, then fail every call
    FailAfterN {
        /// Operation name (`connect`, `snapshot`, `devices`, `historical`)
        operation: &'static str,
        /// Successful calls before failing
        count: u32,
    },
    /// Fail the first `count` calls, then succeed
    FailFirstN {
        /// Operation name
        operation: &'static str,
        /// Failed calls before succeeding
        count: u32,
    },
    /// Every call to the operation times out
    Timeout {
        /// Operation name
        operation: &'static str,
    },
    /// The router rejects the login
    AuthenticationRejected,
    /// The link drops on the first call and stays down until restored
    CommunicationLoss,
}

#[derive(Default, Debug)]
struct ErrorState {
    operation_counts: HashMap<&'static str, u32>,
    communication_lost: bool,
    link_forced_down: bool,
}

impl ErrorConfig {
    fn build(
        failure_rates: HashMap<&'static str, f64>,
        scenarios: Vec<ErrorScenario>,
        seed: Option<u64>,
    ) -> Self {
        Self {
            failure_rates: Arc::new(failure_rates),
            scenarios: Arc::new(scenarios),
            rng: Arc::new(MockRng::new(seed)),
            state: Arc::new(Mutex::new(ErrorState::default())),
        }
    }

    /// No injected failures.
    pub fn none() -> Self {
        Self::build(HashMap::new(), Vec::new(), None)
    }

    /// Uniform random failures on every operation.
    pub fn random_failures(rate: f64) -> Self {
        Self::random_failures_seeded(rate, None)
    }

    /// Uniform random failures with a fixed seed.
    pub fn random_failures_seeded(rate: f64, seed: Option<u64>) -> Self {
        let mut rates = HashMap::new();
        rates.insert("*", rate);
        Self::build(rates, Vec::new(), seed)
    }

    /// A single scripted failure.
    pub fn scenario(scenario: ErrorScenario) -> Self {
        Self::scenarios(vec![scenario])
    }

    /// Several scripted failures, checked in order.
    pub fn scenarios(scenarios: Vec<ErrorScenario>) -> Self {
        Self::build(HashMap::new(), scenarios, None)
    }

    /// Custom failure rate per operation.
    pub fn with_rates(rates: HashMap<&'static str, f64>) -> Self {
        Self::build(rates, Vec::new(), None)
    }

    /// Decide whether `operation` fails this time.
    pub fn check_operation(&self, operation: &'static str) -> Result<(), LinkError> {
        let mut state = self.state.lock();

        if state.communication_lost || state.link_forced_down {
            return Err(LinkError::communication("Router unreachable: connection lost"));
        }

        for scenario in self.scenarios.iter() {
            match scenario {
                ErrorScenario::FailAfterN {
                    operation: op,
                    count,
                } if *op == operation => {
                    let current = state.operation_counts.entry(operation).or_insert(0);
                    *current += 1;
                    if *current > *count {
                        return Err(LinkError::communication(format!(
                            "Router stopped answering '{}' after {} calls",
                            operation, count
                        )));
                    }
                }
                ErrorScenario::FailFirstN {
                    operation: op,
                    count,
                } if *op == operation => {
                    let current = state.operation_counts.entry(operation).or_insert(0);
                    *current += 1;
                    if *current <= *count {
                        return Err(LinkError::communication(format!(
                            "Router refused '{}' (attempt {})",
                            operation, current
                        )));
                    }
                }
                ErrorScenario::Timeout { operation: op } if *op == operation => {
                    return Err(LinkError::timeout(format!(
                        "Router did not answer '{}' in time",
                        operation
                    )));
                }
                ErrorScenario::AuthenticationRejected if operation == "connect" => {
                    return Err(LinkError::new(
                        LinkErrorKind::Authentication,
                        "Router rejected the username or password",
                    ));
                }
                ErrorScenario::CommunicationLoss => {
                    if !state.communication_lost {
                        state.communication_lost = true;
                        return Err(LinkError::communication(
                            "Router unreachable: connection lost",
                        ));
                    }
                }
                _ => {}
            }
        }

        let rate = self
            .failure_rates
            .get(operation)
            .or_else(|| self.failure_rates.get("*"))
            .copied()
            .unwrap_or(0.0);

        if self.rng.should_fail(rate) {
            return Err(LinkError::communication(format!(
                "Random link failure on '{}'",
                operation
            )));
        }

        Ok(())
    }

    /// Take the link down until [`ErrorConfig::restore_link`].
    pub fn drop_link(&self) {
        self.state.lock().link_forced_down = true;
    }

    /// Bring the link back up after a loss.
    pub fn restore_link(&self) {
        let mut state = self.state.lock();
        state.link_forced_down = false;
        state.communication_lost = false;
    }

    /// Whether the link is currently down.
    #[must_use]
    pub fn is_link_down(&self) -> bool {
        let state = self.state.lock();
        state.communication_lost || state.link_forced_down
    }

    /// Clear counters and link state.
    pub fn reset(&self) {
        *self.state.lock() = ErrorState::default();
    }
}

impl Default for ErrorConfig {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_errors() {
        let config = ErrorConfig::none();
        for _ in 0..100 {
            assert!(config.check_operation("snapshot").is_ok());
        }
    }

    #[test]
    fn test_random_failures() {
        let config = ErrorConfig::random_failures_seeded(0.5, Some(42));
        let failures = (0..1000)
            .filter(|_| config.check_operation("snapshot").is_err())
            .count();
        assert!(failures > 400 && failures < 600, "Got {} failures", failures);
    }

    #[test]
    fn test_fail_after_n() {
        let config = ErrorConfig::scenario(ErrorScenario::FailAfterN {
            operation: "connect",
            count: 1,
        });
        assert!(config.check_operation("connect").is_ok());
        let err = config.check_operation("connect").unwrap_err();
        assert!(err.is_retriable());
        assert!(config.check_operation("connect").is_err());
        assert!(config.check_operation("snapshot").is_ok());
    }

    #[test]
    fn test_fail_first_n() {
        let config = ErrorConfig::scenario(ErrorScenario::FailFirstN {
            operation: "connect",
            count: 2,
        });
        assert!(config.check_operation("connect").is_err());
        assert!(config.check_operation("connect").is_err());
        assert!(config.check_operation("connect").is_ok());
        assert!(config.check_operation("connect").is_ok());
    }

    #[test]
    fn test_timeout_scenario() {
        let config = ErrorConfig::scenario(ErrorScenario::Timeout {
            operation: "devices",
        });
        let err = config.check_operation("devices").unwrap_err();
        assert_eq!(err.kind, LinkErrorKind::Timeout);
        assert!(err.message.contains("in time"));
    }

    #[test]
    fn test_authentication_rejected_only_on_connect() {
        let config = ErrorConfig::scenario(ErrorScenario::AuthenticationRejected);
        let err = config.check_operation("connect").unwrap_err();
        assert_eq!(err.kind, LinkErrorKind::Authentication);
        assert!(!err.is_retriable());
        assert!(config.check_operation("snapshot").is_ok());
    }

    #[test]
    fn test_communication_loss_persists_until_restored() {
        let config = ErrorConfig::scenario(ErrorScenario::CommunicationLoss);
        let err = config.check_operation("snapshot").unwrap_err();
        assert_eq!(err.kind, LinkErrorKind::Communication);
        assert!(config.check_operation("connect").is_err());
        assert!(config.is_link_down());

        config.restore_link();
        assert!(!config.is_link_down());
        assert!(config.check_operation("connect").is_ok());
    }

    #[test]
    fn test_drop_link_shared_between_clones() {
        let config = ErrorConfig::none();
        let link = config.clone();
        link.drop_link();
        assert!(config.check_operation("snapshot").is_err());
        config.restore_link();
        assert!(link.check_operation("snapshot").is_ok());
    }

    #[test]
    fn test_reset() {
        let config = ErrorConfig::scenario(ErrorScenario::FailAfterN {
            operation: "snapshot",
            count: 2,
        });
        assert!(config.check_operation("snapshot").is_ok());
        assert!(config.check_operation("snapshot").is_ok());
        assert!(config.check_operation("snapshot").is_err());

        config.reset();
        assert!(config.check_operation("snapshot").is_ok());
    }

    #[test]
    fn test_custom_rates() {
        let mut rates = HashMap::new();
        rates.insert("devices", 1.0);
        rates.insert("snapshot", 0.0);
        let config = ErrorConfig::with_rates(rates);

        for _ in 0..10 {
            assert!(config.check_operation("devices").is_err());
            assert!(config.check_operation("snapshot").is_ok());
        }
    }
}
