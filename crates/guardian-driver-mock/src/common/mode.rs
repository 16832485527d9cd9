//! Operational modes for the simulated router.
//!
//! - **Instant**: No latency, for unit tests
//! - **Realistic**: API-like latency on every call
//! - **Chaos**: Realistic latency plus random link failures

/// How the simulated router behaves on each call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MockMode {
    /// No latency
    #[default]
    Instant,
    /// Random latency drawn from the [`TimingConfig`](super::TimingConfig)
    Realistic,
    /// Latency plus random communication failures
    Chaos,
}

impl MockMode {
    /// Whether calls should sleep before answering.
    #[must_use]
    pub fn simulates_latency(self) -> bool {
        !matches!(self, MockMode::Instant)
    }
}
