//! Latency profile for realistic mode.

use std::time::Duration;

use super::rng::MockRng;

/// Inclusive latency bounds in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyRange {
    /// Fastest answer
    pub min_ms: u64,
    /// Slowest answer
    pub max_ms: u64,
}

impl LatencyRange {
    /// Range between two bounds.
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// Fixed latency.
    pub const fn fixed(ms: u64) -> Self {
        Self::new(ms, ms)
    }

    /// Draw a latency from the range.
    pub fn sample(&self, rng: &MockRng) -> Duration {
        if self.max_ms <= self.min_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rng.gen_range(self.min_ms..=self.max_ms))
    }
}

/// Simulated API latency per call type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingConfig {
    /// Connection handshake
    pub connect: LatencyRange,
    /// Snapshot fetch
    pub snapshot: LatencyRange,
    /// Device list fetch
    pub devices: LatencyRange,
    /// Historical traffic fetch
    pub historical: LatencyRange,
}

impl TimingConfig {
    /// Latencies of a RouterOS API reached over a WAN link.
    pub fn router_api() -> Self {
        Self {
            connect: LatencyRange::fixed(1000),
            snapshot: LatencyRange::new(200, 800),
            devices: LatencyRange::new(150, 600),
            historical: LatencyRange::new(300, 900),
        }
    }

    /// No latency anywhere.
    pub fn zero() -> Self {
        Self {
            connect: LatencyRange::fixed(0),
            snapshot: LatencyRange::fixed(0),
            devices: LatencyRange::fixed(0),
            historical: LatencyRange::fixed(0),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::router_api()
    }
}
