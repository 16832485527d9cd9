//! Shared building blocks for the simulated router.
//!
//! - **mode**: Operational modes (Instant, Realistic, Chaos)
//! - **timing**: Simulated API latencies
//! - **errors**: Link fault injection
//! - **rng**: Seeded random number generator

pub mod errors;
pub mod mode;
pub mod rng;
pub mod timing;

pub use errors::{ErrorConfig, ErrorScenario};
pub use mode::MockMode;
pub use rng::MockRng;
pub use timing::{LatencyRange, TimingConfig};
