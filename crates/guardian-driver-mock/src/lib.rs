//! Simulated MikroTik router for mikrotik-guardian.
//!
//! Stands in for a RouterOS API endpoint so the dashboard, the reconnect
//! logic and the tests run without hardware. All delays use
//! `tokio::time::sleep`, so paused-clock tests stay fast.
//!
//! - [`MockRouter`] - telemetry provider with a rolling log buffer
//! - [`MockConnector`] - login handshake
//!
//! # Latency in realistic mode
//!
//! - connect: 1000ms
//! - snapshot: 200-800ms
//! - device list: 150-600ms
//! - history: 300-900ms
//!
//! Share one [`ErrorConfig`] between a router and a connector to simulate a
//! single physical link that can be dropped and restored.

pub mod common;
pub mod generators;
mod mock_connector;
mod mock_router;

pub use common::{ErrorConfig, ErrorScenario, LatencyRange, MockMode, MockRng, TimingConfig};
pub use generators::{LogBuffer, FLEET, MAX_LOG_ENTRIES, ROUTER_IDENTITY};
pub use mock_connector::{MockConnector, MockConnectorBuilder};
pub use mock_router::{MockRouter, MockRouterBuilder};
