//! Router telemetry data model and the provider trait.
//!
//! Field names serialize in camelCase because the snapshot JSON is embedded
//! verbatim in the AI analysis prompt and mirrors the router API naming.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::LinkError;

/// Severity of a router log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Routine event
    Info,
    /// Worth a look
    Warning,
    /// Needs attention
    Critical,
}

/// One router log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Wall-clock time of day (`HH:MM:SS`)
    pub timestamp: String,
    /// Severity
    pub level: LogLevel,
    /// Log text
    pub message: String,
}

/// Current receive/transmit rate of one interface, in Mbps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceTraffic {
    /// Interface name (e.g. `ether1-WAN`)
    pub name: String,
    /// Receive rate
    pub rx: u32,
    /// Transmit rate
    pub tx: u32,
}

/// One bucket of an aggregated traffic history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalDataPoint {
    /// Bucket label (`HH:00` for hourly, weekday for daily)
    pub time: String,
    /// Receive rate
    pub rx: u32,
    /// Transmit rate
    pub tx: u32,
}

/// One immutable reading of router metrics at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterSnapshot {
    /// Router identity string
    pub identity: String,
    /// Uptime, formatted `{d}d {h}h {m}m`
    pub uptime: String,
    /// CPU load in percent
    pub cpu_load: f64,
    /// Memory usage in percent
    pub memory_usage: f64,
    /// Total memory in GB
    pub total_memory: f64,
    /// Disk usage in percent
    pub disk_usage: f64,
    /// Total disk in GB
    pub total_disk: f64,
    /// Number of logged-in users
    pub active_users: u32,
    /// Recent log lines, oldest first
    pub log_entries: Vec<LogEntry>,
    /// Per-interface traffic
    pub traffic: Vec<InterfaceTraffic>,
}

impl RouterSnapshot {
    /// Memory in use, in GB.
    #[must_use]
    pub fn memory_used_gb(&self) -> f64 {
        self.total_memory * (self.memory_usage / 100.0)
    }

    /// Disk in use, in GB.
    #[must_use]
    pub fn disk_used_gb(&self) -> f64 {
        self.total_disk * (self.disk_usage / 100.0)
    }

    /// Number of critical log entries in this snapshot.
    #[must_use]
    pub fn critical_log_count(&self) -> usize {
        self.log_entries
            .iter()
            .filter(|entry| entry.level == LogLevel::Critical)
            .count()
    }
}

/// Reachability of a managed device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    /// Reachable
    Online,
    /// Not reachable
    Offline,
}

/// Run state of a router service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    /// Service is up
    Running,
    /// Service is down
    Stopped,
}

/// A network service exposed by a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceService {
    /// Service name (e.g. `ssh`)
    pub name: String,
    /// Listening port
    pub port: u16,
    /// Run state
    pub status: ServiceStatus,
}

/// A device in the managed fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterDevice {
    /// Stable identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Management address
    pub ip_address: String,
    /// Reachability
    pub status: DeviceStatus,
    /// CPU load in percent
    pub cpu_load: f64,
    /// Memory usage in percent
    pub memory_usage: f64,
    /// Uptime, formatted `{d}d {h}h {m}m`
    pub uptime: String,
    /// Per-interface traffic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interfaces: Option<Vec<InterfaceTraffic>>,
    /// Exposed services
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<DeviceService>>,
    /// Device-local log lines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<LogEntry>>,
}

/// Aggregation window for historical traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryWindow {
    /// Hourly buckets over the last day
    #[serde(rename = "24h")]
    Last24h,
    /// Daily buckets over the last week
    #[serde(rename = "7d")]
    Last7d,
}

impl HistoryWindow {
    /// Short label used on the wire and in the UI.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Last24h => "24h",
            Self::Last7d => "7d",
        }
    }

    /// Number of buckets the window contains.
    #[must_use]
    pub fn bucket_count(self) -> usize {
        match self {
            Self::Last24h => 24,
            Self::Last7d => 7,
        }
    }
}

impl fmt::Display for HistoryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Source of router telemetry.
///
/// Implemented by the mock router in `guardian-driver-mock`; a real router API
/// client would implement the same trait.
#[async_trait]
pub trait TelemetryProvider: Send + Sync {
    /// Fetch the current metrics snapshot.
    async fn fetch_snapshot(&self) -> Result<RouterSnapshot, LinkError>;

    /// Fetch the managed device list.
    async fn fetch_devices(&self) -> Result<Vec<RouterDevice>, LinkError>;

    /// Fetch aggregated traffic for a window.
    async fn fetch_historical(
        &self,
        window: HistoryWindow,
    ) -> Result<Vec<HistoricalDataPoint>, LinkError>;
}
