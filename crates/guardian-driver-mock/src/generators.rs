//! Pure telemetry generators.
//!
//! Every function takes its randomness and the wall-clock instant explicitly,
//! so a seeded [`MockRng`] and a fixed timestamp give byte-identical output.

use chrono::{DateTime, Datelike, Duration, Local, TimeZone, Timelike};
use guardian_core::telemetry::{
    DeviceService, DeviceStatus, HistoricalDataPoint, HistoryWindow, InterfaceTraffic, LogEntry,
    LogLevel, RouterDevice, RouterSnapshot, ServiceStatus,
};
use std::collections::VecDeque;

use crate::common::MockRng;

/// Identity reported by the simulated head-end router.
pub const ROUTER_IDENTITY: &str = "MikroTik-HQ-Router";

/// Entries seeded into a fresh [`LogBuffer`].
pub const INITIAL_LOG_ENTRIES: usize = 5;

/// Capacity of the rolling router log.
pub const MAX_LOG_ENTRIES: usize = 20;

const LEVEL_WEIGHTS: [LogLevel; 6] = [
    LogLevel::Info,
    LogLevel::Info,
    LogLevel::Info,
    LogLevel::Info,
    LogLevel::Warning,
    LogLevel::Critical,
];

const WARNING_MESSAGES: [&str; 3] = [
    "firewall rule matched: drop shady traffic",
    "high CPU usage detected",
    "potential port scan from 1.2.3.4",
];

const CRITICAL_MESSAGES: [&str; 3] = [
    "login failure for user root",
    "router configuration changed",
    "system failed to update",
];

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// (name, rx range, tx range) in Mbps, upper bounds exclusive.
type TrafficProfile = (&'static str, (u32, u32), (u32, u32));

const ROUTER_INTERFACES: [TrafficProfile; 4] = [
    ("ether1-WAN", (50, 500), (10, 100)),
    ("ether2-LAN", (100, 800), (200, 900)),
    ("wlan1-WiFi", (50, 300), (80, 400)),
    ("VPN-Office", (5, 50), (5, 50)),
];

const DEVICE_INTERFACES: [TrafficProfile; 3] = [
    ("ether1", (50, 500), (10, 100)),
    ("ether2", (100, 800), (200, 900)),
    ("wlan1", (50, 300), (80, 400)),
];

/// Static part of a managed device.
#[derive(Debug, Clone, Copy)]
pub struct DeviceSeed {
    /// Stable identifier
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Management address
    pub ip_address: &'static str,
    /// Baseline reachability
    pub status: DeviceStatus,
}

/// The simulated fleet.
pub const FLEET: [DeviceSeed; 4] = [
    DeviceSeed {
        id: "dev1",
        name: "HQ-Router-01",
        ip_address: "192.168.88.1",
        status: DeviceStatus::Online,
    },
    DeviceSeed {
        id: "dev2",
        name: "Branch-Office-VPN",
        ip_address: "10.10.5.1",
        status: DeviceStatus::Online,
    },
    DeviceSeed {
        id: "dev3",
        name: "Warehouse-AP-Controller",
        ip_address: "192.168.100.1",
        status: DeviceStatus::Offline,
    },
    DeviceSeed {
        id: "dev4",
        name: "Backup-Gateway",
        ip_address: "192.168.88.2",
        status: DeviceStatus::Online,
    },
];

fn format_timestamp(now: &DateTime<Local>) -> String {
    now.format("%H:%M:%S").to_string()
}

fn format_uptime(rng: &MockRng, max_days: u32) -> String {
    format!(
        "{}d {}h {}m",
        rng.int_range(1, max_days),
        rng.int_range(0, 23),
        rng.int_range(0, 59)
    )
}

fn traffic(rng: &MockRng, profiles: &[TrafficProfile]) -> Vec<InterfaceTraffic> {
    profiles
        .iter()
        .map(|(name, rx, tx)| InterfaceTraffic {
            name: (*name).to_string(),
            rx: rng.int_range(rx.0, rx.1),
            tx: rng.int_range(tx.0, tx.1),
        })
        .collect()
}

/// One random log line attributed to `source` (defaults to `router`).
pub fn generate_log_entry(rng: &MockRng, source: Option<&str>, now: &DateTime<Local>) -> LogEntry {
    let level = rng.pick(&LEVEL_WEIGHTS).copied().unwrap_or(LogLevel::Info);
    let message = match level {
        LogLevel::Info => {
            let login = format!("user admin logged in to {}", source.unwrap_or("router"));
            let options = [
                login,
                "ether1 link down".to_string(),
                "ether1 link up".to_string(),
                "System rebooted".to_string(),
            ];
            rng.pick(&options).cloned().unwrap_or_default()
        }
        LogLevel::Warning => rng
            .pick(&WARNING_MESSAGES)
            .map(|m| (*m).to_string())
            .unwrap_or_default(),
        LogLevel::Critical => rng
            .pick(&CRITICAL_MESSAGES)
            .map(|m| (*m).to_string())
            .unwrap_or_default(),
    };

    LogEntry {
        timestamp: format_timestamp(now),
        level,
        message,
    }
}

/// Rolling router log, oldest entry first.
#[derive(Debug, Clone, Default)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
}

impl LogBuffer {
    /// Empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer pre-filled with [`INITIAL_LOG_ENTRIES`] random lines.
    pub fn seeded(rng: &MockRng, now: &DateTime<Local>) -> Self {
        let mut buffer = Self::new();
        for _ in 0..INITIAL_LOG_ENTRIES {
            buffer.push(generate_log_entry(rng, Some(ROUTER_IDENTITY), now));
        }
        buffer
    }

    /// Append a line, evicting the oldest beyond [`MAX_LOG_ENTRIES`].
    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > MAX_LOG_ENTRIES {
            self.entries.pop_front();
        }
    }

    /// Number of buffered lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of the buffered lines, oldest first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }
}

/// A fresh router snapshot. Appends exactly one line to `logs`.
pub fn generate_snapshot(rng: &MockRng, logs: &mut LogBuffer, now: &DateTime<Local>) -> RouterSnapshot {
    logs.push(generate_log_entry(rng, Some(ROUTER_IDENTITY), now));

    RouterSnapshot {
        identity: ROUTER_IDENTITY.to_string(),
        uptime: format_uptime(rng, 30),
        cpu_load: rng.percent(5.0, 85.0),
        memory_usage: rng.percent(25.0, 90.0),
        total_memory: 2.0,
        disk_usage: rng.percent(10.0, 60.0),
        total_disk: 0.5,
        active_users: rng.int_range(5, 50),
        log_entries: logs.to_vec(),
        traffic: traffic(rng, &ROUTER_INTERFACES),
    }
}

fn offline_device(seed: &DeviceSeed, now: &DateTime<Local>) -> RouterDevice {
    RouterDevice {
        id: seed.id.to_string(),
        name: seed.name.to_string(),
        ip_address: seed.ip_address.to_string(),
        status: DeviceStatus::Offline,
        cpu_load: 0.0,
        memory_usage: 0.0,
        uptime: "0d 0h 0m".to_string(),
        interfaces: Some(Vec::new()),
        services: Some(Vec::new()),
        logs: Some(vec![LogEntry {
            timestamp: format_timestamp(now),
            level: LogLevel::Critical,
            message: "Device is offline".to_string(),
        }]),
    }
}

fn services(rng: &MockRng) -> Vec<DeviceService> {
    let api_status = if rng.next_f64() > 0.5 {
        ServiceStatus::Running
    } else {
        ServiceStatus::Stopped
    };
    let all = [
        ("www", 80, ServiceStatus::Running),
        ("ssh", 22, ServiceStatus::Running),
        ("api", 8728, api_status),
        ("winbox", 8291, ServiceStatus::Running),
        ("dns", 53, ServiceStatus::Running),
    ];
    all.into_iter()
        .filter(|_| rng.next_f64() > 0.3)
        .map(|(name, port, status)| DeviceService {
            name: name.to_string(),
            port,
            status,
        })
        .collect()
}

fn online_device(rng: &MockRng, seed: &DeviceSeed, now: &DateTime<Local>) -> RouterDevice {
    let interfaces = traffic(rng, &DEVICE_INTERFACES);
    let services = services(rng);
    let cpu_load = rng.percent(5.0, 95.0);
    let memory_usage = rng.percent(20.0, 90.0);
    let uptime = format_uptime(rng, 45);
    // Reachable devices occasionally report offline but keep their details.
    let status = if rng.next_f64() > 0.95 {
        DeviceStatus::Offline
    } else {
        DeviceStatus::Online
    };
    let log_count = rng.int_range(3, 8);
    let logs = (0..log_count)
        .map(|_| generate_log_entry(rng, Some(seed.name), now))
        .collect();

    RouterDevice {
        id: seed.id.to_string(),
        name: seed.name.to_string(),
        ip_address: seed.ip_address.to_string(),
        status,
        cpu_load,
        memory_usage,
        uptime,
        interfaces: Some(interfaces),
        services: Some(services),
        logs: Some(logs),
    }
}

/// Current state of every device in [`FLEET`].
pub fn generate_devices(rng: &MockRng, now: &DateTime<Local>) -> Vec<RouterDevice> {
    FLEET
        .iter()
        .map(|seed| match seed.status {
            DeviceStatus::Offline => offline_device(seed, now),
            DeviceStatus::Online => online_device(rng, seed, now),
        })
        .collect()
}

/// Diurnal traffic shape, lowest around midnight and peaking at 16:00.
#[must_use]
pub fn peak_factor(hour: u32) -> f64 {
    ((f64::from(hour) - 8.0) * std::f64::consts::PI / 16.0).sin() * 0.4 + 0.6
}

fn scaled(rng: &MockRng, min: f64, max: f64, factor: f64) -> u32 {
    let raw = (min + rng.next_f64() * (max - min)) * factor;
    raw.round().max(0.0) as u32
}

/// Aggregated traffic for the window ending at `now`, oldest bucket first.
pub fn generate_history<Tz: TimeZone>(
    rng: &MockRng,
    window: HistoryWindow,
    now: &DateTime<Tz>,
) -> Vec<HistoricalDataPoint> {
    match window {
        HistoryWindow::Last24h => (0..24)
            .rev()
            .map(|hours_ago| {
                let hour = (now.clone() - Duration::hours(hours_ago)).hour();
                let factor = peak_factor(hour);
                HistoricalDataPoint {
                    time: format!("{:02}:00", hour),
                    rx: scaled(rng, 200.0, 450.0, factor),
                    tx: scaled(rng, 50.0, 100.0, factor),
                }
            })
            .collect(),
        HistoryWindow::Last7d => (0..7)
            .rev()
            .map(|days_ago| {
                let day = (now.clone() - Duration::days(days_ago))
                    .weekday()
                    .num_days_from_sunday() as usize;
                let factor = if day == 0 || day == 6 { 1.25 } else { 1.0 };
                HistoricalDataPoint {
                    time: WEEKDAYS[day % WEEKDAYS.len()].to_string(),
                    rx: scaled(rng, 150.0, 400.0, factor),
                    tx: scaled(rng, 40.0, 90.0, factor),
                }
            })
            .collect(),
    }
}
