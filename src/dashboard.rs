//! Plain-text rendering of connection state, telemetry and analysis reports.

use guardian_analysis::AnalysisReport;
use guardian_client::{ConnectionSnapshot, DashboardState};
use guardian_core::telemetry::{
    DeviceStatus, HistoricalDataPoint, LogLevel, RouterDevice, RouterSnapshot,
};
use std::fmt::Write;

const RECENT_LOGS: usize = 5;

/// One-line connection status, with the error or retry countdown if any.
pub fn render_status(status: &ConnectionSnapshot) -> String {
    let mut out = format!("[{}]", status.status.label());
    if let Some(error) = &status.error {
        let _ = write!(out, " {error}");
    }
    if let Some(next) = status.next_retry_in {
        let _ = write!(out, " (next attempt in {:.0}s)", next.as_secs_f64().ceil());
    }
    out
}

/// Full dashboard view. Empty when there is nothing cached.
pub fn render_dashboard(state: &DashboardState) -> String {
    let mut out = String::new();

    if let Some(error) = &state.error {
        let _ = writeln!(out, "! {error}");
    }
    if let Some(snapshot) = &state.snapshot {
        out.push_str(&render_snapshot(snapshot));
    }
    if !state.devices.is_empty() {
        out.push_str(&render_devices(&state.devices));
    }
    if !state.history_24h.is_empty() {
        let _ = writeln!(out, "Traffic 24h: {}", render_history(&state.history_24h));
    }
    if !state.history_7d.is_empty() {
        let _ = writeln!(out, "Traffic 7d:  {}", render_history(&state.history_7d));
    }
    if let Some(at) = state.last_updated {
        let _ = writeln!(out, "Last updated {}", at.format("%H:%M:%S"));
    }
    out
}

fn render_snapshot(snapshot: &RouterSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}  up {}", snapshot.identity, snapshot.uptime);
    let _ = writeln!(
        out,
        "  CPU {:>5.1}%   Memory {:>5.1}% ({:.2}/{:.0} GB)   Disk {:>5.1}% ({:.2}/{:.1} GB)   Users {}",
        snapshot.cpu_load,
        snapshot.memory_usage,
        snapshot.memory_used_gb(),
        snapshot.total_memory,
        snapshot.disk_usage,
        snapshot.disk_used_gb(),
        snapshot.total_disk,
        snapshot.active_users
    );
    for iface in &snapshot.traffic {
        let _ = writeln!(
            out,
            "  {:<12} rx {:>4} Mbps  tx {:>4} Mbps",
            iface.name, iface.rx, iface.tx
        );
    }

    let critical = snapshot.critical_log_count();
    if critical > 0 {
        let _ = writeln!(out, "  {critical} critical log entries");
    }
    let skip = snapshot.log_entries.len().saturating_sub(RECENT_LOGS);
    for entry in snapshot.log_entries.iter().skip(skip) {
        let level = match entry.level {
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Critical => "CRIT",
        };
        let _ = writeln!(out, "  {} {:<4} {}", entry.timestamp, level, entry.message);
    }
    out
}

fn render_devices(devices: &[RouterDevice]) -> String {
    let mut out = String::from("Devices:\n");
    for device in devices {
        match device.status {
            DeviceStatus::Online => {
                let _ = writeln!(
                    out,
                    "  {:<24} {:<15} online   CPU {:>5.1}%  Mem {:>5.1}%  up {}",
                    device.name, device.ip_address, device.cpu_load, device.memory_usage, device.uptime
                );
            }
            DeviceStatus::Offline => {
                let _ = writeln!(out, "  {:<24} {:<15} OFFLINE", device.name, device.ip_address);
            }
        }
    }
    out
}

/// Peak bucket and average rx/tx for a history series.
fn render_history(points: &[HistoricalDataPoint]) -> String {
    let Some(peak) = points.iter().max_by_key(|p| p.rx + p.tx) else {
        return "no data".to_string();
    };
    let count = points.len() as u64;
    let avg_rx = points.iter().map(|p| u64::from(p.rx)).sum::<u64>() / count;
    let avg_tx = points.iter().map(|p| u64::from(p.tx)).sum::<u64>() / count;
    format!(
        "avg rx {avg_rx} / tx {avg_tx} Mbps, peak at {} (rx {} / tx {})",
        peak.time, peak.rx, peak.tx
    )
}

/// AI analysis report.
pub fn render_report(report: &AnalysisReport) -> String {
    let mut out = format!("Summary: {}\n", report.summary);
    if !report.recommendations.is_empty() {
        out.push_str("Recommendations:\n");
        for rec in &report.recommendations {
            let _ = writeln!(out, "  - {rec}");
        }
    }
    if !report.preventive_actions.is_empty() {
        out.push_str("Preventive actions:\n");
        for action in &report.preventive_actions {
            let _ = writeln!(out, "  - [{}] {}", action.risk, action.action);
        }
    }
    out
}
