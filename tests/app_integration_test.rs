//! Application wiring against the simulated router.

use async_trait::async_trait;
use guardian_analysis::{AnalysisError, AnalysisReport, Analyzer, GenerativeBackend};
use guardian_client::ConnectionStatus;
use guardian_core::{CredentialStore, Credentials, ManualScheduler, MemoryCredentialStore};
use mikrotik_guardian::{Guardian, GuardianConfig};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

fn instant_config() -> GuardianConfig {
    let mut config = GuardianConfig::default();
    config.telemetry.mock_mode = "instant".to_string();
    config.telemetry.seed = Some(7);
    config
}

fn creds() -> Credentials {
    Credentials::new("192.168.88.1:8728", "admin", "")
}

fn guardian_with(store: Arc<MemoryCredentialStore>) -> (Guardian, Arc<ManualScheduler>) {
    let scheduler = Arc::new(ManualScheduler::new());
    let guardian = Guardian::with_parts(instant_config(), store, scheduler.clone());
    (guardian, scheduler)
}

struct FixedBackend(&'static str);

#[async_trait]
impl GenerativeBackend for FixedBackend {
    async fn generate(&self, _prompt: &str, _schema: &Value) -> Result<String, AnalysisError> {
        Ok(self.0.to_string())
    }
}

#[tokio::test]
async fn test_configure_persists_and_connects() {
    let store = Arc::new(MemoryCredentialStore::new());
    let (mut guardian, _) = guardian_with(store.clone());

    assert!(guardian.configure(creds()).await);
    assert_eq!(guardian.status().status, ConnectionStatus::Connected);
    assert_eq!(store.load().unwrap(), Some(creds()));

    guardian.disconnect();
    assert!(store.load().unwrap().is_none());
    assert_eq!(guardian.status().status, ConnectionStatus::Disconnected);
}

#[tokio::test]
async fn test_configure_rejects_missing_user() {
    let (mut guardian, _) = guardian_with(Arc::new(MemoryCredentialStore::new()));
    assert!(!guardian.configure(Credentials::new("10.0.0.1", "", "")).await);
    assert_eq!(
        guardian.status().error.as_deref(),
        Some("Host and username are required.")
    );
}

#[tokio::test]
async fn test_poll_once_without_credentials() {
    let (mut guardian, _) = guardian_with(Arc::new(MemoryCredentialStore::new()));
    assert!(guardian.poll_once().await.is_none());
    assert_eq!(
        guardian.status().error.as_deref(),
        Some("Router API credentials are not configured.")
    );
}

#[tokio::test]
async fn test_poll_once_reads_everything() {
    let store = Arc::new(MemoryCredentialStore::with_credentials(creds()));
    let (mut guardian, _) = guardian_with(store);

    let state = guardian.poll_once().await.unwrap();
    assert!(state.snapshot.is_some());
    assert_eq!(state.devices.len(), 4);
    assert_eq!(state.history_24h.len(), 24);
    assert_eq!(state.history_7d.len(), 7);
}

#[tokio::test]
async fn test_poll_once_failure_starts_reconnect() {
    let store = Arc::new(MemoryCredentialStore::with_credentials(creds()));
    let (mut guardian, scheduler) = guardian_with(store);
    assert!(guardian.initialize().await);

    guardian.link().drop_link();
    let state = guardian.poll_once().await.unwrap();
    assert_eq!(state.error.as_deref(), Some("Failed to fetch MikroTik data."));

    let status = guardian.status();
    assert_eq!(status.status, ConnectionStatus::Error);
    assert_eq!(status.retry_attempt, 1);
    assert_eq!(scheduler.pending_delays(), vec![Duration::from_secs(1)]);
}

#[tokio::test]
async fn test_analysis_without_backend_falls_back() {
    let (guardian, _) = guardian_with(Arc::new(MemoryCredentialStore::new()));
    assert!(!guardian.has_analyzer());

    let snapshot = guardian.fetch_snapshot().await.unwrap();
    let report = guardian.request_analysis(&snapshot).await;
    assert_eq!(report, AnalysisReport::failed());
}

#[tokio::test]
async fn test_analysis_with_backend() {
    let (guardian, _) = guardian_with(Arc::new(MemoryCredentialStore::new()));
    let guardian = guardian.with_analyzer(Analyzer::new(Arc::new(FixedBackend(
        r#"{"summary": "Stable", "recommendations": ["Nothing to do"], "preventiveActions": []}"#,
    ))));

    let snapshot = guardian.fetch_snapshot().await.unwrap();
    let report = guardian.request_analysis(&snapshot).await;
    assert_eq!(report.summary, "Stable");
    assert!(!report.is_failure());
}

#[tokio::test(start_paused = true)]
async fn test_monitor_renders_until_shutdown() {
    let store = Arc::new(MemoryCredentialStore::with_credentials(creds()));
    let (mut guardian, _) = guardian_with(store);

    let mut statuses = Vec::new();
    let mut snapshots_seen = 0;
    let final_state = guardian
        .monitor(tokio::time::sleep(Duration::from_secs(65)), |status, state| {
            statuses.push(status.status);
            if state.snapshot.is_some() && !state.loading {
                snapshots_seen += 1;
            }
        })
        .await;

    assert_eq!(statuses.first(), Some(&ConnectionStatus::Connected));
    assert!(snapshots_seen >= 1);
    assert!(final_state.snapshot.is_some());
    assert_eq!(guardian.status().status, ConnectionStatus::Connected);
}
