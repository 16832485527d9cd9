//! End-to-end tests: connection manager and poller against the simulated router.

use guardian_client::*;
use guardian_core::{
    CredentialStore, Credentials, FileCredentialStore, ManualScheduler, MemoryCredentialStore,
};
use guardian_driver_mock::{ErrorConfig, ErrorScenario, MockConnector, MockRouter};
use std::sync::Arc;
use std::time::Duration;

fn creds() -> Credentials {
    Credentials::new("103.172.204.153:8728", "apiuser", "secret")
}

struct Rig {
    manager: ConnectionManager,
    connector: Arc<MockConnector>,
    scheduler: Arc<ManualScheduler>,
    store: Arc<MemoryCredentialStore>,
    link: ErrorConfig,
}

fn rig() -> Rig {
    let link = ErrorConfig::none();
    let connector = Arc::new(MockConnector::builder().error_config(link.clone()).build());
    let scheduler = Arc::new(ManualScheduler::new());
    let store = Arc::new(MemoryCredentialStore::new());
    let manager = ConnectionManager::new(connector.clone(), store.clone(), scheduler.clone());
    Rig {
        manager,
        connector,
        scheduler,
        store,
        link,
    }
}

#[tokio::test]
async fn test_connect_validation() {
    let Rig {
        mut manager,
        connector,
        ..
    } = rig();

    assert!(manager.connect(&creds(), false).await);
    assert_eq!(manager.status(), ConnectionStatus::Connected);
    assert_eq!(manager.error(), None);

    assert!(!manager.connect(&Credentials::new("", "apiuser", "x"), false).await);
    assert_eq!(manager.status(), ConnectionStatus::Error);
    assert_eq!(manager.error(), Some("Host and username are required."));
    // Validation failures never reach the router
    assert_eq!(connector.attempts(), 1);
}

#[tokio::test]
async fn test_backoff_doubles_across_failed_retries() {
    let Rig {
        mut manager,
        scheduler,
        link,
        ..
    } = rig();
    manager.save_credentials(creds()).await;

    link.drop_link();
    manager.report_connection_lost("Failed to fetch MikroTik data.");

    for expected_attempt in 2..=4 {
        assert!(scheduler.fire_next());
        manager.poll().await;
        assert_eq!(manager.status(), ConnectionStatus::Error);
        assert_eq!(manager.retry_attempt(), expected_attempt);
        assert_eq!(scheduler.pending_count(), 1);
    }

    let delays: Vec<u64> = scheduler
        .scheduled_delays()
        .iter()
        .map(|d| d.as_millis() as u64)
        .collect();
    assert_eq!(delays, [1000, 2000, 4000, 8000]);
    assert_eq!(
        manager.error(),
        Some("Connection lost. Retrying in 8s (attempt 4)...")
    );

    link.restore_link();
    assert!(scheduler.fire_next());
    manager.poll().await;
    assert_eq!(manager.status(), ConnectionStatus::Connected);
    assert_eq!(manager.retry_attempt(), 0);
    assert_eq!(scheduler.pending_count(), 0);
}

#[tokio::test]
async fn test_retry_waits_for_full_delay() {
    let Rig {
        mut manager,
        connector,
        scheduler,
        ..
    } = rig();
    manager.save_credentials(creds()).await;
    manager.report_connection_lost("link down");

    assert_eq!(scheduler.advance(Duration::from_millis(999)), 0);
    assert_eq!(manager.poll().await, 0);
    assert_eq!(connector.attempts(), 1);

    assert_eq!(scheduler.advance(Duration::from_millis(1)), 1);
    manager.poll().await;
    assert_eq!(connector.attempts(), 2);
    assert!(manager.status().is_connected());
}

#[tokio::test]
async fn test_save_credentials_resets_retry_cycle() {
    let Rig {
        mut manager,
        scheduler,
        store,
        link,
        ..
    } = rig();
    manager.save_credentials(creds()).await;
    link.drop_link();
    manager.report_connection_lost("link down");
    scheduler.fire_next();
    manager.poll().await;
    assert_eq!(manager.retry_attempt(), 2);

    link.restore_link();
    let replacement = Credentials::new("192.168.88.1:8728", "admin", "");
    assert!(manager.save_credentials(replacement.clone()).await);
    assert_eq!(manager.retry_attempt(), 0);
    assert_eq!(scheduler.pending_count(), 0);
    assert_eq!(store.load().unwrap(), Some(replacement));
}

#[tokio::test]
async fn test_repeated_test_connection_keeps_counter_at_zero() {
    let Rig {
        mut manager,
        scheduler,
        store,
        ..
    } = rig();

    for _ in 0..3 {
        assert!(manager.test_connection(&creds()).await);
        assert_eq!(manager.retry_attempt(), 0);
    }
    assert_eq!(scheduler.pending_count(), 0);
    // Testing never persists
    assert!(store.load().unwrap().is_none());
}

#[tokio::test]
async fn test_auth_rejection_stops_retrying() {
    let link = ErrorConfig::scenario(ErrorScenario::AuthenticationRejected);
    let connector = Arc::new(MockConnector::builder().error_config(link).build());
    let scheduler = Arc::new(ManualScheduler::new());
    let store = Arc::new(MemoryCredentialStore::with_credentials(creds()));
    let mut manager = ConnectionManager::new(connector, store, scheduler.clone());

    assert!(!manager.initialize().await);
    assert_eq!(manager.status(), ConnectionStatus::Error);
    assert_eq!(manager.retry_attempt(), 0);
    assert_eq!(scheduler.pending_count(), 0);
}

#[tokio::test]
async fn test_initialize_from_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");

    {
        let store = Arc::new(FileCredentialStore::new(&path));
        let mut manager = ConnectionManager::new(
            Arc::new(MockConnector::new()),
            store,
            Arc::new(ManualScheduler::new()),
        );
        assert!(!manager.initialize().await);
        assert_eq!(manager.error(), Some(MSG_NOT_CONFIGURED));
        manager.save_credentials(creds()).await;
    }

    let mut manager = ConnectionManager::new(
        Arc::new(MockConnector::new()),
        Arc::new(FileCredentialStore::new(&path)),
        Arc::new(ManualScheduler::new()),
    );
    assert!(manager.initialize().await);
    assert_eq!(manager.credentials(), Some(&creds()));

    manager.disconnect();
    assert!(FileCredentialStore::new(&path).load().unwrap().is_none());
}

/// Poll failure flows from poller to manager and back again once the link returns
#[tokio::test]
async fn test_poller_failure_drives_reconnect() {
    let Rig {
        mut manager,
        scheduler,
        link,
        ..
    } = rig();
    let router = Arc::new(
        MockRouter::builder()
            .error_config(link.clone())
            .seed(3)
            .build(),
    );
    let mut poller = TelemetryPoller::new(router.clone(), PollerConfig::default())
        .with_observer(Arc::new(manager.observer()));

    manager.save_credentials(creds()).await;
    poller.on_status(manager.status()).await;
    assert!(poller.state().has_data());
    assert_eq!(poller.state().history_24h.len(), 24);

    link.drop_link();
    assert!(!poller.refresh().await);
    assert_eq!(poller.state().error.as_deref(), Some(MSG_FETCH_FAILED));
    // Stale data is kept on screen
    assert!(poller.state().snapshot.is_some());

    manager.poll().await;
    assert_eq!(manager.status(), ConnectionStatus::Error);
    assert_eq!(manager.retry_attempt(), 1);
    poller.on_status(manager.status()).await;
    assert!(!poller.is_active());
    assert!(!poller.state().has_data());

    link.restore_link();
    scheduler.fire_next();
    manager.poll().await;
    assert!(manager.status().is_connected());

    poller.on_status(manager.status()).await;
    assert!(poller.is_active());
    assert!(poller.state().has_data());
    assert_eq!(poller.state().error, None);
}
