//! Integration tests for the simulated router.

use guardian_core::{Connector, Credentials, DeviceStatus, HistoryWindow, TelemetryProvider};
use guardian_driver_mock::*;
use std::sync::Arc;

fn creds() -> Credentials {
    Credentials::new("192.168.88.1:8728", "admin", "")
}

/// Router and connector work as trait objects
#[tokio::test]
async fn test_trait_objects() {
    let provider: Arc<dyn TelemetryProvider> = Arc::new(MockRouter::builder().seed(10).build());
    let connector: Arc<dyn Connector> = Arc::new(MockConnector::new());

    connector.connect(&creds()).await.unwrap();
    let snapshot = provider.fetch_snapshot().await.unwrap();
    assert_eq!(snapshot.identity, ROUTER_IDENTITY);
}

/// Snapshot and device list can be fetched concurrently
#[tokio::test]
async fn test_concurrent_fetch() {
    let router = MockRouter::builder().seed(11).build();
    let (snapshot, devices) =
        futures::future::try_join(router.fetch_snapshot(), router.fetch_devices())
            .await
            .unwrap();

    assert_eq!(snapshot.traffic.len(), 4);
    assert_eq!(devices.len(), FLEET.len());
    assert!(devices
        .iter()
        .any(|d| d.id == "dev3" && d.status == DeviceStatus::Offline));
}

/// One error config shared by router and connector behaves like one link
#[tokio::test]
async fn test_shared_link_drop_and_restore() {
    let link = ErrorConfig::none();
    let router = MockRouter::builder().error_config(link.clone()).build();
    let connector = MockConnector::builder().error_config(link.clone()).build();

    link.drop_link();
    assert!(router.fetch_snapshot().await.is_err());
    assert!(router.fetch_historical(HistoryWindow::Last7d).await.is_err());
    let err = connector.connect(&creds()).await.unwrap_err();
    assert!(err.is_retriable());

    link.restore_link();
    assert!(connector.connect(&creds()).await.is_ok());
    assert!(router.fetch_snapshot().await.is_ok());
}

/// Communication loss scenario trips on the first call of any kind
#[tokio::test]
async fn test_communication_loss_scenario() {
    let link = ErrorConfig::scenario(ErrorScenario::CommunicationLoss);
    let router = MockRouter::builder().error_config(link.clone()).build();

    assert!(router.fetch_devices().await.is_err());
    assert!(link.is_link_down());
    assert!(router.fetch_snapshot().await.is_err());
    assert_eq!(router.device_calls(), 1);
    assert_eq!(router.snapshot_calls(), 1);
}

/// Seeded routers produce identical numbers
#[tokio::test]
async fn test_seeded_reproducibility() {
    let a = MockRouter::builder().seed(99).build();
    let b = MockRouter::builder().seed(99).build();

    let sa = a.fetch_snapshot().await.unwrap();
    let sb = b.fetch_snapshot().await.unwrap();
    assert_eq!(sa.cpu_load, sb.cpu_load);
    assert_eq!(sa.traffic, sb.traffic);
    assert_eq!(sa.uptime, sb.uptime);
}

/// Test mock modes
#[test]
fn test_mock_modes() {
    assert_eq!(MockMode::default(), MockMode::Instant);
    assert!(MockMode::Chaos.simulates_latency());
}
