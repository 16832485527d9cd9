//! Application wiring.
//!
//! [`Guardian`] owns the connection manager and the simulated router link
//! built from [`GuardianConfig`], and exposes one method per CLI command.

use guardian_analysis::{AnalysisReport, Analyzer, GeminiClient};
use guardian_client::{
    ConnectionManager, ConnectionSnapshot, DashboardState, TelemetryPoller,
};
use guardian_core::{
    CredentialStore, Credentials, FileCredentialStore, LinkError, RouterSnapshot, Scheduler,
    TelemetryProvider, TokioScheduler,
};
use guardian_driver_mock::{ErrorConfig, MockConnector, MockRouter};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::config::GuardianConfig;
use crate::error::AppResult;

/// The running application.
pub struct Guardian {
    config: GuardianConfig,
    manager: ConnectionManager,
    router: Arc<MockRouter>,
    link: ErrorConfig,
    analyzer: Option<Analyzer>,
}

impl Guardian {
    /// Build from configuration, with credentials persisted to the configured
    /// file and timers on the current tokio runtime.
    pub fn new(config: GuardianConfig) -> AppResult<Self> {
        let store = Arc::new(FileCredentialStore::new(
            config.storage.resolve_credentials_path()?,
        ));
        let scheduler = Arc::new(TokioScheduler::try_current()?);
        let mut guardian = Self::with_parts(config, store, scheduler);

        match GeminiClient::new(guardian.config.analysis.to_gemini_config()) {
            Ok(client) => guardian.analyzer = Some(Analyzer::new(Arc::new(client))),
            Err(e) if e.is_configuration() => {
                tracing::warn!("Gemini API key not found. AI features will not work.");
            }
            Err(e) => tracing::warn!(error = %e, "AI backend unavailable"),
        }
        Ok(guardian)
    }

    /// Build with an explicit store and scheduler. No analyzer is attached.
    pub fn with_parts(
        config: GuardianConfig,
        store: Arc<dyn CredentialStore>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        let link = ErrorConfig::none();
        let mode = config.telemetry.mode();
        let timing = config.timing();

        let mut router = MockRouter::builder()
            .mode(mode)
            .timing(timing)
            .error_config(link.clone());
        let mut connector = MockConnector::builder()
            .mode(mode)
            .timing(timing)
            .error_config(link.clone());
        if let Some(seed) = config.telemetry.seed {
            router = router.seed(seed);
            connector = connector.seed(seed.wrapping_add(1));
        }

        let manager = ConnectionManager::with_config(
            Arc::new(connector.build()),
            store,
            scheduler,
            config.connection.reconnect.to_reconnect_config(),
        );

        Self {
            config,
            manager,
            router: Arc::new(router.build()),
            link,
            analyzer: None,
        }
    }

    /// Attach an analyzer, replacing any configured one.
    #[must_use]
    pub fn with_analyzer(mut self, analyzer: Analyzer) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &GuardianConfig {
        &self.config
    }

    /// The connection manager.
    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Fault injection for the simulated link.
    pub fn link(&self) -> &ErrorConfig {
        &self.link
    }

    /// Whether AI analysis is available.
    pub fn has_analyzer(&self) -> bool {
        self.analyzer.is_some()
    }

    /// Restore saved credentials and connect if possible.
    pub async fn initialize(&mut self) -> bool {
        self.manager.initialize().await
    }

    /// Save credentials and connect with them.
    pub async fn configure(&mut self, credentials: Credentials) -> bool {
        self.manager.save_credentials(credentials).await
    }

    /// Try credentials without saving them.
    pub async fn test(&mut self, credentials: &Credentials) -> bool {
        self.manager.test_connection(credentials).await
    }

    /// Forget saved credentials.
    pub fn disconnect(&mut self) {
        self.manager.disconnect();
    }

    /// Current connection state.
    pub fn status(&self) -> ConnectionSnapshot {
        self.manager.snapshot()
    }

    fn poller(&self) -> TelemetryPoller {
        TelemetryPoller::new(self.router.clone(), self.config.telemetry.to_poller_config())
            .with_observer(Arc::new(self.manager.observer()))
    }

    /// Connect with saved credentials and take one full dashboard reading.
    ///
    /// Returns `None` when no connection could be made.
    pub async fn poll_once(&mut self) -> Option<DashboardState> {
        if !self.manager.status().is_connected() && !self.initialize().await {
            return None;
        }
        let mut poller = self.poller();
        poller.on_status(self.manager.status()).await;
        // A failed refresh reports the loss; apply it so status is accurate
        self.manager.poll().await;
        Some(poller.state().clone())
    }

    /// Run the dashboard until `shutdown` resolves.
    ///
    /// `render` is called with the latest connection state and dashboard
    /// after every connection event and every dashboard update.
    pub async fn monitor<S, R>(&mut self, shutdown: S, mut render: R) -> DashboardState
    where
        S: Future<Output = ()>,
        R: FnMut(&ConnectionSnapshot, &DashboardState),
    {
        let poller = self.poller();
        let mut dashboard_rx = poller.subscribe();
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(poller.run(self.manager.subscribe(), stop_rx));

        self.manager.initialize().await;
        let mut dashboard = dashboard_rx.borrow().clone();
        render(&self.manager.snapshot(), &dashboard);

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                event = self.manager.next_event() => {
                    let Some(event) = event else { break };
                    self.manager.handle_event(event).await;
                    render(&self.manager.snapshot(), &dashboard);
                }
                changed = dashboard_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    dashboard = dashboard_rx.borrow_and_update().clone();
                    render(&self.manager.snapshot(), &dashboard);
                }
            }
        }

        let _ = stop_tx.send(());
        self.manager.shutdown();
        match task.await {
            Ok(state) => state,
            Err(e) => {
                tracing::error!(error = %e, "Telemetry poller task failed");
                dashboard
            }
        }
    }

    /// Fetch the current router snapshot.
    pub async fn fetch_snapshot(&self) -> Result<RouterSnapshot, LinkError> {
        self.router.fetch_snapshot().await
    }

    /// Analyze a snapshot. Any failure, including a missing API key, yields
    /// [`AnalysisReport::failed`].
    pub async fn request_analysis(&self, snapshot: &RouterSnapshot) -> AnalysisReport {
        match &self.analyzer {
            Some(analyzer) => analyzer.analyze_or_fallback(snapshot).await,
            None => {
                tracing::error!("Gemini API key is not configured");
                AnalysisReport::failed()
            }
        }
    }
}

impl std::fmt::Debug for Guardian {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Guardian")
            .field("status", &self.manager.status())
            .field("has_analyzer", &self.analyzer.is_some())
            .finish_non_exhaustive()
    }
}
