//! Snapshot in, report out.

use guardian_core::telemetry::RouterSnapshot;
use std::sync::Arc;

use crate::error::AnalysisError;
use crate::gemini::GenerativeBackend;
use crate::prompt::{build_prompt, response_schema};
use crate::report::AnalysisReport;

/// Requests a narrative analysis of one router snapshot.
///
/// Each call is independent: there is no caching and no retry.
#[derive(Clone)]
pub struct Analyzer {
    backend: Arc<dyn GenerativeBackend>,
}

impl Analyzer {
    /// Analyzer over the given backend.
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self { backend }
    }

    /// Ask the backend for a report on `snapshot`.
    pub async fn analyze(&self, snapshot: &RouterSnapshot) -> Result<AnalysisReport, AnalysisError> {
        let prompt = build_prompt(snapshot)?;
        let text = self.backend.generate(&prompt, &response_schema()).await?;
        let report = AnalysisReport::parse(&text)?;
        tracing::info!(
            recommendations = report.recommendations.len(),
            preventive_actions = report.preventive_actions.len(),
            "Analysis complete"
        );
        Ok(report)
    }

    /// Like [`Analyzer::analyze`], but any failure becomes
    /// [`AnalysisReport::failed`].
    pub async fn analyze_or_fallback(&self, snapshot: &RouterSnapshot) -> AnalysisReport {
        match self.analyze(snapshot).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "Error calling AI service");
                AnalysisReport::failed()
            }
        }
    }
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer").finish_non_exhaustive()
    }
}
