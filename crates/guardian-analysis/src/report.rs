//! The structured result of an analysis.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AnalysisError;

/// Summary shown when analysis could not be produced.
pub const FAILED_SUMMARY: &str = "Analysis Failed";

/// Recommendation shown when analysis could not be produced.
pub const FAILED_RECOMMENDATION: &str =
    "Could not connect to the AI service. Please check your API key and network connection.";

/// Risk attached to a preventive action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Safe to apply
    #[serde(alias = "low", alias = "LOW")]
    Low,
    /// Plan a maintenance window
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    /// May disrupt service
    #[serde(alias = "high", alias = "HIGH")]
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

/// A suggested preventive step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreventiveAction {
    /// What to do
    pub action: String,
    /// How risky it is
    pub risk: RiskLevel,
}

/// Narrative health report for one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// One-sentence health summary
    pub summary: String,
    /// Actionable recommendations
    pub recommendations: Vec<String>,
    /// Preventive actions with risk levels
    pub preventive_actions: Vec<PreventiveAction>,
}

/// Wire shape with every field optional, so missing fields are reported
/// as malformed instead of as a generic JSON error.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReport {
    summary: Option<String>,
    recommendations: Option<Vec<String>>,
    preventive_actions: Option<Vec<PreventiveAction>>,
}

impl AnalysisReport {
    /// Fallback rendered whenever analysis fails.
    #[must_use]
    pub fn failed() -> Self {
        Self {
            summary: FAILED_SUMMARY.to_string(),
            recommendations: vec![FAILED_RECOMMENDATION.to_string()],
            preventive_actions: Vec::new(),
        }
    }

    /// Whether this is the [`AnalysisReport::failed`] fallback.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.summary == FAILED_SUMMARY && self.preventive_actions.is_empty()
    }

    /// Parse the model's JSON text into a complete report.
    ///
    /// A missing or blank summary, or a missing array, is rejected outright.
    pub fn parse(text: &str) -> Result<Self, AnalysisError> {
        let raw: RawReport = serde_json::from_str(text.trim())
            .map_err(|e| AnalysisError::MalformedResponse(e.to_string()))?;

        let summary = raw
            .summary
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AnalysisError::MalformedResponse("missing summary".into()))?;
        let recommendations = raw
            .recommendations
            .ok_or_else(|| AnalysisError::MalformedResponse("missing recommendations".into()))?;
        let preventive_actions = raw
            .preventive_actions
            .ok_or_else(|| AnalysisError::MalformedResponse("missing preventiveActions".into()))?;

        Ok(Self {
            summary,
            recommendations,
            preventive_actions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "summary": "Router is healthy with moderate load.",
        "recommendations": ["Review firewall rules", "Schedule a firmware update"],
        "preventiveActions": [
            {"action": "Enable brute-force protection on SSH", "risk": "Low"},
            {"action": "Move VPN to a dedicated interface", "risk": "medium"}
        ]
    }"#;

    #[test]
    fn test_parse_valid_report() {
        let report = AnalysisReport::parse(VALID).unwrap();
        assert_eq!(report.recommendations.len(), 2);
        assert_eq!(report.preventive_actions[1].risk, RiskLevel::Medium);
        assert!(!report.is_failure());
    }

    #[test]
    fn test_parse_rejects_missing_recommendations() {
        let text = r#"{"summary": "ok", "preventiveActions": []}"#;
        let err = AnalysisReport::parse(text).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedResponse(ref m) if m.contains("recommendations")));
    }

    #[test]
    fn test_parse_rejects_blank_summary() {
        let text = r#"{"summary": "  ", "recommendations": [], "preventiveActions": []}"#;
        assert!(matches!(
            AnalysisReport::parse(text),
            Err(AnalysisError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(matches!(
            AnalysisReport::parse("The router looks fine."),
            Err(AnalysisError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_risk() {
        let text = r#"{"summary": "ok", "recommendations": [],
            "preventiveActions": [{"action": "x", "risk": "Extreme"}]}"#;
        assert!(AnalysisReport::parse(text).is_err());
    }

    #[test]
    fn test_failed_fallback() {
        let report = AnalysisReport::failed();
        assert_eq!(report.summary, "Analysis Failed");
        assert_eq!(report.recommendations, vec![FAILED_RECOMMENDATION.to_string()]);
        assert!(report.preventive_actions.is_empty());
        assert!(report.is_failure());
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(AnalysisReport::failed()).unwrap();
        assert!(json.get("preventiveActions").is_some());
    }
}
