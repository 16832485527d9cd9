//! Analysis failures. Each one ends the current request; nothing is retried.

use thiserror::Error;

/// Why an analysis request produced no report.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// No API key in configuration or environment.
    #[error("Gemini API key is not configured")]
    MissingApiKey,

    /// Transport failure (DNS, TLS, timeout, connection reset).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("AI service returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, truncated
        body: String,
    },

    /// The service answered but produced no text.
    #[error("AI service returned no content")]
    EmptyResponse,

    /// The text was not a complete report.
    #[error("AI response is malformed: {0}")]
    MalformedResponse(String),

    /// The snapshot could not be serialized into the prompt.
    #[error("Failed to encode router data: {0}")]
    Encode(#[from] serde_json::Error),
}

impl AnalysisError {
    /// Whether the user can fix this by supplying a key.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingApiKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = AnalysisError::Status {
            status: 403,
            body: "API key not valid".into(),
        };
        assert_eq!(err.to_string(), "AI service returned HTTP 403: API key not valid");
        assert!(AnalysisError::MissingApiKey.is_configuration());
        assert!(!AnalysisError::EmptyResponse.is_configuration());
    }
}
