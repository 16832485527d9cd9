//! AI-generated health analysis of router telemetry.
//!
//! The [`Analyzer`] turns a [`RouterSnapshot`](guardian_core::RouterSnapshot)
//! into a prompt, sends it to a [`GenerativeBackend`] (normally
//! [`GeminiClient`]) with a response schema, and validates the JSON answer
//! into an [`AnalysisReport`]. A partially filled report is never returned:
//! callers get either a complete report or an [`AnalysisError`], and usually
//! render [`AnalysisReport::failed`] for the latter.

pub mod analyzer;
pub mod error;
pub mod gemini;
pub mod prompt;
pub mod report;

pub use analyzer::Analyzer;
pub use error::AnalysisError;
pub use gemini::{resolve_api_key, GeminiClient, GeminiConfig, GenerativeBackend};
pub use prompt::{build_prompt, response_schema};
pub use report::{AnalysisReport, PreventiveAction, RiskLevel};
