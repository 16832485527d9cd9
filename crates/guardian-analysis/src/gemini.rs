//! Gemini `generateContent` backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::error::AnalysisError;

/// Default model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
/// Default REST endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Environment variables consulted for the key, in order.
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

const MAX_ERROR_BODY: usize = 512;

/// A text generator that answers in JSON conforming to a schema.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Send `prompt` and return the raw response text.
    async fn generate(&self, prompt: &str, schema: &Value) -> Result<String, AnalysisError>;
}

/// Settings for [`GeminiClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeminiConfig {
    /// Model name
    pub model: String,
    /// Base URL, without a trailing slash
    pub endpoint: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Request timeout
    pub timeout: Duration,
    /// Key from configuration; falls back to the environment when `None`
    pub api_key: Option<String>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            temperature: 0.5,
            timeout: Duration::from_secs(30),
            api_key: None,
        }
    }
}

/// Find the API key: configuration first, then [`API_KEY_VARS`].
pub fn resolve_api_key(configured: Option<&str>) -> Option<String> {
    configured
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .or_else(|| {
            API_KEY_VARS.iter().find_map(|var| {
                std::env::var(var)
                    .ok()
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
            })
        })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a Value,
    temperature: f32,
}

#[derive(Deserialize, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

fn request_body<'a>(prompt: &'a str, schema: &'a Value, temperature: f32) -> GenerateRequest<'a> {
    GenerateRequest {
        contents: [Content {
            role: "user",
            parts: [Part { text: prompt }],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json",
            response_schema: schema,
            temperature,
        },
    }
}

/// Concatenated text of the first candidate.
fn extract_text(response: GenerateResponse) -> Result<String, AnalysisError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    let text = text.trim();
    if text.is_empty() {
        return Err(AnalysisError::EmptyResponse);
    }
    Ok(text.to_string())
}

/// Gemini over HTTPS.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
    api_key: String,
}

impl GeminiClient {
    /// Build a client. Fails with [`AnalysisError::MissingApiKey`] when no
    /// key is configured or set in the environment.
    pub fn new(config: GeminiConfig) -> Result<Self, AnalysisError> {
        let api_key =
            resolve_api_key(config.api_key.as_deref()).ok_or(AnalysisError::MissingApiKey)?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("mikrotik-guardian/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            config,
            api_key,
        })
    }

    /// Active settings.
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn generate(&self, prompt: &str, schema: &Value) -> Result<String, AnalysisError> {
        let body = request_body(prompt, schema, self.config.temperature);
        tracing::debug!(model = %self.config.model, "Requesting analysis");

        let resp = self
            .http
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "AI service rejected the request");
            return Err(AnalysisError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        let parsed: GenerateResponse = resp.json().await?;
        extract_text(parsed)
    }
}
