//! Configuration System using Figment
//!
//! Configuration is layered, later sources overriding earlier ones:
//! 1. Built-in defaults (every field has one)
//! 2. `config/guardian.toml` (optional)
//! 3. Environment variables prefixed with `GUARDIAN_`, with `__` between
//!    nested keys
//!
//! # Example
//! ```no_run
//! use mikrotik_guardian::config::GuardianConfig;
//!
//! let config = GuardianConfig::load()?;
//! println!("Polling every {}s", config.telemetry.poll_interval_secs);
//! # Ok::<(), figment::Error>(())
//! ```
//!
//! `GUARDIAN_CONNECTION__RECONNECT__MAX_ATTEMPTS=5` sets
//! `connection.reconnect.max_attempts`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use guardian_analysis::GeminiConfig;
use guardian_client::{PollerConfig, ReconnectConfig};
use guardian_core::credentials::default_storage_path;
use guardian_core::error::StoreError;
use guardian_driver_mock::{LatencyRange, MockMode, TimingConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/guardian.toml";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "GUARDIAN_";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardianConfig {
    /// Application settings
    pub application: ApplicationConfig,
    /// Router link and reconnect behaviour
    pub connection: ConnectionConfig,
    /// Polling and the simulated router
    pub telemetry: TelemetryConfig,
    /// AI analysis backend
    pub analysis: AnalysisConfig,
    /// Where credentials are persisted
    pub storage: StorageConfig,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, colored
    #[default]
    Pretty,
    /// Single-line
    Compact,
    /// One JSON object per event
    Json,
}

/// Application-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Application name
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "MikroTik Guardian".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
        }
    }
}

/// Router link configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Simulated login handshake duration
    pub connect_latency_ms: u64,
    /// Automatic reconnect
    pub reconnect: ReconnectSettings,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_latency_ms: 1000,
            reconnect: ReconnectSettings::default(),
        }
    }
}

/// Reconnect backoff, in config-file units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectSettings {
    /// Delay before the first retry
    pub initial_delay_ms: u64,
    /// Upper bound on any retry delay
    pub max_delay_ms: u64,
    /// Growth factor between retries
    pub backoff_multiplier: f64,
    /// Give up after this many retries (0 = never)
    pub max_attempts: u32,
    /// Retry automatically at all
    pub enabled: bool,
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        let defaults = ReconnectConfig::default();
        Self {
            initial_delay_ms: defaults.initial_delay.as_millis() as u64,
            max_delay_ms: defaults.max_delay.as_millis() as u64,
            backoff_multiplier: defaults.backoff_multiplier,
            max_attempts: defaults.max_attempts,
            enabled: defaults.enabled,
        }
    }
}

impl ReconnectSettings {
    /// Convert to the connection manager's settings.
    pub fn to_reconnect_config(&self) -> ReconnectConfig {
        ReconnectConfig {
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            backoff_multiplier: self.backoff_multiplier,
            max_attempts: self.max_attempts,
            enabled: self.enabled,
        }
    }
}

/// Telemetry polling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Seconds between snapshot refreshes
    pub poll_interval_secs: u64,
    /// Simulated router mode (instant, realistic, chaos)
    pub mock_mode: String,
    /// RNG seed for reproducible telemetry
    pub seed: Option<u64>,
    /// Treat a failed refresh as a lost connection
    pub report_loss_on_failure: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 30,
            mock_mode: "realistic".to_string(),
            seed: None,
            report_loss_on_failure: true,
        }
    }
}

impl TelemetryConfig {
    /// Parsed simulated router mode. Unknown names fall back to realistic;
    /// [`GuardianConfig::validate`] rejects them first.
    pub fn mode(&self) -> MockMode {
        match self.mock_mode.as_str() {
            "instant" => MockMode::Instant,
            "chaos" => MockMode::Chaos,
            _ => MockMode::Realistic,
        }
    }

    /// Poller settings.
    pub fn to_poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: Duration::from_secs(self.poll_interval_secs),
            report_loss_on_failure: self.report_loss_on_failure,
        }
    }
}

/// AI analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Model name
    pub model: String,
    /// REST endpoint base URL
    pub endpoint: String,
    /// Sampling temperature (0.0 - 2.0)
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// API key; `GEMINI_API_KEY` or `API_KEY` are used when unset
    pub api_key: Option<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let defaults = GeminiConfig::default();
        Self {
            model: defaults.model,
            endpoint: defaults.endpoint,
            temperature: defaults.temperature,
            timeout_secs: defaults.timeout.as_secs(),
            api_key: None,
        }
    }
}

impl AnalysisConfig {
    /// Backend settings.
    pub fn to_gemini_config(&self) -> GeminiConfig {
        GeminiConfig {
            model: self.model.clone(),
            endpoint: self.endpoint.clone(),
            temperature: self.temperature,
            timeout: Duration::from_secs(self.timeout_secs),
            api_key: self.api_key.clone(),
        }
    }
}

/// Credential storage configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Key-value file holding credentials; platform config dir when unset
    pub credentials_path: Option<PathBuf>,
}

impl StorageConfig {
    /// Effective credentials file.
    pub fn resolve_credentials_path(&self) -> Result<PathBuf, StoreError> {
        match &self.credentials_path {
            Some(path) => Ok(path.clone()),
            None => default_storage_path(),
        }
    }
}

impl GuardianConfig {
    /// Load configuration from `config/guardian.toml` and environment variables
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path. A missing file is not an
    /// error; defaults and environment still apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, figment::Error> {
        Self::figment(path.as_ref()).extract()
    }

    /// The layered provider stack, exposed for inspection.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(GuardianConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Simulated link latencies for the configured mode.
    pub fn timing(&self) -> TimingConfig {
        match self.telemetry.mode() {
            MockMode::Instant => TimingConfig::zero(),
            _ => TimingConfig {
                connect: LatencyRange::fixed(self.connection.connect_latency_ms),
                ..TimingConfig::router_api()
            },
        }
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            ));
        }

        let valid_modes = ["instant", "realistic", "chaos"];
        if !valid_modes.contains(&self.telemetry.mock_mode.as_str()) {
            return Err(format!(
                "Invalid mock_mode '{}'. Must be one of: {}",
                self.telemetry.mock_mode,
                valid_modes.join(", ")
            ));
        }

        if self.telemetry.poll_interval_secs == 0 {
            return Err("poll_interval_secs must be greater than 0".to_string());
        }

        let reconnect = &self.connection.reconnect;
        if reconnect.backoff_multiplier.is_nan() || reconnect.backoff_multiplier < 1.0 {
            return Err(format!(
                "Invalid backoff_multiplier {}. Must be at least 1.0",
                reconnect.backoff_multiplier
            ));
        }
        if reconnect.max_delay_ms < reconnect.initial_delay_ms {
            return Err(format!(
                "max_delay_ms ({}) must not be below initial_delay_ms ({})",
                reconnect.max_delay_ms, reconnect.initial_delay_ms
            ));
        }

        if !(0.0..=2.0).contains(&self.analysis.temperature) {
            return Err(format!(
                "Invalid temperature {}. Must be 0.0-2.0",
                self.analysis.temperature
            ));
        }
        if self.analysis.timeout_secs == 0 {
            return Err("analysis timeout_secs must be greater than 0".to_string());
        }

        Ok(())
    }
}
