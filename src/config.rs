//! Configuration module for Vigil.

use std::{path::PathBuf, time::Duration};

use config::{Config, ConfigError as ConfigSourceError, Environment, File};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::monitors::LinkScrapeConfig;

/// Errors raised while resolving the application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is not set or is empty.
    #[error("Required environment variable '{0}' is not set or is empty")]
    MissingEnv(String),

    /// The configuration sources could not be loaded or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigSourceError),
}

/// Reads a required environment variable, rejecting unset or blank values.
pub fn require_env(name: &str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnv(name.to_string())),
    }
}

// --- Custom deserializer for Duration from milliseconds ---
fn deserialize_duration_from_ms<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let ms = u64::deserialize(deserializer)?;
    Ok(Duration::from_millis(ms))
}

// --- Custom deserializer for Duration from seconds ---
fn deserialize_duration_from_seconds<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = u64::deserialize(deserializer)?;
    Ok(Duration::from_secs(secs))
}

/// --- Default values for retry configuration settings ---
fn default_max_retries() -> u32 {
    3
}

fn default_base_for_backoff() -> u32 {
    2
}

fn default_initial_backoff_ms() -> Duration {
    Duration::from_millis(250)
}

fn default_max_backoff_secs() -> Duration {
    Duration::from_secs(10)
}

/// Serializable setting for jitter in retry policies.
#[derive(Default, Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JitterSetting {
    /// No jitter applied to the backoff duration.
    None,
    /// Full jitter applied, randomizing the backoff duration.
    #[default]
    Full,
}

/// Configuration for the HTTP retry policy shared by fetches and notifications.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HttpRetryConfig {
    /// Maximum number of retries for transient errors.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base duration for exponential backoff calculations.
    #[serde(default = "default_base_for_backoff")]
    pub base_for_backoff: u32,
    /// Initial backoff duration before the first retry.
    #[serde(
        default = "default_initial_backoff_ms",
        deserialize_with = "deserialize_duration_from_ms"
    )]
    pub initial_backoff_ms: Duration,
    /// Maximum backoff duration for retries.
    #[serde(
        default = "default_max_backoff_secs",
        deserialize_with = "deserialize_duration_from_seconds"
    )]
    pub max_backoff_secs: Duration,
    /// Jitter to apply to the backoff duration.
    #[serde(default)]
    pub jitter: JitterSetting,
}

impl Default for HttpRetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_for_backoff: default_base_for_backoff(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_secs: default_max_backoff_secs(),
            jitter: JitterSetting::default(),
        }
    }
}

/// --- Default values for application settings ---
fn default_baseline_dir() -> PathBuf {
    PathBuf::from("baselines")
}

/// Daily at 05:50.
fn default_run_schedule() -> String {
    "0 50 5 * * *".to_string()
}

/// Saturdays at 07:55.
fn default_heartbeat_schedule() -> String {
    "0 55 7 * * 6".to_string()
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

/// Application configuration for Vigil.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Directory holding one baseline file per monitor identity.
    #[serde(default = "default_baseline_dir")]
    pub baseline_dir: PathBuf,

    /// Cron expression for the compare-and-notify cycle.
    #[serde(default = "default_run_schedule")]
    pub run_schedule: String,

    /// Cron expression for the heartbeat message.
    #[serde(default = "default_heartbeat_schedule")]
    pub heartbeat_schedule: String,

    /// Upper bound on a single monitor's fetch, in seconds.
    #[serde(
        default = "default_fetch_timeout",
        deserialize_with = "deserialize_duration_from_seconds"
    )]
    pub fetch_timeout: Duration,

    /// Connect timeout for the shared HTTP client, in seconds.
    #[serde(
        default = "default_connect_timeout",
        deserialize_with = "deserialize_duration_from_seconds"
    )]
    pub connect_timeout: Duration,

    /// Retry policy for outbound HTTP requests.
    #[serde(default)]
    pub http_retry: HttpRetryConfig,

    /// Base URL of the Telegram Bot API.
    #[serde(default = "default_telegram_api_base")]
    pub telegram_api_base: String,

    /// Monitor definitions, registered in declaration order. When empty, the
    /// built-in monitor set is registered instead.
    #[serde(default)]
    pub monitors: Vec<LinkScrapeConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            baseline_dir: default_baseline_dir(),
            run_schedule: default_run_schedule(),
            heartbeat_schedule: default_heartbeat_schedule(),
            fetch_timeout: default_fetch_timeout(),
            connect_timeout: default_connect_timeout(),
            http_retry: HttpRetryConfig::default(),
            telegram_api_base: default_telegram_api_base(),
            monitors: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Creates a new `AppConfig` by layering the configuration file with
    /// `VIGIL_`-prefixed environment variable overrides.
    ///
    /// An explicitly supplied path must exist; only the implicit default
    /// (`vigil.yaml` in the working directory) is optional.
    pub fn new(path: Option<&str>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name("vigil").required(false),
        };
        let settings = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix("VIGIL").separator("__"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
