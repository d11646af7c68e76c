use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::elements::DEFAULT_CELESTRAK_URL;

pub const DEFAULT_N2YO_URL: &str = "https://api.n2yo.com/rest/v1/satellite/";
pub const N2YO_API_KEY_ENV: &str = "N2YO_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    pub database: DatabaseConfig,
    pub predictor: PredictorConfig,
    #[serde(default)]
    pub elements: ElementsConfig,
    #[serde(default)]
    pub reservations: ReservationsConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredictorConfig {
    /// Local propagation over cached orbital elements.
    Sgp4 {
        #[serde(default)]
        min_elevation_deg: f64,
    },
    /// Remote visual-pass API.
    N2yo {
        #[serde(default = "default_n2yo_url")]
        base_url: String,
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default = "default_min_visibility")]
        min_visibility_s: u32,
    },
}

fn default_n2yo_url() -> String {
    DEFAULT_N2YO_URL.to_string()
}

fn default_min_visibility() -> u32 {
    30
}

impl PredictorConfig {
    /// The configured key, or `N2YO_API_KEY` from the environment.
    pub fn n2yo_api_key(&self) -> Option<String> {
        match self {
            PredictorConfig::N2yo { api_key, .. } => api_key
                .clone()
                .filter(|k| !k.is_empty())
                .or_else(|| std::env::var(N2YO_API_KEY_ENV).ok()),
            PredictorConfig::Sgp4 { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ElementsConfig {
    #[serde(default)]
    pub source: ElementSourceConfig,
    #[serde(default = "default_staleness", deserialize_with = "deserialize_duration")]
    pub staleness: Duration,
}

impl Default for ElementsConfig {
    fn default() -> Self {
        Self {
            source: ElementSourceConfig::default(),
            staleness: default_staleness(),
        }
    }
}

fn default_staleness() -> Duration {
    Duration::from_secs(24 * 3600)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementSourceConfig {
    Celestrak {
        #[serde(default = "default_celestrak_url")]
        base_url: String,
    },
    TleDirectory {
        folder: PathBuf,
    },
}

impl Default for ElementSourceConfig {
    fn default() -> Self {
        ElementSourceConfig::Celestrak {
            base_url: default_celestrak_url(),
        }
    }
}

fn default_celestrak_url() -> String {
    DEFAULT_CELESTRAK_URL.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReservationsConfig {
    /// How long after its start a pass may still be claimed.
    #[serde(default = "default_claim_grace", deserialize_with = "deserialize_duration")]
    pub claim_grace: Duration,
}

impl Default for ReservationsConfig {
    fn default() -> Self {
        Self {
            claim_grace: default_claim_grace(),
        }
    }
}

fn default_claim_grace() -> Duration {
    Duration::from_secs(2)
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_timeout", deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
        }
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        if config.upstream.timeout.is_zero() {
            return Err(ConfigError::Invalid("upstream.timeout must be positive".into()));
        }
        Ok(config)
    }
}
