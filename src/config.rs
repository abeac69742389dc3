//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub broker: BrokerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Broker connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    /// Query endpoint, e.g. "http://localhost:8082/druid/v2"
    #[serde(default = "default_broker_url")]
    pub url: String,

    /// Request timeout in milliseconds; unset means wait indefinitely
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,

    /// Keep the last raw request and response for inspection
    #[serde(default)]
    pub debug: bool,
}

fn default_broker_url() -> String {
    "http://localhost:8082/druid/v2".to_string()
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: default_broker_url(),
            request_timeout_ms: None,
            debug: false,
        }
    }
}

impl BrokerConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        Self::load_first(default_config_paths())
    }

    /// Load the first candidate file that exists and parses, falling back to
    /// defaults with environment overrides
    pub fn load_first(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        for path in paths {
            if path.exists() {
                match Self::load_with_env(&path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        // Broker overrides
        if let Ok(url) = std::env::var("DRUID_BROKER_URL") {
            self.broker.url = url;
        }
        if let Ok(timeout) = std::env::var("DRUID_REQUEST_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse() {
                self.broker.request_timeout_ms = Some(ms);
            }
        }
        if let Ok(debug) = std::env::var("DRUID_DEBUG") {
            self.broker.debug = matches!(debug.as_str(), "1" | "true" | "yes");
        }

        // Logging overrides
        if let Ok(level) = std::env::var("DRUID_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("DRUID_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Config file locations searched by [`Config::load_default`], in order
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("druid-query").join("config.toml"));
    }
    paths.push(PathBuf::from("./druid-query.toml"));
    paths
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# druid-query configuration
#
# Environment variables override these settings:
# - DRUID_BROKER_URL
# - DRUID_REQUEST_TIMEOUT_MS
# - DRUID_DEBUG
# - DRUID_LOG_LEVEL
# - DRUID_LOG_FORMAT

[broker]
# Broker query endpoint
url = "http://localhost:8082/druid/v2"

# Request timeout in milliseconds (unset: wait for the broker)
# request_timeout_ms = 30000

# Keep the last raw request/response for inspection
debug = false

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
