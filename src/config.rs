//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub broker: BrokerConfig,

    #[serde(default)]
    pub sql: SqlConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Native query endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    #[serde(default = "default_broker_url")]
    pub url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_broker_url() -> String {
    "http://localhost:8082".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: default_broker_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// SQL endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SqlConfig {
    #[serde(default = "default_sql_url")]
    pub url: String,

    pub username: Option<String>,
    pub password: Option<String>,
}

fn default_sql_url() -> String {
    "http://localhost:8082/druid/v2/sql/".to_string()
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            url: default_sql_url(),
            username: None,
            password: None,
        }
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

    /// Load a file then apply environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load from `MENHIR_CONFIG_PATH` or default locations, falling back
    /// to environment-only config
    pub fn load_default() -> Self {
        let config_paths = [
            std::env::var("MENHIR_CONFIG_PATH").ok().map(PathBuf::from),
            dirs::config_dir().map(|p| p.join("menhir").join("config.toml")),
            Some(PathBuf::from("/etc/menhir/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
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

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("MENHIR_BROKER_URL") {
            self.broker.url = url;
        }
        if let Ok(timeout) = std::env::var("MENHIR_REQUEST_TIMEOUT_SECS") {
            if let Ok(t) = timeout.parse() {
                self.broker.request_timeout_secs = t;
            }
        }

        if let Ok(url) = std::env::var("MENHIR_SQL_URL") {
            self.sql.url = url;
        }
        if let Ok(username) = std::env::var("MENHIR_SQL_USERNAME") {
            self.sql.username = Some(username);
        }
        if let Ok(password) = std::env::var("MENHIR_SQL_PASSWORD") {
            self.sql.password = Some(password);
        }

        if let Ok(level) = std::env::var("MENHIR_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("MENHIR_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Build the shared HTTP client with the configured timeout
    pub fn http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(self.broker.request_timeout_secs))
            .build()
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Initialize tracing from the logging config.
///
/// `RUST_LOG` takes precedence over the configured level; format `json`
/// switches the fmt layer to structured output.
pub fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("menhir={}", config.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.broker.url, "http://localhost:8082");
        assert_eq!(config.broker.request_timeout_secs, 30);
        assert_eq!(config.sql.url, "http://localhost:8082/druid/v2/sql/");
        assert!(config.sql.username.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_toml() {
        let content = r#"
            [broker]
            url = "http://druid.internal:8082"
            request_timeout_secs = 5

            [sql]
            url = "http://druid.internal:8082/druid/v2/sql/"
            username = "reader"
            password = "secret"

            [logging]
            level = "debug"
            format = "json"
        "#;
        let config: Config = toml::from_str(content).unwrap();
        assert_eq!(config.broker.url, "http://druid.internal:8082");
        assert_eq!(config.broker.request_timeout_secs, 5);
        assert_eq!(config.sql.username.as_deref(), Some("reader"));
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"trace\"").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.logging.level, "trace");
        assert_eq!(config.broker.url, "http://localhost:8082");
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[broker]\nurl = \"http://other:8082\"\n").unwrap();
        assert_eq!(config.broker.url, "http://other:8082");
        assert_eq!(config.broker.request_timeout_secs, 30);
        assert_eq!(config.logging.level, "info");
    }
}
