//! Configuration loading and constants.
//!
//! Settings are resolved once at startup in layers: built-in defaults, then an
//! optional TOML file, then environment variables (`PORT`, `HOST`). Command line
//! flags are applied last by the binary. `AppConfig` is the root configuration struct.

use const_format::formatcp;
use serde::Deserialize;
use std::path::Path;

// =============================================================================
// HTTP Listener Defaults
// =============================================================================

/// Default listen port
pub const DEFAULT_PORT: u16 = 4000;

/// Default listen host (all IPv4 interfaces)
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Environment variable overriding the listen port
pub const PORT_ENV_VAR: &str = "PORT";

/// Environment variable overriding the listen host
pub const HOST_ENV_VAR: &str = "HOST";

/// Seconds to wait for in-flight requests during graceful shutdown
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Request Handling Limits
// =============================================================================

/// Maximum size of a JSON request body (100 KiB)
pub const JSON_BODY_LIMIT: usize = 100 * 1024;

// =============================================================================
// HTTP Response Cache Control
// =============================================================================

/// Health check - never cached, liveness probes must hit the process
pub const CACHE_CONTROL_HEALTH: &str = "no-store";

// =============================================================================
// Default Paths and Strings
// =============================================================================

/// Configuration file loaded when present and no `--config` is given
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Default log filter when neither `--log-level` nor RUST_LOG is set
pub const DEFAULT_LOG_FILTER: &str =
    formatcp!("{}=info,tower_http=info", env!("CARGO_CRATE_NAME"));

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// HTTP listener configuration
    #[serde(default)]
    pub http: HttpServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "HttpServerConfig::default_host")]
    pub host: String,
    #[serde(default = "HttpServerConfig::default_port")]
    pub port: u16,
    /// Graceful shutdown drain timeout in seconds (default: 30)
    #[serde(default = "HttpServerConfig::default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            shutdown_timeout_seconds: Self::default_shutdown_timeout(),
        }
    }
}

impl HttpServerConfig {
    fn default_host() -> String {
        DEFAULT_HOST.to_string()
    }

    fn default_port() -> u16 {
        DEFAULT_PORT
    }

    fn default_shutdown_timeout() -> u64 {
        DEFAULT_SHUTDOWN_TIMEOUT_SECS
    }

    /// Socket address string in `host:port` form
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "text" (human-readable, default) or "json" (structured)
    #[serde(default = "LoggingConfig::default_format")]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: Self::default_format(),
        }
    }
}

impl LoggingConfig {
    fn default_format() -> LogFormat {
        LogFormat::Text
    }
}

impl AppConfig {
    /// Parse configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from TOML text. Missing sections take their defaults.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve configuration for startup.
    ///
    /// An explicit path must exist. Without one, `DEFAULT_CONFIG_PATH` is used
    /// when present and built-in defaults otherwise. Process environment
    /// overrides are applied on top.
    pub fn resolve(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match explicit_path {
            Some(path) => Self::load(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).is_file() => Self::load(DEFAULT_CONFIG_PATH)?,
            None => Self::default(),
        };
        config.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `PORT` and `HOST` overrides from the given lookup.
    ///
    /// Empty values are ignored. A `PORT` that is not a valid port number is an error.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(PORT_ENV_VAR).filter(|v| !v.trim().is_empty()) {
            self.http.port = port.trim().parse().map_err(|_| {
                ConfigError::Validation(format!(
                    "{} must be a port number between 0 and 65535, got {:?}",
                    PORT_ENV_VAR, port
                ))
            })?;
        }

        if let Some(host) = lookup(HOST_ENV_VAR).filter(|v| !v.trim().is_empty()) {
            self.http.host = host.trim().to_string();
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.http.host.trim().is_empty() {
            return Err(ConfigError::Validation(
                "http.host must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
}
