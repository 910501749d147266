//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::feed::{FeedSettings, DEFAULT_PROBE_WINDOW};
use crate::indexer::{ApiFlavor, IndexerConfig, DEFAULT_INDEXER_URL};
use crate::types::DEFAULT_LIMIT;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub indexer: IndexerSection,

    #[serde(default)]
    pub feed: FeedConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Proxy server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins (empty = permissive)
    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Indexing provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IndexerSection {
    #[serde(default = "default_indexer_url")]
    pub base_url: String,

    #[serde(default = "default_indexer_timeout")]
    pub request_timeout_ms: u64,
}

fn default_indexer_url() -> String {
    DEFAULT_INDEXER_URL.to_string()
}

fn default_indexer_timeout() -> u64 {
    10_000
}

impl Default for IndexerSection {
    fn default() -> Self {
        Self {
            base_url: default_indexer_url(),
            request_timeout_ms: default_indexer_timeout(),
        }
    }
}

impl IndexerSection {
    /// Client configuration for talking to the provider directly
    pub fn client_config(&self) -> IndexerConfig {
        IndexerConfig {
            base_url: self.base_url.clone(),
            flavor: ApiFlavor::Provider,
            request_timeout_ms: self.request_timeout_ms,
        }
    }
}

/// Feed behaviour configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_probe_window")]
    pub probe_window: u32,

    /// Server-side chain scope for latest requests
    #[serde(default)]
    pub chain_ids: Vec<u64>,
}

fn default_page_limit() -> u32 {
    DEFAULT_LIMIT
}

fn default_poll_interval() -> u64 {
    10
}

fn default_probe_window() -> u32 {
    DEFAULT_PROBE_WINDOW
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_limit: default_page_limit(),
            poll_interval_secs: default_poll_interval(),
            probe_window: default_probe_window(),
            chain_ids: Vec::new(),
        }
    }
}

impl FeedConfig {
    pub fn settings(&self) -> FeedSettings {
        FeedSettings {
            page_limit: self.page_limit,
            probe_window: self.probe_window,
            chain_scope: self.chain_ids.clone(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
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
        let config_paths = [
            dirs::config_dir().map(|p| p.join("memoscope").join("config.toml")),
            Some(PathBuf::from("/etc/memoscope/config.toml")),
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
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `MEMOSCOPE_*` overrides from a variable lookup
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // API overrides
        if let Some(host) = var("MEMOSCOPE_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = var("MEMOSCOPE_API_PORT").and_then(|p| p.parse().ok()) {
            self.api.port = port;
        }

        // Indexer overrides
        if let Some(url) = var("MEMOSCOPE_INDEXER_URL") {
            self.indexer.base_url = url;
        }

        // Feed overrides
        if let Some(secs) = var("MEMOSCOPE_POLL_INTERVAL_SECS").and_then(|s| s.parse().ok()) {
            self.feed.poll_interval_secs = secs;
        }

        // Logging overrides
        if let Some(level) = var("MEMOSCOPE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("MEMOSCOPE_LOG_FORMAT") {
            self.logging.format = format;
        }
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

/// Generate a default config file content
pub fn generate_default_config() -> String {
    format!(
        r#"# Memoscope Configuration
#
# Environment variables override these settings:
# - MEMOSCOPE_API_HOST
# - MEMOSCOPE_API_PORT
# - MEMOSCOPE_INDEXER_URL
# - MEMOSCOPE_POLL_INTERVAL_SECS
# - MEMOSCOPE_LOG_LEVEL
# - MEMOSCOPE_LOG_FORMAT

[api]
# Proxy server host
host = "0.0.0.0"

# Proxy server port
port = 8082

# Allowed CORS origins (empty allows any origin)
cors_origins = []

# Request timeout in seconds
request_timeout_secs = 30

[indexer]
# Indexing provider base URL
base_url = "{indexer_url}"

# Upstream request timeout (ms)
request_timeout_ms = 10000

[feed]
# Messages per page
page_limit = {page_limit}

# Seconds between new-message probes
poll_interval_secs = 10

# Newest messages inspected when counting arrivals
probe_window = {probe_window}

# Restrict latest messages to these chains (empty = all)
chain_ids = []

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#,
        indexer_url = DEFAULT_INDEXER_URL,
        page_limit = DEFAULT_LIMIT,
        probe_window = DEFAULT_PROBE_WINDOW,
    )
}
