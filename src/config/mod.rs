//! Configuration management for the uptime monitor
//!
//! Configuration comes from environment variables or a TOML file; command-line
//! flags override individual values in `main`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Scheduler and prober configuration
    pub scheduler: SchedulerConfig,

    /// Target store configuration
    pub storage: StorageConfig,

    /// HTTP API configuration
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Scheduler-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    /// How often the scheduler re-reads targets, in seconds
    pub scan_interval_secs: u64,

    /// Per-probe deadline in seconds
    pub http_timeout_secs: u64,

    /// Maximum number of probes running at once
    pub max_concurrent_probes: usize,

    /// User agent sent with every probe
    pub user_agent: String,

    /// Extra attempts when appending a check fails
    pub persist_retries: u32,
}

/// Target store configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database path
    pub db_path: PathBuf,
}

/// HTTP API configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the API server to
    pub bind_address: SocketAddr,

    /// Enable permissive CORS
    pub enable_cors: bool,

    /// Enable request tracing
    pub enable_request_logging: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

const LOG_FORMATS: &[&str] = &["text", "json"];

fn default_user_agent() -> String {
    format!("uptime-monitor/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: 5,
            http_timeout_secs: 10,
            max_concurrent_probes: 64,
            user_agent: default_user_agent(),
            persist_retries: 2,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/uptime.db"),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8000)),
            enable_cors: true,
            enable_request_logging: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            storage: StorageConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// First set variable among `names`
fn env_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| std::env::var(name).ok())
}

fn env_parse<T: std::str::FromStr>(names: &[&str]) -> Option<T> {
    env_var(names).and_then(|v| v.trim().parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparseable values keep their defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let scan_interval_secs =
            env_parse(&["UPTIME_SCAN_INTERVAL", "CHECKER_SCAN_INTERVAL"])
                .unwrap_or(defaults.scheduler.scan_interval_secs);

        let http_timeout_secs = env_parse(&["UPTIME_HTTP_TIMEOUT", "HTTP_TIMEOUT"])
            .unwrap_or(defaults.scheduler.http_timeout_secs);

        let max_concurrent_probes = env_parse(&["UPTIME_MAX_CONCURRENT_PROBES"])
            .unwrap_or(defaults.scheduler.max_concurrent_probes);

        let persist_retries = env_parse(&["UPTIME_PERSIST_RETRIES"])
            .unwrap_or(defaults.scheduler.persist_retries);

        let user_agent =
            env_var(&["UPTIME_USER_AGENT"]).unwrap_or(defaults.scheduler.user_agent);

        let db_path = env_var(&["UPTIME_DB_PATH", "DB_PATH"])
            .map(PathBuf::from)
            .unwrap_or(defaults.storage.db_path);

        let bind_address = env_parse::<SocketAddr>(&["UPTIME_BIND_ADDRESS"])
            .or_else(|| {
                env_parse::<u16>(&["PORT"]).map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
            })
            .unwrap_or(defaults.server.bind_address);

        let level = env_var(&["UPTIME_LOG_LEVEL", "LOG_LEVEL"])
            .map(|v| v.to_lowercase())
            .unwrap_or(defaults.logging.level);

        let format = env_var(&["UPTIME_LOG_FORMAT"])
            .map(|v| v.to_lowercase())
            .unwrap_or(defaults.logging.format);

        Ok(Self {
            scheduler: SchedulerConfig {
                scan_interval_secs,
                http_timeout_secs,
                max_concurrent_probes,
                user_agent,
                persist_retries,
            },
            storage: StorageConfig { db_path },
            server: ServerConfig {
                bind_address,
                ..defaults.server
            },
            logging: LoggingConfig { level, format },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.scheduler.scan_interval_secs == 0 {
            anyhow::bail!("scan_interval_secs must be greater than 0");
        }

        if self.scheduler.http_timeout_secs == 0 {
            anyhow::bail!("http_timeout_secs must be greater than 0");
        }

        if self.scheduler.max_concurrent_probes == 0 {
            anyhow::bail!("max_concurrent_probes must be greater than 0");
        }

        if self.storage.db_path.as_os_str().is_empty() {
            anyhow::bail!("db_path must not be empty");
        }

        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            anyhow::bail!(
                "unknown log format '{}' (expected one of: {})",
                self.logging.format,
                LOG_FORMATS.join(", ")
            );
        }

        Ok(())
    }

    /// Scan cadence as Duration
    #[must_use]
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scheduler.scan_interval_secs)
    }

    /// Per-probe timeout as Duration
    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.scheduler.http_timeout_secs)
    }
}
