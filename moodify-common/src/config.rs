//! Bootstrap configuration loading and resolution
//!
//! Each setting is resolved in priority order:
//! 1. Command-line argument (highest priority; clap also maps some env vars here)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not an error: Moodify logs a warning and starts
//! with defaults. A config file that exists but fails to parse is an error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_ENVIRONMENT: &str = "development";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SESSION_TTL_HOURS: u64 = 24 * 30;

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "MOODIFY_CONFIG";
pub const CLIENT_ID_ENV: &str = "SPOTIFY_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "SPOTIFY_CLIENT_SECRET";

/// Where history entries are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryBackend {
    /// SQLite `history` table (default)
    Sqlite,
    /// Process memory; lost on restart
    Memory,
}

impl FromStr for HistoryBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(HistoryBackend::Sqlite),
            "memory" => Ok(HistoryBackend::Memory),
            other => Err(Error::Config(format!(
                "Unknown history backend '{}' (expected 'sqlite' or 'memory')",
                other
            ))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// `[catalog]` table as written in the TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogToml {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub token_url: Option<String>,
    pub api_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub market: Option<String>,
}

/// `[session]` table as written in the TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionToml {
    pub ttl_hours: Option<u64>,
}

/// Contents of `moodify.toml`; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub port: Option<u16>,
    pub bind_address: Option<String>,
    pub database_path: Option<PathBuf>,
    pub environment: Option<String>,
    pub history_backend: Option<HistoryBackend>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub catalog: CatalogToml,
    #[serde(default)]
    pub session: SessionToml,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub port: Option<u16>,
    pub bind_address: Option<String>,
    pub database_path: Option<PathBuf>,
    pub environment: Option<String>,
    pub log_level: Option<String>,
    pub history_backend: Option<String>,
}

/// Catalog client settings after resolution
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub token_url: String,
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub market: Option<String>,
}

impl CatalogConfig {
    /// True when both client credentials are present and non-blank
    pub fn has_credentials(&self) -> bool {
        is_set(&self.client_id) && is_set(&self.client_secret)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            market: None,
        }
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}

/// Fully resolved server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub bind_address: String,
    pub database_path: PathBuf,
    pub environment: String,
    pub history_backend: HistoryBackend,
    pub logging: LoggingConfig,
    pub catalog: CatalogConfig,
    pub session_ttl_hours: u64,
}

impl ServerConfig {
    /// Resolve configuration from CLI overrides, environment, TOML and defaults
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self> {
        let toml_config = match locate_config_file(overrides.config_path.as_deref())? {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                load_toml_config(&path)?
            }
            None => {
                warn!("No configuration file found, using defaults");
                TomlConfig::default()
            }
        };
        Self::merge(overrides, toml_config)
    }

    /// Merge already-loaded TOML with overrides and environment
    pub fn merge(overrides: &ConfigOverrides, toml_config: TomlConfig) -> Result<Self> {
        let history_backend = match &overrides.history_backend {
            Some(raw) => raw.parse()?,
            None => toml_config.history_backend.unwrap_or(HistoryBackend::Sqlite),
        };

        let mut logging = toml_config.logging;
        if let Some(level) = &overrides.log_level {
            logging.level = level.clone();
        }

        let catalog = CatalogConfig {
            client_id: env_non_empty(CLIENT_ID_ENV).or(toml_config.catalog.client_id),
            client_secret: env_non_empty(CLIENT_SECRET_ENV).or(toml_config.catalog.client_secret),
            token_url: toml_config
                .catalog
                .token_url
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            api_base_url: toml_config
                .catalog
                .api_base_url
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            request_timeout_secs: toml_config
                .catalog
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            market: toml_config.catalog.market,
        };

        if catalog.request_timeout_secs == 0 {
            return Err(Error::Config(
                "catalog.request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            port: overrides.port.or(toml_config.port).unwrap_or(DEFAULT_PORT),
            bind_address: overrides
                .bind_address
                .clone()
                .or(toml_config.bind_address)
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            database_path: overrides
                .database_path
                .clone()
                .or(toml_config.database_path)
                .unwrap_or_else(default_database_path),
            environment: overrides
                .environment
                .clone()
                .or(toml_config.environment)
                .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            history_backend,
            logging,
            catalog,
            session_ttl_hours: toml_config
                .session
                .ttl_hours
                .unwrap_or(DEFAULT_SESSION_TTL_HOURS),
        })
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Find the config file to load
///
/// An explicitly requested file must exist; the environment variable and the
/// platform default are only used when present.
pub fn locate_config_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(Some(path.to_path_buf()));
        }
        return Err(Error::Config(format!(
            "Config file not found: {}",
            path.display()
        )));
    }

    if let Some(path) = env_non_empty(CONFIG_PATH_ENV).map(PathBuf::from) {
        if path.exists() {
            return Ok(Some(path));
        }
        warn!(
            "{} points to missing file {}, ignoring",
            CONFIG_PATH_ENV,
            path.display()
        );
    }

    Ok(default_config_path().filter(|p| p.exists()))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// `<config_dir>/moodify/moodify.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("moodify").join("moodify.toml"))
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("moodify").join("moodify.db"))
        .unwrap_or_else(|| PathBuf::from("./moodify_data/moodify.db"))
}
