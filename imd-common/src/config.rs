//! Configuration loading and backend URL resolution
//!
//! Backend base URL resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`IMD_API_BASE_URL`)
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error: the client logs a warning and runs on
//! defaults. A TOML file that exists but does not parse is.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Environment variable naming the backend base URL
pub const API_BASE_URL_ENV: &str = "IMD_API_BASE_URL";

/// Backend base URL used when nothing else is configured
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api/v1";

/// TOML configuration file contents
///
/// Every field is optional; omitted sections fall back to built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Backend base URL, e.g. `http://127.0.0.1:8000/api/v1`
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Library listing and filter settings
    #[serde(default)]
    pub library: LibraryConfig,

    /// Search box suggestion settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Library listing and filter settings
#[derive(Debug, Clone, Deserialize)]
pub struct LibraryConfig {
    /// How long a fetched library listing stays fresh (seconds)
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Maximum number of entries shown in the library panel
    #[serde(default = "default_filter_limit")]
    pub filter_limit: usize,

    /// Debounce delay for the library filter input (milliseconds)
    #[serde(default = "default_filter_debounce_ms")]
    pub filter_debounce_ms: u64,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            filter_limit: default_filter_limit(),
            filter_debounce_ms: default_filter_debounce_ms(),
        }
    }
}

/// Search box suggestion settings
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Maximum number of suggestions
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,

    /// Minimum trimmed query length before suggestions appear
    #[serde(default = "default_suggestion_min_chars")]
    pub suggestion_min_chars: usize,

    /// Debounce delay for the search box (milliseconds)
    #[serde(default = "default_suggestion_debounce_ms")]
    pub suggestion_debounce_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            suggestion_limit: default_suggestion_limit(),
            suggestion_min_chars: default_suggestion_min_chars(),
            suggestion_debounce_ms: default_suggestion_debounce_ms(),
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

fn default_cache_ttl_secs() -> u64 {
    30 * 60 // library rarely changes
}

fn default_filter_limit() -> usize {
    10_000
}

fn default_filter_debounce_ms() -> u64 {
    300
}

fn default_suggestion_limit() -> usize {
    10
}

fn default_suggestion_min_chars() -> usize {
    2
}

fn default_suggestion_debounce_ms() -> u64 {
    200
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Fully resolved client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL without trailing slash
    pub api_base_url: String,
    /// Library listing freshness window
    pub library_cache_ttl: Duration,
    /// Library panel entry cap
    pub library_filter_limit: usize,
    /// Library filter debounce delay
    pub library_filter_debounce: Duration,
    /// Search suggestion cap
    pub suggestion_limit: usize,
    /// Minimum query length for suggestions
    pub suggestion_min_chars: usize,
    /// Search box debounce delay
    pub suggestion_debounce: Duration,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl ClientConfig {
    /// Build the resolved configuration from a TOML config and a base URL
    pub fn from_toml(toml: &TomlConfig, api_base_url: String) -> Self {
        Self {
            api_base_url,
            library_cache_ttl: Duration::from_secs(toml.library.cache_ttl_secs),
            library_filter_limit: toml.library.filter_limit,
            library_filter_debounce: Duration::from_millis(toml.library.filter_debounce_ms),
            suggestion_limit: toml.search.suggestion_limit,
            suggestion_min_chars: toml.search.suggestion_min_chars,
            suggestion_debounce: Duration::from_millis(toml.search.suggestion_debounce_ms),
            logging: toml.logging.clone(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_toml(&TomlConfig::default(), DEFAULT_API_BASE_URL.to_string())
    }
}

/// Resolves the client configuration from CLI, environment and TOML
///
/// # Examples
///
/// ```
/// use imd_common::config::ConfigResolver;
///
/// let config = ConfigResolver::new()
///     .with_cli_base_url(Some("http://localhost:9000/api/v1/".to_string()))
///     .with_config_file(Some("/nonexistent/imd.toml".into()))
///     .resolve()
///     .unwrap();
/// assert_eq!(config.api_base_url, "http://localhost:9000/api/v1");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    cli_base_url: Option<String>,
    config_file: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base URL given on the command line
    pub fn with_cli_base_url(mut self, url: Option<String>) -> Self {
        self.cli_base_url = url;
        self
    }

    /// Explicit config file path (replaces the platform default location)
    pub fn with_config_file(mut self, path: Option<PathBuf>) -> Self {
        self.config_file = path;
        self
    }

    /// Resolve the full client configuration
    pub fn resolve(&self) -> Result<ClientConfig> {
        let toml_config = match self.config_path() {
            Some(path) => load_toml_config(&path)?,
            None => {
                warn!("Could not determine config directory, using defaults");
                TomlConfig::default()
            }
        };

        let api_base_url = self.resolve_base_url(&toml_config)?;
        Ok(ClientConfig::from_toml(&toml_config, api_base_url))
    }

    fn config_path(&self) -> Option<PathBuf> {
        self.config_file.clone().or_else(default_config_path)
    }

    fn resolve_base_url(&self, toml_config: &TomlConfig) -> Result<String> {
        let env_url = std::env::var(API_BASE_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty());

        let mut sources = Vec::new();
        if self.cli_base_url.is_some() {
            sources.push("command line");
        }
        if env_url.is_some() {
            sources.push("environment");
        }
        if toml_config.api_base_url.is_some() {
            sources.push("TOML");
        }

        if sources.len() > 1 {
            debug!(
                "Backend URL found in multiple sources: {}. Using {} (highest priority).",
                sources.join(", "),
                sources[0]
            );
        }

        if let Some(url) = &self.cli_base_url {
            info!("Backend URL from command line");
            return normalize_base_url(url);
        }

        if let Some(url) = env_url {
            info!("Backend URL from {} environment variable", API_BASE_URL_ENV);
            return normalize_base_url(&url);
        }

        if let Some(url) = &toml_config.api_base_url {
            info!("Backend URL from TOML config");
            return normalize_base_url(url);
        }

        info!("Backend URL not configured, using default {}", DEFAULT_API_BASE_URL);
        Ok(DEFAULT_API_BASE_URL.to_string())
    }
}

/// Platform config file location (`<config dir>/imd/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("imd").join("config.toml"))
}

/// Load a TOML config file
///
/// Missing file → warning + defaults. Unreadable or malformed file → error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            "Config file not found: {} (using defaults)",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse {}: {}", path.display(), e))
    })?;

    info!("Loaded config file: {}", path.display());
    Ok(config)
}

/// Trim whitespace and trailing slashes; require an http(s) scheme
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');

    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(Error::Config(format!(
            "Backend URL must start with http:// or https://, got '{}'",
            raw
        )));
    }

    Ok(trimmed.to_string())
}
