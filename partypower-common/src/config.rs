//! Configuration loading and config file resolution
//!
//! Bootstrap configuration comes from a single TOML file. Resolution order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`PARTYPOWER_CONFIG`)
//! 3. Platform config directory (`~/.config/partypower/config.toml` on Linux)
//! 4. Built-in defaults (no file)

use crate::params::AnalysisParams;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "PARTYPOWER_CONFIG";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Music-recognition service connection
    #[serde(default)]
    pub recognizer: RecognizerConfig,

    /// Highlight analysis tuning
    #[serde(default)]
    pub analysis: AnalysisParams,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Recognition service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizerConfig {
    /// Identify endpoint accepting an audio clip upload
    #[serde(default = "default_recognizer_endpoint")]
    pub endpoint: String,

    /// Access key sent with each request (optional)
    #[serde(default)]
    pub access_key: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum concurrent recognition requests
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Minimum spacing between request starts in milliseconds, shared by all
    /// concurrent requests
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_recognizer_endpoint(),
            access_key: None,
            timeout_secs: default_timeout_secs(),
            max_concurrency: default_max_concurrency(),
            min_interval_ms: default_min_interval_ms(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_recognizer_endpoint() -> String {
    "http://127.0.0.1:8089/v1/identify".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_concurrency() -> usize {
    1
}

fn default_min_interval_ms() -> u64 {
    500
}

/// Config file resolution following the priority order in the module docs
///
/// Returns `None` when no config file exists; callers then use defaults.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    default_config_path().filter(|path| path.exists())
}

/// Platform config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("partypower").join("config.toml"))
}

/// Parse and validate a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Read config {} failed: {}", path.display(), e))
    })?;
    let config: TomlConfig = toml::from_str(&content)?;
    config.analysis.validate()?;
    debug!(path = %path.display(), "Config file parsed");
    Ok(config)
}

/// Resolve and load bootstrap configuration
///
/// An explicit path (CLI or environment) that does not exist is an error;
/// an absent platform default silently yields built-in defaults.
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    match resolve_config_path(cli_arg, CONFIG_ENV_VAR) {
        Some(path) => {
            if !path.exists() {
                return Err(Error::NotFound(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            info!("Loading config from {}", path.display());
            load_toml_config(&path)
        }
        None => {
            info!("No config file found, using built-in defaults");
            Ok(TomlConfig::default())
        }
    }
}
