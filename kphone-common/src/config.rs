//! Configuration loading and config file resolution
//!
//! The client reads a single TOML file. Every field has a built-in default,
//! so a missing file is not an error: the client logs a warning and starts
//! with defaults. A file that exists but does not parse is an error.
//!
//! # Config file priority
//!
//! 1. Command-line argument (`--config`)
//! 2. Environment variable (`KPHONE_CONFIG`)
//! 3. `<config_dir>/keplerphone/config.toml`
//! 4. Built-in defaults

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "KPHONE_CONFIG";

/// Directory name under the platform config and cache directories
pub const APP_DIR_NAME: &str = "keplerphone";

/// Client configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TomlConfig {
    /// Base URL of the KeplerPhone server (`/ids`, `/scales`, `/keplerphone/...`)
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Origin used for canonical deep links (defaults to `server_url`)
    #[serde(default)]
    pub origin: Option<String>,

    /// Hashtag attached to share links
    #[serde(default = "default_hashtag")]
    pub hashtag: String,

    /// Speeds offered by the speed selector, in display order
    #[serde(default = "default_speeds")]
    pub speeds: Vec<u32>,

    /// Speed selected at startup when no deep link names one
    #[serde(default = "default_speed")]
    pub default_speed: u32,

    /// Timeout for catalog and MIDI requests
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// MIDI player command; the downloaded file path is appended.
    /// Empty means files are only saved.
    #[serde(default)]
    pub player_command: Vec<String>,

    /// Where downloaded MIDI files are written
    #[serde(default)]
    pub download_dir: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
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

fn default_server_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_hashtag() -> String {
    "keplerphone".to_string()
}

fn default_speeds() -> Vec<u32> {
    vec![1, 2, 4, 8]
}

fn default_speed() -> u32 {
    4
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            origin: None,
            hashtag: default_hashtag(),
            speeds: default_speeds(),
            default_speed: default_speed(),
            request_timeout_secs: default_request_timeout_secs(),
            player_command: Vec::new(),
            download_dir: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl TomlConfig {
    /// Parse and validate TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.server_url.trim().is_empty() {
            return Err(Error::Config("server_url must not be empty".to_string()));
        }
        if self.speeds.is_empty() {
            return Err(Error::Config("speeds must list at least one speed".to_string()));
        }
        if self.speeds.contains(&0) {
            return Err(Error::Config("speeds must be positive".to_string()));
        }
        if !self.speeds.contains(&self.default_speed) {
            return Err(Error::Config(format!(
                "default_speed {} is not one of the offered speeds {:?}",
                self.default_speed, self.speeds
            )));
        }
        Ok(())
    }

    /// Origin for canonical URLs, without a trailing slash
    pub fn origin(&self) -> &str {
        self.origin
            .as_deref()
            .unwrap_or(&self.server_url)
            .trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Configured download directory, else the platform cache directory
    pub fn download_dir(&self) -> PathBuf {
        if let Some(dir) = &self.download_dir {
            return dir.clone();
        }
        dirs::cache_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("./keplerphone_cache"))
    }
}

/// Pick the config file to read, in priority order.
///
/// Returns `None` when neither the CLI nor the environment names a file and
/// no file exists at the platform default location.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: platform config directory
    default_config_path().filter(|p| p.exists())
}

/// `<config_dir>/keplerphone/config.toml` for the current platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.toml"))
}

/// Where the loaded configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// No file was named and none exists at the platform default
    Defaults,
    /// Settings were read from this file
    File(PathBuf),
    /// This file was named but does not exist; defaults are in effect
    Missing(PathBuf),
}

impl ConfigSource {
    /// Report the source. Call once logging is set up.
    pub fn log(&self) {
        match self {
            ConfigSource::Defaults => info!("No config file found, using built-in defaults"),
            ConfigSource::File(path) => info!("Loaded config from {}", path.display()),
            ConfigSource::Missing(path) => warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            ),
        }
    }
}

/// Resolve and load the configuration, falling back to defaults when the
/// file is missing.
///
/// Nothing is logged here since logging is configured from the result;
/// the caller reports the returned [`ConfigSource`].
pub fn load_config(cli_arg: Option<&Path>) -> Result<(TomlConfig, ConfigSource)> {
    let Some(path) = resolve_config_path(cli_arg) else {
        return Ok((TomlConfig::default(), ConfigSource::Defaults));
    };

    if !path.exists() {
        return Ok((TomlConfig::default(), ConfigSource::Missing(path)));
    }

    let config = TomlConfig::load(&path)?;
    Ok((config, ConfigSource::File(path)))
}
