//! Configuration loading and config file resolution
//!
//! Bootstrap configuration is a small TOML file. The file itself is located in
//! priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. Platform config directory (`<config_dir>/wkt/config.toml`), if present
//! 4. Built-in defaults (no file)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "WKT_CONFIG";

/// Bootstrap configuration for the player
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PlayerConfig {
    /// Workout library document (JSON); falls back to the platform data dir
    #[serde(default)]
    pub library_path: Option<PathBuf>,

    /// Broadcast buffer for playback events
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
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

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            library_path: None,
            event_capacity: default_event_capacity(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_event_capacity() -> usize {
    64
}

fn default_log_level() -> String {
    "info".to_string()
}

impl PlayerConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PlayerConfig = toml::from_str(content)?;
        if config.event_capacity == 0 {
            return Err(Error::Config("event_capacity must be at least 1".to_string()));
        }
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Resolve and load configuration
    ///
    /// An explicitly named file (CLI or environment) must exist. The platform
    /// default file is optional; without it built-in defaults apply.
    pub fn resolve(cli_arg: Option<&Path>, env_var_name: &str) -> Result<Self> {
        if let Some(path) = explicit_config_path(cli_arg, env_var_name) {
            if !path.exists() {
                return Err(Error::Config(format!("Config file not found: {:?}", path)));
            }
            info!("Loading config from {}", path.display());
            return Self::load(&path);
        }

        match platform_config_path() {
            Some(path) if path.exists() => {
                info!("Loading config from {}", path.display());
                Self::load(&path)
            }
            _ => {
                debug!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Library path from config, or the OS-dependent default
    pub fn library_path_or_default(&self) -> PathBuf {
        self.library_path
            .clone()
            .unwrap_or_else(default_library_path)
    }
}

/// Config path given on the command line or through the environment
fn explicit_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    match std::env::var(env_var_name) {
        Ok(path) if !path.is_empty() => Some(PathBuf::from(path)),
        _ => None,
    }
}

/// `<config_dir>/wkt/config.toml` for the current platform
pub fn platform_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("wkt").join("config.toml"))
}

/// OS-dependent default location of the workout library
pub fn default_library_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("wkt").join("workouts.json"))
        .unwrap_or_else(|| PathBuf::from("./wkt_data/workouts.json"))
}
