//! Tool settings file handling
//!
//! Settings are optional; every field falls back to a default so a missing
//! or partial `config.toml` behaves like the built-in configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths::config_path;
use super::Result;

/// Main settings structure
#[derive(Debug, Deserialize, Default)]
pub struct Settings {
    /// Default settings for the `run` and `login` commands
    #[serde(default)]
    pub defaults: Defaults,

    /// WebSocket settings
    #[serde(default)]
    pub websocket: WebSocketSettings,
}

/// Default settings
#[derive(Debug, Deserialize)]
pub struct Defaults {
    /// Pipeline configuration file used when `--file` is not given
    #[serde(default = "default_config_file")]
    pub config_file: PathBuf,

    /// Environment used when `--env` is not given
    #[serde(default = "default_environment")]
    pub environment: String,

    /// File holding the persisted token
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            config_file: default_config_file(),
            environment: default_environment(),
            token_file: default_token_file(),
        }
    }
}

fn default_config_file() -> PathBuf {
    PathBuf::from("api.json")
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_token_file() -> PathBuf {
    PathBuf::from("token.txt")
}

/// WebSocket settings
#[derive(Debug, Deserialize)]
pub struct WebSocketSettings {
    /// Read deadline for WS requests that do not set `timeout`
    #[serde(default = "default_ws_timeout")]
    pub timeout_secs: u64,
}

impl Default for WebSocketSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_ws_timeout(),
        }
    }
}

fn default_ws_timeout() -> u64 {
    30
}

impl Settings {
    /// Load settings from the default settings file
    ///
    /// Returns default settings if the file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load settings from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }
}
