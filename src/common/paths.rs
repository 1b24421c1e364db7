//! Configuration paths
//!
//! Uses the directories crate for platform-appropriate locations.

use std::path::PathBuf;

/// Name used for the configuration directory
const APP_NAME: &str = "apee-i";

/// Get the configuration directory path
///
/// - Linux: `~/.config/apee-i/`
/// - macOS: `~/Library/Application Support/apee-i/`
/// - Windows: `%APPDATA%\apee-i\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the settings file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}
