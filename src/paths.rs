//! Path resolution for livesync data
//!
//! Base directory follows platform conventions:
//! - **macOS**: `~/Library/Application Support/livesync/`
//! - **Windows**: `%LOCALAPPDATA%\livesync\`
//! - **Linux**: `$XDG_DATA_HOME/livesync/` (fallback `~/.local/share/livesync/`)
//!
//! `APP_DATA_DIR` overrides the base directory entirely.

use once_cell::sync::Lazy;
use std::path::PathBuf;

const APP_DIR: &str = "livesync";

static BASE_DIRECTORY: Lazy<PathBuf> = Lazy::new(resolve_base_directory);

fn resolve_base_directory() -> PathBuf {
    if let Ok(dir) = std::env::var("APP_DATA_DIR") {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }

    if let Some(dir) = dirs::data_local_dir() {
        return dir.join(APP_DIR);
    }

    if let Some(dir) = dirs::data_dir() {
        return dir.join(APP_DIR);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(APP_DIR);
    }

    PathBuf::from(APP_DIR)
}

/// Base directory for all livesync data
pub fn get_base_directory() -> PathBuf {
    BASE_DIRECTORY.clone()
}

/// Logs directory (`LOG_DIR` overrides)
pub fn get_logs_directory() -> PathBuf {
    match std::env::var("LOG_DIR") {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => BASE_DIRECTORY.join("logs"),
    }
}

/// Default config file location
pub fn get_config_path() -> PathBuf {
    BASE_DIRECTORY.join("config.toml")
}
