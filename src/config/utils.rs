/// Configuration loading, reloading and access helpers
///
/// The parsed file is kept in a global so handlers can read it with
/// `with_config`. The hub itself never reads it: it is handed a
/// `HubSettings` built from `HubConfig` at startup.
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::path::Path;

use super::schemas::Config;
use crate::errors::ConfigError;
use crate::logger::{self, LogTag};

/// Global configuration instance
pub static CONFIG: OnceCell<RwLock<Config>> = OnceCell::new();

/// Parse a TOML document into a `Config`, missing keys take defaults
pub fn parse_config(contents: &str, origin: &str) -> Result<Config, ConfigError> {
    toml::from_str::<Config>(contents).map_err(|source| ConfigError::Parse {
        path: origin.to_string(),
        source,
    })
}

/// Read a config file without touching the global
///
/// A missing file yields defaults; environment overrides are applied on top.
pub fn read_config_file(path: &Path) -> Result<Config, ConfigError> {
    let display = path.display().to_string();
    let mut config = if path.exists() {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        parse_config(&contents, &display)?
    } else {
        logger::warning(
            LogTag::Config,
            &format!("Config file '{}' not found, using default values", display),
        );
        Config::default()
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate(&config)?;
    Ok(config)
}

/// Load configuration from a path and initialize the global CONFIG
pub fn load_config_from_path(path: &Path) -> Result<(), ConfigError> {
    let config = read_config_file(path)?;
    CONFIG
        .set(RwLock::new(config))
        .map_err(|_| ConfigError::AlreadyInitialized)?;
    logger::debug(
        LogTag::Config,
        &format!("Configuration loaded from {}", path.display()),
    );
    Ok(())
}

/// Replace the global configuration with a fresh read of `path`
pub fn reload_config_from_path(path: &Path) -> Result<(), ConfigError> {
    let new_config = read_config_file(path)?;
    let lock = CONFIG.get().ok_or(ConfigError::NotInitialized)?;
    *lock.write() = new_config;
    logger::info(LogTag::Config, "Configuration reloaded");
    Ok(())
}

/// Execute a function with read access to the configuration
///
/// Falls back to defaults if nothing was loaded (tests, embedded use).
pub fn with_config<F, R>(f: F) -> R
where
    F: FnOnce(&Config) -> R,
{
    match CONFIG.get() {
        Some(lock) => f(&lock.read()),
        None => f(&Config::default()),
    }
}

/// Clone of the current configuration
pub fn get_config_clone() -> Config {
    with_config(|cfg| cfg.clone())
}

/// Environment variables recognized:
/// `HTTP_HOST`, `PORT`, `HTTP_ADDR` (host:port), `LOG_LEVEL`,
/// `CORS_ALLOW_ALL`, `CORS_ALLOWED_ORIGINS` (comma separated).
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(host) = get("HTTP_HOST") {
        config.server.host = host.trim().to_string();
    }
    if let Some(port) = get("PORT") {
        config.server.port = parse_port("PORT", &port)?;
    }
    if let Some(addr) = get("HTTP_ADDR") {
        let (host, port) = addr
            .trim()
            .rsplit_once(':')
            .ok_or_else(|| ConfigError::Invalid {
                key: "HTTP_ADDR".to_string(),
                reason: format!("expected host:port, got '{}'", addr),
            })?;
        config.server.host = host.to_string();
        config.server.port = parse_port("HTTP_ADDR", port)?;
    }
    if let Some(level) = get("LOG_LEVEL") {
        config.logging.min_level = level.trim().to_string();
    }
    if let Some(flag) = get("CORS_ALLOW_ALL") {
        config.server.cors_allow_all =
            matches!(flag.trim().to_lowercase().as_str(), "1" | "true" | "yes");
    }
    if let Some(origins) = get("CORS_ALLOWED_ORIGINS") {
        config.server.cors_allowed_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();
    }
    Ok(())
}

fn parse_port(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    let hub = &config.hub;
    if hub.client_queue_capacity == 0 {
        return Err(ConfigError::Invalid {
            key: "hub.client_queue_capacity".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    if hub.broadcast_queue_capacity == 0 {
        return Err(ConfigError::Invalid {
            key: "hub.broadcast_queue_capacity".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    if hub.read_timeout_secs == 0 || hub.write_timeout_secs == 0 {
        return Err(ConfigError::Invalid {
            key: "hub.read_timeout_secs / hub.write_timeout_secs".to_string(),
            reason: "timeouts must be positive".to_string(),
        });
    }
    if !config.server.ws_path.starts_with('/') {
        return Err(ConfigError::Invalid {
            key: "server.ws_path".to_string(),
            reason: "must start with '/'".to_string(),
        });
    }
    Ok(())
}
