/// Logger configuration derived from command-line flags
///
/// Stored globally so every `logger::*` call can filter without threading
/// state through the call sites.
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashSet;

use super::levels::LogLevel;
use super::tags::LogTag;
use crate::arguments;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Messages above this level are dropped (Debug/Verbose have extra gating)
    pub min_level: LogLevel,

    /// Tags with debug output enabled (`--debug-<key>`)
    pub debug_tags: HashSet<String>,

    /// Tags with verbose output enabled (`--verbose-<key>`)
    pub verbose_tags: HashSet<String>,

    /// If non-empty, only these tags are shown below Error level
    pub enabled_tags: HashSet<String>,

    /// Mirror console output to the daily log file
    pub file_logging: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            debug_tags: HashSet::new(),
            verbose_tags: HashSet::new(),
            enabled_tags: HashSet::new(),
            file_logging: true,
        }
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> =
    Lazy::new(|| RwLock::new(LoggerConfig::default()));

/// Get a copy of the current logger configuration
pub fn get_logger_config() -> LoggerConfig {
    LOGGER_CONFIG.read().clone()
}

/// Replace the logger configuration
pub fn set_logger_config(config: LoggerConfig) {
    *LOGGER_CONFIG.write() = config;
}

/// Mutate the logger configuration in place
pub fn update_logger_config<F>(f: F)
where
    F: FnOnce(&mut LoggerConfig),
{
    f(&mut LOGGER_CONFIG.write());
}

/// Build the configuration from command-line flags
///
/// Recognized: `--debug-<tag>`, `--verbose`, `--verbose-<tag>`, `--quiet`,
/// `--no-log-file`, `--log-level <level>`.
pub fn init_from_args() {
    let args = arguments::get_cmd_args();
    let mut config = LoggerConfig::default();

    if let Some(level) = arguments::get_arg_value("--log-level").and_then(|v| LogLevel::parse(&v)) {
        config.min_level = level;
    }

    for arg in &args {
        if let Some(key) = arg.strip_prefix("--debug-") {
            config.debug_tags.insert(key.to_string());
            if config.min_level < LogLevel::Debug {
                config.min_level = LogLevel::Debug;
            }
        } else if let Some(key) = arg.strip_prefix("--verbose-") {
            config.verbose_tags.insert(key.to_string());
            config.debug_tags.insert(key.to_string());
            config.min_level = LogLevel::Verbose;
        }
    }

    if arguments::has_arg("--verbose") {
        config.min_level = LogLevel::Verbose;
    }
    if arguments::has_arg("--quiet") {
        config.min_level = LogLevel::Warning;
    }
    if arguments::has_arg("--no-log-file") {
        config.file_logging = false;
    }

    set_logger_config(config);
}

/// Debug output enabled for this tag?
pub fn is_debug_enabled_for_tag(tag: &LogTag) -> bool {
    let config = LOGGER_CONFIG.read();
    config.min_level == LogLevel::Verbose || config.debug_tags.contains(&tag.to_debug_key())
}

/// Verbose output enabled for this tag?
pub fn is_verbose_enabled_for_tag(tag: &LogTag) -> bool {
    LOGGER_CONFIG.read().verbose_tags.contains(&tag.to_debug_key())
}
