//! Structured, tag-based logging for livesync
//!
//! - Standard levels (Error/Warning/Info/Debug/Verbose)
//! - Per-subsystem debug control via `--debug-<tag>` flags
//! - Colored console output mirrored to a daily log file
//!
//! ## Usage
//!
//! ```rust,no_run
//! use livesync::logger::{self, LogTag};
//!
//! logger::init();
//! logger::info(LogTag::Hub, "Dispatch loop started");
//! logger::debug(LogTag::Connection, "Probe sent"); // Only with --debug-connection
//! ```

mod config;
mod core;
mod file;
mod format;
mod levels;
mod tags;

pub use config::{
    get_logger_config, init_from_args, set_logger_config, update_logger_config, LoggerConfig,
};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Initialize the logger system
///
/// Call once at startup before any logging: reads debug flags from the
/// command line and opens the log file.
pub fn init() {
    config::init_from_args();
    file::init_file_logging();
}

/// Apply the `[logging]` config section
///
/// Level flags on the command line (`--log-level`, `--verbose`, `--quiet`,
/// `--debug-*`) win over `min_level`.
pub fn apply_settings(file_enabled: bool, min_level: &str) {
    let level_from_flags = crate::arguments::get_arg_value("--log-level").is_some()
        || crate::arguments::get_cmd_args()
            .iter()
            .any(|a| a == "--quiet" || a.starts_with("--verbose") || a.starts_with("--debug-"));

    let parsed = LogLevel::parse(min_level);
    if parsed.is_none() {
        warning(
            LogTag::Config,
            &format!("Unknown log level '{}', keeping current level", min_level),
        );
    }

    update_logger_config(|cfg| {
        if !level_from_flags {
            if let Some(level) = parsed {
                cfg.min_level = level;
            }
        }
        if !file_enabled {
            cfg.file_logging = false;
        }
    });

    if !file_enabled {
        file::close_file_logging();
    }
}

/// Log at ERROR level (always shown)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level
///
/// Only shown when `--debug-<tag>` was passed for this tag.
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level (only with `--verbose` / `--verbose-<tag>`)
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}

/// Check whether debug output is enabled for a tag
///
/// Lets hot paths skip building `format!` strings nobody will see.
pub fn is_debug_enabled(tag: LogTag) -> bool {
    core::should_log(&tag, LogLevel::Debug)
}

/// Force flush pending log file writes
pub fn flush() {
    file::flush_file_logging();
}
