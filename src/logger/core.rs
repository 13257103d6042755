/// Core logging implementation with automatic filtering
use super::config::{get_logger_config, is_debug_enabled_for_tag, is_verbose_enabled_for_tag};
use super::levels::LogLevel;
use super::tags::LogTag;

/// Check if a log message should be displayed
///
/// Filtering rules:
/// 1. Errors are always shown
/// 2. Anything above the minimum level is dropped
/// 3. Debug requires `--debug-<tag>` for that tag (or global verbose)
/// 4. Verbose requires `--verbose` or `--verbose-<tag>`
/// 5. A non-empty `enabled_tags` set restricts output to those tags
pub fn should_log(tag: &LogTag, level: LogLevel) -> bool {
    if level == LogLevel::Error {
        return true;
    }

    let config = get_logger_config();

    if level > config.min_level {
        return false;
    }

    if level == LogLevel::Debug {
        return is_debug_enabled_for_tag(tag);
    }

    if level == LogLevel::Verbose {
        return config.min_level == LogLevel::Verbose || is_verbose_enabled_for_tag(tag);
    }

    if !config.enabled_tags.is_empty() && !config.enabled_tags.contains(&tag.to_debug_key()) {
        return false;
    }

    true
}

pub fn log_internal(tag: LogTag, level: LogLevel, message: &str) {
    if !should_log(&tag, level) {
        return;
    }
    super::format::format_and_log(tag, level, message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::config::{set_logger_config, LoggerConfig};

    #[test]
    fn test_filtering_rules() {
        let mut config = LoggerConfig::default();
        config.debug_tags.insert("hub".to_string());
        config.min_level = LogLevel::Debug;
        set_logger_config(config);

        assert!(should_log(&LogTag::Hub, LogLevel::Error));
        assert!(should_log(&LogTag::Hub, LogLevel::Info));
        assert!(should_log(&LogTag::Hub, LogLevel::Debug));
        assert!(!should_log(&LogTag::Webserver, LogLevel::Debug));
        assert!(!should_log(&LogTag::Hub, LogLevel::Verbose));

        set_logger_config(LoggerConfig {
            min_level: LogLevel::Warning,
            ..LoggerConfig::default()
        });
        assert!(!should_log(&LogTag::System, LogLevel::Info));
        assert!(should_log(&LogTag::System, LogLevel::Warning));

        set_logger_config(LoggerConfig::default());
    }
}
