//! Log formatting and output with ANSI colors
//!
//! Console lines are colorized and padded so tags and levels line up;
//! the same line (uncolored, with full timestamp) goes to the log file.

use super::file::write_to_file;
use super::levels::LogLevel;
use super::tags::LogTag;
use chrono::Local;
use colored::*;
use std::io::{stdout, ErrorKind, Write};

const TAG_WIDTH: usize = 10;
const LEVEL_WIDTH: usize = 7;

/// Format and output a log message
pub fn format_and_log(tag: LogTag, level: LogLevel, message: &str) {
    let now = Local::now();
    let time = now.format("%H:%M:%S").to_string().dimmed();
    let timestamp = now.format("%Y-%m-%d %H:%M:%S").to_string();
    let tag_str = format_tag(&tag);
    let level_str = format_level(level);

    for (index, line) in message.split('\n').enumerate() {
        if index == 0 {
            print_stdout_safe(&format!("{} [{}] [{}] {}", time, tag_str, level_str, line));
        } else {
            // Continuation lines keep the message column aligned
            let indent = " ".repeat(9 + TAG_WIDTH + LEVEL_WIDTH + 6);
            print_stdout_safe(&format!("{}{}", indent, line));
        }
        write_to_file(&format!(
            "{} [{}] [{}] {}",
            timestamp,
            tag.to_plain_string(),
            level.as_str(),
            line
        ));
    }
}

/// Format a tag with its color
fn format_tag(tag: &LogTag) -> ColoredString {
    let label = format!("{:<width$}", tag.to_plain_string(), width = TAG_WIDTH);
    match tag {
        LogTag::System => label.bright_yellow().bold(),
        LogTag::Config => label.bright_magenta().bold(),
        LogTag::Hub => label.bright_cyan().bold(),
        LogTag::Connection => label.bright_blue().bold(),
        LogTag::Webserver => label.bright_green().bold(),
        LogTag::Test => label.white().bold(),
    }
}

/// Format level with its color
fn format_level(level: LogLevel) -> ColoredString {
    let label = format!("{:<width$}", level.as_str(), width = LEVEL_WIDTH);
    match level {
        LogLevel::Error => label.bright_red().bold(),
        LogLevel::Warning => label.yellow().bold(),
        LogLevel::Info => label.white().bold(),
        LogLevel::Debug | LogLevel::Verbose => label.dimmed(),
    }
}

/// Print to stdout but ignore broken pipe errors
fn print_stdout_safe(message: &str) {
    let mut out = stdout().lock();
    if let Err(e) = writeln!(out, "{}", message) {
        if e.kind() == ErrorKind::BrokenPipe {
            return;
        }
        let _ = writeln!(std::io::stderr(), "Logger stdout error: {}", e);
    }
    let _ = out.flush();
}
