//! Daily log file persistence
//!
//! Lines are appended to `<logs dir>/livesync_<YYYY-MM-DD>.log` through a
//! buffered writer that rolls over when the date changes.

use chrono::Local;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use super::config::get_logger_config;
use crate::paths;

struct LogFile {
    date: String,
    writer: BufWriter<File>,
}

static LOG_FILE: Lazy<Mutex<Option<LogFile>>> = Lazy::new(|| Mutex::new(None));

fn log_file_path(date: &str) -> PathBuf {
    paths::get_logs_directory().join(format!("livesync_{}.log", date))
}

fn open_log_file(date: &str) -> Option<LogFile> {
    let dir = paths::get_logs_directory();
    if fs::create_dir_all(&dir).is_err() {
        return None;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path(date))
        .ok()?;
    Some(LogFile {
        date: date.to_string(),
        writer: BufWriter::new(file),
    })
}

/// Open today's log file (no-op when file logging is disabled)
pub fn init_file_logging() {
    if !get_logger_config().file_logging {
        return;
    }
    let today = Local::now().format("%Y-%m-%d").to_string();
    let opened = open_log_file(&today);
    if opened.is_none() {
        eprintln!(
            "Cannot open log file in {}, continuing with console output only",
            paths::get_logs_directory().display()
        );
    }
    *LOG_FILE.lock() = opened;
}

/// Append one line to the log file
pub fn write_to_file(line: &str) {
    let mut guard = LOG_FILE.lock();
    let Some(current) = guard.as_mut() else {
        return;
    };

    let today = Local::now().format("%Y-%m-%d").to_string();
    if current.date != today {
        let _ = current.writer.flush();
        match open_log_file(&today) {
            Some(next) => *current = next,
            None => {
                *guard = None;
                return;
            }
        }
    }

    if let Some(current) = guard.as_mut() {
        let _ = writeln!(current.writer, "{}", line);
    }
}

/// Flush pending writes
pub fn flush_file_logging() {
    if let Some(current) = LOG_FILE.lock().as_mut() {
        let _ = current.writer.flush();
    }
}

/// Flush and stop writing to the log file
pub fn close_file_logging() {
    if let Some(mut current) = LOG_FILE.lock().take() {
        let _ = current.writer.flush();
    }
}
