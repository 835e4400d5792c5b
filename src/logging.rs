//! Structured logging module for Compass
//!
//! Writes logs to the configured log directory with categories:
//! - JOURNAL: State transitions (actions, batches, undo, missions)
//! - MENTOR: Gateway requests and fallbacks
//! - REMINDER: Scheduler ticks and notifications
//! - STORAGE: Persistence events
//! - ERROR: Errors and crashes

use chrono::{Local, Utc};
use once_cell::sync::Lazy;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Log categories for structured logging
#[derive(Debug, Clone, Copy)]
pub enum LogCategory {
    Journal,  // State transitions
    Mentor,   // Gateway calls and fallbacks
    Reminder, // Scheduler ticks and notifications
    Storage,  // Load/save of the state blob
    Error,    // Errors and crashes
}

impl LogCategory {
    fn as_str(&self) -> &'static str {
        match self {
            LogCategory::Journal => "JOURNAL",
            LogCategory::Mentor => "MENTOR",
            LogCategory::Reminder => "REMINDER",
            LogCategory::Storage => "STORAGE",
            LogCategory::Error => "ERROR",
        }
    }
}

/// Log directory; console-only until `init_logging` sets it
static LOG_DIR: Lazy<Mutex<Option<PathBuf>>> = Lazy::new(|| Mutex::new(None));

fn log_file_path(dir: &Path) -> PathBuf {
    let today = Local::now().format("%Y-%m-%d").to_string();
    dir.join(format!("compass-{}.log", today))
}

fn current_log_dir() -> Option<PathBuf> {
    LOG_DIR.lock().ok().and_then(|dir| dir.clone())
}

/// Initialize the logging system - creates log directory if needed
pub fn init_logging(log_dir: &Path) -> std::io::Result<()> {
    if !log_dir.exists() {
        fs::create_dir_all(log_dir)?;
    }

    if let Ok(mut dir) = LOG_DIR.lock() {
        *dir = Some(log_dir.to_path_buf());
    }

    log(LogCategory::Journal, None, "Compass logging initialized");

    Ok(())
}

/// Log a message with category and optional context (usually an action or batch id)
pub fn log(category: LogCategory, context: Option<&str>, message: &str) {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let context = context
        .map(|id| format!("ref={} | ", id.chars().take(8).collect::<String>()))
        .unwrap_or_default();

    let log_line = format!("[{}] [{}] {}{}\n", timestamp, category.as_str(), context, message);

    print!("{}", log_line);

    if let Some(dir) = current_log_dir() {
        if let Ok(mut file) = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file_path(&dir))
        {
            let _ = file.write_all(log_line.as_bytes());
        }
    }
}

pub fn log_journal(context: Option<&str>, message: &str) {
    log(LogCategory::Journal, context, message);
}

pub fn log_mentor(context: Option<&str>, message: &str) {
    log(LogCategory::Mentor, context, message);
}

pub fn log_reminder(context: Option<&str>, message: &str) {
    log(LogCategory::Reminder, context, message);
}

pub fn log_storage(context: Option<&str>, message: &str) {
    log(LogCategory::Storage, context, message);
}

pub fn log_error(context: Option<&str>, message: &str) {
    log(LogCategory::Error, context, message);
}

/// Clean up old log files (keep last 7 days)
pub fn cleanup_old_logs() -> std::io::Result<usize> {
    let Some(log_dir) = current_log_dir() else {
        return Ok(0);
    };
    if !log_dir.exists() {
        return Ok(0);
    }

    let cutoff = Utc::now() - chrono::Duration::days(7);
    let mut deleted = 0;

    for entry in fs::read_dir(&log_dir)? {
        let entry = entry?;
        let path = entry.path();

        if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
            let modified_time: chrono::DateTime<Utc> = modified.into();
            if modified_time < cutoff && fs::remove_file(&path).is_ok() {
                deleted += 1;
            }
        }
    }

    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_name_is_dated() {
        let path = log_file_path(Path::new("/tmp/compass-logs"));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("compass-"));
        assert!(name.ends_with(".log"));
        assert_eq!(name.len(), "compass-YYYY-MM-DD.log".len());
    }
}
