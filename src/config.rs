//! Runtime configuration
//!
//! Read from the environment (a `.env` file is honoured). Everything has a
//! default except the API key, which may also come from the settings table.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_REMINDER_POLL_SECS: u64 = 30;
const DB_FILE_NAME: &str = "compass.db";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub gemini_api_key: Option<String>,
    pub model: String,
    pub reminder_poll: Duration,
}

impl AppConfig {
    /// Load `.env` (if any) and read the process environment
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = get("COMPASS_DATA_DIR").map(PathBuf::from).unwrap_or_else(|| {
            let home = get("HOME").unwrap_or_else(|| "/tmp".to_string());
            PathBuf::from(home).join(".compass")
        });
        let log_dir = get("COMPASS_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("logs"));
        let reminder_poll_secs = get("COMPASS_REMINDER_POLL_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_REMINDER_POLL_SECS);

        Self {
            data_dir,
            log_dir,
            gemini_api_key: get("GEMINI_API_KEY"),
            model: get("COMPASS_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            reminder_poll: Duration::from_secs(reminder_poll_secs),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }
}
