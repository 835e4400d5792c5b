use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use thiserror::Error;

use crate::defaults::STORAGE_KEY;
use crate::logging;
use crate::models::AppState;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Local persistence: the whole journal as one JSON blob in a key/value table,
/// plus a single settings row for the mentor API key.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "
            -- Serialized application state, one row per storage key
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Local settings (API key)
            CREATE TABLE IF NOT EXISTS settings (
                id INTEGER PRIMARY KEY,
                gemini_key TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )?;

        // Ensure the settings row exists
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM settings", [], |row| row.get(0))?;
        if count == 0 {
            let now = Utc::now().to_rfc3339();
            conn.execute(
                "INSERT INTO settings (gemini_key, created_at, updated_at) VALUES (NULL, ?1, ?2)",
                params![now, now],
            )?;
        }

        Ok(Self { conn })
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    // ============ Raw Blobs ============

    pub fn get_blob(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv_store WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    pub fn put_blob(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn remove_blob(&self, key: &str) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }

    // ============ App State ============

    /// Load the journal. A missing or unreadable blob yields a fresh default state.
    pub fn load_state(&self) -> AppState {
        let raw = match self.get_blob(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return AppState::default(),
            Err(e) => {
                logging::log_error(None, &format!("Failed to read saved state: {}", e));
                return AppState::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(state) => state,
            Err(e) => {
                logging::log_storage(None, &format!("Discarding unreadable saved state: {}", e));
                AppState::default()
            }
        }
    }

    pub fn save_state(&self, state: &AppState) -> Result<(), StoreError> {
        let raw = serde_json::to_string(state)?;
        self.put_blob(STORAGE_KEY, &raw)
    }

    pub fn clear_state(&self) -> Result<(), StoreError> {
        self.remove_blob(STORAGE_KEY)
    }

    // ============ Settings ============

    pub fn get_gemini_key(&self) -> Result<Option<String>, StoreError> {
        let key: Option<String> = self
            .conn
            .query_row("SELECT gemini_key FROM settings LIMIT 1", [], |row| row.get(0))?;
        Ok(key)
    }

    pub fn update_gemini_key(&self, api_key: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE settings SET gemini_key = ?1, updated_at = ?2",
            params![api_key, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn clear_gemini_key(&self) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE settings SET gemini_key = NULL, updated_at = ?1",
            params![Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}
