//! Local fallback store for Shelfmark.
//!
//! Holds the whole state as one JSON blob under a fixed key, used when the
//! persistence service cannot be reached. The previous blob is kept on each
//! overwrite.

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use tracing::{debug, info};

use crate::database::Database;
use crate::types::errors::StoreError;
use crate::types::snapshot::StoredState;

/// File name of the local store inside the data directory.
pub const STORE_FILE: &str = "shelfmark.db";

pub struct LocalStore {
    db: Database,
    key: String,
}

fn db_err(e: rusqlite::Error) -> StoreError {
    StoreError::DatabaseError(e.to_string())
}

impl LocalStore {
    /// Opens (or creates) the store database at `path`.
    pub fn open<P: AsRef<Path>>(path: P, key: &str) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        }
        Ok(Self {
            db: Database::open(path).map_err(db_err)?,
            key: key.to_string(),
        })
    }

    pub fn open_in_memory(key: &str) -> Result<Self, StoreError> {
        Ok(Self {
            db: Database::open_in_memory().map_err(db_err)?,
            key: key.to_string(),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn read(&self, column: &str) -> Result<Option<StoredState>, StoreError> {
        let sql = format!("SELECT {} FROM kv_store WHERE key = ?1", column);
        let raw: Option<Option<String>> = self
            .db
            .connection()
            .query_row(&sql, params![self.key], |row| row.get(0))
            .optional()
            .map_err(db_err)?;
        match raw.flatten() {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| StoreError::SerializationError(e.to_string())),
            None => Ok(None),
        }
    }

    /// The stored blob, if any.
    pub fn load(&self) -> Result<Option<StoredState>, StoreError> {
        self.read("value")
    }

    /// The blob replaced by the most recent save.
    pub fn previous(&self) -> Result<Option<StoredState>, StoreError> {
        self.read("previous_value")
    }

    pub fn save(&self, state: &StoredState) -> Result<(), StoreError> {
        let json = serde_json::to_string(state).map_err(|e| StoreError::SerializationError(e.to_string()))?;
        self.db
            .connection()
            .execute(
                "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                     previous_value = kv_store.value,
                     value = excluded.value,
                     updated_at = excluded.updated_at",
                params![self.key, json, Utc::now().timestamp()],
            )
            .map_err(db_err)?;
        debug!(
            key = %self.key,
            bookmarks = state.bookmarks.len(),
            categories = state.categories.len(),
            "state saved to local store"
        );
        Ok(())
    }

    /// Removes the blob and its history.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.db
            .connection()
            .execute("DELETE FROM kv_store WHERE key = ?1", params![self.key])
            .map_err(db_err)?;
        info!(key = %self.key, "local store cleared");
        Ok(())
    }
}
