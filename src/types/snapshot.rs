use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bookmark::{Bookmark, Category};

/// Version tag written into stored and backed-up state.
pub const STATE_VERSION: &str = "1.0.0";

/// Full `{categories, bookmarks}` state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
}

/// The blob written by a snapshot save, remotely or to the local store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredState {
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub version: String,
    pub last_updated: DateTime<Utc>,
}

impl StoredState {
    pub fn from_snapshot(snapshot: Snapshot, now: DateTime<Utc>) -> Self {
        Self {
            bookmarks: snapshot.bookmarks,
            categories: snapshot.categories,
            version: STATE_VERSION.to_string(),
            last_updated: now,
        }
    }

    pub fn into_snapshot(self) -> Snapshot {
        Snapshot {
            categories: self.categories,
            bookmarks: self.bookmarks,
        }
    }
}

/// A category as produced by an import-file parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedCategory {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub order: i64,
}

/// A bookmark as produced by an import-file parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedBookmark {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub favicon: String,
    /// Either an imported category id or a category name.
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub visit_count: u64,
}

/// Normalized output of a bookmark-file parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportPayload {
    #[serde(default)]
    pub categories: Vec<ImportedCategory>,
    #[serde(default)]
    pub bookmarks: Vec<ImportedBookmark>,
}

/// Outcome of merging an import payload into the collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub added: usize,
    pub merged: usize,
    pub new_categories: usize,
    pub mapped_to_default: usize,
}

/// JSON export document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub bookmarks: Vec<Bookmark>,
    pub categories: Vec<Category>,
    pub export_date: DateTime<Utc>,
}

/// JSON backup document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub bookmarks: Vec<Bookmark>,
    pub categories: Vec<Category>,
    pub version: String,
    pub backup_date: DateTime<Utc>,
}
