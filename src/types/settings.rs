use serde::{Deserialize, Serialize};

use super::view::{SortKey, DEFAULT_PAGE_SIZE};

/// Top-level application settings container.
///
/// Missing sections fall back to their defaults so older files keep loading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AppSettings {
    pub api: ApiSettings,
    pub storage: StorageSettings,
    pub view: ViewSettings,
    pub undo: UndoSettings,
    pub categories: CategorySettings,
}

/// Remote persistence service settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiSettings {
    pub base_url: String,
    pub enabled: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            enabled: true,
        }
    }
}

/// Local fallback store settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageSettings {
    /// Key under which the local blob is stored.
    pub storage_key: String,
    /// Overrides the platform data directory.
    #[serde(default)]
    pub data_dir: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            storage_key: "bookmark-manager-data".to_string(),
            data_dir: None,
        }
    }
}

/// Bookmark list settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViewSettings {
    pub page_size: usize,
    pub default_sort: SortKey,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            default_sort: SortKey::CreatedAt,
        }
    }
}

/// Undo log settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UndoSettings {
    /// How long the undo toast stays visible.
    pub toast_seconds: u64,
    /// Maximum retained entries; `None` keeps everything.
    #[serde(default)]
    pub capacity: Option<usize>,
}

impl Default for UndoSettings {
    fn default() -> Self {
        Self {
            toast_seconds: 8,
            capacity: None,
        }
    }
}

/// Category settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategorySettings {
    /// Display name of the default bucket.
    pub default_name: String,
}

impl Default for CategorySettings {
    fn default() -> Self {
        Self {
            default_name: "Uncategorized".to_string(),
        }
    }
}
