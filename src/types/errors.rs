use thiserror::Error;

// === CategoryError ===

/// Errors related to the category tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CategoryError {
    /// Category with the given ID was not found.
    #[error("Category not found: {0}")]
    NotFound(String),
    /// The category name was empty after trimming.
    #[error("Category name cannot be empty")]
    EmptyName,
    /// The default category cannot be removed.
    #[error("Category is protected: {0}")]
    Protected(String),
    /// A category was dropped onto itself.
    #[error("Cannot move category onto itself: {0}")]
    SelfDrop(String),
    /// The drop target lies inside the dragged category's subtree.
    #[error("Cannot move category {source_id} under its descendant {target_id}")]
    WouldCreateCycle { source_id: String, target_id: String },
    /// The stored parent references already form a cycle.
    #[error("Category hierarchy contains a cycle through: {0}")]
    Cycle(String),
}

// === BookmarkError ===

/// Errors related to the bookmark collection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BookmarkError {
    /// Bookmark with the given ID was not found.
    #[error("Bookmark not found: {0}")]
    NotFound(String),
    /// The URL could not be parsed as an absolute http(s) URL.
    #[error("Invalid bookmark URL: {0}")]
    InvalidUrl(String),
    /// A bulk operation was requested with nothing selected.
    #[error("No bookmarks selected")]
    EmptySelection,
    /// A move target category was not given.
    #[error("Target category is required")]
    MissingCategory,
}

// === PersistError ===

/// Errors returned by a persistence backend.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PersistError {
    /// The service could not be reached.
    #[error("Persistence service unavailable: {0}")]
    Unavailable(String),
    /// The service answered with a non-success status.
    #[error("{method} {path} failed with status {status}")]
    Status {
        method: String,
        path: String,
        status: u16,
    },
    /// The request or response body could not be (de)serialized.
    #[error("Persistence serialization error: {0}")]
    Serialization(String),
}

// === StoreError ===

/// Errors related to the local key-value store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Database operation failed.
    #[error("Local store database error: {0}")]
    DatabaseError(String),
    /// The stored blob could not be (de)serialized.
    #[error("Local store serialization error: {0}")]
    SerializationError(String),
}

// === ImportError ===

/// Errors related to importing bookmark files.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
    /// The import file could not be parsed.
    #[error("Import parse error: {0}")]
    Parse(String),
    /// The payload contained no bookmarks.
    #[error("No bookmarks found to import")]
    NothingToImport,
    /// Reading the local store failed.
    #[error("Import source error: {0}")]
    Source(String),
}

// === ExportError ===

/// Errors related to exporting the collection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExportError {
    /// The document could not be serialized.
    #[error("Export serialization error: {0}")]
    Serialization(String),
    /// The category tree could not be built.
    #[error(transparent)]
    Tree(#[from] CategoryError),
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    #[error("Settings I/O error: {0}")]
    IoError(String),
    /// Failed to serialize or deserialize settings.
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    /// The provided settings key is invalid.
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    /// The provided settings value is invalid.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}

// === AppError ===

/// Top-level error for session-controller operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppError {
    #[error(transparent)]
    Category(#[from] CategoryError),
    #[error(transparent)]
    Bookmark(#[from] BookmarkError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
