//! Persistence service contract.
//!
//! The models never talk to storage directly. Writes are queued as
//! [`crate::services::write_queue::WriteCommand`]s and replayed against a
//! `PersistenceBackend` when the session flushes.

use async_trait::async_trait;

use crate::types::bookmark::{Bookmark, Category};
use crate::types::errors::PersistError;
use crate::types::snapshot::{Snapshot, StoredState};

/// Remote store for categories and bookmarks.
#[async_trait]
pub trait PersistenceBackend: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &str;

    async fn fetch_categories(&self) -> Result<Vec<Category>, PersistError>;
    async fn fetch_bookmarks(&self) -> Result<Vec<Bookmark>, PersistError>;

    async fn create_bookmark(&self, bookmark: &Bookmark) -> Result<(), PersistError>;
    async fn update_bookmark(&self, bookmark: &Bookmark) -> Result<(), PersistError>;
    async fn delete_bookmark(&self, id: &str) -> Result<(), PersistError>;

    async fn create_category(&self, category: &Category) -> Result<(), PersistError>;
    async fn update_category(&self, category: &Category) -> Result<(), PersistError>;
    async fn delete_category(&self, id: &str) -> Result<(), PersistError>;

    /// Overwrites everything with `state`.
    async fn save_snapshot(&self, state: &StoredState) -> Result<(), PersistError>;

    /// Inserts items whose ids are not stored yet; existing ids are left alone.
    async fn import(&self, snapshot: &Snapshot) -> Result<(), PersistError>;
}
