//! In-process persistence backend.
//!
//! Implements the same contract as the HTTP service. Used when the remote
//! API is disabled and by the test suite, which can switch it offline to
//! exercise the recovery paths. Clones share state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::services::backend::PersistenceBackend;
use crate::types::bookmark::{Bookmark, Category};
use crate::types::errors::PersistError;
use crate::types::snapshot::{Snapshot, StoredState};

struct Inner {
    available: AtomicBool,
    categories: Mutex<Vec<Category>>,
    bookmarks: Mutex<Vec<Bookmark>>,
    calls: Mutex<Vec<String>>,
}

#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<Inner>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_snapshot(Snapshot::default())
    }

    /// Starts with the given stored state.
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            inner: Arc::new(Inner {
                available: AtomicBool::new(true),
                categories: Mutex::new(snapshot.categories),
                bookmarks: Mutex::new(snapshot.bookmarks),
                calls: Mutex::new(Vec::new()),
            }),
        }
    }

    /// While offline every call fails with `PersistError::Unavailable`.
    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
    }

    pub async fn stored(&self) -> Snapshot {
        Snapshot {
            categories: self.inner.categories.lock().await.clone(),
            bookmarks: self.inner.bookmarks.lock().await.clone(),
        }
    }

    /// Requests seen so far as `"METHOD /path"`, including failed ones.
    pub async fn calls(&self) -> Vec<String> {
        self.inner.calls.lock().await.clone()
    }

    async fn enter(&self, call: String) -> Result<(), PersistError> {
        debug!(call = %call, "memory backend call");
        self.inner.calls.lock().await.push(call);
        if self.inner.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(PersistError::Unavailable("memory backend offline".to_string()))
        }
    }
}

fn not_found(kind: &str, id: &str) -> PersistError {
    PersistError::Status {
        method: "PUT".to_string(),
        path: format!("/{}/{}", kind, id),
        status: 404,
    }
}

#[async_trait]
impl PersistenceBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, PersistError> {
        self.enter("GET /categories".to_string()).await?;
        Ok(self.inner.categories.lock().await.clone())
    }

    async fn fetch_bookmarks(&self) -> Result<Vec<Bookmark>, PersistError> {
        self.enter("GET /bookmarks".to_string()).await?;
        Ok(self.inner.bookmarks.lock().await.clone())
    }

    async fn create_bookmark(&self, bookmark: &Bookmark) -> Result<(), PersistError> {
        self.enter("POST /bookmarks".to_string()).await?;
        let mut stored = self.inner.bookmarks.lock().await;
        stored.retain(|b| b.id != bookmark.id);
        stored.insert(0, bookmark.clone());
        Ok(())
    }

    async fn update_bookmark(&self, bookmark: &Bookmark) -> Result<(), PersistError> {
        self.enter(format!("PUT /bookmarks/{}", bookmark.id)).await?;
        let mut stored = self.inner.bookmarks.lock().await;
        let slot = stored
            .iter_mut()
            .find(|b| b.id == bookmark.id)
            .ok_or_else(|| not_found("bookmarks", &bookmark.id))?;
        *slot = bookmark.clone();
        Ok(())
    }

    async fn delete_bookmark(&self, id: &str) -> Result<(), PersistError> {
        self.enter(format!("DELETE /bookmarks/{}", id)).await?;
        self.inner.bookmarks.lock().await.retain(|b| b.id != id);
        Ok(())
    }

    async fn create_category(&self, category: &Category) -> Result<(), PersistError> {
        self.enter("POST /categories".to_string()).await?;
        let mut stored = self.inner.categories.lock().await;
        stored.retain(|c| c.id != category.id);
        stored.push(category.clone());
        Ok(())
    }

    async fn update_category(&self, category: &Category) -> Result<(), PersistError> {
        self.enter(format!("PUT /categories/{}", category.id)).await?;
        let mut stored = self.inner.categories.lock().await;
        let slot = stored
            .iter_mut()
            .find(|c| c.id == category.id)
            .ok_or_else(|| not_found("categories", &category.id))?;
        *slot = category.clone();
        Ok(())
    }

    async fn delete_category(&self, id: &str) -> Result<(), PersistError> {
        self.enter(format!("DELETE /categories/{}", id)).await?;
        self.inner.categories.lock().await.retain(|c| c.id != id);
        Ok(())
    }

    async fn save_snapshot(&self, state: &StoredState) -> Result<(), PersistError> {
        self.enter("POST /snapshot".to_string()).await?;
        *self.inner.categories.lock().await = state.categories.clone();
        *self.inner.bookmarks.lock().await = state.bookmarks.clone();
        Ok(())
    }

    async fn import(&self, snapshot: &Snapshot) -> Result<(), PersistError> {
        self.enter("POST /import".to_string()).await?;
        let mut categories = self.inner.categories.lock().await;
        for cat in &snapshot.categories {
            if !categories.iter().any(|c| c.id == cat.id) {
                categories.push(cat.clone());
            }
        }
        drop(categories);

        let mut bookmarks = self.inner.bookmarks.lock().await;
        for bookmark in &snapshot.bookmarks {
            if !bookmarks.iter().any(|b| b.id == bookmark.id) {
                bookmarks.push(bookmark.clone());
            }
        }
        Ok(())
    }
}
