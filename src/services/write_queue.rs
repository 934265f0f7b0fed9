//! Deferred persistence writes.
//!
//! Model mutations apply synchronously and leave a [`WriteCommand`] behind.
//! The session drains the queue in issue order when it flushes, so the
//! remote store sees writes in the order they were made.

use std::collections::VecDeque;

use crate::services::backend::PersistenceBackend;
use crate::types::bookmark::{Bookmark, Category};
use crate::types::errors::PersistError;
use crate::types::snapshot::{Snapshot, StoredState};

/// One pending write against the persistence service.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteCommand {
    CreateBookmark(Bookmark),
    UpdateBookmark(Bookmark),
    DeleteBookmark(String),
    CreateCategory(Category),
    UpdateCategory(Category),
    DeleteCategory(String),
    /// Rolled back locally if the write fails.
    RenameCategory {
        category: Category,
        previous_name: String,
    },
    /// Full overwrite with whatever the models hold at flush time.
    Snapshot,
    /// Idempotent insert of newly imported items.
    Import(Snapshot),
}

impl WriteCommand {
    /// `METHOD /path` label for logs.
    pub fn describe(&self) -> String {
        match self {
            WriteCommand::CreateBookmark(_) => "POST /bookmarks".to_string(),
            WriteCommand::UpdateBookmark(b) => format!("PUT /bookmarks/{}", b.id),
            WriteCommand::DeleteBookmark(id) => format!("DELETE /bookmarks/{}", id),
            WriteCommand::CreateCategory(_) => "POST /categories".to_string(),
            WriteCommand::UpdateCategory(c) | WriteCommand::RenameCategory { category: c, .. } => {
                format!("PUT /categories/{}", c.id)
            }
            WriteCommand::DeleteCategory(id) => format!("DELETE /categories/{}", id),
            WriteCommand::Snapshot => "POST /snapshot".to_string(),
            WriteCommand::Import(_) => "POST /import".to_string(),
        }
    }

    /// Sends the write. `current` supplies the state for a snapshot.
    pub async fn apply(
        &self,
        backend: &dyn PersistenceBackend,
        current: &StoredState,
    ) -> Result<(), PersistError> {
        match self {
            WriteCommand::CreateBookmark(b) => backend.create_bookmark(b).await,
            WriteCommand::UpdateBookmark(b) => backend.update_bookmark(b).await,
            WriteCommand::DeleteBookmark(id) => backend.delete_bookmark(id).await,
            WriteCommand::CreateCategory(c) => backend.create_category(c).await,
            WriteCommand::UpdateCategory(c) => backend.update_category(c).await,
            WriteCommand::RenameCategory { category, .. } => backend.update_category(category).await,
            WriteCommand::DeleteCategory(id) => backend.delete_category(id).await,
            WriteCommand::Snapshot => backend.save_snapshot(current).await,
            WriteCommand::Import(snapshot) => backend.import(snapshot).await,
        }
    }
}

/// FIFO of pending writes.
#[derive(Debug, Clone, Default)]
pub struct WriteQueue {
    pending: VecDeque<WriteCommand>,
}

impl WriteQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: WriteCommand) {
        self.pending.push_back(command);
    }

    pub fn extend(&mut self, commands: impl IntoIterator<Item = WriteCommand>) {
        self.pending.extend(commands);
    }

    /// Takes every pending command, oldest first.
    pub fn drain(&mut self) -> Vec<WriteCommand> {
        self.pending.drain(..).collect()
    }

    pub fn pending(&self) -> impl Iterator<Item = &WriteCommand> {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
