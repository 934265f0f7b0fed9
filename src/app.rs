//! Session controller for Shelfmark.
//!
//! `App` owns the models, the selection, the undo log and the view state.
//! Every gesture mutates the models synchronously, pushes an undo entry when
//! the change is undoable and queues the persistence writes. `flush` sends
//! the queued writes and repairs the remote store when any of them fails.

use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::managers::bookmark_manager::{BookmarkCollection, BookmarkManagerTrait, POPULAR_TAG_LIMIT};
use crate::managers::category_manager::CategoryTree;
use crate::managers::drop_manager::{plan_category_move, DropPayload, DropZone};
use crate::managers::selection_manager::{Selection, SelectionManagerTrait};
use crate::managers::undo_manager::{UndoLog, UndoToast, UNDONE_MESSAGE};
use crate::platform;
use crate::services::backend::PersistenceBackend;
use crate::services::export::{self, ExportFormat};
use crate::services::import_merge::merge_import;
use crate::services::local_store::{LocalStore, STORE_FILE};
use crate::services::write_queue::{WriteCommand, WriteQueue};
use crate::types::bookmark::{Bookmark, BookmarkDraft, Category, CategoryTreeNode, FlatCategory, TagCount};
use crate::types::errors::{AppError, BookmarkError, CategoryError, ImportError};
use crate::types::settings::AppSettings;
use crate::types::snapshot::{ImportPayload, ImportReport, Snapshot, StoredState};
use crate::types::undo::UndoEntry;
use crate::types::view::{Page, SortKey, ViewState};

/// Where `load` found the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadSource {
    Remote,
    Local,
    Empty,
}

/// Outcome of draining the write queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlushReport {
    pub attempted: usize,
    /// `METHOD /path` of every write that failed.
    pub failed: Vec<String>,
    /// Categories whose rename was reverted.
    pub rolled_back: Vec<String>,
    /// A full snapshot was sent to repair the remote store.
    pub resynced: bool,
    pub saved_locally: bool,
    /// State was reloaded after a successful import.
    pub reloaded: bool,
}

/// Result of a drop onto a category node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DropOutcome {
    BookmarkAdded { bookmark: Bookmark },
    CategoryMoved,
    BookmarksMoved { count: usize },
    Ignored,
}

/// Result of clicking a bookmark card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ItemClick {
    /// Bulk mode toggled the card's selection.
    Selected { selected: bool },
    /// The link should be opened.
    Open { url: String },
}

/// Bookmark counts for the selected category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub direct: usize,
    pub total: usize,
}

/// Summary of a cascade delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSummary {
    pub removed_categories: usize,
    pub affected_bookmarks: usize,
}

pub struct App {
    pub categories: CategoryTree,
    pub bookmarks: BookmarkCollection,
    pub selection: Selection,
    pub undo_log: UndoLog,
    pub view: ViewState,
    pub settings: AppSettings,
    queue: WriteQueue,
    backend: Option<Box<dyn PersistenceBackend>>,
    store: LocalStore,
}

impl App {
    /// Without a backend every flush goes straight to the local store.
    pub fn new(settings: AppSettings, backend: Option<Box<dyn PersistenceBackend>>, store: LocalStore) -> Self {
        let undo_log = UndoLog::new(settings.undo.capacity, settings.undo.toast_seconds);
        let view = ViewState {
            sort_by: settings.view.default_sort,
            ..ViewState::default()
        };
        Self {
            categories: CategoryTree::default(),
            bookmarks: BookmarkCollection::default(),
            selection: Selection::new(),
            undo_log,
            view,
            settings,
            queue: WriteQueue::new(),
            backend,
            store,
        }
    }

    /// Opens the local store under the configured data directory and picks
    /// the HTTP backend when the API is enabled.
    pub fn open(settings: AppSettings) -> Result<Self, AppError> {
        let dir = settings
            .storage
            .data_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(platform::get_data_dir);
        let store = LocalStore::open(dir.join(STORE_FILE), &settings.storage.storage_key)?;
        let backend = remote_backend(&settings);
        Ok(Self::new(settings, backend, store))
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    pub fn pending_writes(&self) -> impl Iterator<Item = &WriteCommand> {
        self.queue.pending()
    }

    pub fn stored_state(&self) -> StoredState {
        StoredState::from_snapshot(
            Snapshot {
                categories: self.categories.categories().to_vec(),
                bookmarks: self.bookmarks.bookmarks().to_vec(),
            },
            Utc::now(),
        )
    }

    // ---- loading and persistence ----

    /// Loads from the backend, falling back to the local store.
    ///
    /// Dangling parents and parent cycles are repaired, the default category
    /// is ensured, `order` is renumbered to list position and unassigned
    /// bookmarks are filed under the default.
    pub async fn load(&mut self) -> LoadSource {
        let remote = match self.backend.as_deref() {
            Some(backend) => match tokio::try_join!(backend.fetch_categories(), backend.fetch_bookmarks()) {
                Ok(pair) => Some(pair),
                Err(e) => {
                    warn!(backend = backend.name(), error = %e, "remote load failed, using local store");
                    None
                }
            },
            None => None,
        };

        let source = match remote {
            Some((categories, bookmarks)) => {
                self.categories.replace(categories);
                self.bookmarks.replace(bookmarks);
                LoadSource::Remote
            }
            None => match self.store.load() {
                Ok(Some(state)) => {
                    let snapshot = state.into_snapshot();
                    self.categories.replace(snapshot.categories);
                    self.bookmarks.replace(snapshot.bookmarks);
                    LoadSource::Local
                }
                Ok(None) => {
                    self.categories.replace(Vec::new());
                    self.bookmarks.replace(Vec::new());
                    LoadSource::Empty
                }
                Err(e) => {
                    error!(error = %e, "local store unreadable, starting empty");
                    self.categories.replace(Vec::new());
                    self.bookmarks.replace(Vec::new());
                    LoadSource::Empty
                }
            },
        };

        self.categories.fix_dangling_parents();
        if let Some(default) = self
            .categories
            .ensure_default_category(&self.settings.categories.default_name)
        {
            if source == LoadSource::Remote {
                self.queue.push(WriteCommand::CreateCategory(default));
            }
        }
        self.categories.renumber();
        self.bookmarks.assign_unfiled_to_default();
        self.selection.retain(|id| self.bookmarks.get(id).is_some());

        info!(
            ?source,
            categories = self.categories.len(),
            bookmarks = self.bookmarks.len(),
            "state loaded"
        );
        source
    }

    /// Sends queued writes in issue order.
    ///
    /// A failed rename is reverted locally. Any failure then triggers one
    /// full snapshot write, and the local store catches that too if it fails.
    /// A successful import reloads the state from the backend.
    pub async fn flush(&mut self) -> FlushReport {
        let commands = self.queue.drain();
        let mut report = FlushReport {
            attempted: commands.len(),
            ..FlushReport::default()
        };
        if commands.is_empty() {
            return report;
        }

        if self.backend.is_none() {
            report.saved_locally = self.save_local();
            return report;
        }

        let mut failed_renames = Vec::new();
        let mut imported = false;
        if let Some(backend) = self.backend.as_deref() {
            let state = self.stored_state();
            for command in &commands {
                match command.apply(backend, &state).await {
                    Ok(()) => imported |= matches!(command, WriteCommand::Import(_)),
                    Err(e) => {
                        warn!(write = %command.describe(), error = %e, "persistence write failed");
                        report.failed.push(command.describe());
                        if let WriteCommand::RenameCategory { category, previous_name } = command {
                            failed_renames.push((category.id.clone(), category.name.clone(), previous_name.clone()));
                        }
                    }
                }
            }
        }

        for (id, attempted, previous) in failed_renames {
            if self.categories.rollback_rename(&id, &attempted, &previous) {
                info!(id = %id, name = %previous, "category rename rolled back");
                report.rolled_back.push(id);
            }
        }

        if !report.failed.is_empty() {
            self.resync(&mut report).await;
        } else if imported {
            self.load().await;
            report.reloaded = true;
        }
        report
    }

    /// Final flush before the session is dropped.
    pub async fn shutdown(&mut self) -> FlushReport {
        let report = self.flush().await;
        self.undo_log.dismiss_toast();
        info!(failed = report.failed.len(), "session closed");
        report
    }

    async fn resync(&mut self, report: &mut FlushReport) {
        let state = self.stored_state();
        let Some(backend) = self.backend.as_deref() else {
            return;
        };
        match backend.save_snapshot(&state).await {
            Ok(()) => {
                info!("remote store resynchronized from snapshot");
                report.resynced = true;
            }
            Err(e) => {
                warn!(error = %e, "snapshot resync failed, saving locally");
                report.saved_locally = self.save_local();
            }
        }
    }

    fn save_local(&self) -> bool {
        match self.store.save(&self.stored_state()) {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "local store save failed");
                false
            }
        }
    }

    /// Pushes the local-store blob through the backend's idempotent import and reloads.
    pub async fn migrate_local_to_remote(&mut self) -> Result<usize, AppError> {
        let state = self
            .store
            .load()?
            .ok_or_else(|| ImportError::Source("no local data to migrate".to_string()))?;
        let snapshot = state.into_snapshot();
        let count = snapshot.bookmarks.len();
        let backend = self
            .backend
            .as_deref()
            .ok_or_else(|| ImportError::Source("remote persistence is disabled".to_string()))?;
        backend
            .import(&snapshot)
            .await
            .map_err(|e| ImportError::Source(e.to_string()))?;
        info!(bookmarks = count, "local data migrated to remote store");
        self.load().await;
        Ok(count)
    }

    /// Swaps in new settings. Undo limits apply to the live log at once;
    /// page size and sort apply on the next view read.
    pub fn apply_settings(&mut self, settings: AppSettings) {
        self.undo_log
            .configure(settings.undo.capacity, settings.undo.toast_seconds);
        self.settings = settings;
    }

    /// Drops the local blob and starts over with only the default category.
    pub fn clear_all(&mut self) -> Result<(), AppError> {
        self.store.clear()?;
        self.categories.replace(Vec::new());
        self.bookmarks.replace(Vec::new());
        self.categories
            .ensure_default_category(&self.settings.categories.default_name);
        self.selection.set_bulk_mode(false);
        self.undo_log.clear();
        self.view = ViewState {
            sort_by: self.view.sort_by,
            ..ViewState::default()
        };
        info!("all data cleared");
        Ok(())
    }

    // ---- derived views ----

    pub fn category_tree(&self) -> Result<Vec<CategoryTreeNode>, AppError> {
        Ok(self.categories.build_tree(self.bookmarks.bookmarks())?)
    }

    pub fn flat_categories(&self) -> Result<Vec<FlatCategory>, AppError> {
        Ok(CategoryTree::flatten(&self.category_tree()?))
    }

    /// The page the view currently shows.
    pub fn current_page(&self) -> Page {
        let mut items = self.bookmarks.filter(&self.view.query(), &self.categories);
        BookmarkCollection::sort(&mut items, self.view.sort_by);
        BookmarkCollection::paginate(items, self.view.current_page, self.settings.view.page_size)
    }

    pub fn selected_category_counts(&self) -> Option<CategoryCounts> {
        let id = self.view.selected_category.as_deref()?;
        let bookmarks = self.bookmarks.bookmarks();
        Some(CategoryCounts {
            direct: self.categories.count_direct(id, bookmarks),
            total: self.categories.count_recursive(id, bookmarks),
        })
    }

    pub fn popular_tags(&self) -> Vec<TagCount> {
        self.bookmarks.popular_tags(POPULAR_TAG_LIMIT)
    }

    pub fn undo_toast(&self) -> Option<&UndoToast> {
        self.undo_log.visible_toast(Utc::now())
    }

    /// Selects a category; selecting the current one again clears the filter.
    pub fn select_category(&mut self, id: Option<&str>) {
        let next = match id {
            Some(id) if self.view.selected_category.as_deref() != Some(id) => Some(id.to_string()),
            _ => None,
        };
        self.view.selected_category = next;
        self.view.current_page = 1;
    }

    pub fn set_search(&mut self, query: &str) {
        self.view.search_query = query.to_string();
        self.view.current_page = 1;
    }

    pub fn set_sort(&mut self, key: SortKey) {
        self.view.sort_by = key;
        self.view.current_page = 1;
    }

    /// Moves to `page`, clamped to the available pages.
    pub fn set_page(&mut self, page: usize) -> usize {
        let total_pages = self.current_page().total_pages.max(1);
        self.view.current_page = page.clamp(1, total_pages);
        self.view.current_page
    }

    // ---- bookmarks ----

    /// Creates a bookmark, or edits `editing` when given.
    pub fn save_bookmark(&mut self, draft: BookmarkDraft, editing: Option<&str>) -> Result<Bookmark, AppError> {
        let bookmark = self.bookmarks.upsert(draft, editing, Utc::now())?;
        let command = match editing {
            Some(_) => WriteCommand::UpdateBookmark(bookmark.clone()),
            None => WriteCommand::CreateBookmark(bookmark.clone()),
        };
        self.queue.push(command);
        Ok(bookmark)
    }

    pub fn delete_bookmark(&mut self, id: &str) -> Result<Bookmark, AppError> {
        let removed = self.bookmarks.remove(id)?;
        self.selection.retain(|s| s != id);
        self.queue.push(WriteCommand::DeleteBookmark(removed.id.clone()));
        info!(id, "bookmark deleted");
        Ok(removed)
    }

    /// Counts a visit to `url` before it is opened.
    pub fn visit(&mut self, url: &str) -> Option<Bookmark> {
        let bookmark = self.bookmarks.record_visit(url, Utc::now())?;
        self.queue.push(WriteCommand::UpdateBookmark(bookmark.clone()));
        Some(bookmark)
    }

    /// In bulk mode a click toggles selection; otherwise it opens the link.
    pub fn click_bookmark(&mut self, id: &str) -> Result<ItemClick, AppError> {
        let url = self
            .bookmarks
            .get(id)
            .map(|b| b.url.clone())
            .ok_or_else(|| BookmarkError::NotFound(id.to_string()))?;
        if self.selection.bulk_mode() {
            let selected = self.selection.toggle(id);
            return Ok(ItemClick::Selected { selected });
        }
        self.visit(&url);
        Ok(ItemClick::Open { url })
    }

    pub fn reorder_bookmark(&mut self, dragged_id: &str, target_id: &str) -> bool {
        let moved = self.bookmarks.reorder_by_drag(dragged_id, target_id);
        if moved {
            self.queue.push(WriteCommand::Snapshot);
        }
        moved
    }

    // ---- selection ----

    pub fn toggle_bulk_mode(&mut self) -> bool {
        self.selection.toggle_bulk_mode()
    }

    pub fn toggle_selection(&mut self, id: &str) -> bool {
        self.selection.toggle(id)
    }

    pub fn select_all_on_page(&mut self) {
        let ids: Vec<String> = self.current_page().items.into_iter().map(|b| b.id).collect();
        self.selection.select_all_on_page(&ids);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Deletes every selected bookmark.
    pub fn bulk_delete(&mut self) -> Result<usize, AppError> {
        if self.selection.is_empty() {
            return Err(BookmarkError::EmptySelection.into());
        }
        let ids = self.selection.ids().to_vec();
        let removed = self.bookmarks.remove_many(&ids);
        self.queue
            .extend(removed.iter().map(|b| WriteCommand::DeleteBookmark(b.id.clone())));
        self.selection.clear();
        info!(count = removed.len(), "bulk delete");
        Ok(removed.len())
    }

    /// Files every selected bookmark under `category` as one undoable move.
    pub fn bulk_move(&mut self, category: &str) -> Result<usize, AppError> {
        if category.is_empty() {
            return Err(BookmarkError::MissingCategory.into());
        }
        if self.selection.is_empty() {
            return Err(BookmarkError::EmptySelection.into());
        }
        if !self.categories.contains(category) {
            return Err(CategoryError::NotFound(category.to_string()).into());
        }
        let ids = self.selection.ids().to_vec();
        let count = self.move_bookmarks(&ids, category);
        self.selection.clear();
        info!(count, category, "bulk move");
        Ok(count)
    }

    fn move_bookmarks(&mut self, ids: &[String], category: &str) -> usize {
        let items = self.bookmarks.assign_category(ids, category, Utc::now());
        let count = items.len();
        for item in &items {
            if let Some(bookmark) = self.bookmarks.get(&item.id) {
                self.queue.push(WriteCommand::UpdateBookmark(bookmark.clone()));
            }
        }
        if !items.is_empty() {
            self.undo_log.push(UndoEntry::Move { items }, Utc::now());
        }
        count
    }

    // ---- categories ----

    pub fn add_category(&mut self, name: &str) -> Option<Category> {
        let category = self.categories.add_category(name)?;
        self.queue.push(WriteCommand::CreateCategory(category.clone()));
        Some(category)
    }

    /// Renames optimistically; a failed write reverts the name on flush.
    pub fn rename_category(&mut self, id: &str, name: &str) -> Result<(), AppError> {
        let previous_name = self.categories.rename_category(id, name)?;
        if let Some(category) = self.categories.get(id) {
            self.queue.push(WriteCommand::RenameCategory {
                category: category.clone(),
                previous_name,
            });
        }
        Ok(())
    }

    pub fn toggle_category(&mut self, id: &str) -> Result<bool, AppError> {
        let expanded = self.categories.toggle_expanded(id)?;
        if let Some(category) = self.categories.get(id) {
            self.queue.push(WriteCommand::UpdateCategory(category.clone()));
        }
        Ok(expanded)
    }

    /// Deletes a category with its descendants. Undoable.
    pub fn delete_category(&mut self, id: &str) -> Result<DeleteSummary, AppError> {
        let outcome = self
            .categories
            .delete_category_cascade(id, self.bookmarks.bookmarks_mut())?;
        if self
            .view
            .selected_category
            .as_ref()
            .is_some_and(|s| outcome.removed_ids.contains(s))
        {
            self.view.selected_category = None;
            self.view.current_page = 1;
        }
        self.undo_log.push(outcome.undo, Utc::now());
        self.queue.push(WriteCommand::Snapshot);
        Ok(DeleteSummary {
            removed_categories: outcome.removed_ids.len(),
            affected_bookmarks: outcome.affected_bookmarks.len(),
        })
    }

    /// Reparents or reorders a category. Undoable.
    pub fn move_category(&mut self, source_id: &str, target_id: &str, zone: DropZone) -> Result<(), AppError> {
        let undo = plan_category_move(&mut self.categories, source_id, target_id, zone)?;
        self.undo_log.push(undo, Utc::now());
        self.queue.push(WriteCommand::Snapshot);
        Ok(())
    }

    // ---- drops ----

    /// Handles drag data released over `target_id`.
    pub fn drop_on_category(&mut self, target_id: &str, raw: &str, zone: DropZone) -> Result<DropOutcome, AppError> {
        let Some(payload) = DropPayload::parse(raw) else {
            return Ok(DropOutcome::Ignored);
        };
        if !self.categories.contains(target_id) {
            return Err(CategoryError::NotFound(target_id.to_string()).into());
        }

        match payload {
            DropPayload::ExternalUrl(url) => {
                let bookmark = self.bookmarks.add_from_url(&url, target_id, Utc::now())?;
                self.queue.push(WriteCommand::CreateBookmark(bookmark.clone()));
                self.undo_log.push(
                    UndoEntry::Add {
                        ids: vec![bookmark.id.clone()],
                    },
                    Utc::now(),
                );
                Ok(DropOutcome::BookmarkAdded { bookmark })
            }
            DropPayload::Category(source_id) => {
                self.move_category(&source_id, target_id, zone)?;
                Ok(DropOutcome::CategoryMoved)
            }
            DropPayload::Bookmark(id) => {
                if self.bookmarks.get(&id).is_none() {
                    return Err(BookmarkError::NotFound(id).into());
                }
                let bulk = self.selection.bulk_mode();
                let ids = if bulk && self.selection.contains(&id) {
                    self.selection.ids().to_vec()
                } else {
                    vec![id]
                };
                let count = self.move_bookmarks(&ids, target_id);
                if bulk {
                    self.selection.clear();
                }
                Ok(DropOutcome::BookmarksMoved { count })
            }
        }
    }

    // ---- undo ----

    /// Reverts the most recent undoable change and queues a snapshot write.
    pub fn undo(&mut self) -> Option<&'static str> {
        let entry = self.undo_log.pop()?;
        let label = entry.describe();
        match entry {
            UndoEntry::Move { items } => {
                let restored = self.bookmarks.restore_categories(&items);
                info!(count = restored.len(), "move undone");
            }
            UndoEntry::Add { ids } => {
                let removed = self.bookmarks.remove_many(&ids);
                self.selection.retain(|s| !ids.iter().any(|i| i == s));
                info!(count = removed.len(), "add undone");
            }
            UndoEntry::Reorder { prev } => {
                self.categories.restore_placements(&prev);
                info!("category move undone");
            }
            UndoEntry::DeleteCategory {
                prev_categories,
                prev_bookmarks,
            } => {
                self.categories.replace(prev_categories);
                self.bookmarks.replace(prev_bookmarks);
                info!("category delete undone");
            }
        }
        self.queue.push(WriteCommand::Snapshot);
        self.undo_log.show_toast(UNDONE_MESSAGE, Utc::now());
        Some(label)
    }

    // ---- import and export ----

    pub fn import_payload(&mut self, payload: ImportPayload) -> Result<ImportReport, AppError> {
        let outcome = merge_import(
            &mut self.categories,
            &mut self.bookmarks,
            payload,
            &self.settings.categories.default_name,
            Utc::now(),
        )?;
        let import = outcome.import_snapshot();
        if !import.categories.is_empty() || !import.bookmarks.is_empty() {
            self.queue.push(WriteCommand::Import(import));
        }
        self.queue.extend(
            outcome
                .updated_categories
                .iter()
                .cloned()
                .map(WriteCommand::UpdateCategory),
        );
        self.queue.extend(
            outcome
                .merged_bookmarks
                .iter()
                .cloned()
                .map(WriteCommand::UpdateBookmark),
        );
        Ok(outcome.report)
    }

    /// Parses a JSON bookmark file and merges it.
    pub fn import_json(&mut self, content: &str) -> Result<ImportReport, AppError> {
        let payload = ImportPayload::from_json(content)?;
        self.import_payload(payload)
    }

    /// `(file name, content)` of an export.
    pub fn export(&self, format: ExportFormat) -> Result<(String, String), AppError> {
        let now = Utc::now();
        let bookmarks = self.bookmarks.bookmarks();
        let content = match format {
            ExportFormat::Json => export::export_json(&self.categories, bookmarks, now)?,
            ExportFormat::Html => export::export_html(&self.categories, bookmarks)?,
        };
        Ok((export::export_filename(format, now), content))
    }

    pub fn backup(&self) -> Result<(String, String), AppError> {
        let now = Utc::now();
        let content = export::backup_json(&self.categories, self.bookmarks.bookmarks(), now)?;
        Ok((export::backup_filename(now), content))
    }
}

#[cfg(feature = "remote")]
fn remote_backend(settings: &AppSettings) -> Option<Box<dyn PersistenceBackend>> {
    if !settings.api.enabled {
        info!("remote persistence disabled, using local store only");
        return None;
    }
    let api = crate::services::remote_api::RemoteApi::new(&settings.api.base_url);
    Some(Box::new(api))
}

#[cfg(not(feature = "remote"))]
fn remote_backend(_settings: &AppSettings) -> Option<Box<dyn PersistenceBackend>> {
    info!("built without remote persistence, using local store only");
    None
}
