//! Merges parsed bookmark files into the collection.
//!
//! Categories are matched by normalized name, bookmarks by exact URL. Running
//! the same import twice leaves the collection unchanged apart from
//! `updatedAt` on the merged bookmarks.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::managers::bookmark_manager::BookmarkCollection;
use crate::managers::category_manager::CategoryTree;
use crate::types::bookmark::{Bookmark, Category, DEFAULT_CATEGORY_ID};
use crate::types::errors::ImportError;
use crate::types::snapshot::{ImportPayload, ImportReport, ImportedBookmark, ImportedCategory, Snapshot};

impl ImportPayload {
    /// Parses a JSON bookmark file. Export and backup documents are accepted
    /// as they are; extra fields are ignored.
    pub fn from_json(content: &str) -> Result<Self, ImportError> {
        serde_json::from_str(content).map_err(|e| ImportError::Parse(e.to_string()))
    }

    /// Reads a local-store blob as an import payload.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            categories: snapshot
                .categories
                .into_iter()
                .map(|c| ImportedCategory {
                    id: c.id,
                    name: c.name,
                    parent_id: c.parent_id,
                    order: c.order,
                })
                .collect(),
            bookmarks: snapshot
                .bookmarks
                .into_iter()
                .map(|b| ImportedBookmark {
                    id: b.id,
                    title: b.title,
                    url: b.url,
                    description: b.description,
                    favicon: b.favicon,
                    category: b.category,
                    category_name: None,
                    tags: b.tags,
                    created_at: Some(b.created_at),
                    updated_at: Some(b.updated_at),
                    visit_count: b.visit_count,
                })
                .collect(),
        }
    }
}

/// What a merge changed, split by the write each part needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    pub report: ImportReport,
    /// Categories that did not exist before, including a freshly created default.
    pub new_categories: Vec<Category>,
    /// Pre-existing categories whose parent was remapped.
    pub updated_categories: Vec<Category>,
    pub new_bookmarks: Vec<Bookmark>,
    /// Pre-existing bookmarks that absorbed an imported duplicate.
    pub merged_bookmarks: Vec<Bookmark>,
}

impl MergeOutcome {
    /// The idempotent insert sent to the persistence service.
    pub fn import_snapshot(&self) -> Snapshot {
        Snapshot {
            categories: self.new_categories.clone(),
            bookmarks: self.new_bookmarks.clone(),
        }
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

fn name_index(tree: &CategoryTree) -> HashMap<String, String> {
    tree.categories()
        .iter()
        .map(|c| (normalize(&c.name), c.id.clone()))
        .collect()
}

/// Merges `payload` into the models.
///
/// Fails without touching anything when the payload holds no bookmarks.
pub fn merge_import(
    tree: &mut CategoryTree,
    collection: &mut BookmarkCollection,
    payload: ImportPayload,
    default_name: &str,
    now: DateTime<Utc>,
) -> Result<MergeOutcome, ImportError> {
    if payload.bookmarks.iter().all(|b| b.url.trim().is_empty()) {
        return Err(ImportError::NothingToImport);
    }

    let mut outcome = MergeOutcome::default();
    let created_default = tree.ensure_default_category(default_name).is_some();

    let existing_ids: HashSet<String> = tree.categories().iter().map(|c| c.id.clone()).collect();
    let existing_names = name_index(tree);

    // Categories new by both id and normalized name; repeats within the batch collapse.
    let mut batch_names: HashMap<String, String> = HashMap::new();
    let mut final_ids: HashMap<String, String> = HashMap::new();
    let mut added = Vec::new();
    for imported in &payload.categories {
        let name = imported.name.trim();
        let norm = normalize(name);
        if existing_ids.contains(&imported.id) {
            final_ids.insert(imported.id.clone(), imported.id.clone());
            continue;
        }
        if let Some(id) = existing_names.get(&norm).or_else(|| batch_names.get(&norm)) {
            if !imported.id.is_empty() {
                final_ids.insert(imported.id.clone(), id.clone());
            }
            continue;
        }
        if name.is_empty() {
            continue;
        }
        let id = if imported.id.is_empty() || final_ids.contains_key(&imported.id) {
            Uuid::new_v4().to_string()
        } else {
            imported.id.clone()
        };
        if !imported.id.is_empty() {
            final_ids.insert(imported.id.clone(), id.clone());
        }
        batch_names.insert(norm, id.clone());
        let parent = imported.parent_id.clone().filter(|p| !p.is_empty());
        added.push(Category::new(id, name, parent.as_deref(), imported.order));
    }
    outcome.report.new_categories = added.len();
    tree.categories_mut().extend(added);

    // Parents pointing at merged-away import ids move to the surviving id.
    let mut added_ids: HashSet<String> = batch_names.values().cloned().collect();
    for cat in tree.categories_mut().iter_mut() {
        let Some(parent) = cat.parent_id.as_ref() else {
            continue;
        };
        if let Some(target) = final_ids.get(parent) {
            if target != parent && *target != cat.id {
                cat.parent_id = Some(target.clone());
                if !added_ids.contains(&cat.id) {
                    outcome.updated_categories.push(cat.clone());
                }
            }
        }
    }
    tree.fix_dangling_parents();
    tree.renumber();
    if created_default {
        added_ids.insert(DEFAULT_CATEGORY_ID.to_string());
    }
    outcome.new_categories.extend(
        tree.categories()
            .iter()
            .filter(|c| added_ids.contains(&c.id))
            .cloned(),
    );

    let names = name_index(tree);
    let current_ids: HashSet<String> = tree.categories().iter().map(|c| c.id.clone()).collect();
    let resolve = |imported: &ImportedBookmark| -> String {
        let key = imported.category.trim();
        if !key.is_empty() {
            if let Some(id) = final_ids.get(key) {
                return id.clone();
            }
            if current_ids.contains(key) {
                return key.to_string();
            }
            if let Some(id) = names.get(&key.to_lowercase()) {
                return id.clone();
            }
        }
        imported
            .category_name
            .as_deref()
            .and_then(|n| names.get(&normalize(n)))
            .cloned()
            .unwrap_or_else(|| DEFAULT_CATEGORY_ID.to_string())
    };

    let mut merged_ids: Vec<String> = Vec::new();
    for imported in payload.bookmarks.iter().filter(|b| !b.url.trim().is_empty()) {
        let category = resolve(imported);
        if category == DEFAULT_CATEGORY_ID {
            outcome.report.mapped_to_default += 1;
        }

        let list = collection.bookmarks_mut();
        if let Some(existing) = list.iter_mut().find(|b| b.url == imported.url) {
            for tag in &imported.tags {
                if !existing.tags.contains(tag) {
                    existing.tags.push(tag.clone());
                }
            }
            if !imported.description.is_empty() {
                existing.description = imported.description.clone();
            }
            if !imported.favicon.is_empty() {
                existing.favicon = imported.favicon.clone();
            }
            existing.visit_count = existing.visit_count.max(imported.visit_count);
            existing.updated_at = now;
            outcome.report.merged += 1;
            if !merged_ids.contains(&existing.id) {
                merged_ids.push(existing.id.clone());
            }
            continue;
        }

        let mut tags: Vec<String> = Vec::new();
        for tag in &imported.tags {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
        let id = if imported.id.is_empty() || list.iter().any(|b| b.id == imported.id) {
            Uuid::new_v4().to_string()
        } else {
            imported.id.clone()
        };
        let bookmark = Bookmark {
            id,
            title: if imported.title.trim().is_empty() {
                imported.url.clone()
            } else {
                imported.title.trim().to_string()
            },
            url: imported.url.clone(),
            description: imported.description.clone(),
            favicon: imported.favicon.clone(),
            category,
            tags,
            created_at: imported.created_at.unwrap_or(now),
            updated_at: imported.updated_at.unwrap_or(now),
            visit_count: imported.visit_count,
            last_visited: None,
        };
        debug!(id = %bookmark.id, url = %bookmark.url, "imported bookmark");
        list.insert(0, bookmark.clone());
        outcome.new_bookmarks.push(bookmark);
        outcome.report.added += 1;
    }

    // A bookmark added earlier in this batch may have absorbed a later duplicate.
    let new_ids: HashSet<String> = outcome.new_bookmarks.iter().map(|b| b.id.clone()).collect();
    for bookmark in collection.bookmarks() {
        if new_ids.contains(&bookmark.id) {
            if let Some(slot) = outcome.new_bookmarks.iter_mut().find(|b| b.id == bookmark.id) {
                *slot = bookmark.clone();
            }
        } else if merged_ids.contains(&bookmark.id) {
            outcome.merged_bookmarks.push(bookmark.clone());
        }
    }

    info!(
        added = outcome.report.added,
        merged = outcome.report.merged,
        new_categories = outcome.report.new_categories,
        mapped_to_default = outcome.report.mapped_to_default,
        "import merged"
    );
    Ok(outcome)
}
