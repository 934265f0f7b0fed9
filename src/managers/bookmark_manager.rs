//! Bookmark collection model for Shelfmark.
//!
//! Implements `BookmarkManagerTrait` over an in-memory list. Filtering,
//! sorting and pagination are pure reads; nothing derived is cached.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

use crate::managers::category_manager::CategoryTree;
use crate::types::bookmark::{Bookmark, BookmarkDraft, TagCount, DEFAULT_CATEGORY_ID};
use crate::types::errors::BookmarkError;
use crate::types::undo::MovedBookmark;
use crate::types::view::{BookmarkQuery, Page, SortKey, DEFAULT_PAGE_SIZE};

/// Number of entries returned by [`BookmarkCollection::popular_tags`] in the sidebar.
pub const POPULAR_TAG_LIMIT: usize = 10;

/// Trait defining bookmark collection operations.
pub trait BookmarkManagerTrait {
    fn upsert(&mut self, draft: BookmarkDraft, editing: Option<&str>, now: DateTime<Utc>) -> Result<Bookmark, BookmarkError>;
    fn remove(&mut self, id: &str) -> Result<Bookmark, BookmarkError>;
    fn remove_many(&mut self, ids: &[String]) -> Vec<Bookmark>;
    fn assign_category(&mut self, ids: &[String], category: &str, now: DateTime<Utc>) -> Vec<MovedBookmark>;
    fn record_visit(&mut self, url: &str, now: DateTime<Utc>) -> Option<Bookmark>;
    fn reorder_by_drag(&mut self, dragged_id: &str, target_id: &str) -> bool;
    fn filter(&self, query: &BookmarkQuery, tree: &CategoryTree) -> Vec<Bookmark>;
}

/// Ordered in-memory bookmark list. New bookmarks go to the front.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookmarkCollection {
    bookmarks: Vec<Bookmark>,
}

impl BookmarkCollection {
    pub fn new(bookmarks: Vec<Bookmark>) -> Self {
        Self { bookmarks }
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    pub(crate) fn bookmarks_mut(&mut self) -> &mut Vec<Bookmark> {
        &mut self.bookmarks
    }

    pub fn replace(&mut self, bookmarks: Vec<Bookmark>) {
        self.bookmarks = bookmarks;
    }

    pub fn len(&self) -> usize {
        self.bookmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Bookmark> {
        self.bookmarks.iter().find(|b| b.id == id)
    }

    /// Sorts in place. Ties keep their current relative order.
    pub fn sort(items: &mut [Bookmark], key: SortKey) {
        match key {
            SortKey::Title => items.sort_by(|a, b| {
                a.title
                    .to_lowercase()
                    .cmp(&b.title.to_lowercase())
                    .then_with(|| a.title.cmp(&b.title))
            }),
            SortKey::VisitCount => items.sort_by(|a, b| b.visit_count.cmp(&a.visit_count)),
            SortKey::CreatedAt => items.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
    }

    /// Slices one page out of a sorted list. Pages are 1-based; a zero page
    /// size falls back to the default.
    pub fn paginate(sorted: Vec<Bookmark>, page: usize, page_size: usize) -> Page {
        let page_size = if page_size == 0 { DEFAULT_PAGE_SIZE } else { page_size };
        let page = page.max(1);
        let total = sorted.len();
        let total_pages = total.div_ceil(page_size);

        let items = sorted
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect();

        Page {
            items,
            page,
            page_size,
            total,
            total_pages,
        }
    }

    /// Creates a bookmark for a dropped link, titled with its URL.
    pub fn add_from_url(&mut self, raw_url: &str, category: &str, now: DateTime<Utc>) -> Result<Bookmark, BookmarkError> {
        let parsed = parse_url(raw_url)?;
        let bookmark = Bookmark {
            id: Uuid::new_v4().to_string(),
            title: raw_url.to_string(),
            url: raw_url.to_string(),
            description: String::new(),
            favicon: favicon_for(&parsed),
            category: category.to_string(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
            visit_count: 0,
            last_visited: None,
        };
        self.bookmarks.insert(0, bookmark.clone());
        info!(id = %bookmark.id, category, "bookmark added from dropped link");
        Ok(bookmark)
    }

    /// Puts `prior` categories back, as recorded by a move.
    pub fn restore_categories(&mut self, items: &[MovedBookmark]) -> Vec<String> {
        let prior: HashMap<&str, &str> = items
            .iter()
            .map(|m| (m.id.as_str(), m.from_category.as_str()))
            .collect();
        let mut restored = Vec::new();
        for bookmark in &mut self.bookmarks {
            if let Some(from) = prior.get(bookmark.id.as_str()) {
                bookmark.category = from.to_string();
                restored.push(bookmark.id.clone());
            }
        }
        restored
    }

    /// Files unassigned bookmarks under the default category.
    pub fn assign_unfiled_to_default(&mut self) -> usize {
        let mut moved = 0;
        for bookmark in self.bookmarks.iter_mut().filter(|b| b.category.is_empty()) {
            bookmark.category = DEFAULT_CATEGORY_ID.to_string();
            moved += 1;
        }
        if moved > 0 {
            debug!(moved, "unfiled bookmarks assigned to default category");
        }
        moved
    }

    /// Most frequent tags, ties broken by name.
    pub fn popular_tags(&self, limit: usize) -> Vec<TagCount> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for tag in self.bookmarks.iter().flat_map(|b| b.tags.iter()) {
            *counts.entry(tag.as_str()).or_insert(0) += 1;
        }
        let mut tags: Vec<TagCount> = counts
            .into_iter()
            .map(|(name, count)| TagCount {
                name: name.to_string(),
                count,
            })
            .collect();
        tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        tags.truncate(limit);
        tags
    }
}

impl BookmarkManagerTrait for BookmarkCollection {
    /// Creates a new bookmark at the front, or merges the draft into `editing`.
    ///
    /// An edit keeps the stored favicon and visit history.
    fn upsert(&mut self, draft: BookmarkDraft, editing: Option<&str>, now: DateTime<Utc>) -> Result<Bookmark, BookmarkError> {
        let url = draft.url.trim().to_string();
        let parsed = parse_url(&url)?;
        let title = match draft.title.trim() {
            "" => url.clone(),
            t => t.to_string(),
        };

        if let Some(id) = editing {
            let existing = self
                .bookmarks
                .iter_mut()
                .find(|b| b.id == id)
                .ok_or_else(|| BookmarkError::NotFound(id.to_string()))?;
            existing.title = title;
            existing.url = url;
            existing.description = draft.description;
            existing.category = draft.category;
            existing.tags = draft.tags;
            existing.updated_at = now;
            debug!(id, "bookmark updated");
            return Ok(existing.clone());
        }

        let bookmark = Bookmark {
            id: Uuid::new_v4().to_string(),
            title,
            url,
            description: draft.description,
            favicon: favicon_for(&parsed),
            category: draft.category,
            tags: draft.tags,
            created_at: now,
            updated_at: now,
            visit_count: 0,
            last_visited: None,
        };
        self.bookmarks.insert(0, bookmark.clone());
        info!(id = %bookmark.id, "bookmark created");
        Ok(bookmark)
    }

    fn remove(&mut self, id: &str) -> Result<Bookmark, BookmarkError> {
        let index = self
            .bookmarks
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| BookmarkError::NotFound(id.to_string()))?;
        Ok(self.bookmarks.remove(index))
    }

    fn remove_many(&mut self, ids: &[String]) -> Vec<Bookmark> {
        let targets: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let (removed, kept) = std::mem::take(&mut self.bookmarks)
            .into_iter()
            .partition(|b| targets.contains(b.id.as_str()));
        self.bookmarks = kept;
        removed
    }

    /// Moves the given bookmarks to `category` and returns their prior categories.
    fn assign_category(&mut self, ids: &[String], category: &str, now: DateTime<Utc>) -> Vec<MovedBookmark> {
        let targets: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let mut moved = Vec::new();
        for bookmark in self.bookmarks.iter_mut().filter(|b| targets.contains(b.id.as_str())) {
            moved.push(MovedBookmark {
                id: bookmark.id.clone(),
                from_category: std::mem::replace(&mut bookmark.category, category.to_string()),
            });
            bookmark.updated_at = now;
        }
        moved
    }

    fn record_visit(&mut self, url: &str, now: DateTime<Utc>) -> Option<Bookmark> {
        let bookmark = self.bookmarks.iter_mut().find(|b| b.url == url)?;
        bookmark.visit_count += 1;
        bookmark.last_visited = Some(now);
        Some(bookmark.clone())
    }

    /// Removes the dragged bookmark and reinserts it at the target's index.
    fn reorder_by_drag(&mut self, dragged_id: &str, target_id: &str) -> bool {
        if dragged_id == target_id {
            return false;
        }
        let dragged = self.bookmarks.iter().position(|b| b.id == dragged_id);
        let target = self.bookmarks.iter().position(|b| b.id == target_id);
        let (Some(from), Some(to)) = (dragged, target) else {
            return false;
        };
        let item = self.bookmarks.remove(from);
        self.bookmarks.insert(to, item);
        true
    }

    /// Bookmarks matching `query`, in collection order.
    fn filter(&self, query: &BookmarkQuery, tree: &CategoryTree) -> Vec<Bookmark> {
        let categories: Option<HashSet<String>> = query
            .category_id
            .as_deref()
            .map(|id| tree.descendant_ids(id).into_iter().collect());
        let needle = query
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);
        let tag = query.tag.as_deref().map(str::to_lowercase);

        self.bookmarks
            .iter()
            .filter(|b| categories.as_ref().map_or(true, |set| set.contains(&b.category)))
            .filter(|b| needle.as_deref().map_or(true, |n| matches_text(b, n)))
            .filter(|b| {
                tag.as_deref()
                    .map_or(true, |t| b.tags.iter().any(|bt| bt.to_lowercase() == t))
            })
            .cloned()
            .collect()
    }
}

fn matches_text(bookmark: &Bookmark, needle: &str) -> bool {
    bookmark.title.to_lowercase().contains(needle)
        || bookmark.description.to_lowercase().contains(needle)
        || bookmark.url.to_lowercase().contains(needle)
        || bookmark.tags.iter().any(|t| t.to_lowercase().contains(needle))
}

fn parse_url(raw: &str) -> Result<Url, BookmarkError> {
    let parsed = Url::parse(raw).map_err(|_| BookmarkError::InvalidUrl(raw.to_string()))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(parsed),
        _ => Err(BookmarkError::InvalidUrl(raw.to_string())),
    }
}

/// Favicon service URL for the link's host.
pub fn favicon_for(url: &Url) -> String {
    format!(
        "https://www.google.com/s2/favicons?domain={}",
        url.host_str().unwrap_or_default()
    )
}
