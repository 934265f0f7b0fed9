use serde::{Deserialize, Serialize};

use super::bookmark::Bookmark;

/// Number of bookmarks per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 24;

/// Ordering of the bookmark list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    /// Title, case-folded ascending.
    Title,
    /// Most visited first.
    VisitCount,
    /// Newest first.
    #[default]
    CreatedAt,
}

impl SortKey {
    /// Parses the wire name; unknown names fall back to `CreatedAt`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "title" => SortKey::Title,
            "visitCount" => SortKey::VisitCount,
            _ => SortKey::CreatedAt,
        }
    }
}

/// Filter applied to the bookmark collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkQuery {
    /// Restrict to this category and all of its descendants.
    pub category_id: Option<String>,
    /// Case-insensitive substring over title, description, url and tags.
    pub query: Option<String>,
    /// Keep only bookmarks carrying this tag (case-insensitive equality).
    pub tag: Option<String>,
}

/// One page of the sorted bookmark list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub items: Vec<Bookmark>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
}

/// What the bookmark list is currently showing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub selected_category: Option<String>,
    pub search_query: String,
    pub sort_by: SortKey,
    pub current_page: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            selected_category: None,
            search_query: String::new(),
            sort_by: SortKey::CreatedAt,
            current_page: 1,
        }
    }
}

impl ViewState {
    /// The filter implied by the current view. A `tag:<name>` search is a tag filter.
    pub fn query(&self) -> BookmarkQuery {
        let trimmed = self.search_query.trim();
        let (query, tag) = match trimmed.strip_prefix("tag:") {
            Some(tag) if !tag.trim().is_empty() => (None, Some(tag.trim().to_string())),
            _ if trimmed.is_empty() => (None, None),
            _ => (Some(trimmed.to_string()), None),
        };
        BookmarkQuery {
            category_id: self.selected_category.clone(),
            query,
            tag,
        }
    }
}
