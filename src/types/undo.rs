use serde::{Deserialize, Serialize};

use super::bookmark::{Bookmark, Category};

/// A bookmark's category before a move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovedBookmark {
    pub id: String,
    pub from_category: String,
}

/// A category's position in the hierarchy before a reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPlacement {
    pub id: String,
    pub parent_id: Option<String>,
    pub order: i64,
}

/// Inverse descriptor for one undoable structural mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum UndoEntry {
    /// Bookmarks moved to another category.
    Move { items: Vec<MovedBookmark> },
    /// Bookmarks created by a drop.
    Add { ids: Vec<String> },
    /// A category reparent or sibling reorder.
    Reorder { prev: Vec<CategoryPlacement> },
    /// A cascade delete, stored as full pre-delete snapshots.
    #[serde(rename_all = "camelCase")]
    DeleteCategory {
        prev_categories: Vec<Category>,
        prev_bookmarks: Vec<Bookmark>,
    },
}

impl UndoEntry {
    /// Toast text shown after the mutation this entry reverses.
    pub fn describe(&self) -> &'static str {
        match self {
            UndoEntry::Move { .. } => "Bookmarks moved",
            UndoEntry::Add { .. } => "External link added",
            UndoEntry::Reorder { .. } => "Category moved",
            UndoEntry::DeleteCategory { .. } => "Category deleted",
        }
    }
}
