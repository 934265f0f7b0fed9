//! Drag-and-drop protocol for Shelfmark.
//!
//! Decodes drag payloads, resolves the drop zone from the pointer position
//! and performs category reparent/reorder splices on the flat category list.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::managers::category_manager::CategoryTree;
use crate::types::errors::CategoryError;
use crate::types::undo::UndoEntry;

const CATEGORY_PREFIX: &str = "category:";
const BOOKMARK_PREFIX: &str = "bookmark:";

/// What was dropped onto a category node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropPayload {
    /// A dragged category, encoded as `category:<id>`.
    Category(String),
    /// A link dragged in from outside the application.
    ExternalUrl(String),
    /// A dragged bookmark, encoded as its raw id.
    Bookmark(String),
}

impl DropPayload {
    /// Decodes drag data. Blank data yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Some(id) = trimmed.strip_prefix(CATEGORY_PREFIX) {
            return Some(DropPayload::Category(id.trim().to_string()));
        }
        if let Some(id) = trimmed.strip_prefix(BOOKMARK_PREFIX) {
            return Some(DropPayload::Bookmark(id.trim().to_string()));
        }
        if trimmed.contains("http://") || trimmed.contains("https://") {
            let first = trimmed.lines().next().unwrap_or_default().trim();
            return Some(DropPayload::ExternalUrl(first.to_string()));
        }
        Some(DropPayload::Bookmark(trimmed.to_string()))
    }

    /// Drag data for a category.
    pub fn encode_category(id: &str) -> String {
        format!("{CATEGORY_PREFIX}{id}")
    }
}

/// Region of a drop target the pointer was released over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropZone {
    /// Top quarter: sibling preceding the target.
    Before,
    /// Middle half: last child of the target.
    Child,
    /// Bottom quarter: sibling following the target.
    #[default]
    After,
}

impl DropZone {
    /// Maps a pointer offset within a target of the given height to a zone.
    pub fn from_pointer(offset_y: f64, height: f64) -> Self {
        let height = if height > 0.0 { height } else { 1.0 };
        if offset_y < height * 0.25 {
            DropZone::Before
        } else if offset_y > height * 0.75 {
            DropZone::After
        } else {
            DropZone::Child
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "before" => Some(DropZone::Before),
            "child" => Some(DropZone::Child),
            "after" => Some(DropZone::After),
            _ => None,
        }
    }
}

/// Moves `source_id` relative to `target_id` and returns the inverse entry.
///
/// Self-drops and drops into the source's own subtree are rejected before
/// anything changes. `Before` and `After` adopt the target's parent; `Child`
/// places the source after the target's last existing child, or directly
/// after the target when it has none. Every `order` is renumbered.
pub fn plan_category_move(
    tree: &mut CategoryTree,
    source_id: &str,
    target_id: &str,
    zone: DropZone,
) -> Result<UndoEntry, CategoryError> {
    if source_id == target_id {
        return Err(CategoryError::SelfDrop(source_id.to_string()));
    }
    if tree.is_descendant(target_id, source_id) {
        debug!(source_id, target_id, "rejected drop into own subtree");
        return Err(CategoryError::WouldCreateCycle {
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
        });
    }
    let source_index = tree
        .index_of(source_id)
        .ok_or_else(|| CategoryError::NotFound(source_id.to_string()))?;
    let target_parent = tree
        .get(target_id)
        .ok_or_else(|| CategoryError::NotFound(target_id.to_string()))?
        .parent_id
        .clone();

    let undo = UndoEntry::Reorder {
        prev: tree.placements(),
    };

    let categories = tree.categories_mut();
    let mut source = categories.remove(source_index);
    let target_index = categories
        .iter()
        .position(|c| c.id == target_id)
        .ok_or_else(|| CategoryError::NotFound(target_id.to_string()))?;

    let insert_at = match zone {
        DropZone::Before => {
            source.parent_id = target_parent;
            target_index
        }
        DropZone::After => {
            source.parent_id = target_parent;
            target_index + 1
        }
        DropZone::Child => {
            source.parent_id = Some(target_id.to_string());
            categories
                .iter()
                .rposition(|c| c.parent_id.as_deref() == Some(target_id))
                .unwrap_or(target_index)
                + 1
        }
    };
    categories.insert(insert_at, source);
    tree.renumber();

    info!(source_id, target_id, ?zone, "category moved");
    Ok(undo)
}
