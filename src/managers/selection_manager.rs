//! Bulk-edit selection for Shelfmark.
//!
//! The selection is transient: it lives only while bulk mode is on and is
//! never persisted.

use tracing::debug;

/// Trait defining selection operations.
pub trait SelectionManagerTrait {
    fn toggle(&mut self, id: &str) -> bool;
    fn select_all_on_page(&mut self, page_ids: &[String]);
    fn clear(&mut self);
    fn set_bulk_mode(&mut self, enabled: bool);
    fn contains(&self, id: &str) -> bool;
}

/// Selected bookmark ids in the order they were picked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<String>,
    bulk_mode: bool,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn bulk_mode(&self) -> bool {
        self.bulk_mode
    }

    pub fn toggle_bulk_mode(&mut self) -> bool {
        self.set_bulk_mode(!self.bulk_mode);
        self.bulk_mode
    }

    /// Drops ids that no longer name a bookmark.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.ids.retain(|id| keep(id));
    }
}

impl SelectionManagerTrait for Selection {
    /// Adds or removes `id`; returns whether it is selected afterwards.
    fn toggle(&mut self, id: &str) -> bool {
        if let Some(pos) = self.ids.iter().position(|s| s == id) {
            self.ids.remove(pos);
            false
        } else {
            self.ids.push(id.to_string());
            true
        }
    }

    /// Deselects the page if every id on it is selected, otherwise selects all of it.
    fn select_all_on_page(&mut self, page_ids: &[String]) {
        if page_ids.is_empty() {
            return;
        }
        let all_selected = page_ids.iter().all(|id| self.contains(id));
        if all_selected {
            self.ids.retain(|id| !page_ids.contains(id));
        } else {
            for id in page_ids {
                if !self.contains(id) {
                    self.ids.push(id.clone());
                }
            }
        }
        debug!(selected = self.ids.len(), "page selection toggled");
    }

    fn clear(&mut self) {
        self.ids.clear();
    }

    /// Leaving bulk mode clears the selection.
    fn set_bulk_mode(&mut self, enabled: bool) {
        self.bulk_mode = enabled;
        if !enabled {
            self.ids.clear();
        }
    }

    fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|s| s == id)
    }
}
