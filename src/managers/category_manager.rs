//! Category tree model for Shelfmark.
//!
//! Categories are held as a flat list with parent references. The nested
//! tree, recursive counts and the indented flat listing are derived on read
//! and never stored. All traversals are iterative and guarded by a visited
//! set, so a corrupted parent chain is reported instead of recursing forever.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::types::bookmark::{
    Bookmark, Category, CategoryTreeNode, FlatCategory, DEFAULT_CATEGORY_ID,
};
use crate::types::errors::CategoryError;
use crate::types::undo::{CategoryPlacement, UndoEntry};

/// Indent emitted per tree level by [`CategoryTree::flatten`].
pub const INDENT: &str = "  ";

/// Result of a cascade delete.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeDelete {
    /// The deleted category and all of its descendants.
    pub removed_ids: Vec<String>,
    /// Bookmarks whose category was rewritten.
    pub affected_bookmarks: Vec<String>,
    /// Full pre-delete state.
    pub undo: UndoEntry,
}

/// Flat, ordered list of categories.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryTree {
    categories: Vec<Category>,
}

impl CategoryTree {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub(crate) fn categories_mut(&mut self) -> &mut Vec<Category> {
        &mut self.categories
    }

    /// Replaces the whole list, e.g. after a load or an undo of a cascade delete.
    pub fn replace(&mut self, categories: Vec<Category>) {
        self.categories = categories;
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    pub(crate) fn index_of(&self, id: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.id == id)
    }

    /// Ids of the direct children of `id`, in list order.
    pub fn child_ids(&self, id: &str) -> Vec<String> {
        self.categories
            .iter()
            .filter(|c| c.parent_id.as_deref() == Some(id))
            .map(|c| c.id.clone())
            .collect()
    }

    /// `id` followed by every transitive descendant, breadth first.
    pub fn descendant_ids(&self, id: &str) -> Vec<String> {
        let mut ids = vec![id.to_string()];
        let mut seen: HashSet<String> = ids.iter().cloned().collect();
        let mut queue = VecDeque::from([id.to_string()]);

        while let Some(parent) = queue.pop_front() {
            for child in self.child_ids(&parent) {
                if seen.insert(child.clone()) {
                    ids.push(child.clone());
                    queue.push_back(child);
                }
            }
        }
        ids
    }

    /// True if `ancestor` appears on the parent chain of `candidate`.
    ///
    /// A category is not its own descendant.
    pub fn is_descendant(&self, candidate: &str, ancestor: &str) -> bool {
        let mut visited = HashSet::new();
        let mut current = self.get(candidate);

        while let Some(cat) = current {
            if !visited.insert(cat.id.as_str()) {
                return false;
            }
            match cat.parent_id.as_deref() {
                Some(parent) if parent == ancestor => return true,
                Some(parent) => current = self.get(parent),
                None => return false,
            }
        }
        false
    }

    /// Creates the default bucket at the front of the list if it is missing.
    ///
    /// Returns the created category.
    pub fn ensure_default_category(&mut self, name: &str) -> Option<Category> {
        if self.contains(DEFAULT_CATEGORY_ID) {
            return None;
        }
        let default = Category::new(DEFAULT_CATEGORY_ID, name, None, 0);
        self.categories.insert(0, default.clone());
        self.renumber();
        info!(name, "created default category");
        Some(default)
    }

    /// Bookmarks filed directly under `id`.
    pub fn count_direct(&self, id: &str, bookmarks: &[Bookmark]) -> usize {
        bookmarks.iter().filter(|b| b.category == id).count()
    }

    /// Bookmarks filed under `id` or any of its descendants.
    pub fn count_recursive(&self, id: &str, bookmarks: &[Bookmark]) -> usize {
        let direct = direct_counts(bookmarks);
        self.descendant_ids(id)
            .iter()
            .map(|cid| direct.get(cid.as_str()).copied().unwrap_or(0))
            .sum()
    }

    /// Builds the nested tree with recursive counts.
    ///
    /// Roots are categories without a parent, plus categories whose parent
    /// does not exist. Children keep list order. Categories that cannot be
    /// reached from any root sit on a parent cycle and fail the build.
    pub fn build_tree(&self, bookmarks: &[Bookmark]) -> Result<Vec<CategoryTreeNode>, CategoryError> {
        let index: HashMap<&str, usize> = self
            .categories
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.as_str(), i))
            .collect();

        let mut roots = Vec::new();
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); self.categories.len()];
        for (i, cat) in self.categories.iter().enumerate() {
            match cat.parent_id.as_deref().and_then(|p| index.get(p)) {
                Some(&parent) => children[parent].push(i),
                None => roots.push(i),
            }
        }

        // Pre-order walk; every node must be reached exactly once.
        let mut visited = vec![false; self.categories.len()];
        let mut preorder = Vec::with_capacity(self.categories.len());
        let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
        while let Some(i) = stack.pop() {
            if visited[i] {
                return Err(CategoryError::Cycle(self.categories[i].id.clone()));
            }
            visited[i] = true;
            preorder.push(i);
            stack.extend(children[i].iter().rev().copied());
        }
        if let Some(stuck) = visited.iter().position(|v| !v) {
            warn!(id = %self.categories[stuck].id, "category unreachable from any root");
            return Err(CategoryError::Cycle(self.categories[stuck].id.clone()));
        }

        // Children follow their parent in pre-order, so the reverse visits leaves first.
        let direct = direct_counts(bookmarks);
        let mut built: Vec<Option<CategoryTreeNode>> = vec![None; self.categories.len()];
        for &i in preorder.iter().rev() {
            let kids: Vec<CategoryTreeNode> = children[i]
                .iter()
                .filter_map(|&c| built[c].take())
                .collect();
            let category = self.categories[i].clone();
            let count = direct.get(category.id.as_str()).copied().unwrap_or(0)
                + kids.iter().map(|k| k.count).sum::<usize>();
            built[i] = Some(CategoryTreeNode {
                category,
                children: kids,
                count,
            });
        }

        Ok(roots.iter().filter_map(|&r| built[r].take()).collect())
    }

    /// Pre-order listing of a tree with depth-indented labels.
    pub fn flatten(tree: &[CategoryTreeNode]) -> Vec<FlatCategory> {
        let mut result = Vec::new();
        let mut stack: Vec<(&CategoryTreeNode, usize)> = tree.iter().rev().map(|n| (n, 0)).collect();

        while let Some((node, depth)) = stack.pop() {
            result.push(FlatCategory {
                category: node.category.clone(),
                depth,
                label: format!("{}{}", INDENT.repeat(depth), node.category.name),
            });
            stack.extend(node.children.iter().rev().map(|c| (c, depth + 1)));
        }
        result
    }

    /// Appends a root category. Blank names are ignored.
    pub fn add_category(&mut self, name: &str) -> Option<Category> {
        let name = name.trim();
        if name.is_empty() {
            debug!("ignoring blank category name");
            return None;
        }
        let category = Category::new(
            Uuid::new_v4().to_string(),
            name,
            None,
            self.categories.len() as i64,
        );
        self.categories.push(category.clone());
        info!(id = %category.id, name, "category added");
        Some(category)
    }

    /// Renames a category in place and returns the previous name.
    pub fn rename_category(&mut self, id: &str, new_name: &str) -> Result<String, CategoryError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(CategoryError::EmptyName);
        }
        let cat = self
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| CategoryError::NotFound(id.to_string()))?;
        let previous = std::mem::replace(&mut cat.name, new_name.to_string());
        debug!(id, from = %previous, to = new_name, "category renamed");
        Ok(previous)
    }

    /// Puts back a name if it still holds the value a failed rename wrote.
    pub fn rollback_rename(&mut self, id: &str, attempted: &str, previous: &str) -> bool {
        match self.categories.iter_mut().find(|c| c.id == id) {
            Some(cat) if cat.name == attempted => {
                cat.name = previous.to_string();
                true
            }
            _ => false,
        }
    }

    /// Flips the expanded flag and returns the new value.
    pub fn toggle_expanded(&mut self, id: &str) -> Result<bool, CategoryError> {
        let cat = self
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| CategoryError::NotFound(id.to_string()))?;
        cat.expanded = !cat.expanded;
        Ok(cat.expanded)
    }

    /// Deletes `id` and all descendants.
    ///
    /// Every bookmark filed under a removed category moves to the original
    /// parent of its own category, or becomes unassigned when that category
    /// was a root.
    pub fn delete_category_cascade(
        &mut self,
        id: &str,
        bookmarks: &mut [Bookmark],
    ) -> Result<CascadeDelete, CategoryError> {
        if id == DEFAULT_CATEGORY_ID {
            return Err(CategoryError::Protected(id.to_string()));
        }
        if !self.contains(id) {
            return Err(CategoryError::NotFound(id.to_string()));
        }
        let removed_ids = self.descendant_ids(id);
        if removed_ids.iter().any(|r| r == DEFAULT_CATEGORY_ID) {
            return Err(CategoryError::Protected(DEFAULT_CATEGORY_ID.to_string()));
        }

        let undo = UndoEntry::DeleteCategory {
            prev_categories: self.categories.clone(),
            prev_bookmarks: bookmarks.to_vec(),
        };

        let removed: HashSet<&str> = removed_ids.iter().map(String::as_str).collect();
        let original_parent: HashMap<String, Option<String>> = self
            .categories
            .iter()
            .filter(|c| removed.contains(c.id.as_str()))
            .map(|c| (c.id.clone(), c.parent_id.clone()))
            .collect();

        self.categories.retain(|c| !removed.contains(c.id.as_str()));
        self.renumber();

        let mut affected_bookmarks = Vec::new();
        for bookmark in bookmarks.iter_mut() {
            if let Some(parent) = original_parent.get(&bookmark.category) {
                bookmark.category = parent.clone().unwrap_or_default();
                affected_bookmarks.push(bookmark.id.clone());
            }
        }

        info!(
            id,
            categories = removed_ids.len(),
            bookmarks = affected_bookmarks.len(),
            "category deleted with descendants"
        );
        Ok(CascadeDelete {
            removed_ids,
            affected_bookmarks,
            undo,
        })
    }

    /// Repairs parent references that point at no existing category.
    ///
    /// A dangling value is first read as a category name, then matched
    /// against ids and names, and finally the category is promoted to a
    /// root. A repair that would close a cycle also promotes to root, and so
    /// does one category on every parent cycle already present.
    /// Returns how many categories changed.
    pub fn fix_dangling_parents(&mut self) -> usize {
        let ids: HashSet<String> = self.categories.iter().map(|c| c.id.clone()).collect();
        let name_to_id: HashMap<String, String> = self
            .categories
            .iter()
            .map(|c| (c.name.clone(), c.id.clone()))
            .collect();

        let mut changed = 0;
        for i in 0..self.categories.len() {
            let dangling = match self.categories[i].parent_id.as_deref() {
                Some(p) if !ids.contains(p) => p.to_string(),
                _ => continue,
            };
            let own_id = self.categories[i].id.clone();

            let candidate = name_to_id.get(&dangling).cloned().or_else(|| {
                self.categories
                    .iter()
                    .find(|x| x.id == dangling || x.name == dangling)
                    .map(|x| x.id.clone())
            });
            let repaired = candidate
                .filter(|c| *c != own_id && !self.is_descendant(c, &own_id));

            debug!(id = %own_id, from = %dangling, to = ?repaired, "repaired dangling parent");
            self.categories[i].parent_id = repaired;
            changed += 1;
        }
        changed += self.promote_unreachable();

        if changed > 0 {
            info!(changed, "dangling category parents repaired");
        }
        changed
    }

    /// Promotes categories that no root reaches, which only happens on a
    /// parent cycle. The first stranded category in list order becomes a
    /// root; this repeats until every cycle is broken.
    pub fn promote_unreachable(&mut self) -> usize {
        let mut promoted = 0;
        loop {
            let reachable = self.reachable_ids();
            let Some(stuck) = self
                .categories
                .iter()
                .position(|c| !reachable.contains(c.id.as_str()))
            else {
                break;
            };
            warn!(id = %self.categories[stuck].id, "category on a parent cycle promoted to root");
            self.categories[stuck].parent_id = None;
            promoted += 1;
        }
        promoted
    }

    fn reachable_ids(&self) -> HashSet<String> {
        let ids: HashSet<&str> = self.categories.iter().map(|c| c.id.as_str()).collect();
        let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        for cat in &self.categories {
            match cat.parent_id.as_deref().filter(|p| ids.contains(p)) {
                Some(parent) => children.entry(parent).or_default().push(cat.id.as_str()),
                None => queue.push_back(cat.id.as_str()),
            }
        }

        let mut reachable = HashSet::new();
        while let Some(id) = queue.pop_front() {
            if reachable.insert(id.to_string()) {
                queue.extend(children.get(id).into_iter().flatten().copied());
            }
        }
        reachable
    }

    /// Current `{id, parentId, order}` of every category.
    pub fn placements(&self) -> Vec<CategoryPlacement> {
        self.categories
            .iter()
            .map(|c| CategoryPlacement {
                id: c.id.clone(),
                parent_id: c.parent_id.clone(),
                order: c.order,
            })
            .collect()
    }

    /// Restores recorded placements and re-sorts the list by `order`.
    pub fn restore_placements(&mut self, prev: &[CategoryPlacement]) {
        let by_id: HashMap<&str, &CategoryPlacement> =
            prev.iter().map(|p| (p.id.as_str(), p)).collect();
        for cat in &mut self.categories {
            if let Some(p) = by_id.get(cat.id.as_str()) {
                cat.parent_id = p.parent_id.clone();
                cat.order = p.order;
            }
        }
        self.categories.sort_by_key(|c| c.order);
    }

    /// Sets every `order` to the category's list index.
    pub fn renumber(&mut self) {
        for (i, cat) in self.categories.iter_mut().enumerate() {
            cat.order = i as i64;
        }
    }
}

fn direct_counts(bookmarks: &[Bookmark]) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for b in bookmarks {
        *counts.entry(b.category.as_str()).or_insert(0) += 1;
    }
    counts
}
