//! Property-based tests for the category tree and category drag-and-drop.
//!
//! Forests are generated with every parent pointing at an earlier node, then
//! shuffled, so the input is acyclic but not in tree order.

use std::collections::HashSet;

use chrono::Utc;
use proptest::prelude::*;
use shelfmark::managers::category_manager::CategoryTree;
use shelfmark::managers::drop_manager::{plan_category_move, DropZone};
use shelfmark::types::bookmark::{Bookmark, Category};

/// Up to 12 categories; each one is a root or hangs under an earlier one.
fn arb_forest() -> impl Strategy<Value = Vec<Category>> {
    prop::collection::vec(any::<prop::sample::Index>(), 1..12)
        .prop_map(|parents| {
            parents
                .iter()
                .enumerate()
                .map(|(i, pick)| {
                    // Index over i + 1 slots: slot i means "root".
                    let slot = pick.index(i + 1);
                    let parent = (slot < i).then(|| format!("c{}", slot));
                    Category::new(format!("c{}", i), format!("Cat {}", i), parent.as_deref(), i as i64)
                })
                .collect::<Vec<_>>()
        })
        .prop_shuffle()
}

fn arb_zone() -> impl Strategy<Value = DropZone> {
    prop_oneof![Just(DropZone::Before), Just(DropZone::Child), Just(DropZone::After)]
}

fn bookmarks_in(categories: &[Category], picks: &[prop::sample::Index]) -> Vec<Bookmark> {
    let now = Utc::now();
    picks
        .iter()
        .enumerate()
        .map(|(i, pick)| Bookmark {
            id: format!("b{}", i),
            title: format!("B{}", i),
            url: format!("https://b{}.example/", i),
            description: String::new(),
            favicon: String::new(),
            category: categories[pick.index(categories.len())].id.clone(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
            visit_count: 0,
            last_visited: None,
        })
        .collect()
}

fn ancestor_count(tree: &CategoryTree, id: &str) -> usize {
    let mut count = 0;
    let mut current = tree.get(id).and_then(|c| c.parent_id.clone());
    while let Some(parent) = current {
        count += 1;
        current = tree.get(&parent).and_then(|c| c.parent_id.clone());
    }
    count
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// Every category appears once in the flat listing, at a depth equal to
    /// its number of ancestors.
    #[test]
    fn flatten_depth_matches_ancestor_count(categories in arb_forest()) {
        let tree = CategoryTree::new(categories);
        let flat = CategoryTree::flatten(&tree.build_tree(&[]).unwrap());

        prop_assert_eq!(flat.len(), tree.len());
        let unique: HashSet<&str> = flat.iter().map(|f| f.category.id.as_str()).collect();
        prop_assert_eq!(unique.len(), tree.len());
        for row in &flat {
            prop_assert_eq!(row.depth, ancestor_count(&tree, &row.category.id));
            prop_assert!(row.label.ends_with(&row.category.name));
        }
    }

    /// Node counts agree with `count_recursive`, and the roots cover every bookmark.
    #[test]
    fn tree_counts_are_recursive(
        categories in arb_forest(),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 0..20),
    ) {
        let bookmarks = bookmarks_in(&categories, &picks);
        let tree = CategoryTree::new(categories);
        let roots = tree.build_tree(&bookmarks).unwrap();

        prop_assert_eq!(roots.iter().map(|r| r.count).sum::<usize>(), bookmarks.len());
        let mut stack: Vec<_> = roots.iter().collect();
        while let Some(node) = stack.pop() {
            prop_assert_eq!(node.count, tree.count_recursive(&node.category.id, &bookmarks));
            stack.extend(node.children.iter());
        }
    }

    /// `descendant_ids` and `is_descendant` describe the same relation.
    #[test]
    fn descendants_agree_with_ancestry(categories in arb_forest(), a in any::<prop::sample::Index>(), b in any::<prop::sample::Index>()) {
        let tree = CategoryTree::new(categories);
        let ancestor = tree.categories()[a.index(tree.len())].id.clone();
        let candidate = tree.categories()[b.index(tree.len())].id.clone();

        let listed = tree.descendant_ids(&ancestor).contains(&candidate) && candidate != ancestor;
        prop_assert_eq!(listed, tree.is_descendant(&candidate, &ancestor));
    }

    /// A move is rejected exactly when it would drop a category onto itself
    /// or into its own subtree; accepted moves keep the forest acyclic.
    #[test]
    fn moves_never_create_cycles(
        categories in arb_forest(),
        source in any::<prop::sample::Index>(),
        target in any::<prop::sample::Index>(),
        zone in arb_zone(),
    ) {
        let mut tree = CategoryTree::new(categories);
        let source_id = tree.categories()[source.index(tree.len())].id.clone();
        let target_id = tree.categories()[target.index(tree.len())].id.clone();
        let before = tree.clone();
        let forbidden = source_id == target_id || tree.is_descendant(&target_id, &source_id);

        match plan_category_move(&mut tree, &source_id, &target_id, zone) {
            Ok(_) => {
                prop_assert!(!forbidden);
                prop_assert!(tree.build_tree(&[]).is_ok());
                let ids: HashSet<&str> = tree.categories().iter().map(|c| c.id.as_str()).collect();
                prop_assert_eq!(ids.len(), before.len());
                let orders: Vec<i64> = tree.categories().iter().map(|c| c.order).collect();
                prop_assert_eq!(orders, (0..before.len() as i64).collect::<Vec<_>>());
                if zone == DropZone::Child {
                    prop_assert_eq!(tree.get(&source_id).unwrap().parent_id.as_deref(), Some(target_id.as_str()));
                } else {
                    prop_assert_eq!(
                        tree.get(&source_id).unwrap().parent_id.clone(),
                        tree.get(&target_id).unwrap().parent_id.clone()
                    );
                }
            }
            Err(_) => {
                prop_assert!(forbidden);
                prop_assert_eq!(tree, before);
            }
        }
    }
}
