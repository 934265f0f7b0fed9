//! Property-based tests for import merging.

use std::collections::HashSet;

use chrono::Utc;
use proptest::prelude::*;
use serde_json::{json, Value};
use shelfmark::managers::bookmark_manager::BookmarkCollection;
use shelfmark::managers::category_manager::CategoryTree;
use shelfmark::services::import_merge::merge_import;
use shelfmark::types::bookmark::{Category, DEFAULT_CATEGORY_ID};
use shelfmark::types::snapshot::ImportPayload;

const DEFAULT_NAME: &str = "Uncategorized";
const NAMES: [&str; 5] = ["Work", "work ", "Reading", "Rust", "  READING"];

/// Categories with unique ids whose parents point at earlier entries or nowhere.
fn arb_categories() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec((0..NAMES.len(), any::<prop::sample::Index>(), any::<bool>()), 0..6).prop_map(|specs| {
        specs
            .iter()
            .enumerate()
            .map(|(i, (name, parent, dangling))| {
                let parent_id = if *dangling {
                    json!("ghost")
                } else if i > 0 && parent.index(2) == 0 {
                    json!(format!("imp{}", parent.index(i)))
                } else {
                    Value::Null
                };
                json!({"id": format!("imp{}", i), "name": NAMES[*name], "parentId": parent_id, "order": i})
            })
            .collect()
    })
}

/// Bookmarks drawn from a small URL pool so duplicates are common.
fn arb_bookmarks(categories: usize) -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec((0..6usize, 0..categories + 2, prop::collection::vec("[a-c]", 0..3)), 1..10).prop_map(
        move |specs| {
            specs
                .into_iter()
                .map(|(url, cat, tags)| {
                    let category = if cat < categories {
                        format!("imp{}", cat)
                    } else if cat == categories {
                        "Work".to_string()
                    } else {
                        String::new()
                    };
                    json!({"url": format!("https://site{}.example/", url), "category": category, "tags": tags})
                })
                .collect()
        },
    )
}

fn arb_payload() -> impl Strategy<Value = Value> {
    arb_categories().prop_flat_map(|categories| {
        let count = categories.len();
        arb_bookmarks(count).prop_map(move |bookmarks| json!({"categories": categories.clone(), "bookmarks": bookmarks}))
    })
}

fn existing() -> (CategoryTree, BookmarkCollection) {
    let tree = CategoryTree::new(vec![
        Category::new(DEFAULT_CATEGORY_ID, DEFAULT_NAME, None, 0),
        Category::new("work", "Work", None, 1),
    ]);
    (tree, BookmarkCollection::default())
}

fn parse(value: &Value) -> ImportPayload {
    ImportPayload::from_json(&value.to_string()).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// A second import of the same file creates no bookmarks or categories.
    #[test]
    fn second_import_adds_nothing(file in arb_payload()) {
        let (mut tree, mut collection) = existing();

        let first = merge_import(&mut tree, &mut collection, parse(&file), DEFAULT_NAME, Utc::now()).unwrap();
        let categories = tree.categories().to_vec();
        let urls: Vec<String> = collection.bookmarks().iter().map(|b| b.url.clone()).collect();

        let second = merge_import(&mut tree, &mut collection, parse(&file), DEFAULT_NAME, Utc::now()).unwrap();

        prop_assert_eq!(second.report.added, 0);
        prop_assert_eq!(second.report.new_categories, 0);
        prop_assert_eq!(second.report.merged, first.report.added + first.report.merged);
        prop_assert_eq!(tree.categories(), categories.as_slice());
        let after: Vec<String> = collection.bookmarks().iter().map(|b| b.url.clone()).collect();
        prop_assert_eq!(after, urls);
    }

    /// After a merge URLs are unique and every bookmark sits in a known category.
    #[test]
    fn merge_keeps_urls_unique_and_categories_resolved(file in arb_payload()) {
        let (mut tree, mut collection) = existing();
        merge_import(&mut tree, &mut collection, parse(&file), DEFAULT_NAME, Utc::now()).unwrap();

        let urls: HashSet<&str> = collection.bookmarks().iter().map(|b| b.url.as_str()).collect();
        prop_assert_eq!(urls.len(), collection.len());
        for bookmark in collection.bookmarks() {
            prop_assert!(tree.contains(&bookmark.category), "{} has no category", bookmark.url);
        }

        let names: HashSet<String> = tree
            .categories()
            .iter()
            .map(|c| c.name.trim().to_lowercase())
            .collect();
        prop_assert_eq!(names.len(), tree.len());
        prop_assert!(tree.build_tree(collection.bookmarks()).is_ok());
    }
}
