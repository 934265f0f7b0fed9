//! Unit tests for merging imported bookmark files into the collection.

use chrono::{TimeZone, Utc};
use serde_json::json;
use shelfmark::managers::bookmark_manager::BookmarkCollection;
use shelfmark::managers::category_manager::CategoryTree;
use shelfmark::services::import_merge::merge_import;
use shelfmark::types::bookmark::{Bookmark, Category, DEFAULT_CATEGORY_ID};
use shelfmark::types::errors::ImportError;
use shelfmark::types::snapshot::ImportPayload;

const DEFAULT_NAME: &str = "Uncategorized";

fn existing() -> (CategoryTree, BookmarkCollection) {
    let at = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();
    let tree = CategoryTree::new(vec![
        Category::new(DEFAULT_CATEGORY_ID, DEFAULT_NAME, None, 0),
        Category::new("work", "Work", None, 1),
    ]);
    let collection = BookmarkCollection::new(vec![Bookmark {
        id: "rust".to_string(),
        title: "Rust".to_string(),
        url: "https://www.rust-lang.org/".to_string(),
        description: String::new(),
        favicon: "https://icons.example/rust.png".to_string(),
        category: "work".to_string(),
        tags: vec!["lang".to_string()],
        created_at: at,
        updated_at: at,
        visit_count: 3,
        last_visited: None,
    }]);
    (tree, collection)
}

fn payload(value: serde_json::Value) -> ImportPayload {
    ImportPayload::from_json(&value.to_string()).unwrap()
}

#[test]
fn test_payload_without_urls_is_rejected_untouched() {
    let (mut tree, mut collection) = existing();
    let before = (tree.clone(), collection.clone());

    let empty = payload(json!({"categories": [{"id": "x", "name": "X"}], "bookmarks": []}));
    assert_eq!(
        merge_import(&mut tree, &mut collection, empty, DEFAULT_NAME, Utc::now()).unwrap_err(),
        ImportError::NothingToImport
    );
    let blank = payload(json!({"bookmarks": [{"url": "  "}]}));
    assert!(merge_import(&mut tree, &mut collection, blank, DEFAULT_NAME, Utc::now()).is_err());

    assert_eq!((tree, collection), before);
}

#[test]
fn test_categories_match_by_normalized_name() {
    let (mut tree, mut collection) = existing();
    let input = payload(json!({
        "categories": [{"id": "w2", "name": "  WORK "}],
        "bookmarks": [{"url": "https://docs.rs/", "title": "Docs", "category": "w2"}]
    }));

    let outcome = merge_import(&mut tree, &mut collection, input, DEFAULT_NAME, Utc::now()).unwrap();

    assert_eq!(outcome.report.new_categories, 0);
    assert_eq!(tree.len(), 2);
    assert_eq!(outcome.new_bookmarks[0].category, "work");
}

#[test]
fn test_new_hierarchy_keeps_parent_links() {
    let (mut tree, mut collection) = existing();
    let input = payload(json!({
        "categories": [
            {"id": "p", "name": "Parent", "order": 0},
            {"id": "c", "name": "Child", "parentId": "p", "order": 1},
            {"id": "w2", "name": "work"},
            {"id": "s", "name": "Sub", "parentId": "w2"}
        ],
        "bookmarks": [{"url": "https://example.com/", "category": "c"}]
    }));

    let outcome = merge_import(&mut tree, &mut collection, input, DEFAULT_NAME, Utc::now()).unwrap();

    assert_eq!(outcome.report.new_categories, 3);
    assert_eq!(tree.get("c").unwrap().parent_id.as_deref(), Some("p"));
    assert_eq!(tree.get("s").unwrap().parent_id.as_deref(), Some("work"));
    assert_eq!(outcome.new_categories.len(), 3);
    assert!(outcome.updated_categories.is_empty());
    let orders: Vec<i64> = tree.categories().iter().map(|c| c.order).collect();
    assert_eq!(orders, (0..tree.len() as i64).collect::<Vec<_>>());
    assert_eq!(outcome.new_bookmarks[0].title, "https://example.com/");
}

/// Parent links that loop inside the file are broken so the tree still builds.
#[test]
fn test_cyclic_parents_in_file_are_repaired() {
    let (mut tree, mut collection) = existing();
    let input = payload(json!({
        "categories": [
            {"id": "x", "name": "X", "parentId": "y"},
            {"id": "y", "name": "Y", "parentId": "x"}
        ],
        "bookmarks": [{"url": "https://loop.example/", "category": "y"}]
    }));

    let outcome = merge_import(&mut tree, &mut collection, input, DEFAULT_NAME, Utc::now()).unwrap();

    assert_eq!(outcome.report.new_categories, 2);
    assert_eq!(tree.get("x").unwrap().parent_id, None);
    assert_eq!(tree.get("y").unwrap().parent_id.as_deref(), Some("x"));
    let sent = outcome.new_categories.iter().find(|c| c.id == "x").unwrap();
    assert_eq!(sent.parent_id, None);

    let roots = tree.build_tree(collection.bookmarks()).unwrap();
    let x = roots.iter().find(|r| r.category.id == "x").unwrap();
    assert_eq!(x.count, 1);
}

/// A repeated URL merges tags, keeps the higher visit count and touches `updatedAt`.
#[test]
fn test_duplicate_url_merges_into_existing() {
    let (mut tree, mut collection) = existing();
    let now = Utc.with_ymd_and_hms(2024, 2, 2, 0, 0, 0).unwrap();
    let input = payload(json!({
        "bookmarks": [{
            "url": "https://www.rust-lang.org/",
            "title": "ignored",
            "description": "The Rust language",
            "tags": ["systems", "lang"],
            "visitCount": 10
        }]
    }));

    let outcome = merge_import(&mut tree, &mut collection, input, DEFAULT_NAME, now).unwrap();

    assert_eq!(outcome.report.added, 0);
    assert_eq!(outcome.report.merged, 1);
    let merged = collection.get("rust").unwrap();
    assert_eq!(merged.title, "Rust");
    assert_eq!(merged.tags, ["lang", "systems"]);
    assert_eq!(merged.description, "The Rust language");
    assert_eq!(merged.favicon, "https://icons.example/rust.png");
    assert_eq!(merged.visit_count, 10);
    assert_eq!(merged.updated_at, now);
    assert_eq!(outcome.merged_bookmarks.len(), 1);
    assert!(outcome.new_bookmarks.is_empty());
}

#[test]
fn test_duplicates_within_one_file_collapse() {
    let (mut tree, mut collection) = existing();
    let input = payload(json!({
        "bookmarks": [
            {"url": "https://a.example/", "tags": ["one"]},
            {"url": "https://a.example/", "tags": ["two"]}
        ]
    }));

    let outcome = merge_import(&mut tree, &mut collection, input, DEFAULT_NAME, Utc::now()).unwrap();

    assert_eq!(outcome.report.added, 1);
    assert_eq!(outcome.report.merged, 1);
    assert_eq!(collection.len(), 2);
    assert_eq!(outcome.new_bookmarks.len(), 1);
    assert_eq!(outcome.new_bookmarks[0].tags, ["one", "two"]);
    assert!(outcome.merged_bookmarks.is_empty());
}

#[test]
fn test_unknown_category_maps_to_default() {
    let mut tree = CategoryTree::default();
    let mut collection = BookmarkCollection::default();
    let input = payload(json!({
        "bookmarks": [
            {"url": "https://a.example/", "category": "nowhere"},
            {"url": "https://b.example/", "category": "", "categoryName": "Nope"}
        ]
    }));

    let outcome = merge_import(&mut tree, &mut collection, input, DEFAULT_NAME, Utc::now()).unwrap();

    assert_eq!(outcome.report.mapped_to_default, 2);
    assert!(tree.contains(DEFAULT_CATEGORY_ID));
    assert_eq!(outcome.new_categories.len(), 1);
    assert_eq!(outcome.new_categories[0].id, DEFAULT_CATEGORY_ID);
    assert!(collection.bookmarks().iter().all(|b| b.category == DEFAULT_CATEGORY_ID));
}

#[test]
fn test_category_resolved_by_name() {
    let (mut tree, mut collection) = existing();
    let input = payload(json!({
        "bookmarks": [
            {"url": "https://a.example/", "category": "Work"},
            {"url": "https://b.example/", "categoryName": "work"}
        ]
    }));

    merge_import(&mut tree, &mut collection, input, DEFAULT_NAME, Utc::now()).unwrap();

    assert!(collection
        .bookmarks()
        .iter()
        .filter(|b| b.url.ends_with(".example/"))
        .all(|b| b.category == "work"));
}

/// Importing the same file twice adds nothing the second time.
#[test]
fn test_second_import_is_idempotent() {
    let (mut tree, mut collection) = existing();
    let file = json!({
        "categories": [{"id": "r", "name": "Reading"}],
        "bookmarks": [
            {"url": "https://a.example/", "category": "r", "tags": ["x"]},
            {"url": "https://b.example/", "category": "Reading"}
        ]
    });

    merge_import(&mut tree, &mut collection, payload(file.clone()), DEFAULT_NAME, Utc::now()).unwrap();
    let categories = tree.categories().to_vec();
    let count = collection.len();

    let second = merge_import(&mut tree, &mut collection, payload(file), DEFAULT_NAME, Utc::now()).unwrap();

    assert_eq!(second.report.added, 0);
    assert_eq!(second.report.new_categories, 0);
    assert_eq!(second.report.merged, 2);
    assert_eq!(tree.categories(), categories.as_slice());
    assert_eq!(collection.len(), count);
    assert!(second.import_snapshot().bookmarks.is_empty());
}

#[test]
fn test_export_document_is_accepted() {
    let doc = json!({
        "bookmarks": [{
            "id": "b1",
            "title": "One",
            "url": "https://one.example/",
            "category": "c1",
            "tags": [],
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z",
            "visitCount": 2
        }],
        "categories": [{"id": "c1", "name": "One", "parentId": null, "order": 0, "expanded": true}],
        "exportDate": "2024-01-02T00:00:00Z"
    });
    let mut tree = CategoryTree::default();
    let mut collection = BookmarkCollection::default();

    merge_import(&mut tree, &mut collection, payload(doc), DEFAULT_NAME, Utc::now()).unwrap();

    let imported = collection.get("b1").unwrap();
    assert_eq!(imported.category, "c1");
    assert_eq!(imported.visit_count, 2);
    assert_eq!(imported.created_at, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
}
