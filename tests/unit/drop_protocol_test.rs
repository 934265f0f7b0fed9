//! Unit tests for drag payload decoding, drop zones and category splices.

use rstest::rstest;
use shelfmark::managers::category_manager::CategoryTree;
use shelfmark::managers::drop_manager::{plan_category_move, DropPayload, DropZone};
use shelfmark::types::bookmark::Category;
use shelfmark::types::errors::CategoryError;
use shelfmark::types::undo::UndoEntry;

fn cat(id: &str, parent: Option<&str>, order: i64) -> Category {
    Category::new(id, id, parent, order)
}

/// a
///   a1
///   a2
/// b
///   b1
/// c
fn tree() -> CategoryTree {
    CategoryTree::new(vec![
        cat("a", None, 0),
        cat("a1", Some("a"), 1),
        cat("a2", Some("a"), 2),
        cat("b", None, 3),
        cat("b1", Some("b"), 4),
        cat("c", None, 5),
    ])
}

fn order(tree: &CategoryTree) -> Vec<&str> {
    tree.categories().iter().map(|c| c.id.as_str()).collect()
}

fn parent<'a>(tree: &'a CategoryTree, id: &str) -> Option<&'a str> {
    tree.get(id).and_then(|c| c.parent_id.as_deref())
}

#[rstest]
#[case("category:abc", Some(DropPayload::Category("abc".to_string())))]
#[case("bookmark:42", Some(DropPayload::Bookmark("42".to_string())))]
#[case("https://example.com/page", Some(DropPayload::ExternalUrl("https://example.com/page".to_string())))]
#[case("https://a.example/\nhttps://b.example/", Some(DropPayload::ExternalUrl("https://a.example/".to_string())))]
#[case("some-bookmark-id", Some(DropPayload::Bookmark("some-bookmark-id".to_string())))]
#[case("   ", None)]
#[case("", None)]
fn test_payload_decoding(#[case] raw: &str, #[case] expected: Option<DropPayload>) {
    assert_eq!(DropPayload::parse(raw), expected);
}

#[test]
fn test_encode_category_round_trips() {
    let encoded = DropPayload::encode_category("xyz");
    assert_eq!(encoded, "category:xyz");
    assert_eq!(DropPayload::parse(&encoded), Some(DropPayload::Category("xyz".to_string())));
}

#[rstest]
#[case(0.0, 40.0, DropZone::Before)]
#[case(9.9, 40.0, DropZone::Before)]
#[case(10.0, 40.0, DropZone::Child)]
#[case(30.0, 40.0, DropZone::Child)]
#[case(30.1, 40.0, DropZone::After)]
#[case(40.0, 40.0, DropZone::After)]
fn test_zone_from_pointer(#[case] y: f64, #[case] height: f64, #[case] expected: DropZone) {
    assert_eq!(DropZone::from_pointer(y, height), expected);
}

#[test]
fn test_zone_names_and_default() {
    assert_eq!(DropZone::from_name("before"), Some(DropZone::Before));
    assert_eq!(DropZone::from_name("child"), Some(DropZone::Child));
    assert_eq!(DropZone::from_name("sideways"), None);
    assert_eq!(DropZone::default(), DropZone::After);
}

#[test]
fn test_move_before_takes_target_parent() {
    let mut tree = tree();
    plan_category_move(&mut tree, "c", "a2", DropZone::Before).unwrap();
    assert_eq!(order(&tree), ["a", "a1", "c", "a2", "b", "b1"]);
    assert_eq!(parent(&tree, "c"), Some("a"));
}

#[test]
fn test_move_after_inserts_behind_target() {
    let mut tree = tree();
    plan_category_move(&mut tree, "a1", "c", DropZone::After).unwrap();
    assert_eq!(order(&tree), ["a", "a2", "b", "b1", "c", "a1"]);
    assert_eq!(parent(&tree, "a1"), None);
}

#[test]
fn test_move_child_goes_after_last_child() {
    let mut tree = tree();
    plan_category_move(&mut tree, "c", "a", DropZone::Child).unwrap();
    assert_eq!(order(&tree), ["a", "a1", "a2", "c", "b", "b1"]);
    assert_eq!(parent(&tree, "c"), Some("a"));
}

#[test]
fn test_move_child_of_leaf_goes_right_after_it() {
    let mut tree = tree();
    plan_category_move(&mut tree, "a", "c", DropZone::Child).unwrap();
    assert_eq!(order(&tree), ["a1", "a2", "b", "b1", "c", "a"]);
    assert_eq!(parent(&tree, "a"), Some("c"));
    // Children keep their parent reference and still hang under "a".
    assert_eq!(parent(&tree, "a1"), Some("a"));
    assert_eq!(tree.build_tree(&[]).unwrap().len(), 2);
}

#[test]
fn test_orders_are_renumbered() {
    let mut tree = tree();
    plan_category_move(&mut tree, "b", "a", DropZone::Before).unwrap();
    let orders: Vec<i64> = tree.categories().iter().map(|c| c.order).collect();
    assert_eq!(orders, [0, 1, 2, 3, 4, 5]);
}

/// Dropping a category into its own child is rejected and changes nothing.
#[test]
fn test_drop_into_own_child_is_rejected() {
    let mut tree = tree();
    let before = tree.clone();
    let err = plan_category_move(&mut tree, "a", "a1", DropZone::Child).unwrap_err();
    assert!(matches!(err, CategoryError::WouldCreateCycle { .. }));
    assert_eq!(tree, before);
}

#[test]
fn test_self_drop_and_unknown_ids_are_rejected() {
    let mut tree = tree();
    assert!(matches!(
        plan_category_move(&mut tree, "a", "a", DropZone::Child),
        Err(CategoryError::SelfDrop(_))
    ));
    assert!(matches!(
        plan_category_move(&mut tree, "zzz", "a", DropZone::After),
        Err(CategoryError::NotFound(_))
    ));
    assert!(matches!(
        plan_category_move(&mut tree, "a", "zzz", DropZone::After),
        Err(CategoryError::NotFound(_))
    ));
}

#[test]
fn test_move_returns_prior_placements() {
    let mut tree = tree();
    let snapshot = tree.placements();
    let undo = plan_category_move(&mut tree, "b1", "a", DropZone::Child).unwrap();
    assert_eq!(undo, UndoEntry::Reorder { prev: snapshot.clone() });

    tree.restore_placements(&snapshot);
    assert_eq!(tree.placements(), snapshot);
}
