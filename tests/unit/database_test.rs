//! Unit tests for the Shelfmark database layer and the local store on top of it.

use chrono::Utc;
use shelfmark::database::migrations::{get_schema_version, run_all, CURRENT_SCHEMA_VERSION};
use shelfmark::database::Database;
use shelfmark::services::local_store::LocalStore;
use shelfmark::types::bookmark::Category;
use shelfmark::types::snapshot::{Snapshot, StoredState};
use tempfile::TempDir;

fn state_with(names: &[&str]) -> StoredState {
    let categories = names
        .iter()
        .enumerate()
        .map(|(i, n)| Category::new(*n, *n, None, i as i64))
        .collect();
    StoredState::from_snapshot(
        Snapshot {
            categories,
            bookmarks: Vec::new(),
        },
        Utc::now(),
    )
}

#[test]
fn test_open_in_memory_succeeds() {
    let db = Database::open_in_memory();
    assert!(db.is_ok(), "open_in_memory should succeed");
}

#[test]
fn test_migrations_reach_current_version() {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    assert_eq!(get_schema_version(db.connection()), CURRENT_SCHEMA_VERSION);

    let has_previous: bool = db
        .connection()
        .query_row(
            "SELECT COUNT(*) > 0 FROM pragma_table_info('kv_store') WHERE name = 'previous_value'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert!(has_previous, "v2 should add kv_store.previous_value");
}

#[test]
fn test_migrations_are_idempotent() {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    // Running migrations a second time should not fail
    assert!(run_all(db.connection()).is_ok());
    assert_eq!(get_schema_version(db.connection()), CURRENT_SCHEMA_VERSION);
}

#[test]
fn test_open_file_database_creates_file() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("shelfmark.db");

    let store = LocalStore::open(&db_path, "k");
    assert!(store.is_ok(), "open with file path should succeed");
    assert!(db_path.exists(), "Database file should exist on disk");
}

#[test]
fn test_local_store_round_trip_and_history() {
    let store = LocalStore::open_in_memory("bookmark-manager-data").unwrap();
    assert_eq!(store.load().unwrap(), None);

    let first = state_with(&["a"]);
    let second = state_with(&["a", "b"]);
    store.save(&first).unwrap();
    store.save(&second).unwrap();

    assert_eq!(store.load().unwrap(), Some(second));
    assert_eq!(store.previous().unwrap(), Some(first));

    store.clear().unwrap();
    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn test_local_store_keys_are_isolated() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shelfmark.db");
    let a = LocalStore::open(&path, "alpha").unwrap();
    a.save(&state_with(&["x"])).unwrap();

    let b = LocalStore::open(&path, "beta").unwrap();
    assert_eq!(b.load().unwrap(), None);
    assert_eq!(b.key(), "beta");
}

#[test]
fn test_local_store_reports_corrupt_blob() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shelfmark.db");
    let store = LocalStore::open(&path, "k").unwrap();
    store.save(&state_with(&[])).unwrap();

    let db = Database::open(&path).unwrap();
    db.connection()
        .execute("UPDATE kv_store SET value = '{oops' WHERE key = 'k'", [])
        .unwrap();
    assert!(store.load().is_err());
}
