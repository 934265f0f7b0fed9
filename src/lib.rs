//! Shelfmark: a personal bookmark manager core.
//!
//! Categories form a tree stored flat with parent references. Bookmarks are
//! filtered, sorted and paged into views, moved by drag and drop or in bulk,
//! and structural changes can be undone. State persists to an HTTP service
//! with a local SQLite fallback.

pub mod app;
pub mod database;
pub mod managers;
pub mod platform;
pub mod rpc_handler;
pub mod services;
pub mod types;
