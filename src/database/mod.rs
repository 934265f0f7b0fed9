//! Shelfmark database layer.
//!
//! Provides the SQLite connection and schema migrations behind the local
//! fallback store.
//!
//! # Usage
//!
//! ```no_run
//! use shelfmark::database::Database;
//!
//! let db = Database::open("shelfmark.db").expect("failed to open database");
//! let conn = db.connection();
//! ```

pub mod connection;
pub mod migrations;

pub use connection::Database;
