// Shelfmark services
// Persistence plumbing, import/export and settings around the in-memory models.

pub mod backend;
pub mod export;
pub mod import_merge;
pub mod local_store;
pub mod memory_backend;
#[cfg(feature = "remote")]
pub mod remote_api;
pub mod settings_engine;
pub mod write_queue;
