// Shelfmark state managers
// Managers hold the in-memory models: category tree, bookmark collection, selection, drops, undo.

pub mod bookmark_manager;
pub mod category_manager;
pub mod drop_manager;
pub mod selection_manager;
pub mod undo_manager;
