//! Local search-count store.
//!
//! Uses `rusqlite` (bundled `SQLite`) to keep search counts on disk,
//! as an offline alternative to the Appwrite collection.

mod connection;
mod migrations;
/// Search-count table CRUD operations.
pub mod search_counts;
mod store;

#[allow(clippy::module_name_repetitions)]
pub use connection::{open_db, open_in_memory, resolve_db_path};
#[allow(clippy::module_name_repetitions)]
pub use store::SqliteSearchStore;
