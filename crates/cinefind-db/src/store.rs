//! [`SearchCountStore`] backed by a local `SQLite` file.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use anyhow::Result;
use cinefind_api::{FetchError, FetchResult};
use cinefind_api::store::{NewSearchCount, SearchCountDocument, SearchCountStore};
use rusqlite::Connection;

use super::connection::open_db;
use super::search_counts;

/// Search-count store over a single `SQLite` connection.
///
/// The connection is guarded by a blocking mutex; each operation is one
/// short statement and never holds the lock across an `.await`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct SqliteSearchStore {
    conn: Mutex<Connection>,
}

impl SqliteSearchStore {
    /// Wraps an already-migrated connection.
    #[must_use]
    pub const fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Opens the database under `dir` (or the default data directory).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(dir: Option<&PathBuf>) -> Result<Self> {
        open_db(dir).map(Self::new)
    }

    /// Locks the connection, mapping a poisoned lock to a store error.
    fn lock(&self) -> FetchResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| FetchError::Store(String::from("database connection lock poisoned")))
    }
}

/// Formats an `anyhow` chain into a store error.
fn store_error(err: &anyhow::Error) -> FetchError {
    FetchError::Store(format!("{err:#}"))
}

impl SearchCountStore for SqliteSearchStore {
    async fn find_by_term(&self, term: &str) -> FetchResult<Option<SearchCountDocument>> {
        let conn = self.lock()?;
        search_counts::find_by_term(&conn, term).map_err(|e| store_error(&e))
    }

    async fn create(&self, document: &NewSearchCount) -> FetchResult<SearchCountDocument> {
        let conn = self.lock()?;
        search_counts::insert(&conn, document).map_err(|e| store_error(&e))
    }

    async fn update_count(
        &self,
        document_id: &str,
        count: u32,
    ) -> FetchResult<SearchCountDocument> {
        let conn = self.lock()?;
        search_counts::set_count(&conn, document_id, count).map_err(|e| store_error(&e))
    }

    async fn top_by_count(&self, limit: u32) -> FetchResult<Vec<SearchCountDocument>> {
        let conn = self.lock()?;
        search_counts::top_by_count(&conn, limit).map_err(|e| store_error(&e))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use super::*;
    use crate::open_in_memory;

    fn new_count(term: &str) -> NewSearchCount {
        NewSearchCount {
            search_term: String::from(term),
            count: 1,
            movie_id: 268,
            poster_url: None,
            title: String::from("Batman"),
        }
    }

    #[tokio::test]
    async fn test_store_roundtrip_through_trait() {
        // Arrange
        let store = SqliteSearchStore::new(open_in_memory().unwrap());

        // Act
        let created = store.create(&new_count("batman")).await.unwrap();
        let updated = store.update_count(&created.id, 2).await.unwrap();
        let found = store.find_by_term("batman").await.unwrap().unwrap();
        let top = store.top_by_count(5).await.unwrap();

        // Assert
        assert_eq!(updated.count, 2);
        assert_eq!(found, updated);
        assert_eq!(top, vec![updated]);
    }

    #[tokio::test]
    async fn test_duplicate_create_maps_to_store_error() {
        // Arrange
        let store = SqliteSearchStore::new(open_in_memory().unwrap());
        store.create(&new_count("batman")).await.unwrap();

        // Act
        let err = store.create(&new_count("batman")).await.unwrap_err();

        // Assert
        assert!(matches!(err, FetchError::Store(_)), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn test_open_persists_across_connections() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_path_buf();
        {
            let store = SqliteSearchStore::open(Some(&path)).unwrap();
            store.create(&new_count("batman")).await.unwrap();
        }

        // Act
        let reopened = SqliteSearchStore::open(Some(&path)).unwrap();
        let found = reopened.find_by_term("batman").await.unwrap();

        // Assert
        assert_eq!(found.unwrap().count, 1);
    }
}
