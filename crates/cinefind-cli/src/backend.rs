//! Search-count backend chosen by configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use cinefind_api::FetchResult;
use cinefind_api::appwrite::AppwriteClient;
use cinefind_api::store::{NewSearchCount, SearchCountDocument, SearchCountStore};
use cinefind_db::SqliteSearchStore;

use crate::config::{ResolvedAppwrite, ResolvedStore};

/// Either the remote collection or the local database.
#[derive(Debug)]
pub enum Backend {
    /// Appwrite collection.
    Appwrite(AppwriteClient),
    /// SQLite database under the data directory.
    Sqlite(SqliteSearchStore),
}

impl Backend {
    /// Opens the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built or the database cannot be opened.
    pub fn open(store: &ResolvedStore, dir: Option<&PathBuf>, user_agent: &str) -> Result<Self> {
        match store {
            ResolvedStore::Appwrite(settings) => {
                build_appwrite_client(settings, user_agent).map(Self::Appwrite)
            }
            ResolvedStore::Sqlite => SqliteSearchStore::open(dir)
                .context("failed to open search-count database")
                .map(Self::Sqlite),
        }
    }
}

fn build_appwrite_client(settings: &ResolvedAppwrite, user_agent: &str) -> Result<AppwriteClient> {
    AppwriteClient::builder()
        .endpoint(settings.endpoint.clone())
        .project_id(&settings.project_id)
        .database_id(&settings.database_id)
        .collection_id(&settings.collection_id)
        .api_key(&settings.api_key)
        .user_agent(user_agent)
        .build()
        .context("failed to build Appwrite client")
}

impl SearchCountStore for Backend {
    async fn find_by_term(&self, term: &str) -> FetchResult<Option<SearchCountDocument>> {
        match self {
            Self::Appwrite(client) => client.find_by_term(term).await,
            Self::Sqlite(store) => store.find_by_term(term).await,
        }
    }

    async fn create(&self, document: &NewSearchCount) -> FetchResult<SearchCountDocument> {
        match self {
            Self::Appwrite(client) => client.create(document).await,
            Self::Sqlite(store) => store.create(document).await,
        }
    }

    async fn update_count(
        &self,
        document_id: &str,
        count: u32,
    ) -> FetchResult<SearchCountDocument> {
        match self {
            Self::Appwrite(client) => client.update_count(document_id, count).await,
            Self::Sqlite(store) => store.update_count(document_id, count).await,
        }
    }

    async fn top_by_count(&self, limit: u32) -> FetchResult<Vec<SearchCountDocument>> {
        match self {
            Self::Appwrite(client) => client.top_by_count(limit).await,
            Self::Sqlite(store) => store.top_by_count(limit).await,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use url::Url;

    use super::*;

    #[tokio::test]
    async fn test_sqlite_backend_round_trips_counts() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_path_buf();
        let backend = Backend::open(&ResolvedStore::Sqlite, Some(&path), "cinefind-test").unwrap();
        let document = NewSearchCount {
            search_term: String::from("dune"),
            count: 1,
            movie_id: 438_631,
            poster_url: None,
            title: String::from("Dune"),
        };

        // Act
        let created = backend.create(&document).await.unwrap();
        backend.update_count(&created.id, 2).await.unwrap();
        let found = backend.find_by_term("dune").await.unwrap();

        // Assert
        assert!(matches!(backend, Backend::Sqlite(_)));
        assert_eq!(found.map(|d| d.count), Some(2));
        assert!(dir.path().join("cinefind.db").exists());
    }

    #[test]
    fn test_appwrite_backend_builds_client() {
        // Arrange
        let settings = ResolvedAppwrite {
            endpoint: Url::parse("https://cloud.appwrite.io/v1").unwrap(),
            project_id: String::from("proj-1"),
            database_id: String::from("movies-db"),
            collection_id: String::from("metrics"),
            api_key: String::from("secret-key"),
        };

        // Act
        let backend =
            Backend::open(&ResolvedStore::Appwrite(settings), None, "cinefind-test").unwrap();

        // Assert
        assert!(matches!(backend, Backend::Appwrite(_)));
    }
}
