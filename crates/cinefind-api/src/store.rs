//! Search-count document store abstraction.
//!
//! One document per distinct search term, holding a cumulative count and the
//! denormalized top result (id, poster URL, title) of the first search that
//! created it. Implemented by the Appwrite client and the local SQLite cache.
#![allow(clippy::future_not_send)]

use serde::{Deserialize, Serialize};

use crate::error::FetchResult;
use crate::tmdb::Movie;

/// A stored search-count document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCountDocument {
    /// Store-assigned document ID.
    #[serde(rename = "$id")]
    pub id: String,
    /// Exact search term used as the lookup key.
    #[serde(rename = "searchTerm")]
    pub search_term: String,
    /// Number of successful searches recorded for this term (>= 1).
    pub count: u32,
    /// TMDB ID of the top result when the document was created.
    pub movie_id: u64,
    /// Poster URL of that movie.
    #[serde(default)]
    pub poster_url: Option<String>,
    /// Title of that movie.
    pub title: String,
}

/// Field set for creating a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSearchCount {
    /// Exact search term.
    #[serde(rename = "searchTerm")]
    pub search_term: String,
    /// Initial count.
    pub count: u32,
    /// TMDB movie ID.
    pub movie_id: u64,
    /// Poster URL.
    pub poster_url: Option<String>,
    /// Movie title.
    pub title: String,
}

impl NewSearchCount {
    /// First-search document for `term` with `count = 1`, denormalizing `movie`.
    #[must_use]
    pub fn first_search(term: impl Into<String>, movie: &Movie) -> Self {
        Self {
            search_term: term.into(),
            count: 1,
            movie_id: movie.id,
            poster_url: movie.poster_url(),
            title: movie.title.clone(),
        }
    }
}

/// Search-count store trait.
///
/// Uses `trait_variant::make` to generate a `Send`-bound async trait;
/// backends implement `SearchCountStore`.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(SearchCountStore: Send)]
pub trait LocalSearchCountStore {
    /// Finds the document whose term equals `term` exactly.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FetchError::Store`] if the backend query fails.
    async fn find_by_term(&self, term: &str) -> FetchResult<Option<SearchCountDocument>>;

    /// Creates a new document.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FetchError::Store`] if the backend write fails.
    async fn create(&self, document: &NewSearchCount) -> FetchResult<SearchCountDocument>;

    /// Sets the count of an existing document, leaving other fields untouched.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FetchError::Store`] if the backend write fails
    /// or the document does not exist.
    async fn update_count(
        &self,
        document_id: &str,
        count: u32,
    ) -> FetchResult<SearchCountDocument>;

    /// Returns up to `limit` documents ordered by `count` descending.
    ///
    /// Order among equal counts is whatever the backend returns.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FetchError::Store`] if the backend query fails.
    async fn top_by_count(&self, limit: u32) -> FetchResult<Vec<SearchCountDocument>>;
}
