//! Test doubles for the movie API and the search-count store.
#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use cinefind_api::store::{NewSearchCount, SearchCountDocument, SearchCountStore};
use cinefind_api::tmdb::{Movie, MovieApi, MovieDetails, MovieListParams, MovieListResponse};
use cinefind_api::{FetchError, FetchResult};

/// Parsed `search/movie?query=batman` fixture (first result: id 268, "Batman").
pub fn batman_results() -> MovieListResponse {
    serde_json::from_str(include_str!(
        "../../../fixtures/tmdb/search_movie_batman.json"
    ))
    .unwrap()
}

/// Parsed popular listing fixture.
pub fn popular_results() -> MovieListResponse {
    serde_json::from_str(include_str!(
        "../../../fixtures/tmdb/discover_movie_popular.json"
    ))
    .unwrap()
}

/// Parsed `movie/438631` fixture.
pub fn dune_details() -> MovieDetails {
    serde_json::from_str(include_str!(
        "../../../fixtures/tmdb/movie_details_438631.json"
    ))
    .unwrap()
}

/// Movie with the given ID and title and no other data.
pub fn movie(id: u64, title: &str) -> Movie {
    serde_json::from_value(serde_json::json!({ "id": id, "title": title })).unwrap()
}

/// Scripted [`MovieApi`] counting calls and recording queries.
#[derive(Debug, Default)]
pub struct MockMovieApi {
    pub calls: AtomicU32,
    pub queries: Mutex<Vec<String>>,
    /// Response per query; unmatched queries get an empty page.
    pub responses: HashMap<String, MovieListResponse>,
    /// Per-query artificial latency.
    pub delays: HashMap<String, Duration>,
    /// When set, every search fails with this error.
    pub failure: Option<FetchError>,
}

impl MockMovieApi {
    pub fn with_response(mut self, query: &str, response: MovieListResponse) -> Self {
        self.responses.insert(String::from(query), response);
        self
    }

    pub fn with_delay(mut self, query: &str, delay: Duration) -> Self {
        self.delays.insert(String::from(query), delay);
        self
    }

    pub fn failing(mut self, err: FetchError) -> Self {
        self.failure = Some(err);
        self
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn recorded_queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl MovieApi for MockMovieApi {
    async fn search_or_list_movies(
        &self,
        params: &MovieListParams,
    ) -> FetchResult<MovieListResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(params.query.clone());
        if let Some(delay) = self.delays.get(&params.query) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(self
            .responses
            .get(&params.query)
            .cloned()
            .unwrap_or(MovieListResponse {
                page: 1,
                results: Vec::new(),
                total_pages: 0,
                total_results: 0,
            }))
    }

    async fn movie_details(&self, movie_id: u64) -> FetchResult<MovieDetails> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let details = dune_details();
        if details.id == movie_id {
            Ok(details)
        } else {
            Err(FetchError::Api {
                status: 404,
                message: String::from("The resource you requested could not be found. (code 34)"),
            })
        }
    }
}

/// In-memory [`SearchCountStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub documents: Mutex<Vec<SearchCountDocument>>,
    next_id: AtomicU32,
    /// When set, every operation fails.
    pub fail: AtomicBool,
}

impl MemoryStore {
    pub fn with_documents(documents: Vec<SearchCountDocument>) -> Self {
        Self {
            documents: Mutex::new(documents),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        let store = Self::default();
        store.fail.store(true, Ordering::SeqCst);
        store
    }

    pub fn all(&self) -> Vec<SearchCountDocument> {
        self.documents.lock().unwrap().clone()
    }

    fn check(&self) -> FetchResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            Err(FetchError::Store(String::from("HTTP 503: service unavailable")))
        } else {
            Ok(())
        }
    }
}

impl SearchCountStore for MemoryStore {
    async fn find_by_term(&self, term: &str) -> FetchResult<Option<SearchCountDocument>> {
        self.check()?;
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.search_term == term)
            .cloned())
    }

    async fn create(&self, document: &NewSearchCount) -> FetchResult<SearchCountDocument> {
        self.check()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let created = SearchCountDocument {
            id: format!("doc-{id}"),
            search_term: document.search_term.clone(),
            count: document.count,
            movie_id: document.movie_id,
            poster_url: document.poster_url.clone(),
            title: document.title.clone(),
        };
        self.documents.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update_count(
        &self,
        document_id: &str,
        count: u32,
    ) -> FetchResult<SearchCountDocument> {
        self.check()?;
        let mut documents = self.documents.lock().unwrap();
        let doc = documents
            .iter_mut()
            .find(|d| d.id == document_id)
            .ok_or_else(|| FetchError::Store(format!("document not found: {document_id}")))?;
        doc.count = count;
        Ok(doc.clone())
    }

    async fn top_by_count(&self, limit: u32) -> FetchResult<Vec<SearchCountDocument>> {
        self.check()?;
        let mut documents = self.all();
        documents.sort_by(|a, b| b.count.cmp(&a.count));
        documents.truncate(usize::try_from(limit).unwrap());
        Ok(documents)
    }
}
