//! Search popularity tracking.
//!
//! Each successful search that returned at least one movie bumps a counter
//! document keyed by the search term. Recording is fire-and-forget: store
//! failures are logged and never reach the caller.

use cinefind_api::FetchResult;
use cinefind_api::store::{NewSearchCount, SearchCountDocument, SearchCountStore};
use cinefind_api::tmdb::Movie;

/// Outcome of [`PopularityTracker::record_search`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// First search for the term; a document with `count = 1` was created.
    Created,
    /// Existing document incremented to `count`.
    Incremented {
        /// Count after the increment.
        count: u32,
    },
    /// Blank term; nothing was recorded.
    Skipped,
    /// The store failed; the failure was logged.
    Failed,
}

/// Records searches and ranks terms by how often they were searched.
#[derive(Debug)]
pub struct PopularityTracker<S> {
    store: S,
}

impl<S: SearchCountStore> PopularityTracker<S> {
    /// Creates a tracker over `store`.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Records one search for `term` whose top result was `top_movie`.
    ///
    /// The term is trimmed (case is kept). An existing document has only its
    /// count incremented; otherwise a new one is created from `top_movie`.
    /// Lookup and write are separate calls, so two concurrent first searches
    /// for the same term may both create.
    pub async fn record_search(&self, term: &str, top_movie: &Movie) -> RecordOutcome {
        let term = term.trim();
        if term.is_empty() {
            return RecordOutcome::Skipped;
        }

        match self.upsert(term, top_movie).await {
            Ok(outcome) => {
                tracing::debug!(term, ?outcome, "recorded search");
                outcome
            }
            Err(err) => {
                tracing::warn!(term, error = %err, "failed to record search");
                RecordOutcome::Failed
            }
        }
    }

    async fn upsert(&self, term: &str, top_movie: &Movie) -> FetchResult<RecordOutcome> {
        if let Some(existing) = self.store.find_by_term(term).await? {
            let updated = self
                .store
                .update_count(&existing.id, existing.count.saturating_add(1))
                .await?;
            return Ok(RecordOutcome::Incremented {
                count: updated.count,
            });
        }

        self.store
            .create(&NewSearchCount::first_search(term, top_movie))
            .await?;
        Ok(RecordOutcome::Created)
    }

    /// Returns up to `limit` documents, most searched first.
    ///
    /// Documents with equal counts come back in whatever order the store
    /// returns them.
    ///
    /// # Errors
    ///
    /// Returns [`cinefind_api::FetchError::Store`] if the store query fails.
    pub async fn get_trending(&self, limit: u32) -> FetchResult<Vec<SearchCountDocument>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut documents = self.store.top_by_count(limit).await?;
        documents.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use tracing_mock::{expect, subscriber};

    use super::*;
    use crate::testing::{MemoryStore, movie};

    fn doc(id: &str, term: &str, count: u32) -> SearchCountDocument {
        SearchCountDocument {
            id: String::from(id),
            search_term: String::from(term),
            count,
            movie_id: 1,
            poster_url: None,
            title: String::from(term),
        }
    }

    #[tokio::test]
    async fn test_new_term_creates_document_from_top_movie() {
        // Arrange
        let tracker = PopularityTracker::new(MemoryStore::default());
        let mut dune = movie(438_631, "Dune");
        dune.poster_path = Some(String::from("/d5NXSklXo0qyIYkgV94XAgMIckC.jpg"));

        // Act
        let outcome = tracker.record_search("dune", &dune).await;

        // Assert
        assert_eq!(outcome, RecordOutcome::Created);
        let docs = tracker.store().all();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].search_term, "dune");
        assert_eq!(docs[0].count, 1);
        assert_eq!(docs[0].movie_id, 438_631);
        assert_eq!(docs[0].title, "Dune");
        assert_eq!(
            docs[0].poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/d5NXSklXo0qyIYkgV94XAgMIckC.jpg")
        );
    }

    #[tokio::test]
    async fn test_repeat_term_increments_single_document() {
        // Arrange
        let tracker = PopularityTracker::new(MemoryStore::default());
        let dune = movie(438_631, "Dune");

        // Act
        let first = tracker.record_search("dune", &dune).await;
        let second = tracker.record_search("dune", &dune).await;

        // Assert
        assert_eq!(first, RecordOutcome::Created);
        assert_eq!(second, RecordOutcome::Incremented { count: 2 });
        let docs = tracker.store().all();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].count, 2);
    }

    #[tokio::test]
    async fn test_increment_keeps_original_movie() {
        // Arrange
        let tracker = PopularityTracker::new(MemoryStore::default());
        tracker.record_search("batman", &movie(268, "Batman")).await;

        // Act
        tracker
            .record_search("batman", &movie(414_906, "The Batman"))
            .await;

        // Assert
        let docs = tracker.store().all();
        assert_eq!(docs[0].movie_id, 268);
        assert_eq!(docs[0].title, "Batman");
    }

    #[tokio::test]
    async fn test_term_is_trimmed_but_case_preserved() {
        // Arrange
        let tracker = PopularityTracker::new(MemoryStore::default());
        let dune = movie(438_631, "Dune");

        // Act
        tracker.record_search("  dune ", &dune).await;
        tracker.record_search("dune", &dune).await;
        tracker.record_search("Dune", &dune).await;

        // Assert
        let mut docs = tracker.store().all();
        docs.sort_by(|a, b| a.search_term.cmp(&b.search_term));
        assert_eq!(docs.len(), 2);
        assert_eq!((docs[0].search_term.as_str(), docs[0].count), ("Dune", 1));
        assert_eq!((docs[1].search_term.as_str(), docs[1].count), ("dune", 2));
    }

    #[tokio::test]
    async fn test_blank_term_is_skipped() {
        // Arrange
        let tracker = PopularityTracker::new(MemoryStore::default());

        // Act
        let outcome = tracker.record_search("   ", &movie(1, "x")).await;

        // Assert
        assert_eq!(outcome, RecordOutcome::Skipped);
        assert!(tracker.store().all().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_logged_and_swallowed() {
        // Arrange
        let tracker = PopularityTracker::new(MemoryStore::failing());
        let (subscriber, handle) = subscriber::mock()
            .event(
                expect::event()
                    .at_level(tracing::Level::WARN)
                    .with_fields(expect::msg("failed to record search")),
            )
            .run_with_handle();
        let _guard = tracing::subscriber::set_default(subscriber);

        // Act
        let outcome = tracker.record_search("dune", &movie(1, "Dune")).await;

        // Assert
        assert_eq!(outcome, RecordOutcome::Failed);
        handle.assert_finished();
    }

    #[tokio::test]
    async fn test_get_trending_orders_by_count_and_limits() {
        // Arrange
        let store = MemoryStore::with_documents(vec![
            doc("1", "alien", 1),
            doc("2", "batman", 12),
            doc("3", "dune", 3),
            doc("4", "heat", 5),
            doc("5", "jaws", 2),
            doc("6", "up", 7),
        ]);
        let tracker = PopularityTracker::new(store);

        // Act
        let trending = tracker.get_trending(5).await.unwrap();

        // Assert
        assert_eq!(trending.len(), 5);
        assert!(trending.windows(2).all(|w| w[0].count >= w[1].count));
        assert_eq!(trending[0].search_term, "batman");
    }

    #[tokio::test]
    async fn test_get_trending_zero_limit_is_empty() {
        // Arrange
        let tracker = PopularityTracker::new(MemoryStore::with_documents(vec![doc("1", "a", 1)]));

        // Act
        let trending = tracker.get_trending(0).await.unwrap();

        // Assert
        assert!(trending.is_empty());
    }

    #[tokio::test]
    async fn test_get_trending_propagates_store_error() {
        // Arrange
        let tracker = PopularityTracker::new(MemoryStore::failing());

        // Act
        let err = tracker.get_trending(5).await.unwrap_err();

        // Assert
        assert!(matches!(err, cinefind_api::FetchError::Store(_)));
    }
}
