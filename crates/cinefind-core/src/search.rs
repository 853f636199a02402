//! Debounced search controller.
//!
//! Keystrokes restart a debounce timer. When the timer survives its full
//! delay, the current query is searched through a [`FetchContainer`] and,
//! if any movie came back, the term is recorded with the popularity tracker.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use cinefind_api::store::SearchCountStore;
use cinefind_api::tmdb::{Movie, MovieApi, MovieListParams};
use tokio::task::JoinHandle;

use crate::fetch::{Completion, FetchContainer, FetchState};
use crate::tracker::PopularityTracker;

/// Default delay between the last keystroke and the search.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Lifecycle phase of the search screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchPhase {
    /// Empty query, nothing shown.
    #[default]
    Idle,
    /// Waiting for typing to pause.
    PendingDebounce,
    /// Search request in flight.
    Loading,
    /// Results available.
    Loaded,
    /// Last search failed.
    Errored,
}

/// State shared with timer and search tasks.
#[derive(Debug)]
struct Shared<S> {
    tracker: Arc<PopularityTracker<S>>,
    results: FetchContainer<Vec<Movie>>,
    query: Arc<Mutex<String>>,
    phase: Mutex<SearchPhase>,
    /// Bumped on every keystroke; a timer only fires if it still matches.
    debounce_generation: AtomicU64,
}

impl<S> Shared<S> {
    fn is_current(&self, generation: u64) -> bool {
        self.debounce_generation.load(Ordering::SeqCst) == generation
    }

    fn set_phase(&self, phase: SearchPhase) {
        *lock(&self.phase) = phase;
    }
}

impl<S> Shared<S>
where
    S: SearchCountStore + Send + Sync + 'static,
{
    async fn run_search(self: Arc<Self>, generation: u64) {
        if !self.is_current(generation) {
            return;
        }
        let query = lock(&self.query).clone();
        self.set_phase(SearchPhase::Loading);
        tracing::debug!(query = %query, "debounced search fired");

        match self.results.refetch().await {
            Completion::Succeeded(movies) => {
                if self.is_current(generation) {
                    self.set_phase(SearchPhase::Loaded);
                }
                if let Some(top) = movies.into_iter().next() {
                    let tracker = Arc::clone(&self.tracker);
                    drop(tokio::spawn(async move {
                        tracker.record_search(&query, &top).await;
                    }));
                }
            }
            Completion::Failed(err) => {
                tracing::warn!(query = %query, error = %err, "search failed");
                if self.is_current(generation) {
                    self.set_phase(SearchPhase::Errored);
                }
            }
            Completion::Stale => {}
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Debounces query changes into movie searches.
///
/// Must be driven from within a tokio runtime. Dropping the controller
/// cancels a pending debounce; a search already in flight still completes.
#[derive(Debug)]
pub struct SearchController<S> {
    shared: Arc<Shared<S>>,
    debounce: Duration,
    timer: Option<JoinHandle<()>>,
}

impl<S> SearchController<S>
where
    S: SearchCountStore + Send + Sync + 'static,
{
    /// Creates a controller searching through `api` and recording with `tracker`.
    pub fn new<A>(api: Arc<A>, tracker: Arc<PopularityTracker<S>>, debounce: Duration) -> Self
    where
        A: MovieApi + Send + Sync + 'static,
    {
        let query = Arc::new(Mutex::new(String::new()));
        let op_query = Arc::clone(&query);
        let results = FetchContainer::new(
            move || {
                let api = Arc::clone(&api);
                let params = MovieListParams::new(lock(&op_query).clone());
                async move {
                    api.search_or_list_movies(&params)
                        .await
                        .map(|response| response.results)
                }
            },
            false,
        );

        Self {
            shared: Arc::new(Shared {
                tracker,
                results,
                query,
                phase: Mutex::new(SearchPhase::Idle),
                debounce_generation: AtomicU64::new(0),
            }),
            debounce,
            timer: None,
        }
    }

    /// Handles an edit of the query text.
    ///
    /// Cancels any pending timer. A blank query clears the results and
    /// returns to [`SearchPhase::Idle`]; anything else schedules a search
    /// after the debounce delay.
    pub fn on_query_changed(&mut self, query: impl Into<String>) {
        let query = query.into();
        self.cancel_timer();
        let generation = self
            .shared
            .debounce_generation
            .fetch_add(1, Ordering::SeqCst)
            .wrapping_add(1);
        let blank = query.trim().is_empty();
        *lock(&self.shared.query) = query;

        if blank {
            self.shared.set_phase(SearchPhase::Idle);
            self.shared.results.reset();
            return;
        }

        self.shared.set_phase(SearchPhase::PendingDebounce);
        let shared = Arc::clone(&self.shared);
        let delay = self.debounce;
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !shared.is_current(generation) {
                return;
            }
            // Detached so a later keystroke cannot abort the request itself.
            drop(tokio::spawn(shared.run_search(generation)));
        }));
    }

    /// Current query text.
    #[must_use]
    pub fn query(&self) -> String {
        lock(&self.shared.query).clone()
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> SearchPhase {
        *lock(&self.shared.phase)
    }

    /// Current results state.
    #[must_use]
    pub fn results(&self) -> FetchState<Vec<Movie>> {
        self.shared.results.snapshot()
    }

    /// Popularity tracker used for recording.
    #[must_use]
    pub fn tracker(&self) -> &PopularityTracker<S> {
        &self.shared.tracker
    }

    /// Cancels the pending debounce timer, if any.
    pub fn shutdown(&mut self) {
        self.cancel_timer();
    }
}

impl<S> SearchController<S> {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl<S> Drop for SearchController<S> {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}
