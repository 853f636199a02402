//! Async fetch state container.
//!
//! [`FetchContainer`] owns the `{data, loading, error}` lifecycle of one
//! repeatable asynchronous operation. Every [`FetchContainer::refetch`] and
//! [`FetchContainer::reset`] advances a request generation; under the default
//! [`StalePolicy::Discard`] a completion from an older generation is dropped
//! instead of overwriting newer state.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cinefind_api::{FetchError, FetchResult};
use futures::FutureExt;
use futures::future::BoxFuture;

/// Type-erased, repeatable fetch operation.
pub type Operation<T> = Arc<dyn Fn() -> BoxFuture<'static, FetchResult<T>> + Send + Sync>;

/// Observable state of a fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    /// Last successful result. Kept across failed refetches.
    pub data: Option<T>,
    /// `true` while a request is in flight.
    pub loading: bool,
    /// Failure of the most recent completed request.
    pub error: Option<FetchError>,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

/// What to do with a completion whose request generation is no longer current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StalePolicy {
    /// Drop it. The newer request (or the reset) owns the state.
    #[default]
    Discard,
    /// Apply it anyway; late completions overwrite whatever is there.
    Apply,
}

/// Result of one [`FetchContainer::refetch`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion<T> {
    /// The operation succeeded and its data was stored.
    Succeeded(T),
    /// The operation failed and its error was stored.
    Failed(FetchError),
    /// The request was superseded and its outcome was dropped.
    Stale,
}

struct Inner<T> {
    state: FetchState<T>,
    generation: u64,
}

/// Holder for the lifecycle of one asynchronous request.
pub struct FetchContainer<T> {
    operation: Operation<T>,
    policy: StalePolicy,
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T> Clone for FetchContainer<T> {
    fn clone(&self) -> Self {
        Self {
            operation: Arc::clone(&self.operation),
            policy: self.policy,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for FetchContainer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("FetchContainer")
            .field("policy", &self.policy)
            .field("generation", &inner.generation)
            .field("state", &inner.state)
            .finish_non_exhaustive()
    }
}

impl<T> FetchContainer<T>
where
    T: Clone + Send + 'static,
{
    /// Creates a container with [`StalePolicy::Discard`].
    ///
    /// With `auto_run`, the first [`refetch`](Self::refetch) is spawned on the
    /// current tokio runtime and `loading` is already `true` on return.
    #[must_use]
    pub fn new<F, Fut>(operation: F, auto_run: bool) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = FetchResult<T>> + Send + 'static,
    {
        Self::with_policy(operation, StalePolicy::default(), auto_run)
    }

    /// Creates a container with an explicit stale-completion policy.
    #[must_use]
    pub fn with_policy<F, Fut>(operation: F, policy: StalePolicy, auto_run: bool) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = FetchResult<T>> + Send + 'static,
    {
        let container = Self {
            operation: Arc::new(move || operation().boxed()),
            policy,
            inner: Arc::new(Mutex::new(Inner {
                state: FetchState::default(),
                generation: 0,
            })),
        };
        if auto_run {
            container.spawn_refetch();
        }
        container
    }

    /// Starts a refetch in the background.
    ///
    /// `loading` is set before this returns. Outside a tokio runtime the
    /// request is abandoned and logged.
    pub fn spawn_refetch(&self) {
        let generation = self.begin();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let this = self.clone();
                drop(handle.spawn(async move {
                    let result = (this.operation)().await;
                    this.complete(generation, result);
                }));
            }
            Err(err) => {
                tracing::warn!(error = %err, "no tokio runtime; fetch not started");
                self.complete(
                    generation,
                    Err(FetchError::Network(String::from("no async runtime available"))),
                );
            }
        }
    }

    /// Runs the operation and records its outcome.
    ///
    /// Sets `loading` and clears `error` first. On success stores the data;
    /// on failure stores the error and keeps any previous data. `loading` is
    /// cleared when the request completes, unless it was superseded under
    /// [`StalePolicy::Discard`].
    pub async fn refetch(&self) -> Completion<T> {
        let generation = self.begin();
        let result = (self.operation)().await;
        self.complete(generation, result)
    }

    /// Clears data and error and sets `loading = false`.
    ///
    /// An in-flight request keeps running; its completion is stale.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.generation = inner.generation.wrapping_add(1);
        inner.state = FetchState::default();
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> FetchState<T> {
        self.lock().state.clone()
    }

    /// Returns the stale-completion policy.
    #[must_use]
    pub const fn policy(&self) -> StalePolicy {
        self.policy
    }

    fn begin(&self) -> u64 {
        let mut inner = self.lock();
        inner.generation = inner.generation.wrapping_add(1);
        inner.state.loading = true;
        inner.state.error = None;
        inner.generation
    }

    fn complete(&self, generation: u64, result: FetchResult<T>) -> Completion<T> {
        let mut inner = self.lock();
        if generation != inner.generation {
            match self.policy {
                StalePolicy::Discard => {
                    tracing::debug!(
                        generation,
                        current = inner.generation,
                        "discarding stale fetch completion"
                    );
                    return Completion::Stale;
                }
                StalePolicy::Apply => {
                    tracing::debug!(
                        generation,
                        current = inner.generation,
                        "applying stale fetch completion"
                    );
                }
            }
        }

        inner.state.loading = false;
        match result {
            Ok(data) => {
                inner.state.data = Some(data.clone());
                inner.state.error = None;
                Completion::Succeeded(data)
            }
            Err(err) => {
                inner.state.error = Some(err.clone());
                Completion::Failed(err)
            }
        }
    }
}

impl<T> FetchContainer<T> {
    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
