//! Minimum-interval request pacing shared by the HTTP clients.

use std::time::{Duration, Instant};

/// Enforces a minimum gap between consecutive requests of one client.
///
/// TMDB tolerates roughly 40 requests per second; Appwrite has its own
/// per-project limits. Each client owns one limiter behind a
/// `tokio::sync::Mutex` so concurrent callers queue up instead of bursting.
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum interval between requests.
    min_interval: Duration,
    /// When the previous request was released.
    last_request: Option<Instant>,
}

impl RateLimiter {
    /// Creates a limiter with the given minimum interval.
    pub(crate) const fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: None,
        }
    }

    /// Configured minimum interval.
    #[cfg(test)]
    pub(crate) const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Sleeps until the next request is allowed, then records the release time.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval.saturating_sub(elapsed)).await;
            }
        }

        self.last_request = Some(Instant::now());
    }
}
