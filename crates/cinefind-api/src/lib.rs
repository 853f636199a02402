//! API client library for cinefind.
//!
//! Provides clients for the TMDB metadata API and the Appwrite document
//! store, plus the store abstraction used to track search popularity.

/// Appwrite document store client.
pub mod appwrite;
mod error;
mod rate_limiter;
/// Search-count document store abstraction.
pub mod store;

/// TMDB API client.
pub mod tmdb;

pub use error::{FetchError, FetchResult};
