//! Appwrite document store client module.
//!
//! Talks to the Appwrite REST API (`/databases/{db}/collections/{col}/documents`)
//! and implements [`crate::store::SearchCountStore`] on top of it.

mod client;
mod query;
mod types;

#[allow(clippy::module_name_repetitions)]
pub use client::{AppwriteClient, AppwriteClientBuilder};
pub use query::Query;
