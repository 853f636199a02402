//! Client-side state for cinefind.
//!
//! - [`fetch`]: generation-fenced async fetch state container
//! - [`tracker`]: search popularity recording and trending lookup
//! - [`search`]: debounced search controller
//! - [`view`]: display records shaped from API data

pub mod fetch;
pub mod search;
pub mod tracker;
pub mod view;

#[cfg(test)]
mod testing;
