//! `MovieApi` trait definition.
#![allow(clippy::future_not_send)]

use super::types::{MovieDetails, MovieListParams, MovieListResponse};
use crate::error::FetchResult;

/// TMDB movie API trait.
///
/// Abstracts API operations for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait;
/// implement `MovieApi` to get `LocalMovieApi` for free.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(MovieApi: Send)]
pub trait LocalMovieApi {
    /// Lists popular movies (empty query) or searches by title.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FetchError::Network`] on transport failure,
    /// [`crate::FetchError::Api`] on a non-2xx response, and
    /// [`crate::FetchError::Decode`] when the body is not a movie listing.
    async fn search_or_list_movies(
        &self,
        params: &MovieListParams,
    ) -> FetchResult<MovieListResponse>;

    /// Fetches one movie's full details with configured sub-resources inlined.
    ///
    /// # Errors
    ///
    /// Same failure taxonomy as [`LocalMovieApi::search_or_list_movies`].
    async fn movie_details(&self, movie_id: u64) -> FetchResult<MovieDetails>;
}
