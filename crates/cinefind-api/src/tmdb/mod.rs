//! TMDB API client module.
//!
//! Handles HTTP requests to the TMDB API v3 movie endpoints
//! (`discover/movie`, `search/movie`, `movie/{id}`).

mod api;
mod client;
mod types;

#[allow(clippy::module_name_repetitions)]
pub use api::{LocalMovieApi, MovieApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{TmdbClient, TmdbClientBuilder};
pub use types::{
    CastMember, Credits, CrewMember, Genre, Movie, MovieDetails, MovieListParams,
    MovieListResponse, POSTER_BASE_URL, ProductionCompany, SpokenLanguage, Video, VideoList,
    poster_url,
};
