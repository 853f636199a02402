//! `TmdbClient` - TMDB API client implementation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::{Client, StatusCode};
use tokio::sync::Mutex;
use tracing::instrument;
use url::Url;

use super::api::MovieApi;
use super::types::{MovieDetails, MovieListParams, MovieListResponse, TmdbErrorResponse};
use crate::error::{FetchError, FetchResult};
use crate::rate_limiter::RateLimiter;

/// Default base URL for TMDB API v3.
const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3/";

/// Default response language.
const DEFAULT_LANGUAGE: &str = "en-US";

/// Sub-resources inlined into `movie/{id}` unless overridden.
const DEFAULT_APPEND_TO_RESPONSE: &str = "credits,videos";

/// Default minimum interval between requests (~40 req/s).
const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(25);

/// Maximum number of retries for HTTP 429 responses.
const MAX_RETRIES: u32 = 3;

/// Backoff step between retries (multiplied by the retry number).
const RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// TMDB API client.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClient {
    /// HTTP client.
    http_client: Client,
    /// Base URL for API requests.
    base_url: Url,
    /// Bearer API token.
    api_token: String,
    /// Response language.
    language: String,
    /// `append_to_response` value for detail requests (empty disables it).
    append_to_response: String,
    /// Rate limiter.
    rate_limiter: Arc<Mutex<RateLimiter>>,
}

/// Builder for `TmdbClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClientBuilder {
    base_url: Option<Url>,
    api_token: Option<String>,
    user_agent: Option<String>,
    language: Option<String>,
    append_to_response: Option<String>,
    min_interval: Option<Duration>,
}

impl TmdbClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            api_token: None,
            user_agent: None,
            language: None,
            append_to_response: None,
            min_interval: None,
        }
    }

    /// Overrides the base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the API bearer token (required).
    #[must_use]
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the response language (default: "en-US").
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Sets the sub-resources inlined into detail responses
    /// (default: "credits,videos"; empty string disables).
    #[must_use]
    pub fn append_to_response(mut self, append: impl Into<String>) -> Self {
        self.append_to_response = Some(append.into());
        self
    }

    /// Sets the minimum request interval (default: 25ms).
    #[must_use]
    pub const fn min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = Some(interval);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `api_token` is not set or blank.
    /// - `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<TmdbClient> {
        let api_token = self.api_token.context("api_token is required")?;
        if api_token.trim().is_empty() {
            bail!("api_token is required");
        }
        let user_agent = self.user_agent.context("user_agent is required")?;

        let base_url = if let Some(url) = self.base_url {
            with_trailing_slash(url)
        } else {
            Url::parse(DEFAULT_BASE_URL).context("invalid default base URL")?
        };

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .build()
            .context("failed to build HTTP client")?;

        Ok(TmdbClient {
            http_client,
            base_url,
            api_token,
            language: self
                .language
                .unwrap_or_else(|| String::from(DEFAULT_LANGUAGE)),
            append_to_response: self
                .append_to_response
                .unwrap_or_else(|| String::from(DEFAULT_APPEND_TO_RESPONSE)),
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(
                self.min_interval.unwrap_or(DEFAULT_MIN_INTERVAL),
            ))),
        })
    }
}

impl TmdbClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> TmdbClientBuilder {
        TmdbClientBuilder::new()
    }

    /// Sends a GET request with Bearer auth, query params, and rate limiting.
    /// Retries up to `MAX_RETRIES` times on HTTP 429.
    #[instrument(skip_all, fields(path = path))]
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> FetchResult<T> {
        self.rate_limiter.lock().await.wait().await;

        let url = self
            .base_url
            .join(path)
            .map_err(|e| FetchError::Network(format!("invalid request URL {path}: {e}")))?;

        let mut retries = 0u32;
        loop {
            let request = self
                .http_client
                .get(url.clone())
                .bearer_auth(&self.api_token)
                .query(query)
                .build()
                .map_err(|e| FetchError::network(&format!("failed to build request {path}"), &e))?;

            tracing::debug!(url = %request.url(), "TMDB API request");

            let response = self
                .http_client
                .execute(request)
                .await
                .map_err(|e| FetchError::network(&format!("request failed {path}"), &e))?;

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                retries = retries.saturating_add(1);
                if retries > MAX_RETRIES {
                    return Err(FetchError::Api {
                        status: status.as_u16(),
                        message: format!("rate limit exceeded after {MAX_RETRIES} retries"),
                    });
                }
                tracing::warn!(
                    retry = retries,
                    max_retries = MAX_RETRIES,
                    "TMDB API rate limited (429). Retrying..."
                );
                tokio::time::sleep(RETRY_BACKOFF.saturating_mul(retries)).await;
                self.rate_limiter.lock().await.wait().await;
                continue;
            }

            let body = response
                .text()
                .await
                .map_err(|e| FetchError::network(&format!("failed to read body {path}"), &e))?;

            if !status.is_success() {
                return Err(api_error(status, &body));
            }

            return serde_json::from_str(&body)
                .map_err(|e| FetchError::Decode(format!("{path}: {e}")));
        }
    }
}

/// Ensures relative joins append to the base path instead of replacing its last segment.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Maps a non-success response to [`FetchError::Api`], preferring TMDB's error document.
fn api_error(status: StatusCode, body: &str) -> FetchError {
    let message = serde_json::from_str::<TmdbErrorResponse>(body).map_or_else(
        |_| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                String::from(status.canonical_reason().unwrap_or("unknown error"))
            } else {
                String::from(trimmed)
            }
        },
        |err| format!("{} (code {})", err.status_message, err.status_code),
    );
    tracing::debug!(status = status.as_u16(), %message, "TMDB API error response");
    FetchError::Api {
        status: status.as_u16(),
        message,
    }
}

impl MovieApi for TmdbClient {
    #[instrument(skip_all, fields(query = %params.query, page = params.page))]
    async fn search_or_list_movies(
        &self,
        params: &MovieListParams,
    ) -> FetchResult<MovieListResponse> {
        let mut query: Vec<(&str, String)> = vec![
            ("language", self.language.clone()),
            ("page", params.page.to_string()),
            ("include_adult", params.include_adult.to_string()),
        ];

        if params.is_listing() {
            query.push(("sort_by", String::from("popularity.desc")));
            self.get_json("discover/movie", &query).await
        } else {
            query.push(("query", String::from(params.query.trim())));
            self.get_json("search/movie", &query).await
        }
    }

    #[instrument(skip_all, fields(movie_id = movie_id))]
    async fn movie_details(&self, movie_id: u64) -> FetchResult<MovieDetails> {
        let path = format!("movie/{movie_id}");
        let mut query = vec![("language", self.language.clone())];
        if !self.append_to_response.is_empty() {
            query.push(("append_to_response", self.append_to_response.clone()));
        }
        self.get_json(&path, &query).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn client_for(server: &MockServer) -> TmdbClient {
        let base_url = format!("{}/3/", server.uri());
        TmdbClient::builder()
            .base_url(base_url.parse().unwrap())
            .api_token("test-token")
            .user_agent("test/0.0.0")
            .min_interval(Duration::ZERO)
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_api_token() {
        // Arrange & Act
        let result = TmdbClient::builder().user_agent("test/0.0.0").build();

        // Assert
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("api_token is required")
        );
    }

    #[test]
    fn test_builder_rejects_blank_api_token() {
        // Arrange & Act
        let result = TmdbClient::builder()
            .api_token("  ")
            .user_agent("test/0.0.0")
            .build();

        // Assert
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("api_token is required")
        );
    }

    #[test]
    fn test_builder_requires_user_agent() {
        // Arrange & Act
        let result = TmdbClient::builder().api_token("test-token").build();

        // Assert
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("user_agent is required")
        );
    }

    #[test]
    fn test_builder_defaults() {
        // Arrange & Act
        let client = TmdbClient::builder()
            .api_token("test-token")
            .user_agent("test/0.0.0")
            .build()
            .unwrap();

        // Assert
        assert_eq!(client.base_url.as_str(), DEFAULT_BASE_URL);
        assert_eq!(client.language, "en-US");
        assert_eq!(client.append_to_response, "credits,videos");
    }

    #[test]
    fn test_parse_search_fixture() {
        // Arrange
        let json = include_str!("../../../../fixtures/tmdb/search_movie_batman.json");

        // Act
        let response: MovieListResponse = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(response.page, 1);
        assert_eq!(response.results.len(), 3);
        assert_eq!(response.results[0].id, 268);
        assert_eq!(response.results[0].title, "Batman");
    }

    #[test]
    fn test_parse_details_fixture() {
        // Arrange
        let json = include_str!("../../../../fixtures/tmdb/movie_details_438631.json");

        // Act
        let details: MovieDetails = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(details.id, 438_631);
        assert_eq!(details.runtime, Some(155));
        assert_eq!(details.genres.len(), 2);
        let credits = details.credits.unwrap();
        assert_eq!(credits.cast[0].name, "Timothée Chalamet");
        assert_eq!(details.videos.unwrap().results[0].kind, "Trailer");
    }

    #[tokio::test]
    async fn test_empty_query_uses_discover_listing() {
        // Arrange
        let server = MockServer::start().await;
        let body = include_str!("../../../../fixtures/tmdb/discover_movie_popular.json");

        Mock::given(method("GET"))
            .and(path("/3/discover/movie"))
            .and(query_param("sort_by", "popularity.desc"))
            .and(query_param("page", "1"))
            .and(query_param_is_missing("query"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;

        // Act
        let response = client
            .search_or_list_movies(&MovieListParams::popular())
            .await
            .unwrap();

        // Assert
        assert!(!response.results.is_empty());
    }

    #[tokio::test]
    async fn test_query_uses_search_endpoint() {
        // Arrange
        let server = MockServer::start().await;
        let body = include_str!("../../../../fixtures/tmdb/search_movie_batman.json");

        Mock::given(method("GET"))
            .and(path("/3/search/movie"))
            .and(query_param("query", "batman"))
            .and(query_param("include_adult", "false"))
            .and(query_param("language", "en-US"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;

        // Act
        let response = client
            .search_or_list_movies(&MovieListParams::new("  batman "))
            .await
            .unwrap();

        // Assert
        assert_eq!(response.results[0].title, "Batman");
    }

    #[tokio::test]
    async fn test_base_url_without_trailing_slash_keeps_version_segment() {
        // Arrange
        let server = MockServer::start().await;
        let body = include_str!("../../../../fixtures/tmdb/search_movie_batman.json");

        Mock::given(method("GET"))
            .and(path("/3/search/movie"))
            .and(query_param("query", "batman"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;

        let client = TmdbClient::builder()
            .base_url(format!("{}/3", server.uri()).parse().unwrap())
            .api_token("test-token")
            .user_agent("test/0.0.0")
            .min_interval(Duration::ZERO)
            .build()
            .unwrap();

        // Act
        let response = client
            .search_or_list_movies(&MovieListParams::new("batman"))
            .await
            .unwrap();

        // Assert
        assert_eq!(client.base_url.path(), "/3/");
        assert_eq!(response.results[0].title, "Batman");
    }

    #[tokio::test]
    async fn test_movie_details_appends_sub_resources() {
        // Arrange
        let server = MockServer::start().await;
        let body = include_str!("../../../../fixtures/tmdb/movie_details_438631.json");

        Mock::given(method("GET"))
            .and(path("/3/movie/438631"))
            .and(query_param("append_to_response", "credits,videos"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;

        // Act
        let details = client.movie_details(438_631).await.unwrap();

        // Assert
        assert_eq!(details.title, "Dune");
        assert!(details.credits.is_some());
    }

    #[tokio::test]
    async fn test_movie_details_without_append() {
        // Arrange
        let server = MockServer::start().await;
        let body = include_str!("../../../../fixtures/tmdb/movie_details_438631.json");

        Mock::given(method("GET"))
            .and(path("/3/movie/438631"))
            .and(query_param_is_missing("append_to_response"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;

        let base_url = format!("{}/3/", server.uri());
        let client = TmdbClient::builder()
            .base_url(base_url.parse().unwrap())
            .api_token("test-token")
            .user_agent("test/0.0.0")
            .append_to_response("")
            .min_interval(Duration::ZERO)
            .build()
            .unwrap();

        // Act & Assert (mock expect(1) verifies the query)
        client.movie_details(438_631).await.unwrap();
    }

    #[tokio::test]
    async fn test_bearer_token_is_sent() {
        // Arrange
        let server = MockServer::start().await;
        let body = include_str!("../../../../fixtures/tmdb/search_movie_empty.json");

        Mock::given(method("GET"))
            .and(header("Authorization", "Bearer my-secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;

        let base_url = format!("{}/3/", server.uri());
        let client = TmdbClient::builder()
            .base_url(base_url.parse().unwrap())
            .api_token("my-secret-token")
            .user_agent("test/0.0.0")
            .min_interval(Duration::ZERO)
            .build()
            .unwrap();

        // Act & Assert (mock expect(1) verifies Authorization header)
        client
            .search_or_list_movies(&MovieListParams::new("nothing"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_http_error_maps_to_api_error() {
        // Arrange
        let server = MockServer::start().await;
        let error_body = r#"{"status_code":7,"status_message":"Invalid API key: You must be granted a valid key.","success":false}"#;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string(error_body))
            .mount(&server)
            .await;

        let client = client_for(&server).await;

        // Act
        let err = client
            .search_or_list_movies(&MovieListParams::new("dune"))
            .await
            .unwrap_err();

        // Assert
        assert_eq!(err.status(), Some(401));
        assert!(err.to_string().contains("Invalid API key"));
    }

    #[tokio::test]
    async fn test_http_error_without_error_document_keeps_body() {
        // Arrange
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;

        // Act
        let err = client.movie_details(1).await.unwrap_err();

        // Assert
        assert_eq!(
            err,
            FetchError::Api {
                status: 503,
                message: String::from("upstream unavailable"),
            }
        );
    }

    #[tokio::test]
    async fn test_malformed_body_maps_to_decode_error() {
        // Arrange
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"page": "one"}"#))
            .mount(&server)
            .await;

        let client = client_for(&server).await;

        // Act
        let err = client
            .search_or_list_movies(&MovieListParams::popular())
            .await
            .unwrap_err();

        // Assert
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_maps_to_network_error() {
        // Arrange: bind a server, then drop it so the port refuses connections
        let server = MockServer::start().await;
        let base_url = format!("{}/3/", server.uri());
        drop(server);

        let client = TmdbClient::builder()
            .base_url(base_url.parse().unwrap())
            .api_token("test-token")
            .user_agent("test/0.0.0")
            .min_interval(Duration::ZERO)
            .build()
            .unwrap();

        // Act
        let err = client
            .search_or_list_movies(&MovieListParams::new("dune"))
            .await
            .unwrap_err();

        // Assert
        assert!(err.is_network(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn test_http_429_retries_then_fails() {
        // Arrange
        let server = MockServer::start().await;
        let error_body = r#"{"status_code":25,"status_message":"Your request count is over the allowed limit.","success":false}"#;

        // initial request + MAX_RETRIES retries
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string(error_body))
            .expect(u64::from(MAX_RETRIES) + 1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;

        // Act
        let err = client
            .search_or_list_movies(&MovieListParams::new("dune"))
            .await
            .unwrap_err();

        // Assert
        assert_eq!(err.status(), Some(429));
        assert!(err.to_string().contains("rate limit"));
    }

    #[tokio::test]
    async fn test_local_trait_is_usable_through_blanket_impl() {
        // Arrange
        let server = MockServer::start().await;
        let body = include_str!("../../../../fixtures/tmdb/search_movie_empty.json");

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let client = client_for(&server).await;

        // Act
        let response =
            crate::tmdb::LocalMovieApi::search_or_list_movies(&client, &MovieListParams::new("zzzz"))
                .await
                .unwrap();

        // Assert
        assert_eq!(response.total_results, 0);
        assert!(response.results.is_empty());
    }
}
