//! `AppwriteClient` - Appwrite document store client implementation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::{Client, RequestBuilder};
use tokio::sync::Mutex;
use tracing::instrument;
use url::Url;

use super::query::Query;
use super::types::{
    AppwriteErrorResponse, CountPatch, CreateDocumentRequest, DocumentList, UpdateDocumentRequest,
};
use crate::error::{FetchError, FetchResult};
use crate::rate_limiter::RateLimiter;
use crate::store::{NewSearchCount, SearchCountDocument, SearchCountStore};

/// Attribute holding the search term.
const SEARCH_TERM_ATTRIBUTE: &str = "searchTerm";

/// Attribute holding the count.
const COUNT_ATTRIBUTE: &str = "count";

/// Placeholder ID asking the server to generate one.
const UNIQUE_ID: &str = "unique()";

/// Default minimum interval between requests.
const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(10);

/// Appwrite document store client bound to one collection.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct AppwriteClient {
    /// HTTP client.
    http_client: Client,
    /// `.../documents` URL of the configured collection.
    collection_url: Url,
    /// Same URL with a trailing slash, used as the base for document IDs.
    documents_url: Url,
    /// Project ID (`X-Appwrite-Project`).
    project_id: String,
    /// Server API key (`X-Appwrite-Key`).
    api_key: String,
    /// Rate limiter.
    rate_limiter: Arc<Mutex<RateLimiter>>,
}

/// Builder for `AppwriteClient`.
#[derive(Debug, Default)]
#[allow(clippy::module_name_repetitions)]
pub struct AppwriteClientBuilder {
    endpoint: Option<Url>,
    project_id: Option<String>,
    database_id: Option<String>,
    collection_id: Option<String>,
    api_key: Option<String>,
    user_agent: Option<String>,
    min_interval: Option<Duration>,
}

impl AppwriteClientBuilder {
    /// Sets the API endpoint, e.g. `https://cloud.appwrite.io/v1` (required).
    #[must_use]
    pub fn endpoint(mut self, url: Url) -> Self {
        self.endpoint = Some(url);
        self
    }

    /// Sets the project ID (required).
    #[must_use]
    pub fn project_id(mut self, id: impl Into<String>) -> Self {
        self.project_id = Some(id.into());
        self
    }

    /// Sets the database ID (required).
    #[must_use]
    pub fn database_id(mut self, id: impl Into<String>) -> Self {
        self.database_id = Some(id.into());
        self
    }

    /// Sets the collection ID (required).
    #[must_use]
    pub fn collection_id(mut self, id: impl Into<String>) -> Self {
        self.collection_id = Some(id.into());
        self
    }

    /// Sets the server API key (required).
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the minimum request interval (default: 10ms).
    #[must_use]
    pub const fn min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = Some(interval);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - Any required field is missing or blank.
    /// - The collection URL cannot be derived from the endpoint.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<AppwriteClient> {
        let endpoint = self.endpoint.context("endpoint is required")?;
        let project_id = required(self.project_id, "project_id")?;
        let database_id = required(self.database_id, "database_id")?;
        let collection_id = required(self.collection_id, "collection_id")?;
        let api_key = required(self.api_key, "api_key")?;
        let user_agent = self.user_agent.context("user_agent is required")?;

        let documents_url = documents_url(&endpoint, &database_id, &collection_id)?;
        let mut collection_url = documents_url.clone();
        let trimmed = String::from(documents_url.path().trim_end_matches('/'));
        collection_url.set_path(&trimmed);

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .build()
            .context("failed to build HTTP client")?;

        Ok(AppwriteClient {
            http_client,
            collection_url,
            documents_url,
            project_id,
            api_key,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(
                self.min_interval.unwrap_or(DEFAULT_MIN_INTERVAL),
            ))),
        })
    }
}

/// Unwraps a required, non-blank builder field.
fn required(value: Option<String>, name: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => bail!("{name} is required"),
    }
}

/// Derives `{endpoint}/databases/{db}/collections/{col}/documents/`.
fn documents_url(endpoint: &Url, database_id: &str, collection_id: &str) -> Result<Url> {
    let mut base = endpoint.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(&format!(
        "databases/{database_id}/collections/{collection_id}/documents/"
    ))
    .with_context(|| format!("invalid Appwrite endpoint: {endpoint}"))
}

impl AppwriteClient {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> AppwriteClientBuilder {
        AppwriteClientBuilder::default()
    }

    /// Lists documents matching `queries`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Store`] on transport, HTTP, or decode failure.
    #[instrument(skip_all)]
    pub async fn list_documents(&self, queries: &[Query]) -> FetchResult<DocumentList> {
        let params: Vec<(&str, String)> = queries
            .iter()
            .map(|q| ("queries[]", q.to_json()))
            .collect();
        let request = self
            .http_client
            .get(self.collection_url.clone())
            .query(&params);
        self.send_json(request, "list documents").await
    }

    /// URL of one document.
    fn document_url(&self, document_id: &str) -> FetchResult<Url> {
        self.documents_url
            .join(document_id)
            .map_err(|e| FetchError::Store(format!("invalid document ID {document_id}: {e}")))
    }

    /// Sends a request with project/key headers and decodes a JSON response.
    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: &str,
    ) -> FetchResult<T> {
        self.rate_limiter.lock().await.wait().await;

        let request = request
            .header("X-Appwrite-Project", &self.project_id)
            .header("X-Appwrite-Key", &self.api_key)
            .build()
            .map_err(|e| FetchError::Store(format!("{operation}: failed to build request: {e}")))?;

        tracing::debug!(method = %request.method(), url = %request.url(), "Appwrite request");

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| FetchError::Store(format!("{operation}: request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Store(format!("{operation}: failed to read body: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<AppwriteErrorResponse>(&body).map_or_else(
                |_| String::from(body.trim()),
                |err| match err.kind {
                    Some(kind) => format!("{} ({kind})", err.message),
                    None => err.message,
                },
            );
            return Err(FetchError::Store(format!(
                "{operation}: HTTP {}: {message}",
                status.as_u16()
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| FetchError::Store(format!("{operation}: failed to decode response: {e}")))
    }
}

impl SearchCountStore for AppwriteClient {
    #[instrument(skip_all, fields(term = term))]
    async fn find_by_term(&self, term: &str) -> FetchResult<Option<SearchCountDocument>> {
        let list = self
            .list_documents(&[Query::equal(SEARCH_TERM_ATTRIBUTE, term), Query::Limit(1)])
            .await?;
        Ok(list.documents.into_iter().next())
    }

    #[instrument(skip_all, fields(term = %document.search_term))]
    async fn create(&self, document: &NewSearchCount) -> FetchResult<SearchCountDocument> {
        let body = CreateDocumentRequest {
            document_id: UNIQUE_ID,
            data: document,
        };
        let request = self
            .http_client
            .post(self.collection_url.clone())
            .json(&body);
        self.send_json(request, "create document").await
    }

    #[instrument(skip_all, fields(document_id = document_id, count = count))]
    async fn update_count(
        &self,
        document_id: &str,
        count: u32,
    ) -> FetchResult<SearchCountDocument> {
        let url = self.document_url(document_id)?;
        let body = UpdateDocumentRequest {
            data: CountPatch { count },
        };
        let request = self.http_client.patch(url).json(&body);
        self.send_json(request, "update document").await
    }

    #[instrument(skip_all, fields(limit = limit))]
    async fn top_by_count(&self, limit: u32) -> FetchResult<Vec<SearchCountDocument>> {
        let list = self
            .list_documents(&[
                Query::Limit(limit),
                Query::OrderDesc(String::from(COUNT_ATTRIBUTE)),
            ])
            .await?;
        Ok(list.documents)
    }
}
