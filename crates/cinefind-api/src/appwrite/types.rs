//! Appwrite REST response and request bodies.

use serde::{Deserialize, Serialize};

use crate::store::SearchCountDocument;

/// Response from the list-documents endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentList {
    /// Total number of matching documents.
    pub total: u64,
    /// Documents on this page.
    pub documents: Vec<SearchCountDocument>,
}

/// Body of a create-document request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentRequest<'a, T> {
    /// Document ID, or `unique()` to let the server assign one.
    pub document_id: &'a str,
    /// Document fields.
    pub data: &'a T,
}

/// Body of an update-document request.
#[derive(Debug, Serialize)]
pub struct UpdateDocumentRequest<T> {
    /// Fields to change.
    pub data: T,
}

/// Partial update touching only `count`.
#[derive(Debug, Serialize)]
pub struct CountPatch {
    /// New count.
    pub count: u32,
}

/// Appwrite error response body.
#[derive(Debug, Clone, Deserialize)]
pub struct AppwriteErrorResponse {
    /// Error message.
    pub message: String,
    /// Error type identifier (e.g. `document_not_found`).
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}
