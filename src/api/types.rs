use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::catalog::SearchType;
use crate::input::PanelView;
use crate::query::{FilterText, FocusContext};
use crate::service::InputStatus;

/// JSON response wrapper that pretty-prints the output.
pub struct PrettyJson<T>(pub T);

impl<T: Serialize> IntoResponse for PrettyJson<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec_pretty(&self.0) {
            Ok(bytes) => ([(header::CONTENT_TYPE, "application/json")], bytes).into_response(),
            Err(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain")],
                e.to_string(),
            )
                .into_response(),
        }
    }
}

/// List response envelope.
#[derive(Debug, Serialize)]
pub struct ListResponse<T: Serialize> {
    pub url: String,
    pub object: &'static str,
    pub data: Vec<T>,
}

impl<T: Serialize> ListResponse<T> {
    pub fn new(url: String, data: Vec<T>) -> Self {
        Self {
            url,
            object: "list",
            data,
        }
    }
}

/// Structured error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    #[serde(rename = "type")]
    pub error_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
}

/// Server status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub backend: &'static str,
    pub fill_id: bool,
    pub build: BuildInfo,
}

/// Build metadata embedded at compile time.
#[derive(Debug, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub commit: &'static str,
}

// ---------------------------------------------------------------------------
// Query editing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct TokenizeRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct TokenizeResponse {
    pub object: &'static str,
    pub query: String,
    pub tokens: Vec<FilterText>,
}

/// Body of `POST /query/context` and `POST /query/splice`.
#[derive(Debug, Deserialize)]
pub struct CaretRequest {
    #[serde(default)]
    pub query: String,
    /// Char offset; defaults to the end of the query.
    #[serde(default)]
    pub caret: Option<usize>,
    #[serde(default)]
    pub search_type: SearchType,
    /// Suggestion to insert (splice only).
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Suggestion {
    pub id: String,
    pub name: String,
    /// Whether this is the entry under the caret.
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct ContextResponse {
    pub object: &'static str,
    /// The query after whitespace normalization.
    pub query: String,
    pub caret: usize,
    pub panel: PanelView,
    pub context: FocusContext,
    pub suggestions: Vec<Suggestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SpliceResponse {
    pub object: &'static str,
    pub query: String,
    pub caret: usize,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub search_type: SearchType,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub object: &'static str,
    pub status: InputStatus,
}

// ---------------------------------------------------------------------------
// History and favorites
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RecordHistoryRequest {
    pub query_string: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateFavoriteRequest {
    pub name: String,
    #[serde(default)]
    pub query_string: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameFavoriteRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub object: &'static str,
    pub id: i64,
    pub deleted: bool,
}
