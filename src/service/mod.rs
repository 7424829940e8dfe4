//! The remote history / favorite / validation backend.

pub mod http;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, SearchType};
use crate::query::rewrite::rewrite_empty_values;
use crate::Error;

pub use http::HttpSearchService;
pub use memory::MemorySearchService;

/// Saved search parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    #[serde(default)]
    pub query_string: String,
}

/// A recent search, as recorded by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub params: QueryParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
}

/// A named, persisted query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub search_type: SearchType,
    #[serde(default)]
    pub params: QueryParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
}

/// Body of a favorite creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFavorite {
    pub search_type: SearchType,
    pub name: String,
    pub params: QueryParams,
}

/// Backend for recent searches, favorites and query validation. Every call is
/// an independent round trip; callers never retry automatically.
#[async_trait]
pub trait SearchService: Send + Sync {
    async fn list_history(&self, search_type: SearchType) -> Result<Vec<HistoryRecord>, Error>;

    async fn list_favorites(&self, search_type: SearchType) -> Result<Vec<FavoriteRecord>, Error>;

    async fn create_favorite(&self, favorite: NewFavorite) -> Result<FavoriteRecord, Error>;

    async fn update_favorite(&self, id: i64, name: &str) -> Result<FavoriteRecord, Error>;

    async fn destroy_favorite(&self, id: i64) -> Result<(), Error>;

    /// Whether the backend accepts `query_string` for `search_type`.
    async fn validate(&self, query_string: &str, search_type: SearchType) -> Result<bool, Error>;

    /// Record a submitted search. Backends that log searches as they run
    /// them keep the default.
    async fn record_history(&self, _search_type: SearchType, _query_string: &str) -> Result<(), Error> {
        Ok(())
    }
}

/// Visual status of the input after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputStatus {
    Success,
    Error,
}

/// Validate a query against the backend. Empty queries are valid without a
/// call; failed calls mark the input as erroneous but never propagate.
pub async fn validate_query<S: SearchService + ?Sized>(
    service: &S,
    catalog: &Catalog,
    query: &str,
    search_type: SearchType,
) -> InputStatus {
    if query.trim().is_empty() {
        return InputStatus::Success;
    }

    let rewritten = rewrite_empty_values(query, &catalog.nullable_field_names(search_type));
    match service.validate(&rewritten, search_type).await {
        Ok(true) => InputStatus::Success,
        Ok(false) => InputStatus::Error,
        Err(e) => {
            tracing::warn!(error = %e, %search_type, "query validation failed");
            InputStatus::Error
        }
    }
}
