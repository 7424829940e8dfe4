use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use super::error::ApiError;
use super::types::{
    BuildInfo, CaretRequest, ContextResponse, CreateFavoriteRequest, DeletedResponse, ListResponse,
    PrettyJson, RecordHistoryRequest, RenameFavoriteRequest, SpliceResponse, StatusResponse,
    Suggestion, TokenizeRequest, TokenizeResponse, ValidateRequest, ValidateResponse,
};
use crate::catalog::{MenuItem, SearchType};
use crate::favorites::FavoriteStore;
use crate::input::{Caret, FilterInput, PanelView};
use crate::query::{tokenize, Panel};
use crate::service::{validate_query, SearchService};
use crate::AppState;

fn record(endpoint: &'static str, start: Instant) {
    metrics::counter!("api_requests_total", "endpoint" => endpoint).increment(1);
    metrics::histogram!("api_request_duration_seconds", "endpoint" => endpoint)
        .record(start.elapsed().as_secs_f64());
}

fn parse_search_type(raw: &str) -> Result<SearchType, ApiError> {
    raw.parse().map_err(|message| ApiError::BadRequest {
        message,
        param: Some("search_type".to_string()),
    })
}

/// An editor session over the shared catalog, positioned at the request's
/// caret with its context resolved.
fn session(state: &AppState, req: &CaretRequest) -> FilterInput<dyn SearchService> {
    // Nothing listens: a request-scoped session never commits.
    let (events, _) = tokio::sync::mpsc::unbounded_channel();
    let mut input = FilterInput::new(
        state.service.clone(),
        state.catalog(),
        req.search_type,
        Caret::default(),
        events,
    );
    input.on_input(req.query.as_str());
    input.set_caret(req.caret.unwrap_or_else(|| req.query.chars().count()));
    input.refresh_context();
    input
}

fn favorite_store(state: &AppState, search_type: SearchType) -> FavoriteStore<dyn SearchService> {
    FavoriteStore::new(state.service.clone(), search_type)
}

/// GET /health
#[tracing::instrument(skip_all)]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    PrettyJson(StatusResponse {
        status: "ok",
        backend: state.backend,
        fill_id: state.catalog().fill_id(),
        build: BuildInfo {
            version: env!("CARGO_PKG_VERSION"),
            commit: option_env!("BUILD_COMMIT").unwrap_or(""),
        },
    })
}

/// GET /fields/{search_type}
#[tracing::instrument(skip_all, fields(search_type = %search_type))]
pub async fn list_fields(
    State(state): State<Arc<AppState>>,
    Path(search_type): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let start = Instant::now();
    let search_type = parse_search_type(&search_type)?;
    let catalog = state.catalog();
    let fields = catalog.fields(search_type).to_vec();

    record("fields", start);
    Ok(PrettyJson(ListResponse::new(
        format!("/fields/{}", search_type),
        fields,
    )))
}

/// PUT /catalog/values/{field_id}
#[tracing::instrument(skip_all, fields(field_id = %field_id))]
pub async fn set_values(
    State(state): State<Arc<AppState>>,
    Path(field_id): Path<String>,
    Json(items): Json<Vec<MenuItem>>,
) -> Result<impl IntoResponse, ApiError> {
    let start = Instant::now();
    if field_id.trim().is_empty() {
        return Err(ApiError::BadRequest {
            message: "field id must not be blank".to_string(),
            param: Some("field_id".to_string()),
        });
    }

    let values = state.update_catalog(|catalog| {
        catalog.set_values(&field_id, items);
        catalog.values(&field_id).to_vec()
    });
    tracing::debug!(values = values.len(), "value suggestions replaced");

    record("set_values", start);
    Ok(PrettyJson(ListResponse::new(
        format!("/catalog/values/{}", field_id),
        values,
    )))
}

// ---------------------------------------------------------------------------
// Query editing
// ---------------------------------------------------------------------------

/// POST /query/tokenize
#[tracing::instrument(skip_all)]
pub async fn tokenize_query(Json(req): Json<TokenizeRequest>) -> impl IntoResponse {
    let start = Instant::now();
    let tokens = tokenize(&req.query);
    record("tokenize", start);
    PrettyJson(TokenizeResponse {
        object: "tokens",
        query: req.query,
        tokens,
    })
}

/// POST /query/context
#[tracing::instrument(skip_all, fields(search_type = %req.search_type))]
pub async fn query_context(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CaretRequest>,
) -> impl IntoResponse {
    let start = Instant::now();
    let input = session(&state, &req);
    let context = input.context().clone();

    let suggestions: Vec<Suggestion> = match input.panel() {
        PanelView::Main => input
            .fields()
            .iter()
            .map(|f| Suggestion {
                id: f.id.clone(),
                name: f.name.clone(),
                active: context.highlights(&f.id, &f.name),
            })
            .collect(),
        PanelView::Menu(_) => input
            .menu_items()
            .iter()
            .map(|i| Suggestion {
                id: i.id.clone(),
                name: i.name.clone(),
                active: context.highlights(&i.id, &i.name),
            })
            .collect(),
        PanelView::Hidden => Vec::new(),
    };

    record("context", start);
    PrettyJson(ContextResponse {
        object: "context",
        query: input.value().to_string(),
        caret: input.caret(),
        panel: input.panel(),
        context,
        suggestions,
        hint: input.placeholder().map(str::to_string),
    })
}

/// POST /query/splice
#[tracing::instrument(skip_all, fields(search_type = %req.search_type))]
pub async fn splice_query(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CaretRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let start = Instant::now();
    let id = req.id.as_deref().ok_or_else(|| ApiError::BadRequest {
        message: "id is required".to_string(),
        param: Some("id".to_string()),
    })?;

    let mut input = session(&state, &req);
    if input.context().show == Panel::None {
        return Err(ApiError::BadRequest {
            message: "no suggestions apply at this caret position".to_string(),
            param: Some("caret".to_string()),
        });
    }
    let result = input
        .select_suggestion(id)
        .ok_or_else(|| ApiError::BadRequest {
            message: format!("unknown suggestion: {}", id),
            param: Some("id".to_string()),
        })?;

    record("splice", start);
    Ok(PrettyJson(SpliceResponse {
        object: "splice",
        query: result.text,
        caret: result.caret,
    }))
}

/// POST /query/validate
#[tracing::instrument(skip_all, fields(search_type = %req.search_type))]
pub async fn validate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ValidateRequest>,
) -> impl IntoResponse {
    let start = Instant::now();
    let catalog = state.catalog();
    let status = validate_query(
        state.service.as_ref(),
        &catalog,
        &req.query,
        req.search_type,
    )
    .await;

    record("validate", start);
    PrettyJson(ValidateResponse {
        object: "validation",
        status,
    })
}

// ---------------------------------------------------------------------------
// History and favorites
// ---------------------------------------------------------------------------

/// GET /history/{search_type}
#[tracing::instrument(skip_all, fields(search_type = %search_type))]
pub async fn list_history(
    State(state): State<Arc<AppState>>,
    Path(search_type): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let start = Instant::now();
    let search_type = parse_search_type(&search_type)?;
    let mut store = favorite_store(&state, search_type);
    store.refresh_history().await;

    record("history", start);
    Ok(PrettyJson(ListResponse::new(
        format!("/history/{}", search_type),
        store.history().to_vec(),
    )))
}

/// POST /history/{search_type}
#[tracing::instrument(skip_all, fields(search_type = %search_type))]
pub async fn record_history(
    State(state): State<Arc<AppState>>,
    Path(search_type): Path<String>,
    Json(req): Json<RecordHistoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let start = Instant::now();
    let search_type = parse_search_type(&search_type)?;
    state
        .service
        .record_history(search_type, &req.query_string)
        .await?;

    record("record_history", start);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /favorites/{search_type}
#[tracing::instrument(skip_all, fields(search_type = %search_type))]
pub async fn list_favorites(
    State(state): State<Arc<AppState>>,
    Path(search_type): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let start = Instant::now();
    let search_type = parse_search_type(&search_type)?;
    let mut store = favorite_store(&state, search_type);
    store.refresh_favorites().await;

    record("favorites", start);
    Ok(PrettyJson(ListResponse::new(
        format!("/favorites/{}", search_type),
        store.favorites().to_vec(),
    )))
}

/// POST /favorites/{search_type}
#[tracing::instrument(skip_all, fields(search_type = %search_type))]
pub async fn create_favorite(
    State(state): State<Arc<AppState>>,
    Path(search_type): Path<String>,
    Json(req): Json<CreateFavoriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let start = Instant::now();
    let search_type = parse_search_type(&search_type)?;
    let mut store = favorite_store(&state, search_type);
    store.try_refresh_favorites().await?;
    let item = store.create_favorite(&req.name, &req.query_string).await?;

    record("create_favorite", start);
    Ok((StatusCode::CREATED, PrettyJson(item)))
}

/// PATCH /favorites/{search_type}/{id}
#[tracing::instrument(skip_all, fields(search_type = %search_type, id))]
pub async fn rename_favorite(
    State(state): State<Arc<AppState>>,
    Path((search_type, id)): Path<(String, i64)>,
    Json(req): Json<RenameFavoriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let start = Instant::now();
    let search_type = parse_search_type(&search_type)?;
    let mut store = favorite_store(&state, search_type);
    store.try_refresh_favorites().await?;
    store.begin_rename(id)?;
    let item = store.rename_favorite(id, &req.name).await?;

    record("rename_favorite", start);
    Ok(PrettyJson(item))
}

/// DELETE /favorites/{search_type}/{id}
#[tracing::instrument(skip_all, fields(search_type = %search_type, id))]
pub async fn delete_favorite(
    State(state): State<Arc<AppState>>,
    Path((search_type, id)): Path<(String, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    let start = Instant::now();
    let search_type = parse_search_type(&search_type)?;
    let mut store = favorite_store(&state, search_type);
    store.try_refresh_favorites().await?;
    store.delete_favorite(id).await?;

    record("delete_favorite", start);
    Ok(PrettyJson(DeletedResponse {
        object: "favorite",
        id,
        deleted: true,
    }))
}
