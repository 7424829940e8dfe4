pub mod error;
pub mod routes;
pub mod types;

use std::sync::Arc;

use axum::routing::{get, patch, post, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Build the API router.
pub fn router(state: Arc<AppState>, metrics_handle: Option<PrometheusHandle>) -> Router {
    let mut app = Router::new()
        .route("/health", get(routes::health))
        .route("/fields/{search_type}", get(routes::list_fields))
        .route("/catalog/values/{field_id}", put(routes::set_values))
        .route("/query/tokenize", post(routes::tokenize_query))
        .route("/query/context", post(routes::query_context))
        .route("/query/splice", post(routes::splice_query))
        .route("/query/validate", post(routes::validate))
        .route(
            "/history/{search_type}",
            get(routes::list_history).post(routes::record_history),
        )
        .route(
            "/favorites/{search_type}",
            get(routes::list_favorites).post(routes::create_favorite),
        )
        .route(
            "/favorites/{search_type}/{id}",
            patch(routes::rename_favorite).delete(routes::delete_favorite),
        );

    if let Some(handle) = metrics_handle {
        app = app.route(
            "/metrics",
            get(move || std::future::ready(handle.render())),
        );
    }

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
