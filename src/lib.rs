pub mod api;
pub mod catalog;
pub mod favorites;
pub mod input;
pub mod query;
pub mod service;

use std::sync::{Arc, PoisonError, RwLock};

use catalog::Catalog;
use service::SearchService;

/// Shared application state.
pub struct AppState {
    catalog: RwLock<Arc<Catalog>>,
    pub service: Arc<dyn SearchService>,
    /// Name of the service backend, reported by `/health`.
    pub backend: &'static str,
}

impl AppState {
    pub fn new(catalog: Catalog, service: Arc<dyn SearchService>, backend: &'static str) -> Self {
        Self {
            catalog: RwLock::new(Arc::new(catalog)),
            service,
            backend,
        }
    }

    /// Snapshot of the current catalog.
    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply `update` to the catalog. Snapshots taken earlier are unaffected.
    pub fn update_catalog<R>(&self, update: impl FnOnce(&mut Catalog) -> R) -> R {
        let mut guard = self.catalog.write().unwrap_or_else(PoisonError::into_inner);
        update(Arc::make_mut(&mut guard))
    }
}

/// Application-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{url} returned status {status}")]
    Status { status: u16, url: String },

    #[error("service rejected the request: {0}")]
    Service(String),
}
