//! Favorite and history lists for one search bar.
//!
//! Both lists are scoped to the active [`SearchType`] and mirror the backing
//! [`SearchService`]; favorites are only changed through explicit save,
//! rename and delete actions.

use std::sync::Arc;

use serde::Serialize;

use crate::catalog::SearchType;
use crate::service::{FavoriteRecord, HistoryRecord, NewFavorite, QueryParams, SearchService};
use crate::Error;

/// A saved query, plus the transient rename state of the list row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FavoriteItem {
    pub id: i64,
    pub name: String,
    pub query_string: String,
    pub edit: bool,
    /// In-progress rename buffer.
    pub fake_name: String,
}

impl From<FavoriteRecord> for FavoriteItem {
    fn from(record: FavoriteRecord) -> Self {
        Self {
            id: record.id,
            fake_name: record.name.clone(),
            name: record.name,
            query_string: record.params.query_string,
            edit: false,
        }
    }
}

/// A recent query. `id` is the position in the backend's list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryItem {
    pub id: usize,
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum FavoriteError {
    #[error("favorite name must not be blank")]
    BlankName,

    #[error("favorite name must not contain emoji")]
    Emoji,

    #[error("a favorite named '{0}' already exists")]
    DuplicateName(String),

    #[error("favorite {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Remote(#[from] Error),
}

impl FavoriteError {
    /// Whether the error was raised before any service call.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            FavoriteError::BlankName | FavoriteError::Emoji | FavoriteError::DuplicateName(_)
        )
    }
}

/// Pictographs and symbols rejected in favorite names.
pub fn is_emoji(ch: char) -> bool {
    matches!(
        ch as u32,
        0x1F300..=0x1F3FF | 0x1F400..=0x1F64F | 0x1F680..=0x1F6FF | 0x2600..=0x2B55
    )
}

pub fn validate_name(name: &str) -> Result<(), FavoriteError> {
    if name.trim().is_empty() {
        return Err(FavoriteError::BlankName);
    }
    if name.chars().any(is_emoji) {
        return Err(FavoriteError::Emoji);
    }
    Ok(())
}

fn history_items(records: Vec<HistoryRecord>) -> Vec<HistoryItem> {
    records
        .into_iter()
        .map(|r| r.params.query_string)
        .filter(|q| !q.trim().is_empty())
        .enumerate()
        .map(|(id, name)| HistoryItem { id, name })
        .collect()
}

/// Favorite and history state for the active search type.
pub struct FavoriteStore<S: SearchService + ?Sized> {
    service: Arc<S>,
    search_type: SearchType,
    favorites: Vec<FavoriteItem>,
    history: Vec<HistoryItem>,
    /// Name buffer of a favorite being created, if any.
    draft: Option<String>,
}

impl<S: SearchService + ?Sized> FavoriteStore<S> {
    pub fn new(service: Arc<S>, search_type: SearchType) -> Self {
        Self {
            service,
            search_type,
            favorites: Vec::new(),
            history: Vec::new(),
            draft: None,
        }
    }

    pub fn service(&self) -> &Arc<S> {
        &self.service
    }

    pub fn search_type(&self) -> SearchType {
        self.search_type
    }

    pub fn favorites(&self) -> &[FavoriteItem] {
        &self.favorites
    }

    pub fn history(&self) -> &[HistoryItem] {
        &self.history
    }

    pub fn favorite(&self, id: i64) -> Option<&FavoriteItem> {
        self.favorites.iter().find(|f| f.id == id)
    }

    pub fn draft(&self) -> Option<&str> {
        self.draft.as_deref()
    }

    /// Whether a favorite is being created or renamed.
    pub fn is_editing(&self) -> bool {
        self.draft.is_some() || self.favorites.iter().any(|f| f.edit)
    }

    /// Switch search type, refetching both lists when it changes.
    pub async fn set_search_type(&mut self, search_type: SearchType) {
        if self.search_type == search_type {
            return;
        }
        self.search_type = search_type;
        self.draft = None;
        self.refresh().await;
    }

    /// Refetch history and favorites concurrently.
    pub async fn refresh(&mut self) {
        let search_type = self.search_type;
        let (history, favorites) = futures::join!(
            self.service.list_history(search_type),
            self.service.list_favorites(search_type)
        );
        self.apply_history(history);
        self.apply_favorites(favorites);
    }

    pub async fn refresh_history(&mut self) {
        let history = self.service.list_history(self.search_type).await;
        self.apply_history(history);
    }

    pub async fn refresh_favorites(&mut self) {
        let favorites = self.service.list_favorites(self.search_type).await;
        self.apply_favorites(favorites);
    }

    /// Like [`FavoriteStore::refresh_favorites`], but a failed fetch is
    /// returned and the current list kept.
    pub async fn try_refresh_favorites(&mut self) -> Result<(), Error> {
        let records = self.service.list_favorites(self.search_type).await?;
        self.favorites = records.into_iter().map(FavoriteItem::from).collect();
        Ok(())
    }

    fn apply_history(&mut self, result: Result<Vec<HistoryRecord>, Error>) {
        self.history = match result {
            Ok(records) => history_items(records),
            Err(e) => {
                tracing::warn!(error = %e, search_type = %self.search_type, "failed to load search history");
                Vec::new()
            }
        };
    }

    fn apply_favorites(&mut self, result: Result<Vec<FavoriteRecord>, Error>) {
        self.favorites = match result {
            Ok(records) => records.into_iter().map(FavoriteItem::from).collect(),
            Err(e) => {
                tracing::warn!(error = %e, search_type = %self.search_type, "failed to load favorites");
                Vec::new()
            }
        };
    }

    // --- Create ---

    /// Open the "save as favorite" row. Any rename in progress is abandoned.
    pub fn begin_new(&mut self) {
        for item in &mut self.favorites {
            item.edit = false;
            item.fake_name = item.name.clone();
        }
        self.draft = Some(String::new());
    }

    pub fn set_draft_name(&mut self, name: &str) {
        if let Some(draft) = self.draft.as_mut() {
            *draft = name.to_string();
        }
    }

    pub fn cancel_draft(&mut self) {
        self.draft = None;
    }

    /// Save `query_string` as a favorite named `name`. Invalid or duplicate
    /// names are rejected without calling the service; on failure the draft
    /// stays open.
    pub async fn create_favorite(
        &mut self,
        name: &str,
        query_string: &str,
    ) -> Result<FavoriteItem, FavoriteError> {
        validate_name(name)?;
        if self.favorites.iter().any(|f| f.name == name) {
            return Err(FavoriteError::DuplicateName(name.to_string()));
        }

        let request = NewFavorite {
            search_type: self.search_type,
            name: name.to_string(),
            params: QueryParams {
                query_string: query_string.to_string(),
            },
        };
        match self.service.create_favorite(request).await {
            Ok(record) => {
                let item = FavoriteItem::from(record);
                self.favorites.insert(0, item.clone());
                self.draft = None;
                tracing::info!(id = item.id, name = %item.name, "favorite saved");
                Ok(item)
            }
            Err(e) => {
                tracing::warn!(error = %e, name, "failed to save favorite");
                Err(e.into())
            }
        }
    }

    // --- Rename ---

    pub fn begin_rename(&mut self, id: i64) -> Result<(), FavoriteError> {
        if self.favorite(id).is_none() {
            return Err(FavoriteError::NotFound(id));
        }
        self.draft = None;
        for item in &mut self.favorites {
            item.edit = item.id == id;
            item.fake_name = item.name.clone();
        }
        Ok(())
    }

    pub fn set_rename_buffer(&mut self, id: i64, name: &str) {
        if let Some(item) = self.favorites.iter_mut().find(|f| f.id == id) {
            item.fake_name = name.to_string();
        }
    }

    pub fn cancel_edit(&mut self, id: i64) {
        if let Some(item) = self.favorites.iter_mut().find(|f| f.id == id) {
            item.edit = false;
            item.fake_name = item.name.clone();
        }
    }

    /// Rename a favorite. An unchanged name leaves edit mode without a call;
    /// a failed call keeps the row in edit mode.
    pub async fn rename_favorite(
        &mut self,
        id: i64,
        name: &str,
    ) -> Result<FavoriteItem, FavoriteError> {
        validate_name(name)?;
        let item = self
            .favorites
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or(FavoriteError::NotFound(id))?;
        item.fake_name = name.to_string();
        if item.name == name {
            item.edit = false;
            return Ok(item.clone());
        }

        let result = self.service.update_favorite(id, name).await;

        // The list may have been refreshed while the call was in flight.
        let item = self
            .favorites
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or(FavoriteError::NotFound(id))?;
        match result {
            Ok(record) => {
                item.name = record.name;
                item.fake_name = item.name.clone();
                item.edit = false;
                Ok(item.clone())
            }
            Err(e) => {
                tracing::warn!(error = %e, id, "failed to rename favorite");
                item.edit = true;
                Err(e.into())
            }
        }
    }

    // --- Delete ---

    /// Delete a favorite; the row is removed only once the service agrees.
    pub async fn delete_favorite(&mut self, id: i64) -> Result<(), FavoriteError> {
        if self.favorite(id).is_none() {
            return Err(FavoriteError::NotFound(id));
        }

        match self.service.destroy_favorite(id).await {
            Ok(()) => {
                self.favorites.retain(|f| f.id != id);
                tracing::info!(id, "favorite deleted");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, id, "failed to delete favorite");
                Err(e.into())
            }
        }
    }
}
