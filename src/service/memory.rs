use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use super::{FavoriteRecord, HistoryRecord, NewFavorite, QueryParams, SearchService};
use crate::catalog::SearchType;
use crate::query::{tokenize, TokenKind};
use crate::Error;

/// Most recent searches kept per search type.
const HISTORY_LIMIT: usize = 10;

/// In-process [`SearchService`] for running without a backend and for tests.
/// Lists are kept newest first.
#[derive(Debug)]
pub struct MemorySearchService {
    history: DashMap<SearchType, Vec<HistoryRecord>>,
    favorites: DashMap<SearchType, Vec<FavoriteRecord>>,
    next_id: AtomicI64,
}

impl Default for MemorySearchService {
    fn default() -> Self {
        Self {
            history: DashMap::new(),
            favorites: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl MemorySearchService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a submitted search. Repeating a query moves it to the front.
    pub fn push_history(&self, search_type: SearchType, query_string: &str) {
        let query_string = query_string.trim();
        if query_string.is_empty() {
            return;
        }

        let mut entries = self.history.entry(search_type).or_default();
        entries.retain(|h| h.params.query_string != query_string);
        entries.insert(
            0,
            HistoryRecord {
                id: Some(self.next_id.fetch_add(1, Ordering::Relaxed)),
                params: QueryParams {
                    query_string: query_string.to_string(),
                },
                create_time: Some(Utc::now()),
            },
        );
        entries.truncate(HISTORY_LIMIT);
    }

    fn not_found(id: i64) -> Error {
        Error::Service(format!("favorite {} does not exist", id))
    }
}

/// A query is accepted when every clause carries a value and no condition
/// dangles at either end.
fn is_complete_query(query_string: &str) -> bool {
    let tokens = tokenize(query_string);
    if tokens.is_empty() {
        return true;
    }

    tokens
        .split(|t| t.kind == TokenKind::Condition)
        .all(|clause| clause.last().is_some_and(|t| t.kind == TokenKind::Value))
}

#[async_trait]
impl SearchService for MemorySearchService {
    async fn list_history(&self, search_type: SearchType) -> Result<Vec<HistoryRecord>, Error> {
        Ok(self
            .history
            .get(&search_type)
            .map(|entries| entries.value().clone())
            .unwrap_or_default())
    }

    async fn list_favorites(&self, search_type: SearchType) -> Result<Vec<FavoriteRecord>, Error> {
        Ok(self
            .favorites
            .get(&search_type)
            .map(|entries| entries.value().clone())
            .unwrap_or_default())
    }

    async fn create_favorite(&self, favorite: NewFavorite) -> Result<FavoriteRecord, Error> {
        let mut entries = self.favorites.entry(favorite.search_type).or_default();
        if entries.iter().any(|f| f.name == favorite.name) {
            return Err(Error::Service(format!(
                "favorite '{}' already exists",
                favorite.name
            )));
        }

        let record = FavoriteRecord {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            name: favorite.name,
            search_type: favorite.search_type,
            params: favorite.params,
            create_time: Some(Utc::now()),
        };
        entries.insert(0, record.clone());
        tracing::debug!(id = record.id, name = %record.name, "favorite created");
        Ok(record)
    }

    async fn update_favorite(&self, id: i64, name: &str) -> Result<FavoriteRecord, Error> {
        for mut entries in self.favorites.iter_mut() {
            let Some(index) = entries.iter().position(|f| f.id == id) else {
                continue;
            };
            if entries.iter().any(|f| f.id != id && f.name == name) {
                return Err(Error::Service(format!("favorite '{}' already exists", name)));
            }
            entries[index].name = name.to_string();
            return Ok(entries[index].clone());
        }
        Err(Self::not_found(id))
    }

    async fn destroy_favorite(&self, id: i64) -> Result<(), Error> {
        for mut entries in self.favorites.iter_mut() {
            let before = entries.len();
            entries.retain(|f| f.id != id);
            if entries.len() != before {
                return Ok(());
            }
        }
        Err(Self::not_found(id))
    }

    async fn validate(&self, query_string: &str, _search_type: SearchType) -> Result<bool, Error> {
        Ok(is_complete_query(query_string))
    }

    async fn record_history(&self, search_type: SearchType, query_string: &str) -> Result<(), Error> {
        self.push_history(search_type, query_string);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_favorite(name: &str, query: &str) -> NewFavorite {
        NewFavorite {
            search_type: SearchType::Alert,
            name: name.to_string(),
            params: QueryParams {
                query_string: query.to_string(),
            },
        }
    }

    #[test]
    fn test_complete_queries() {
        assert!(is_complete_query(""));
        assert!(is_complete_query("status : ABNORMAL"));
        assert!(is_complete_query("status : ABNORMAL AND severity : 1"));
        assert!(is_complete_query("NOT assignee : *"));
        assert!(!is_complete_query("status"));
        assert!(!is_complete_query("status :"));
        assert!(!is_complete_query("status : ABNORMAL AND"));
    }

    #[tokio::test]
    async fn test_history_newest_first_and_capped() {
        let service = MemorySearchService::new();
        for i in 0..15 {
            service.push_history(SearchType::Alert, &format!("id : {}", i));
        }
        service.push_history(SearchType::Alert, "  ");

        let history = service.list_history(SearchType::Alert).await.unwrap();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0].params.query_string, "id : 14");
        assert!(service.list_history(SearchType::Event).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_repeat_moves_to_front() {
        let service = MemorySearchService::new();
        service.push_history(SearchType::Alert, "a : 1");
        service.push_history(SearchType::Alert, "b : 2");
        service.push_history(SearchType::Alert, "a : 1");

        let history = service.list_history(SearchType::Alert).await.unwrap();
        let queries: Vec<_> = history.iter().map(|h| h.params.query_string.as_str()).collect();
        assert_eq!(queries, vec!["a : 1", "b : 2"]);
    }

    #[tokio::test]
    async fn test_favorite_lifecycle() {
        let service = MemorySearchService::new();
        let created = service
            .create_favorite(new_favorite("abnormal", "status : ABNORMAL"))
            .await
            .unwrap();
        assert_eq!(created.name, "abnormal");

        let renamed = service.update_favorite(created.id, "broken").await.unwrap();
        assert_eq!(renamed.name, "broken");
        assert_eq!(renamed.params.query_string, "status : ABNORMAL");

        service.destroy_favorite(created.id).await.unwrap();
        assert!(service.list_favorites(SearchType::Alert).await.unwrap().is_empty());
        assert!(service.destroy_favorite(created.id).await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_favorite_rejected() {
        let service = MemorySearchService::new();
        service.create_favorite(new_favorite("a", "x : 1")).await.unwrap();
        let err = service
            .create_favorite(new_favorite("a", "x : 2"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Service(_)));
    }

    #[tokio::test]
    async fn test_update_unknown_favorite() {
        let service = MemorySearchService::new();
        assert!(service.update_favorite(42, "x").await.is_err());
    }
}
