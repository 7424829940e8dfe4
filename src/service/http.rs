use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{FavoriteRecord, HistoryRecord, NewFavorite, SearchService};
use crate::catalog::SearchType;
use crate::Error;

/// Response envelope used by every backend endpoint.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    result: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Serialize)]
struct RenameBody<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct ValidateBody<'a> {
    query_string: &'a str,
    search_type: SearchType,
}

/// [`SearchService`] backed by the monitoring backend's REST API.
#[derive(Debug, Clone)]
pub struct HttpSearchService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSearchService {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request and unwrap the envelope, requiring `result: true`.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<Option<T>, Error> {
        let envelope: Envelope<T> = self.send_envelope(request, url).await?;
        if !envelope.result {
            return Err(Error::Service(envelope.message));
        }
        Ok(envelope.data)
    }

    async fn send_envelope<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<Envelope<T>, Error> {
        let resp = request.send().await?;
        if !resp.status().is_success() {
            return Err(Error::Status {
                status: resp.status().as_u16(),
                url: url.to_string(),
            });
        }
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn favorite_url(&self, id: Option<i64>) -> String {
        match id {
            Some(id) => format!("{}/search_favorite/{}/", self.base_url, id),
            None => format!("{}/search_favorite/", self.base_url),
        }
    }
}

#[async_trait]
impl SearchService for HttpSearchService {
    async fn list_history(&self, search_type: SearchType) -> Result<Vec<HistoryRecord>, Error> {
        let url = format!("{}/search_history/", self.base_url);
        tracing::debug!(url = %url, %search_type, "listing search history");
        let request = self
            .client
            .get(&url)
            .query(&[("search_type", search_type.as_str())]);
        Ok(self.send(request, &url).await?.unwrap_or_default())
    }

    async fn list_favorites(&self, search_type: SearchType) -> Result<Vec<FavoriteRecord>, Error> {
        let url = self.favorite_url(None);
        tracing::debug!(url = %url, %search_type, "listing favorites");
        let request = self
            .client
            .get(&url)
            .query(&[("search_type", search_type.as_str())]);
        Ok(self.send(request, &url).await?.unwrap_or_default())
    }

    async fn create_favorite(&self, favorite: NewFavorite) -> Result<FavoriteRecord, Error> {
        let url = self.favorite_url(None);
        tracing::info!(url = %url, name = %favorite.name, "creating favorite");
        let request = self.client.post(&url).json(&favorite);
        self.send(request, &url)
            .await?
            .ok_or_else(|| Error::Service("favorite creation returned no data".to_string()))
    }

    async fn update_favorite(&self, id: i64, name: &str) -> Result<FavoriteRecord, Error> {
        let url = self.favorite_url(Some(id));
        tracing::info!(url = %url, id, name, "renaming favorite");
        let request = self.client.patch(&url).json(&RenameBody { name });
        self.send(request, &url)
            .await?
            .ok_or_else(|| Error::Service("favorite update returned no data".to_string()))
    }

    async fn destroy_favorite(&self, id: i64) -> Result<(), Error> {
        let url = self.favorite_url(Some(id));
        tracing::info!(url = %url, id, "deleting favorite");
        let request = self.client.delete(&url);
        self.send::<serde_json::Value>(request, &url).await?;
        Ok(())
    }

    async fn validate(&self, query_string: &str, search_type: SearchType) -> Result<bool, Error> {
        let url = format!("{}/validate_query_string/", self.base_url);
        tracing::debug!(url = %url, %search_type, "validating query");
        let request = self.client.post(&url).json(&ValidateBody {
            query_string,
            search_type,
        });
        // A rejected query is reported through `result`, not as a failure.
        let envelope: Envelope<serde_json::Value> = self.send_envelope(request, &url).await?;
        Ok(envelope.result)
    }
}
