//! Poster lookup for items whose catalog entry has no image.
//!
//! The TMDB provider is optional. Any failure while talking to it is logged
//! and treated as "no poster", so the resolver always yields something the
//! client can display.

use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::{Item, ItemId},
};

/// Source of poster URLs keyed by item id
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PosterProvider: Send + Sync {
    /// Returns the poster URL, or `None` when the provider has no image
    async fn fetch_poster(&self, id: ItemId) -> AppResult<Option<String>>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Subset of TMDB's `GET /movie/{id}` response
#[derive(Debug, Deserialize)]
struct TmdbMovieDetails {
    #[serde(default)]
    poster_path: Option<String>,
}

fn poster_url(image_base_url: &str, details: TmdbMovieDetails) -> Option<String> {
    details
        .poster_path
        .map(|path| format!("{}/{}", image_base_url.trim_end_matches('/'), path.trim_start_matches('/')))
}

/// TMDB-backed poster provider with an in-memory memo
pub struct TmdbPosterProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    image_base_url: String,
    memo: RwLock<HashMap<ItemId, Option<String>>>,
}

impl TmdbPosterProvider {
    pub fn new(api_key: String, api_url: String, image_base_url: String) -> AppResult<Self> {
        if api_key.is_empty() {
            return Err(AppError::InvalidInput("TMDB API key is empty".to_string()));
        }

        let http_client = HttpClient::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url,
            image_base_url,
            memo: RwLock::new(HashMap::new()),
        })
    }

    async fn call_api(&self, id: ItemId) -> AppResult<Option<String>> {
        let url = format!("{}/movie/{}", self.api_url, id);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("language", "en-US")])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB returned status {}: {}",
                status, body
            )));
        }

        let details: TmdbMovieDetails = response.json().await?;
        Ok(poster_url(&self.image_base_url, details))
    }
}

#[async_trait::async_trait]
impl PosterProvider for TmdbPosterProvider {
    async fn fetch_poster(&self, id: ItemId) -> AppResult<Option<String>> {
        if let Some(cached) = self.memo.read().await.get(&id) {
            tracing::debug!(item_id = %id, "Poster memo hit");
            return Ok(cached.clone());
        }

        let poster = self.call_api(id).await?;
        self.memo.write().await.insert(id, poster.clone());
        Ok(poster)
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

/// Picks the image shown for an item
#[derive(Clone)]
pub struct PosterResolver {
    provider: Option<Arc<dyn PosterProvider>>,
    placeholder: String,
}

impl PosterResolver {
    pub fn new(provider: Option<Arc<dyn PosterProvider>>, placeholder: String) -> Self {
        Self {
            provider,
            placeholder,
        }
    }

    /// Catalog poster first, then the provider, then the placeholder
    pub async fn resolve(&self, item: &Item) -> String {
        if let Some(poster) = &item.poster {
            return poster.clone();
        }

        if let Some(provider) = &self.provider {
            match provider.fetch_poster(item.id).await {
                Ok(Some(url)) => return url,
                Ok(None) => {
                    tracing::debug!(item_id = %item.id, provider = provider.name(), "No poster found");
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        item_id = %item.id,
                        provider = provider.name(),
                        "Poster fetch failed"
                    );
                }
            }
        }

        self.placeholder.clone()
    }

    /// Fills in the poster of every item
    pub async fn attach(&self, items: Vec<Item>) -> Vec<Item> {
        let mut resolved = Vec::with_capacity(items.len());
        for mut item in items {
            let poster = self.resolve(&item).await;
            item.poster = Some(poster);
            resolved.push(item);
        }
        resolved
    }
}
