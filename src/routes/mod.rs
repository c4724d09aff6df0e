use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::Config,
    error::{AppError, AppResult},
    middleware::{make_span_with_request_id, request_id_middleware},
    models::{Item, ItemId, Recommendation, Strategy},
    services::{vectorizer::DEFAULT_MAX_FEATURES, Catalog, PosterResolver, SessionStore, TmdbPosterProvider},
};

pub mod catalog;
pub mod recommendations;
pub mod sessions;

/// Shared state handed to every handler
pub struct AppState {
    /// Catalog snapshot loaded at startup, read-only afterwards
    pub catalog: Arc<Catalog>,
    pub sessions: SessionStore,
    pub posters: PosterResolver,
    pub pool_size: usize,
    pub max_features: usize,
}

impl AppState {
    /// State without poster lookups, using default sizes
    pub fn new(catalog: Catalog, placeholder: impl Into<String>) -> Self {
        Self {
            catalog: Arc::new(catalog),
            sessions: SessionStore::new(),
            posters: PosterResolver::new(None, placeholder.into()),
            pool_size: 20,
            max_features: DEFAULT_MAX_FEATURES,
        }
    }

    pub fn from_config(config: &Config, catalog: Catalog) -> AppResult<Self> {
        let provider = match config.tmdb_api_key.as_deref() {
            Some(key) if !key.is_empty() => {
                let provider = TmdbPosterProvider::new(
                    key.to_string(),
                    config.tmdb_api_url.clone(),
                    config.tmdb_image_url.clone(),
                )?;
                Some(Arc::new(provider) as Arc<dyn crate::services::PosterProvider>)
            }
            _ => {
                tracing::info!("TMDB_API_KEY not set, poster lookups disabled");
                None
            }
        };

        Ok(Self {
            catalog: Arc::new(catalog),
            sessions: SessionStore::with_ttl_secs(config.session_ttl_secs),
            posters: PosterResolver::new(provider, config.placeholder_poster.clone()),
            pool_size: config.pool_size,
            max_features: config.max_features,
        })
    }

    /// Runs a ranking strategy off the async executor
    pub async fn rank(
        &self,
        strategy: Strategy,
        catalog: Arc<Catalog>,
        liked: Vec<ItemId>,
        top_k: usize,
    ) -> AppResult<Vec<Recommendation>> {
        let ranker = strategy.ranker(self.max_features);
        let recommendations =
            tokio::task::spawn_blocking(move || ranker.rank(&catalog, &liked, top_k))
                .await
                .map_err(|e| AppError::Internal(e.to_string()))??;

        let mut resolved = Vec::with_capacity(recommendations.len());
        for mut rec in recommendations {
            rec.item.poster = Some(self.posters.resolve(&rec.item).await);
            resolved.push(rec);
        }
        Ok(resolved)
    }

    pub async fn with_posters(&self, items: Vec<Item>) -> Vec<Item> {
        self.posters.attach(items).await
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/catalog", get(catalog::list))
        .route("/catalog/:id", get(catalog::get_item))
        .route("/recommendations", post(recommendations::recommend))
        .route("/sessions", post(sessions::create))
        .route("/sessions/:id", get(sessions::get_session))
        .route("/sessions/:id/settings", put(sessions::update_settings))
        .route("/sessions/:id/start", post(sessions::start))
        .route("/sessions/:id/pool", get(sessions::pool))
        .route("/sessions/:id/selections", post(sessions::select))
        .route("/sessions/:id/retry", post(sessions::retry))
        .route("/sessions/:id/recommendations", get(sessions::recommendations))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
