use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{ItemId, Recommendation, Strategy, YearRange},
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub liked_ids: Vec<ItemId>,
    pub top_k: usize,
    #[serde(default)]
    pub strategy: Strategy,
    /// Restricts the catalog before ranking
    #[serde(default)]
    pub years: Option<YearRange>,
}

/// Handler for stateless recommendations
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<Vec<Recommendation>>> {
    tracing::info!(
        request_id = %request_id,
        liked_count = request.liked_ids.len(),
        top_k = request.top_k,
        strategy = ?request.strategy,
        "Processing recommendation request"
    );

    let catalog = match request.years {
        Some(years) => Arc::new(state.catalog.view(years, &[])),
        None => Arc::clone(&state.catalog),
    };

    let recommendations = state
        .rank(request.strategy, catalog, request.liked_ids, request.top_k)
        .await?;

    tracing::info!(
        request_id = %request_id,
        returned = recommendations.len(),
        "Recommendations ready"
    );

    Ok(Json(recommendations))
}
