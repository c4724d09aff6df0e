use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Item, ItemId, YearRange},
    routes::AppState,
};

const DEFAULT_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    min_year: Option<i32>,
    max_year: Option<i32>,
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    /// Items matching the filter, before `limit` applies
    pub total: usize,
    pub items: Vec<Item>,
}

/// Handler for browsing the catalog by year
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CatalogQuery>,
) -> AppResult<Json<CatalogResponse>> {
    let years = YearRange::new(
        query.min_year.unwrap_or(i32::MIN),
        query.max_year.unwrap_or(i32::MAX),
    );
    if years.min > years.max {
        return Err(AppError::InvalidInput(
            "min_year must not exceed max_year".to_string(),
        ));
    }

    let view = state.catalog.view(years, &[]);
    let items: Vec<Item> = view
        .items()
        .iter()
        .take(query.limit.unwrap_or(DEFAULT_LIMIT))
        .cloned()
        .collect();

    Ok(Json(CatalogResponse {
        total: view.len(),
        items: state.with_posters(items).await,
    }))
}

/// Handler for a single catalog item
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> AppResult<Json<Item>> {
    let item = state
        .catalog
        .get(ItemId(id))
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("item {}", id)))?;

    let mut items = state.with_posters(vec![item]).await;
    items
        .pop()
        .map(Json)
        .ok_or_else(|| AppError::Internal("poster resolution dropped the item".to_string()))
}
