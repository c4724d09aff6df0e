use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        AddOutcome, Item, ItemId, Recommendation, SelectionSession, SessionPhase,
        SessionSettings, Strategy,
    },
    routes::AppState,
};

// Request/Response types

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub phase: SessionPhase,
    pub settings: SessionSettings,
    pub liked_ids: Vec<ItemId>,
    pub selected_count: usize,
    pub remaining: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&SelectionSession> for SessionResponse {
    fn from(session: &SelectionSession) -> Self {
        Self {
            id: session.id,
            phase: session.phase,
            settings: session.settings,
            liked_ids: session.liked().to_vec(),
            selected_count: session.selected_count(),
            remaining: session
                .settings
                .input_len
                .saturating_sub(session.selected_count()),
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PoolQuery {
    size: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct PoolResponse {
    pub session: SessionResponse,
    pub items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    pub item_id: ItemId,
    /// Client-generated token; replays of the same token are ignored
    pub event_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    pub outcome: AddOutcome,
    pub session: SessionResponse,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecommendationQuery {
    #[serde(default)]
    strategy: Strategy,
}

#[derive(Debug, Serialize)]
pub struct SessionRecommendations {
    pub strategy: Strategy,
    /// Baseline picks drawn uniformly from unseen items
    pub random: Vec<Recommendation>,
    pub recommended: Vec<Recommendation>,
}

// Handlers

/// Create a selection session
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<SessionSettings>,
) -> AppResult<(StatusCode, Json<SessionResponse>)> {
    let session = state.sessions.create(settings).await?;
    Ok((StatusCode::CREATED, Json(SessionResponse::from(&session))))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SessionResponse>> {
    let session = state.sessions.get(id).await?;
    Ok(Json(SessionResponse::from(&session)))
}

pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(settings): Json<SessionSettings>,
) -> AppResult<Json<SessionResponse>> {
    let response = state
        .sessions
        .update(id, |session| {
            session.update_settings(settings)?;
            Ok(SessionResponse::from(&*session))
        })
        .await?;
    Ok(Json(response))
}

pub async fn start(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SessionResponse>> {
    let response = state
        .sessions
        .update(id, |session| {
            session.start()?;
            Ok(SessionResponse::from(&*session))
        })
        .await?;
    tracing::info!(session_id = %id, "Selection started");
    Ok(Json(response))
}

/// Sample of movies the user can pick from
pub async fn pool(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<PoolQuery>,
) -> AppResult<Json<PoolResponse>> {
    let session = state.sessions.get(id).await?;
    if session.phase != SessionPhase::Selecting {
        return Err(AppError::Conflict(format!(
            "pool is only available while selecting, session is {:?}",
            session.phase
        )));
    }

    let size = query.size.unwrap_or(state.pool_size);
    if size == 0 {
        return Err(AppError::InvalidInput("size must be at least 1".to_string()));
    }

    let view = state.catalog.view(session.settings.years, session.liked());
    let picks = view.sample(size, &[], &mut rand::thread_rng());

    tracing::debug!(session_id = %id, offered = picks.len(), "Sampled pick pool");

    Ok(Json(PoolResponse {
        session: SessionResponse::from(&session),
        items: state.with_posters(picks).await,
    }))
}

/// Record a liked movie
pub async fn select(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<SelectionRequest>,
) -> AppResult<Json<SelectionResponse>> {
    let settings = state.sessions.get(id).await?.settings;
    let item = state
        .catalog
        .get(request.item_id)
        .ok_or(AppError::UnknownItem(request.item_id))?;
    if !settings.years.contains(item.year) {
        return Err(AppError::InvalidInput(format!(
            "item {} is outside the session's year range",
            request.item_id
        )));
    }

    let response = state
        .sessions
        .update(id, |session| {
            let outcome = session.add_item(request.item_id, request.event_id)?;
            Ok(SelectionResponse {
                outcome,
                session: SessionResponse::from(&*session),
            })
        })
        .await?;

    tracing::info!(
        session_id = %id,
        item_id = %request.item_id,
        outcome = ?response.outcome,
        selected = response.session.selected_count,
        "Selection recorded"
    );

    Ok(Json(response))
}

/// Reset the session so the user can start over
pub async fn retry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SessionResponse>> {
    let response = state
        .sessions
        .update(id, |session| {
            session.reset();
            Ok(SessionResponse::from(&*session))
        })
        .await?;
    tracing::info!(session_id = %id, "Session reset");
    Ok(Json(response))
}

/// Random baseline plus ranked recommendations for a complete session
pub async fn recommendations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<RecommendationQuery>,
) -> AppResult<Json<SessionRecommendations>> {
    let session = state.sessions.get(id).await?;
    if !session.is_complete() {
        return Err(AppError::Conflict(format!(
            "{} more selections needed",
            session.settings.input_len.saturating_sub(session.selected_count())
        )));
    }

    let view = Arc::new(state.catalog.view(session.settings.years, &[]));
    let liked = session.liked().to_vec();
    let top_k = session.settings.top_k;

    let random = state
        .rank(Strategy::Random, Arc::clone(&view), liked.clone(), top_k)
        .await?;
    let recommended = state.rank(query.strategy, view, liked, top_k).await?;

    tracing::info!(
        session_id = %id,
        strategy = ?query.strategy,
        recommended = recommended.len(),
        "Session recommendations ready"
    );

    Ok(Json(SessionRecommendations {
        strategy: query.strategy,
        random,
        recommended,
    }))
}
