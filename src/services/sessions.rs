use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{SelectionSession, SessionSettings},
};

/// Idle time after which a session is dropped
pub const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

const MAX_SESSION_TTL_SECS: i64 = 365 * 24 * 3600;

/// In-memory registry of selection sessions.
///
/// Sessions untouched for longer than the TTL are evicted on every `create`
/// and by `purge_expired`.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, SelectionSession>>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl_secs(DEFAULT_SESSION_TTL_SECS)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl_secs(ttl_secs: u64) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::seconds(
                i64::try_from(ttl_secs).map_or(MAX_SESSION_TTL_SECS, |s| s.min(MAX_SESSION_TTL_SECS)),
            ),
        }
    }

    pub async fn create(&self, settings: SessionSettings) -> AppResult<SelectionSession> {
        let session = SelectionSession::new(settings)?;
        let mut sessions = self.inner.write().await;
        Self::evict_idle(&mut sessions, self.ttl);
        sessions.insert(session.id, session.clone());
        tracing::info!(session_id = %session.id, "Created selection session");
        Ok(session)
    }

    /// Drops sessions idle for longer than the TTL, returning how many went
    pub async fn purge_expired(&self) -> usize {
        let removed = Self::evict_idle(&mut *self.inner.write().await, self.ttl);
        if removed > 0 {
            tracing::info!(removed, "Evicted idle sessions");
        }
        removed
    }

    fn evict_idle(sessions: &mut HashMap<Uuid, SelectionSession>, ttl: Duration) -> usize {
        let cutoff = Utc::now() - ttl;
        let before = sessions.len();
        sessions.retain(|_, session| session.updated_at >= cutoff);
        before - sessions.len()
    }

    /// Snapshot of a session
    pub async fn get(&self, id: Uuid) -> AppResult<SelectionSession> {
        self.inner
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("session {}", id)))
    }

    /// Applies `f` to the session under the write lock and returns its result
    pub async fn update<T, F>(&self, id: Uuid, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut SelectionSession) -> AppResult<T>,
    {
        let mut sessions = self.inner.write().await;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("session {}", id)))?;
        f(session)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}
