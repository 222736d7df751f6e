use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    config::Config,
    engine::{ActiveSession, EngineError},
    models::participant::Participant,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub sessions: SessionHub,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        Self {
            pool,
            config,
            sessions: SessionHub::default(),
        }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for SessionHub {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

/// The single running session and the roster of people who joined it.
/// Both sit behind one lock so a session swap and its roster reset are a single step.
#[derive(Clone, Default)]
pub struct SessionHub {
    inner: Arc<RwLock<LiveState>>,
}

#[derive(Default)]
struct LiveState {
    session: Option<Arc<ActiveSession>>,
    roster: Vec<Participant>,
}

impl SessionHub {
    /// Replaces the running session. Views and roster of the previous one are dropped.
    pub async fn start(&self, session: ActiveSession) {
        let mut live = self.inner.write().await;
        live.session = Some(Arc::new(session));
        live.roster.clear();
    }

    pub async fn current(&self) -> Result<Arc<ActiveSession>, EngineError> {
        self.inner
            .read()
            .await
            .session
            .clone()
            .ok_or(EngineError::NoActiveSession)
    }

    pub async fn join(&self, name: String) -> Participant {
        let participant = Participant {
            id: Uuid::new_v4().to_string(),
            name,
        };
        self.inner.write().await.roster.push(participant.clone());
        participant
    }

    pub async fn participants(&self) -> Vec<Participant> {
        self.inner.read().await.roster.clone()
    }

    pub async fn participant_name(&self, id: &str) -> Option<String> {
        self.inner
            .read()
            .await
            .roster
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.name.clone())
    }
}
