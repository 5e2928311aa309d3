use axum::extract::FromRef;
use sqlx::SqlitePool;

use shelf_authz::SessionStore;

/// Shared handles every module router is built with.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub sessions: SessionStore,
}

impl FromRef<AppState> for SessionStore {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}
