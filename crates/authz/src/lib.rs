//! Login gate for shelf: server-side sessions, the session cookie, and the
//! `CurrentUser` extractor that turns a missing session into `401`.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;

use shelf_http::error::AppError;
use shelf_kernel::{InitCtx, Migration, Module};

pub mod session;

pub use session::{Session, SessionStore};

/// Schema for the `sessions` table; `expires_at` is a unix timestamp.
pub const SESSIONS_MIGRATION: &str = r#"
    CREATE TABLE sessions (
        token      TEXT PRIMARY KEY NOT NULL,
        user_name  TEXT NOT NULL,
        created_at TIMESTAMP NOT NULL,
        expires_at INTEGER NOT NULL
    );
    CREATE INDEX sessions_user_name ON sessions (user_name);
"#;

/// The logged-in user behind the request's session cookie.
///
/// Handlers that take this extractor are only reachable with a live session;
/// anything else is rejected with `401 Unauthorized`.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_name: String,
    pub token: String,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    SessionStore: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let store = SessionStore::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);

        let Some(token) = jar.get(store.cookie_name()).map(|c| c.value().to_string()) else {
            return Err(AppError::unauthorized("login required"));
        };

        match store.resolve(&token).await? {
            Some(user_name) => Ok(CurrentUser { user_name, token }),
            None => Err(AppError::unauthorized("session expired or unknown")),
        }
    }
}

/// Core module owning the `sessions` table.
pub struct AuthzModule {
    store: SessionStore,
}

impl AuthzModule {
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for AuthzModule {
    fn name(&self) -> &'static str {
        "authz"
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_sessions",
            up: SESSIONS_MIGRATION,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let purged = self.store.purge_expired().await?;
        tracing::info!(module = self.name(), purged, "expired sessions purged");
        Ok(())
    }
}

pub fn create_module(store: SessionStore) -> Arc<dyn Module> {
    Arc::new(AuthzModule::new(store))
}
