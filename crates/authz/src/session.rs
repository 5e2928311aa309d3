//! Server-side session records keyed by an opaque cookie token.

use std::sync::Arc;

use anyhow::Context;
use axum_extra::extract::cookie::{Cookie, SameSite};
use sqlx::SqlitePool;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use shelf_kernel::settings::AuthSettings;

/// A freshly issued session.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_name: String,
    pub expires_at: OffsetDateTime,
}

/// Handle to the `sessions` table plus the cookie conventions around it.
#[derive(Clone)]
pub struct SessionStore {
    pool: SqlitePool,
    cookie_name: Arc<str>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(pool: SqlitePool, settings: &AuthSettings) -> Self {
        Self {
            pool,
            cookie_name: Arc::from(settings.session_cookie_name.as_str()),
            ttl: Duration::minutes(settings.session_ttl_minutes.max(1)),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Issue a new session for `user_name`.
    pub async fn create(&self, user_name: &str) -> anyhow::Result<Session> {
        let token = Uuid::new_v4().to_string();
        let now = OffsetDateTime::now_utc();
        let expires_at = now + self.ttl;

        sqlx::query(
            "INSERT INTO sessions (token, user_name, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&token)
        .bind(user_name)
        .bind(now)
        .bind(expires_at.unix_timestamp())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to create session for '{user_name}'"))?;

        Ok(Session {
            token,
            user_name: user_name.to_string(),
            expires_at,
        })
    }

    /// Look up the user behind `token`. Expired sessions are deleted and
    /// reported as absent.
    pub async fn resolve(&self, token: &str) -> anyhow::Result<Option<String>> {
        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT user_name, expires_at FROM sessions WHERE token = ?")
                .bind(token)
                .fetch_optional(&self.pool)
                .await
                .context("failed to read session")?;

        match row {
            Some((user_name, expires_at))
                if expires_at > OffsetDateTime::now_utc().unix_timestamp() =>
            {
                Ok(Some(user_name))
            }
            Some((user_name, _)) => {
                tracing::debug!(%user_name, "session expired");
                self.revoke(token).await?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub async fn revoke(&self, token: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await
            .context("failed to delete session")?;
        Ok(())
    }

    /// Delete every expired session, returning how many were removed.
    pub async fn purge_expired(&self) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(OffsetDateTime::now_utc().unix_timestamp())
            .execute(&self.pool)
            .await
            .context("failed to purge sessions")?;
        Ok(result.rows_affected())
    }

    /// Cookie carrying `session` back to the browser.
    pub fn cookie(&self, session: &Session) -> Cookie<'static> {
        Cookie::build((self.cookie_name.to_string(), session.token.clone()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(self.ttl)
            .build()
    }

    /// Cookie that clears the session cookie.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build(self.cookie_name.to_string()).path("/").build()
    }
}
