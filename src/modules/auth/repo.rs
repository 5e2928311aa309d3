//! Queries against the `users` table.

use anyhow::Context;
use sqlx::SqlitePool;

use super::models::User;

pub async fn create_user(pool: &SqlitePool, user: &User) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO users (user_name, password) VALUES (?, ?)")
        .bind(&user.user_name)
        .bind(&user.password)
        .execute(pool)
        .await
        .with_context(|| format!("failed to insert user '{}'", user.user_name))?;
    Ok(())
}

pub async fn find_user(pool: &SqlitePool, user_name: &str) -> anyhow::Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT user_name, password FROM users WHERE user_name = ?")
        .bind(user_name)
        .fetch_optional(pool)
        .await
        .context("failed to look up user")
}

/// Every user, in sign-up order.
pub async fn all_users(pool: &SqlitePool) -> anyhow::Result<Vec<User>> {
    sqlx::query_as::<_, User>("SELECT user_name, password FROM users ORDER BY rowid")
        .fetch_all(pool)
        .await
        .context("failed to list users")
}

/// True when a user with exactly this name and password exists.
pub async fn verify_credentials(
    pool: &SqlitePool,
    user_name: &str,
    password: &str,
) -> anyhow::Result<bool> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM users WHERE user_name = ? AND password = ?")
            .bind(user_name)
            .bind(password)
            .fetch_optional(pool)
            .await
            .context("failed to check credentials")?;
    Ok(found.is_some())
}

/// Replace the password only if `old_password` matches. Returns whether a
/// row changed.
pub async fn change_password(
    pool: &SqlitePool,
    user_name: &str,
    old_password: &str,
    new_password: &str,
) -> anyhow::Result<bool> {
    let result =
        sqlx::query("UPDATE users SET password = ? WHERE user_name = ? AND password = ?")
            .bind(new_password)
            .bind(user_name)
            .bind(old_password)
            .execute(pool)
            .await
            .with_context(|| format!("failed to update password for '{user_name}'"))?;
    Ok(result.rows_affected() == 1)
}
