//! SQLite connection factory and migration runner for shelf.

use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use shelf_kernel::settings::DatabaseSettings;
use shelf_kernel::Migration;

const MIGRATION_LEDGER: &str = r#"
    CREATE TABLE IF NOT EXISTS schema_migrations (
        module     TEXT NOT NULL,
        id         TEXT NOT NULL,
        applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        PRIMARY KEY (module, id)
    )
"#;

/// Open a connection pool for the configured database.
///
/// In-memory URLs get a single long-lived connection, otherwise every new
/// connection would see its own empty database.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<SqlitePool> {
    let in_memory = is_in_memory(&settings.url);

    let mut options = SqliteConnectOptions::from_str(&settings.url)
        .with_context(|| format!("invalid database url '{}'", settings.url))?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));
    if !in_memory {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(settings.max_connections.max(1))
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .with_context(|| format!("failed to open database '{}'", settings.url))?;

    tracing::info!(target: "shelf-db", url = %settings.url, in_memory, "database opened");
    Ok(pool)
}

/// Open a fresh, private in-memory database.
pub async fn connect_in_memory() -> anyhow::Result<SqlitePool> {
    connect(&DatabaseSettings {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
    })
    .await
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Apply every migration not yet recorded in `schema_migrations`.
///
/// Each migration runs in its own transaction together with its ledger row,
/// so a failing migration leaves no partial schema behind. Returns the number
/// of migrations applied by this call.
pub async fn run_migrations(
    pool: &SqlitePool,
    migrations: &[(String, Migration)],
) -> anyhow::Result<usize> {
    sqlx::raw_sql(MIGRATION_LEDGER)
        .execute(pool)
        .await
        .with_context(|| "failed to create migration ledger")?;

    let mut applied = 0;
    for (module, migration) in migrations {
        let already: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM schema_migrations WHERE module = ? AND id = ?")
                .bind(module)
                .bind(migration.id)
                .fetch_optional(pool)
                .await?;
        if already.is_some() {
            tracing::debug!(target: "shelf-db", %module, id = migration.id, "migration already applied");
            continue;
        }

        let mut tx = pool.begin().await?;
        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("migration {}/{} failed", module, migration.id))?;
        sqlx::query("INSERT INTO schema_migrations (module, id) VALUES (?, ?)")
            .bind(module)
            .bind(migration.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(target: "shelf-db", %module, id = migration.id, "migration applied");
        applied += 1;
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<(String, Migration)> {
        vec![(
            "books".to_string(),
            Migration {
                id: "001_init",
                up: r#"
                    CREATE TABLE shelf_test (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
                    CREATE INDEX shelf_test_name ON shelf_test (name);
                "#,
            },
        )]
    }

    #[tokio::test]
    async fn migrations_apply_once() {
        let pool = connect_in_memory().await.unwrap();

        assert_eq!(run_migrations(&pool, &sample()).await.unwrap(), 1);
        assert_eq!(run_migrations(&pool, &sample()).await.unwrap(), 0);

        let recorded: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(recorded, 1);
    }

    #[tokio::test]
    async fn failed_migration_is_not_recorded() {
        let pool = connect_in_memory().await.unwrap();
        let broken = vec![(
            "broken".to_string(),
            Migration {
                id: "001_init",
                up: "CREATE TABLE ok_table (id INTEGER); CREATE TABLE;",
            },
        )];

        assert!(run_migrations(&pool, &broken).await.is_err());

        let recorded: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(recorded, 0);
    }

    #[tokio::test]
    async fn in_memory_pool_keeps_its_data() {
        let pool = connect_in_memory().await.unwrap();
        sqlx::query("CREATE TABLE kept (id INTEGER)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO kept (id) VALUES (1)")
            .execute(&pool)
            .await
            .unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM kept")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn detects_in_memory_urls() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite://file?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite://shelf.db?mode=rwc"));
    }
}
