//! shelf application library
//!
//! Wires the auth, genres and books modules onto the kernel, runs their
//! migrations and exposes the resulting HTTP router.

use anyhow::Context;
use axum::Router;
use sqlx::SqlitePool;

use shelf_authz::SessionStore;
use shelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

pub mod modules;
pub mod state;
pub mod utils;
pub mod validation;

pub use state::AppState;

/// A migrated, started application ready to serve.
pub struct App {
    pub settings: Settings,
    pub state: AppState,
    pub registry: ModuleRegistry,
}

/// Registry holding the session core module and every application module
pub fn build_registry(state: &AppState) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, state);
    registry
}

/// Connect to the configured database, then boot the app on it
pub async fn bootstrap(settings: Settings) -> anyhow::Result<App> {
    let pool = shelf_db::connect(&settings.database).await?;
    bootstrap_with_pool(settings, pool).await
}

/// Initialize modules, apply pending migrations and start modules on `pool`
pub async fn bootstrap_with_pool(settings: Settings, pool: SqlitePool) -> anyhow::Result<App> {
    let state = AppState {
        sessions: SessionStore::new(pool.clone(), &settings.auth),
        db: pool,
    };
    let registry = build_registry(&state);

    let ctx = InitCtx {
        settings: &settings,
        db: &state.db,
    };
    registry.init_all(&ctx).await?;

    let applied = shelf_db::run_migrations(&state.db, &registry.collect_migrations())
        .await
        .context("failed to migrate database")?;
    tracing::info!(applied, "database schema up to date");

    registry.start_all(&ctx).await?;

    tracing::info!(
        env = ?settings.environment,
        modules = registry.modules().len(),
        "shelf bootstrap complete"
    );

    Ok(App {
        settings,
        state,
        registry,
    })
}

/// Apply pending migrations without starting anything. Returns how many ran.
pub async fn migrate(settings: &Settings) -> anyhow::Result<usize> {
    let pool = shelf_db::connect(&settings.database).await?;
    let state = AppState {
        sessions: SessionStore::new(pool.clone(), &settings.auth),
        db: pool,
    };
    let registry = build_registry(&state);

    shelf_db::run_migrations(&state.db, &registry.collect_migrations()).await
}

impl App {
    /// The full HTTP surface: module routes, docs and middleware
    pub fn router(&self) -> Router {
        shelf_http::build_router(&self.registry, &self.settings)
    }

    /// Serve until Ctrl-C, then stop every module
    pub async fn serve(self) -> anyhow::Result<()> {
        let router = self.router();
        shelf_http::start_server(router, &self.settings, shutdown_signal()).await?;

        self.registry.stop_all().await?;
        self.state.db.close().await;
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
pub(crate) mod test_support {
    use sqlx::SqlitePool;

    use shelf_kernel::settings::Settings;

    /// An in-memory database with every module's schema applied
    pub async fn migrated_pool() -> SqlitePool {
        let pool = shelf_db::connect_in_memory().await.unwrap();
        let app = crate::bootstrap_with_pool(Settings::default(), pool)
            .await
            .unwrap();
        app.state.db
    }
}
