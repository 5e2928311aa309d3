pub mod models;
pub mod repo;
pub mod routes;

use async_trait::async_trait;
use axum::Router;
use serde_json::json;
use shelf_kernel::{InitCtx, Migration, Module};

use crate::state::AppState;

/// Genres and the genre listing
pub struct GenresModule {
    state: AppState,
}

impl GenresModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for GenresModule {
    fn name(&self) -> &'static str {
        "genres"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "genres module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let gated = json!({
            "200": { "description": "HTML page", "content": { "text/html": {} } },
            "401": {
                "description": "Login required",
                "content": {
                    "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } }
                }
            }
        });

        Some(json!({
            "paths": {
                "/newgenre": {
                    "get": { "summary": "New genre form", "tags": ["Genres"], "responses": gated },
                    "post": {
                        "summary": "Create a genre; the page says \"New Genre Created\" on success",
                        "tags": ["Genres"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/x-www-form-urlencoded": {
                                    "schema": { "$ref": "#/components/schemas/GenreForm" }
                                }
                            }
                        },
                        "responses": gated
                    }
                },
                "/viewgenres": {
                    "get": {
                        "summary": "All genres with the books tagged with each",
                        "tags": ["Genres"],
                        "responses": gated
                    }
                }
            },
            "components": {
                "schemas": {
                    "GenreForm": {
                        "type": "object",
                        "properties": {
                            "genreName": { "type": "string", "minLength": 1 },
                            "genreDescription": { "type": "string" }
                        },
                        "required": ["genreName"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_genres",
            up: r#"
                CREATE TABLE genres (
                    id                INTEGER PRIMARY KEY AUTOINCREMENT,
                    genre_name        TEXT NOT NULL CHECK (genre_name <> ''),
                    genre_description TEXT NOT NULL DEFAULT ''
                );
                "#,
        }]
    }
}

/// Create a new instance of the genres module
pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(GenresModule::new(state))
}
