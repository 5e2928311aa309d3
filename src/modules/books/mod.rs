pub mod models;
pub mod repo;
pub mod routes;

use async_trait::async_trait;
use axum::Router;
use serde_json::json;
use shelf_kernel::{InitCtx, Migration, Module};

use crate::state::AppState;

/// Books a user has read, and their genre tags
pub struct BooksModule {
    state: AppState,
}

impl BooksModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
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
                "/newbook": {
                    "get": { "summary": "New book form", "tags": ["Books"], "responses": gated },
                    "post": {
                        "summary": "Record a finished book; the page says \"New Book Created\" on success",
                        "tags": ["Books"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/x-www-form-urlencoded": {
                                    "schema": { "$ref": "#/components/schemas/BookForm" }
                                }
                            }
                        },
                        "responses": gated
                    }
                },
                "/viewbooks": {
                    "get": {
                        "summary": "The current user's books with their genres",
                        "tags": ["Books"],
                        "responses": gated
                    }
                }
            },
            "components": {
                "schemas": {
                    "BookForm": {
                        "type": "object",
                        "properties": {
                            "bookName": { "type": "string", "minLength": 1 },
                            "bookRating": { "type": "integer", "format": "int64" },
                            "bookNotes": { "type": "string", "minLength": 1 },
                            "dateFinished": { "type": "string", "format": "date" },
                            "genres": {
                                "type": "array",
                                "items": { "type": "integer", "format": "int64" },
                                "description": "Genre ids, attached in the order given"
                            }
                        },
                        "required": ["bookName", "bookRating", "bookNotes"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![
            Migration {
                id: "001_books",
                up: r#"
                    CREATE TABLE books (
                        id            INTEGER PRIMARY KEY AUTOINCREMENT,
                        book_name     TEXT NOT NULL CHECK (book_name <> ''),
                        book_rating   INTEGER NOT NULL,
                        book_notes    TEXT NOT NULL CHECK (book_notes <> ''),
                        date_finished DATE,
                        book_reader   TEXT NOT NULL
                    );
                    CREATE INDEX books_book_reader ON books (book_reader);
                    "#,
            },
            // `genres` is created by its own module; SQLite resolves the
            // reference when rows are written.
            Migration {
                id: "002_book_genres",
                up: r#"
                    CREATE TABLE book_genres (
                        id       INTEGER PRIMARY KEY AUTOINCREMENT,
                        book_id  INTEGER NOT NULL REFERENCES books (id) ON DELETE CASCADE,
                        genre_id INTEGER NOT NULL REFERENCES genres (id) ON DELETE CASCADE
                    );
                    CREATE INDEX book_genres_book_id ON book_genres (book_id);
                    CREATE INDEX book_genres_genre_id ON book_genres (genre_id);
                    "#,
            },
        ]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new(state))
}
