pub mod models;
pub mod repo;
pub mod routes;

use async_trait::async_trait;
use axum::Router;
use serde_json::json;
use shelf_kernel::{InitCtx, Migration, Module};

use crate::state::AppState;

/// Accounts: sign-up, login, password changes, logout
pub struct AuthModule {
    state: AppState,
}

impl AuthModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for AuthModule {
    fn name(&self) -> &'static str {
        "auth"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            cookie = %ctx.settings.auth.session_cookie_name,
            "auth module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let html = json!({ "description": "HTML page", "content": { "text/html": {} } });
        let form = |schema: &str| {
            json!({
                "required": true,
                "content": {
                    "application/x-www-form-urlencoded": {
                        "schema": { "$ref": format!("#/components/schemas/{schema}") }
                    }
                }
            })
        };

        Some(json!({
            "paths": {
                "/signUp": {
                    "get": { "summary": "Sign-up form", "tags": ["Auth"], "responses": { "200": html } },
                    "post": {
                        "summary": "Create an account",
                        "tags": ["Auth"],
                        "requestBody": form("Credentials"),
                        "responses": { "200": html }
                    }
                },
                "/login": {
                    "get": { "summary": "Login form", "tags": ["Auth"], "responses": { "200": html } },
                    "post": {
                        "summary": "Log in; the page says \"logged in\" on success and sets the session cookie",
                        "tags": ["Auth"],
                        "requestBody": form("Credentials"),
                        "responses": { "200": html }
                    }
                },
                "/changePassword": {
                    "get": { "summary": "Change-password form", "tags": ["Auth"], "responses": { "200": html } },
                    "post": {
                        "summary": "Change a password given the old one",
                        "tags": ["Auth"],
                        "requestBody": form("ChangePassword"),
                        "responses": { "200": html }
                    }
                },
                "/logout": {
                    "get": {
                        "summary": "End the current session",
                        "tags": ["Auth"],
                        "responses": {
                            "200": html,
                            "401": {
                                "description": "No session",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Credentials": {
                        "type": "object",
                        "properties": {
                            "userName": { "type": "string" },
                            "password": { "type": "string" }
                        },
                        "required": ["userName", "password"]
                    },
                    "ChangePassword": {
                        "type": "object",
                        "properties": {
                            "userName": { "type": "string" },
                            "oldPassword": { "type": "string" },
                            "newPassword": { "type": "string" }
                        },
                        "required": ["userName", "oldPassword", "newPassword"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_users",
            up: r#"
                CREATE TABLE users (
                    user_name TEXT PRIMARY KEY NOT NULL,
                    password  TEXT NOT NULL
                );
                "#,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "auth module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "auth module stopped");
        Ok(())
    }
}

/// Create a new instance of the auth module
pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(AuthModule::new(state))
}
