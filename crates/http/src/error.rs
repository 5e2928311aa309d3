//! Error handling for the shelf HTTP layer
//!
//! Business-rule failures (bad credentials, empty form fields) are rendered
//! as ordinary pages by the handlers. `AppError` is reserved for the cases
//! that do surface as an error status: the login gate, unknown routes,
//! unreadable form bodies, and storage failures on reads.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::{Form, FormRejection, WithRejection};
use serde::Serialize;
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use uuid::Uuid;

/// Form body extractor whose rejections use the JSON error envelope.
pub type FormBody<T> = WithRejection<Form<T>, AppError>;

/// Standard error response format for all HTTP errors
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub details: Vec<serde_json::Value>,
    pub trace_id: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("bad request: {message}")]
    BadRequest {
        details: Vec<serde_json::Value>,
        message: String,
    },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(details: Vec<serde_json::Value>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            details,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound { .. } => "not_found",
            AppError::Unauthorized { .. } => "unauthorized",
            AppError::BadRequest { .. } => "bad_request",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        Self::bad_request(
            vec![serde_json::json!({ "reason": rejection.body_text() })],
            "request body is not a readable form",
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let trace_id = Uuid::new_v4();
        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(
                error_id = %trace_id,
                error_code = code,
                error = ?self,
                "request failed"
            );
        } else {
            tracing::warn!(
                error_id = %trace_id,
                error_code = code,
                status_code = status.as_u16(),
                "request rejected"
            );
        }

        let (message, details) = match self {
            AppError::NotFound { message } | AppError::Unauthorized { message } => {
                (message, Vec::new())
            }
            AppError::BadRequest { details, message } => (message, details),
            // Internal details stay in the log outside debug builds
            AppError::Internal(e) if cfg!(debug_assertions) => (format!("{e:#}"), Vec::new()),
            AppError::Internal(_) => (
                "An internal server error occurred".to_string(),
                Vec::new(),
            ),
        };

        let body = ErrorEnvelope {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
                trace_id: trace_id.to_string(),
                timestamp,
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_unauthorized_mapping() {
        let response = AppError::unauthorized("login required").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_internal_error_mapping() {
        let error = AppError::from(anyhow::anyhow!("Database connection failed"));
        assert_eq!(error.code(), "internal_error");
        assert_eq!(
            error.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn form_rejection_becomes_bad_request() {
        use axum::{body::Body, extract::FromRequest, http::Request};

        #[derive(Debug, serde::Deserialize)]
        struct Fields {
            #[allow(dead_code)]
            name: String,
        }

        let request = Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from("{\"name\":\"x\"}"))
            .unwrap();
        let error = FormBody::<Fields>::from_request(request, &())
            .await
            .unwrap_err();
        assert_eq!(error.code(), "bad_request");

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"]["details"][0]["reason"].is_string());
    }

    #[tokio::test]
    async fn test_error_response_format() {
        let response = AppError::bad_request(
            vec![serde_json::json!({"field": "bookRating"})],
            "unreadable form",
        )
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "bad_request");
        assert_eq!(body["error"]["message"], "unreadable form");
        assert_eq!(body["error"]["details"][0]["field"], "bookRating");
        assert!(Uuid::parse_str(body["error"]["trace_id"].as_str().unwrap()).is_ok());
        assert!(body["error"]["timestamp"].is_string());
    }
}
