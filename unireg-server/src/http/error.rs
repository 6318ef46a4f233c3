//! API error types with IntoResponse
//!
//! Errors are converted to `{ "success": false, "error": ... }` responses
//! with appropriate status codes.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::DbError;
use crate::fallback::Source;
use crate::models::ValidationError;

use super::server::AppState;

/// Message shown instead of internal details in production
const INTERNAL_MESSAGE: &str = "Internal server error";

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// No route for this method and path (404)
    RouteNotFound { method: String, path: String },

    /// Uniqueness violated (409)
    Conflict { message: String },

    /// Database unreachable on a write path (503)
    Unavailable { retry_after: Duration },

    /// Database error (500, logged)
    Database(DbError),

    /// Internal error (500)
    Internal { message: String },
}

/// Detail of a 500 response, attached for [`expose_internal_errors`].
#[derive(Debug, Clone)]
pub struct InternalDetail(pub String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body, detail) = match &self {
            Self::Validation(e) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "error": e.to_string() }),
                None,
            ),
            Self::NotFound { resource, id } => (
                StatusCode::NOT_FOUND,
                json!({
                    "success": false,
                    "error": format!("{} '{}' not found", resource, id)
                }),
                None,
            ),
            Self::RouteNotFound { method, path } => (
                StatusCode::NOT_FOUND,
                json!({
                    "success": false,
                    "error": "Route not found",
                    "message": format!("Cannot {} {}", method, path)
                }),
                None,
            ),
            Self::Conflict { message } => (
                StatusCode::CONFLICT,
                json!({ "success": false, "error": message }),
                None,
            ),
            Self::Unavailable { .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({
                    "success": false,
                    "error": "Database unavailable, the submission was not stored. Please retry later.",
                    "source": Source::Fallback
                }),
                None,
            ),
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!(error = %e, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "success": false, "error": INTERNAL_MESSAGE }),
                    Some(e.to_string()),
                )
            }
            Self::Internal { message } => {
                tracing::error!(%message, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "success": false, "error": INTERNAL_MESSAGE }),
                    Some(message.clone()),
                )
            }
        };

        let mut response = (status, Json(body)).into_response();

        if let Self::Unavailable { retry_after } = &self {
            let secs = retry_after.as_secs().max(1);
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        if let Some(detail) = detail {
            response.extensions_mut().insert(InternalDetail(detail));
        }

        response
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            DbError::Conflict { resource } => Self::Conflict {
                message: format!("{} already exists", resource),
            },
            _ => Self::Database(e),
        }
    }
}

/// Response middleware: outside production, 500 bodies carry the real cause.
pub async fn expose_internal_errors(
    State(state): State<Arc<AppState>>,
    mut response: Response,
) -> Response {
    let detail = response.extensions_mut().remove::<InternalDetail>();
    match detail {
        Some(InternalDetail(detail)) if !state.env.is_production() => {
            let status = response.status();
            (status, Json(json!({ "success": false, "error": detail }))).into_response()
        }
        _ => response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_error_is_400() {
        let err = ApiError::Validation(ValidationError::Missing { fields: vec!["email"] });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Missing required fields: email");
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let err = ApiError::NotFound {
            resource: "university",
            id: "64f1a2b3c4d5e6f708192a3b".into(),
        };
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn conflict_from_db_is_409() {
        let err = ApiError::from(DbError::Conflict { resource: "lead" });
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn unavailable_is_503_with_retry_after() {
        let err = ApiError::Unavailable {
            retry_after: Duration::from_secs(30),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::RETRY_AFTER], "30");
        let body = body_json(response).await;
        assert_eq!(body["source"], "fallback");
    }

    #[tokio::test]
    async fn internal_detail_is_hidden_in_body() {
        let err = ApiError::Internal {
            message: "boom".into(),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.extensions().get::<InternalDetail>().is_some());
        let body = body_json(response).await;
        assert_eq!(body["error"], INTERNAL_MESSAGE);
    }
}
