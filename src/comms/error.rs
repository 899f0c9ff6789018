//! API error type and JSON error response formatting.
//!
//! Maps service-level failures to HTTP status codes with a consistent
//! `{"error": "..."}` body across all endpoints.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::service::ServiceError;

#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request — missing or empty question text.
    BadRequest(String),
    /// 404 Not Found — unknown session id.
    NotFound(String),
    /// 500 Internal Server Error — unexpected fault; logged, never silent.
    Internal(String),
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::EmptyQuestion => ApiError::BadRequest(e.to_string()),
            ServiceError::SessionNotFound(_) => ApiError::NotFound(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => {
                error!(%msg, "internal error while handling request");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
