use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::chat::ChatError;

/// Structured API error that serializes to JSON.
#[derive(Debug)]
pub enum ApiError {
    SessionNotFound(String),
    SessionBusy(String),
    InvalidRequest(String),
    /// Backend call failed. Carries only user-safe text.
    ProviderFailure(String),
    InternalError(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::SessionNotFound(id) => (
                StatusCode::NOT_FOUND,
                "SESSION_NOT_FOUND",
                format!("Session not found: {id}"),
            ),
            ApiError::SessionBusy(id) => (
                StatusCode::CONFLICT,
                "SESSION_BUSY",
                format!("Session {id} is still waiting for a reply"),
            ),
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg),
            ApiError::ProviderFailure(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PROVIDER_ERROR", msg)
            }
            ApiError::InternalError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::SessionNotFound(id) => ApiError::SessionNotFound(id),
            ChatError::SessionBusy(id) => ApiError::SessionBusy(id),
            ChatError::UnsupportedProvider(_) | ChatError::EmptyQuery => {
                ApiError::InvalidRequest(err.to_string())
            }
            other => ApiError::InternalError(other.to_string()),
        }
    }
}
