//! API error type with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use medibridge_core::CoreError;

use crate::orchestrator::TurnError;

/// Error response body: `{"error": {"code", "message"}}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A chat turn failed at some stage; nothing was persisted.
    #[error("Turn failed: {0}")]
    TurnFailed(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::TurnFailed(_) => "TURN_FAILED",
            ApiError::Unavailable(_) => "UNAVAILABLE",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::TurnFailed(_) => StatusCode::BAD_GATEWAY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Details stay in the log; clients get a generic message except for
        // their own bad input.
        let message = match &self {
            ApiError::TurnFailed(detail) => {
                tracing::error!(detail, "Chat turn failed");
                "The assistant could not complete this message. Please try again.".to_string()
            }
            ApiError::Unavailable(detail) => {
                tracing::error!(detail, "Database unavailable");
                "The service is temporarily unavailable".to_string()
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                "An internal error occurred".to_string()
            }
            ApiError::BadRequest(detail) => detail.clone(),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code(),
                message,
            },
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        if err.is_unavailable() {
            ApiError::Unavailable(err.to_string())
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

impl From<TurnError> for ApiError {
    fn from(err: TurnError) -> Self {
        match err {
            TurnError::Store(e) => e.into(),
            TurnError::Join(detail) => ApiError::Internal(detail),
            other => ApiError::TurnFailed(other.to_string()),
        }
    }
}
