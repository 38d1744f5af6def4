use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::core::telephony::TwilioError;

/// Errors surfaced by HTTP handlers.
///
/// Rendered as `{"message": ..., "error": ...}` with a matching status code.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    /// A feature needs configuration that is absent
    #[error("{0}")]
    NotConfigured(String),

    #[error("Failed to initiate call")]
    CallFailed(#[from] TwilioError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::CallFailed(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match self {
            AppError::CallFailed(e) => e.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), "{}: {}", self, self.detail());
        }

        let body = Json(json!({
            "message": self.to_string(),
            "error": self.detail(),
        }));
        (status, body).into_response()
    }
}
