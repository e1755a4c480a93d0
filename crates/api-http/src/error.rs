//! HTTP Error Types
//!
//! Maps application errors to HTTP status codes with plain-text bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use d2render_core::error::AppError;
use d2render_core::port::RenderError;
use thiserror::Error;
use tracing::error;

/// Body returned for undecodable request JSON
pub const INVALID_REQUEST_MESSAGE: &str = "Invalid request format";

#[derive(Error, Debug)]
pub enum ApiError {
    /// Body is not the expected JSON shape
    #[error("Invalid request format")]
    BadRequest(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Render(RenderError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Render(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Validation(msg) => ApiError::Validation(msg),
            AppError::Domain(e) => ApiError::Validation(e.to_string()),
            AppError::Serialization(e) => ApiError::BadRequest(e.to_string()),
            AppError::Render(e) => ApiError::Render(e),
            AppError::Io(e) => ApiError::Internal(e.to_string()),
            AppError::Config(msg) | AppError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::BadRequest(detail) => {
                error!(error = %detail, "Error decoding JSON");
            }
            other => error!(status = status.as_u16(), error = %other, "Error rendering diagram"),
        }

        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::BadRequest("eof".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(AppError::Validation("bad key".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Render(RenderError::Timeout(10)).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ApiError::Render(RenderError::SpawnFailed("d2: not found".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_bad_request_hides_decoder_detail() {
        let err = ApiError::BadRequest("expected value at line 1 column 1".into());
        assert_eq!(err.to_string(), INVALID_REQUEST_MESSAGE);
    }

    #[test]
    fn test_tool_failure_message_passthrough() {
        let err = ApiError::from(AppError::Render(RenderError::ToolFailed {
            tool: "d2".into(),
            exit_code: Some(1),
            stderr: "err: failed to compile".into(),
        }));
        assert_eq!(
            err.to_string(),
            "Failed to execute d2 command: err: failed to compile"
        );
    }
}
