//! SDK Error Types

use thiserror::Error;

/// SDK Result type
pub type Result<T> = std::result::Result<T, SdkError>;

/// SDK Error
#[derive(Debug, Error)]
pub enum SdkError {
    #[error("Connection error: {0}")]
    Connection(String),

    /// Non-2xx response; `message` is the server's plain-text body
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for SdkError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            SdkError::Connection(e.to_string())
        } else if e.is_decode() {
            SdkError::Transport(format!("Failed to decode response: {}", e))
        } else if let Some(status) = e.status() {
            SdkError::Http {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            SdkError::Transport(e.to_string())
        }
    }
}

impl SdkError {
    /// True for 4xx responses (the request itself was rejected)
    pub fn is_client_error(&self) -> bool {
        matches!(self, SdkError::Http { status, .. } if (400..500).contains(status))
    }
}
