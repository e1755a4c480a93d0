// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid option key '{key}': {reason}")]
    InvalidOptionKey { key: String, reason: String },

    #[error("Invalid value for option '{key}': {reason}")]
    InvalidOptionValue { key: String, reason: String },
}

pub type Result<T> = std::result::Result<T, DomainError>;
