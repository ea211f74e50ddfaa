//! Error types for the protocol core

use thiserror::Error;

/// Core protocol error type
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid intent configuration: {0}")]
    Configuration(String),

    #[error("Operation not available: {0}")]
    IntentNotFound(String),

    #[error("Unknown page: {0}")]
    UnknownPage(String),

    #[error("Missing argument: {0}")]
    MissingArgument(String),

    #[error("Invalid navigation ticket: {0}")]
    InvalidTicket(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Serialization(e.to_string())
    }
}

/// Result type for core protocol operations
pub type Result<T> = std::result::Result<T, CoreError>;
