//! Error types for the console runtime

use thiserror::Error;

/// Console error type
#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Page not mounted: {0}")]
    PageNotMounted(String),

    #[error("No pending approval to respond to")]
    NothingPending,

    #[error("No dialog open")]
    NoDialogOpen,

    #[error("Collaborator rejected the mutation: {0}")]
    Collaborator(#[from] crate::collaborator::CollaboratorError),

    #[error(transparent)]
    Core(#[from] helm_core::CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ConsoleError {
    fn from(e: serde_json::Error) -> Self {
        ConsoleError::Serialization(e.to_string())
    }
}

/// Result type for console operations
pub type Result<T> = std::result::Result<T, ConsoleError>;
