//! Error types for the cwf-help-ipc crate.

use crate::transport::CodecError;

/// Unified error type for invocation queue operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Request queue already exists: {0}")]
    QueueExists(String),

    #[error("Request queue closed: {0}")]
    QueueClosed(String),

    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Invalid arguments for {method}: {reason}")]
    InvalidArguments { method: String, reason: String },
}

impl Error {
    pub fn invalid_arguments(method: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            method: method.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
