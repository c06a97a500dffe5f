use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Similarity model has not been fitted")]
    ModelNotFitted,

    #[error("Profile store did not answer within {timeout_ms}ms")]
    UpstreamTimeout { timeout_ms: u64 },

    /// The profile store answered, but with a failure or unreadable data.
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not enough profiles to fit a model: need {required}, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Coarse error tag exposed to callers alongside a human-readable detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Empty pool or unknown target. Tags soft failures, never an [`Error`].
    DataUnavailable,
    ModelNotFitted,
    UpstreamTimeout,
    Upstream,
    InvalidRequest,
    InsufficientData,
    Storage,
    Internal,
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::ModelNotFitted => ErrorCategory::ModelNotFitted,
            Error::UpstreamTimeout { .. } => ErrorCategory::UpstreamTimeout,
            Error::Upstream(_) => ErrorCategory::Upstream,
            Error::InvalidRequest(_) | Error::InvalidConfig(_) => ErrorCategory::InvalidRequest,
            Error::InsufficientData { .. } => ErrorCategory::InsufficientData,
            Error::Storage(_) | Error::Io(_) | Error::Serialization(_) => ErrorCategory::Storage,
            Error::InvalidDimension { .. } => ErrorCategory::Internal,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(Error::ModelNotFitted.category(), ErrorCategory::ModelNotFitted);
        assert_eq!(
            Error::UpstreamTimeout { timeout_ms: 10 }.category(),
            ErrorCategory::UpstreamTimeout
        );
        assert_eq!(
            Error::InsufficientData { required: 5, actual: 2 }.category(),
            ErrorCategory::InsufficientData
        );
        assert_eq!(
            Error::Upstream("feed unreadable".to_string()).category(),
            ErrorCategory::Upstream
        );
    }

    #[test]
    fn test_category_serialization() {
        let json = serde_json::to_string(&ErrorCategory::ModelNotFitted).unwrap();
        assert_eq!(json, "\"model_not_fitted\"");
    }
}
