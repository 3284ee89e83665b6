//! Error types for the muleflow analysis pipeline.

use thiserror::Error;

/// Result type alias using `AnalysisError`.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that can occur while analyzing a transaction batch.
///
/// Detector budget exhaustion is deliberately absent: hitting a frame or
/// path cap truncates results and is reported via `tracing::warn!`, never
/// as an error.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The batch could not be accepted: empty body, missing header, or a
    /// required column is absent.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The header parsed but zero rows survived validation.
    #[error("no valid transactions: {0}")]
    NoData(String),

    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Unexpected failure anywhere in the pipeline.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AnalysisError {
    /// Create an invalid-input error.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        AnalysisError::InvalidInput(msg.into())
    }

    /// Create a no-data error.
    #[must_use]
    pub fn no_data(msg: impl Into<String>) -> Self {
        AnalysisError::NoData(msg.into())
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        AnalysisError::Internal(msg.into())
    }

    /// Returns true if the error was caused by the submitted batch rather
    /// than by the engine itself.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            AnalysisError::InvalidInput(_) | AnalysisError::NoData(_)
        )
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        AnalysisError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_are_classified() {
        assert!(AnalysisError::invalid_input("missing header").is_input_error());
        assert!(AnalysisError::no_data("zero rows").is_input_error());
        assert!(!AnalysisError::internal("boom").is_input_error());
    }

    #[test]
    fn test_error_display() {
        let err = AnalysisError::invalid_input("missing required column: sender");
        assert_eq!(
            err.to_string(),
            "invalid input: missing required column: sender"
        );
    }
}
