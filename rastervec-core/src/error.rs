//! Error types for the rastervec-core library

use thiserror::Error;

/// Main error type for tracing operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TraceError {
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    #[error("Tracing was cancelled")]
    Cancelled,
}

impl TraceError {
    /// Create a new invalid-parameter error
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }
}

/// Result type alias for convenience
pub type TraceResult<T> = Result<T, TraceError>;
