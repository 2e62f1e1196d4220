//! Error Handling
//!
//! Unified error types for the host-facing crate.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

use agent_gate_core::CoreError;

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Errors raised by the core types and the dispatch pipeline
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Convert AppError to a string suitable for host responses
impl From<AppError> for String {
    fn from(err: AppError) -> String {
        err.to_string()
    }
}
