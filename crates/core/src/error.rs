//! Core Error Types
//!
//! Defines the foundational error types used across the Agent Gate workspace.
//! These error types are dependency-free (only thiserror + std) to keep the core
//! crate lightweight.
//!
//! The main crate extends these with configuration-file variants in
//! `agent_gate::utils::error::AppError`.

use thiserror::Error;

/// Core error type for the Agent Gate workspace.
#[derive(Error, Debug)]
pub enum CoreError {
    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// A tool was invoked without one of its required parameters
    #[error("Missing value for required parameter '{param}' of tool '{tool}'")]
    MissingParameter { tool: String, param: String },

    /// Not found errors (unknown tool, server, resource)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Parse errors (legacy XML parameters, native arguments)
    #[error("Parse error: {0}")]
    Parse(String),

    /// The pending operation was cancelled (session aborted, approval dropped)
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a missing parameter error
    pub fn missing_parameter(tool: impl Into<String>, param: impl Into<String>) -> Self {
        Self::MissingParameter {
            tool: tool.into(),
            param: param.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a cancellation error
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
