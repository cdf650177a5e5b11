//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Tool '{0}' is registered more than once")]
    DuplicateTool(String),

    #[error("Unknown tool: {0}")]
    ToolNotFound(String),

    #[error("Invalid policy pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Invalid session id: {0}")]
    InvalidSessionId(String),
}
