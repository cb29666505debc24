//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for UniNest
///
/// Transport failures (`Network`) are kept distinct from domain validation
/// failures (`InvalidCredentials`, `AlreadyRegistered`) so callers can show
/// specific guidance instead of a generic retry prompt.
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum UniNestError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0} is already registered")]
    AlreadyRegistered(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for UniNest operations
pub type Result<T> = std::result::Result<T, UniNestError>;
