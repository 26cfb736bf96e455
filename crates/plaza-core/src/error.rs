//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Content classifier call failed.
    #[error("Audit error: {0}")]
    Audit(#[from] plaza_audit::Error),

    /// Referenced record does not exist.
    #[error("{0} not found: {1}")]
    NotFound(&'static str, i64),

    /// Operation would violate a uniqueness rule.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Operation is not allowed in the record's current state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Caller may not touch the target record.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Username/password pair did not match.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The account is banned and may not sign in.
    #[error("Account is banned")]
    AccountBanned,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
