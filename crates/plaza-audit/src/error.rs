//! Error types for content moderation operations.

/// Result type alias for moderation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Content moderation error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Error reported by the classifier service.
    #[error("Classifier error {code}: {message}")]
    Api {
        /// Provider-specific error code.
        code: i64,
        /// Human-readable description.
        message: String,
    },

    /// Token endpoint rejected the credentials.
    #[error("Credential error: {0}")]
    Credentials(String),

    /// Response body did not match the documented shape.
    #[error("Invalid classifier response: {0}")]
    InvalidResponse(String),

    /// Background task for a batched request failed.
    #[error("Batch task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl Error {
    /// Creates a classifier API error from code and message.
    #[must_use]
    pub fn api(code: i64, message: impl Into<String>) -> Self {
        Self::Api {
            code,
            message: message.into(),
        }
    }
}
