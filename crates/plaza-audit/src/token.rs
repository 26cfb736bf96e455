//! Access token types and expiry tracking.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Access token for the classifier API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    /// Raw token string, appended to every censoring request.
    pub access_token: String,
    /// Expiration time, if the token endpoint reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Creates a token that never expires.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: None,
        }
    }

    /// Creates a token from a token endpoint response.
    ///
    /// # Errors
    ///
    /// Returns an error if the response carried no token.
    pub fn from_response(response: TokenResponse) -> Result<Self> {
        if response.access_token.is_empty() {
            return Err(Error::InvalidResponse(
                "token endpoint returned an empty access_token".to_string(),
            ));
        }

        let expires_at = response
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(i64::from(secs)));

        Ok(Self {
            access_token: response.access_token,
            expires_at,
        })
    }

    /// Checks if the token is expired (with 60 second buffer).
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|exp| Utc::now() + Duration::seconds(60) >= exp)
    }

    /// Returns true if the token is valid (not expired).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.is_expired()
    }
}

/// Raw token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Access token string.
    #[serde(default)]
    pub access_token: String,
    /// Lifetime in seconds.
    pub expires_in: Option<u32>,
    /// Error code, present when the credentials were rejected.
    pub error: Option<String>,
    /// Error description.
    pub error_description: Option<String>,
}

impl TokenResponse {
    /// Converts an error-shaped response into an [`Error`].
    #[must_use]
    pub fn into_error(self) -> Error {
        let code = self.error.unwrap_or_else(|| "unknown_error".to_string());
        let description = self
            .error_description
            .unwrap_or_else(|| "token endpoint rejected the request".to_string());
        Error::Credentials(format!("{code}: {description}"))
    }
}
