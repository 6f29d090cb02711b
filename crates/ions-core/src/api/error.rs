use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::auth::AuthError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication failed with status {status}: {body}")]
    AuthenticationFailed {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Network error: {0}")]
    Transport(#[source] BoxError),

    #[error("Invalid JSON response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    /// Error for a login attempt that did not return 200.
    pub fn authentication_failed(status: reqwest::StatusCode, body: &str) -> Self {
        ApiError::AuthenticationFailed {
            status,
            body: Self::truncate_body(body),
        }
    }

    /// Wrap any transport-level failure.
    pub fn transport(err: impl Into<BoxError>) -> Self {
        ApiError::Transport(err.into())
    }

    pub fn is_token_expired(&self) -> bool {
        matches!(self, ApiError::Auth(AuthError::TokenExpired { .. }))
    }

    /// Expiry instant of the credential, when this is a `TokenExpired` error.
    pub fn expired_at(&self) -> Option<DateTime<Utc>> {
        match self {
            ApiError::Auth(AuthError::TokenExpired { expires_at }) => Some(*expires_at),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(Box::new(err))
    }
}
