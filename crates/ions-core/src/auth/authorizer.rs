use chrono::{DateTime, Utc};
use reqwest::header::{self, HeaderValue};
use thiserror::Error;
use tracing::warn;

use super::Credential;
use crate::api::ApiRequest;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Not authenticated - no credential has been issued")]
    Unauthenticated,

    #[error("Token expired at {expires_at}")]
    TokenExpired { expires_at: DateTime<Utc> },

    #[error("Token cannot be sent as an HTTP header value")]
    MalformedToken,
}

/// Stamps outgoing requests with the bearer token of one credential.
#[derive(Debug, Clone)]
pub struct Authorizer {
    credential: Credential,
}

impl Authorizer {
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Add `Authorization: Bearer <token>` to the request, or refuse if the
    /// credential has expired. Nothing else on the request is touched.
    pub fn authorize(&self, request: ApiRequest) -> Result<ApiRequest, AuthError> {
        self.authorize_at(request, Utc::now())
    }

    pub fn authorize_at(
        &self,
        mut request: ApiRequest,
        now: DateTime<Utc>,
    ) -> Result<ApiRequest, AuthError> {
        if self.credential.is_expired_at(now) {
            let expires_at = self.credential.expires_at();
            warn!(%expires_at, url = %request.url, "Refusing to send request with expired token");
            return Err(AuthError::TokenExpired { expires_at });
        }

        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.credential.token()))
            .map_err(|_| AuthError::MalformedToken)?;
        value.set_sensitive(true);
        request.headers.insert(header::AUTHORIZATION, value);
        Ok(request)
    }
}

/// Authorize with an optional authorizer; `None` means no login has produced a credential yet.
pub fn authorize(authorizer: Option<&Authorizer>, request: ApiRequest) -> Result<ApiRequest, AuthError> {
    match authorizer {
        Some(authorizer) => authorizer.authorize(request),
        None => {
            warn!(url = %request.url, "Refusing to send request before login");
            Err(AuthError::Unauthenticated)
        }
    }
}
