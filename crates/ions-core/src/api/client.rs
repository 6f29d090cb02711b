//! Client for the ONS integration API data endpoints.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::session::Session;
use super::transport::{ReqwestTransport, Transport};
use super::ApiError;

/// API client. All requests go through the wrapped [`Session`].
pub struct Ions<T: Transport = ReqwestTransport> {
    session: Session<T>,
}

impl Ions<ReqwestTransport> {
    /// Log in with default settings and wrap the new session.
    pub async fn connect(username: &str, password: &str) -> Result<Self, ApiError> {
        Ok(Self::from_session(Session::connect(username, password).await?))
    }
}

impl<T: Transport> Ions<T> {
    pub fn from_session(session: Session<T>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session<T> {
        &self.session
    }

    /// Fetch the reservoir collection as raw JSON.
    pub async fn fetch_reservoirs(&self) -> Result<Value, ApiError> {
        self.fetch_reservoirs_as().await
    }

    /// Fetch the reservoir collection decoded into `R`.
    pub async fn fetch_reservoirs_as<R: DeserializeOwned>(&self) -> Result<R, ApiError> {
        let url = self.session.build_url(["hidrologia", "reservatorios"]);
        let response = self.session.get(&url).await?;
        debug!(status = %response.status(), bytes = response.body().len(), "Fetched reservoirs");
        response.json()
    }
}
