//! HTTP transport boundary.
//!
//! The `Session` never talks to `reqwest` directly; it prepares an
//! [`ApiRequest`] and hands it to a [`Transport`]. This keeps the auth and
//! timeout policy testable without a network.

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use super::ApiError;
use crate::config::Timeouts;

/// A fully prepared outbound request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
    pub timeouts: Timeouts,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>, timeouts: Timeouts) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
            timeouts,
        }
    }
}

/// Raw response as returned by the transport. Nothing is interpreted.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Sends one prepared request and returns the raw response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// Maximum number of distinct `Timeouts` pairs that keep a pooled client.
const MAX_CACHED_CLIENTS: usize = 8;

/// `reqwest` backed transport.
///
/// Connect and read timeouts are client-level settings in reqwest, so one
/// client is built per distinct `Timeouts` pair and reused. Clone of a
/// `reqwest::Client` is cheap (Arc internally). Once `MAX_CACHED_CLIENTS`
/// pairs are cached, further overrides get a one-off client that is not kept.
#[derive(Default)]
pub struct ReqwestTransport {
    clients: DashMap<Timeouts, Client>,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn client_for(&self, timeouts: Timeouts) -> Result<Client, ApiError> {
        if let Some(client) = self.clients.get(&timeouts) {
            return Ok(client.value().clone());
        }

        debug!(
            connect_ms = timeouts.connect.as_millis() as u64,
            read_ms = timeouts.read.as_millis() as u64,
            "Building HTTP client"
        );
        let client = Client::builder()
            .connect_timeout(timeouts.connect)
            .read_timeout(timeouts.read)
            .build()?;
        if self.clients.len() < MAX_CACHED_CLIENTS {
            self.clients.entry(timeouts).or_insert_with(|| client.clone());
        } else {
            debug!("Client cache full, not keeping client");
        }
        Ok(client)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let client = self.client_for(request.timeouts)?;

        let mut builder = client
            .request(request.method, &request.url)
            .headers(request.headers);
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        trace!(status = %status, bytes = body.len(), "Received response");

        Ok(ApiResponse::new(status, headers, body.to_vec()))
    }
}
