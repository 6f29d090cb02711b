//! Authenticated session for the ONS integration API.
//!
//! A `Session` owns the network identity (base URL, timeouts, default
//! headers), the transport and the current `Authorizer`. Login happens while
//! the session is being built; a failed login means no session.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};
use super::ApiError;
use crate::auth::{self, Authorizer, Credential, DEFAULT_TOKEN_TTL_SECS};
use crate::cache::{UrlBuilder, UrlCache};
use crate::config::{SessionConfig, Timeouts};

/// Path segment of the login endpoint
const LOGIN_SEGMENT: &str = "autenticar";

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default = "default_ttl", deserialize_with = "deserialize_ttl")]
    expires_in: i64,
}

fn default_ttl() -> i64 {
    DEFAULT_TOKEN_TTL_SECS
}

/// `expires_in` arrives as an integer, but some deployments send a float or a numeric string.
fn deserialize_ttl<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTtl {
        Int(i64),
        Float(f64),
        Text(String),
    }

    match RawTtl::deserialize(deserializer)? {
        RawTtl::Int(secs) => Ok(secs),
        RawTtl::Float(secs) => Ok(secs.trunc() as i64),
        RawTtl::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid expires_in {:?}", text))),
    }
}

/// JSON values that count as "no login payload".
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

fn unexpected(value: &Value) -> de::Unexpected<'_> {
    match value {
        Value::Null => de::Unexpected::Unit,
        Value::Bool(b) => de::Unexpected::Bool(*b),
        Value::Number(_) => de::Unexpected::Other("number"),
        Value::String(s) => de::Unexpected::Str(s),
        Value::Array(_) => de::Unexpected::Seq,
        Value::Object(_) => de::Unexpected::Map,
    }
}

/// Turn a 200 login body into a credential. `Ok(None)` for an empty payload.
fn parse_login_body(body: &[u8]) -> Result<Option<Credential>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let value: Value = serde_json::from_slice(body)?;
    if is_blank(&value) {
        return Ok(None);
    }
    if !value.is_object() {
        return Err(ApiError::Decode(de::Error::invalid_type(
            unexpected(&value),
            &"a login response object",
        )));
    }

    let login: LoginResponse = serde_json::from_value(value)?;
    Ok(Some(Credential::new(
        login.access_token.unwrap_or_default(),
        login.expires_in,
    )))
}

/// Per-request overrides. Anything left unset falls back to the session defaults.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub body: Option<Value>,
    pub timeouts: Option<Timeouts>,
    pub headers: HeaderMap,
}

impl RequestOptions {
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = Some(timeouts);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Configures and logs in a [`Session`].
pub struct SessionBuilder<T> {
    config: SessionConfig,
    transport: T,
    url_cache: Option<Arc<dyn UrlCache>>,
}

impl SessionBuilder<ReqwestTransport> {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            transport: ReqwestTransport::new(),
            url_cache: None,
        }
    }
}

impl<T: Transport> SessionBuilder<T> {
    /// Send requests through a different transport.
    pub fn transport<U: Transport>(self, transport: U) -> SessionBuilder<U> {
        SessionBuilder {
            config: self.config,
            transport,
            url_cache: self.url_cache,
        }
    }

    /// Share a URL cache instead of giving the session its own.
    pub fn url_cache(mut self, cache: Arc<dyn UrlCache>) -> Self {
        self.url_cache = Some(cache);
        self
    }

    /// Build the session and log in with the given credentials.
    pub async fn login(self, username: &str, password: &str) -> Result<Session<T>, ApiError> {
        let default_headers = default_headers(&self.config.user_agent)?;
        let urls = match self.url_cache {
            Some(cache) => UrlBuilder::with_cache(self.config.base_url.clone(), cache),
            None => UrlBuilder::new(self.config.base_url.clone()),
        };

        let session = Session {
            transport: self.transport,
            urls,
            timeouts: self.config.timeouts(),
            default_headers,
            authorizer: ArcSwapOption::empty(),
        };
        session.login(username, password).await?;
        Ok(session)
    }
}

fn default_headers(user_agent: &str) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(header::ACCEPT_CHARSET, HeaderValue::from_static("utf-8"));
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    let user_agent = HeaderValue::from_str(user_agent)
        .map_err(|_| ApiError::Configuration(format!("invalid user agent {:?}", user_agent)))?;
    headers.insert(header::USER_AGENT, user_agent);
    Ok(headers)
}

pub struct Session<T: Transport = ReqwestTransport> {
    transport: T,
    urls: UrlBuilder,
    timeouts: Timeouts,
    default_headers: HeaderMap,
    authorizer: ArcSwapOption<Authorizer>,
}

impl Session<ReqwestTransport> {
    /// Log in against the default endpoint with default timeouts.
    pub async fn connect(username: &str, password: &str) -> Result<Self, ApiError> {
        Self::builder(SessionConfig::default())
            .login(username, password)
            .await
    }

    pub fn builder(config: SessionConfig) -> SessionBuilder<ReqwestTransport> {
        SessionBuilder::new(config)
    }
}

impl<T: Transport> Session<T> {
    /// Exchange username/password for a bearer token.
    ///
    /// On success the previous authorizer (if any) is replaced wholesale.
    /// A 200 with an empty payload leaves the current authorizer untouched.
    /// Any other status fails with `AuthenticationFailed`.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let url = self.build_url([LOGIN_SEGMENT]);
        info!(username = username, url = %url, "Logging in");

        let options = RequestOptions::default().json(json!({
            "usuario": username,
            "senha": password,
        }));
        let response = self
            .transport
            .send(self.prepare(Method::POST, &url, options))
            .await?;

        if response.status() != StatusCode::OK {
            warn!(status = %response.status(), "Login rejected");
            return Err(ApiError::authentication_failed(
                response.status(),
                &response.text(),
            ));
        }

        match parse_login_body(response.body())? {
            Some(credential) => {
                info!(expires_at = %credential.expires_at(), "Login succeeded");
                self.authorizer
                    .store(Some(Arc::new(Authorizer::new(credential))));
            }
            None => warn!("Login response carried no token"),
        }
        Ok(())
    }

    /// Send a request with the session defaults applied and the bearer token attached.
    ///
    /// Authorization failures return before anything reaches the transport.
    /// The response is returned as-is; status codes are not inspected.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        let request = self.prepare(method, url, options);
        let authorizer = self.authorizer.load_full();
        let request = auth::authorize(authorizer.as_deref(), request)?;

        debug!(method = %request.method, url = %request.url, "Sending request");
        self.transport.send(request).await
    }

    pub async fn get(&self, url: &str) -> Result<ApiResponse, ApiError> {
        self.request(Method::GET, url, RequestOptions::default())
            .await
    }

    pub async fn post(&self, url: &str, body: Value) -> Result<ApiResponse, ApiError> {
        self.request(Method::POST, url, RequestOptions::default().json(body))
            .await
    }

    /// URL under the session's base URL.
    pub fn build_url<I, S>(&self, segments: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.urls.build(None, segments)
    }

    /// URL under an explicit base URL.
    pub fn build_url_with_base<I, S>(&self, base: &str, segments: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.urls.build(Some(base), segments)
    }

    pub fn base_url(&self) -> &str {
        self.urls.base_url()
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// Current authorizer, `None` until a login returned a token.
    pub fn authorizer(&self) -> Option<Arc<Authorizer>> {
        self.authorizer.load_full()
    }

    pub fn credential(&self) -> Option<Credential> {
        self.authorizer().map(|a| a.credential().clone())
    }

    /// True when a credential is held and has not expired.
    pub fn is_authenticated(&self) -> bool {
        self.authorizer()
            .map(|a| !a.credential().is_expired())
            .unwrap_or(false)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn prepare(&self, method: Method, url: &str, options: RequestOptions) -> ApiRequest {
        let mut request = ApiRequest::new(method, url, options.timeouts.unwrap_or(self.timeouts));
        request.headers = self.default_headers.clone();
        request.headers.extend(options.headers);
        request.body = options.body;
        request
    }
}
