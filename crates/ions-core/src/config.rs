//! Session configuration.
//!
//! Holds the network identity of a session: base URL, user agent and the
//! connect/read timeout pair applied to every request. Values can be
//! deserialized, built in code, or overridden from the environment.
//! Usernames and passwords are not part of the configuration; they are
//! passed to the session at login time and never stored.

use std::time::Duration;

use serde::Deserialize;

use crate::api::ApiError;

/// Default API root for the ONS integration service.
pub const DEFAULT_BASE_URL: &str = "https://integra.ons.org.br/api";

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 4;

/// Default read timeout in seconds.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 10;

/// Env var overriding the base URL
const ENV_BASE_URL: &str = "IONS_BASE_URL";
const ENV_CONNECT_TIMEOUT: &str = "IONS_CONNECT_TIMEOUT_SECS";
const ENV_READ_TIMEOUT: &str = "IONS_READ_TIMEOUT_SECS";

/// Connect and read timeout pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timeouts {
    pub connect: Duration,
    pub read: Duration,
}

impl Timeouts {
    pub fn new(connect: Duration, read: Duration) -> Self {
        Self { connect, read }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            read: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_read_timeout_secs() -> u64 {
    DEFAULT_READ_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    concat!("ions-core/", env!("CARGO_PKG_VERSION")).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by `IONS_BASE_URL`, `IONS_CONNECT_TIMEOUT_SECS`
    /// and `IONS_READ_TIMEOUT_SECS` when set.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let mut config = Self::default();
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            config.base_url = base_url;
        }
        if let Some(secs) = lookup(ENV_CONNECT_TIMEOUT) {
            config.connect_timeout_secs = parse_secs(ENV_CONNECT_TIMEOUT, &secs)?;
        }
        if let Some(secs) = lookup(ENV_READ_TIMEOUT) {
            config.read_timeout_secs = parse_secs(ENV_READ_TIMEOUT, &secs)?;
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeouts(mut self, connect_secs: u64, read_secs: u64) -> Self {
        self.connect_timeout_secs = connect_secs;
        self.read_timeout_secs = read_secs;
        self
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts::new(
            Duration::from_secs(self.connect_timeout_secs),
            Duration::from_secs(self.read_timeout_secs),
        )
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64, ApiError> {
    value
        .trim()
        .parse()
        .map_err(|_| ApiError::Configuration(format!("{} must be a whole number of seconds, got {:?}", key, value)))
}
