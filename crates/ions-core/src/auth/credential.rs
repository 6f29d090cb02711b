use std::fmt;

use chrono::{DateTime, Duration, Utc};

/// Token lifetime in seconds assumed when the login response omits `expires_in`.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 60 * 60;

/// Number of token characters shown by `Debug`/`Display`.
const TOKEN_PREVIEW_CHARS: usize = 4;

/// A bearer token and the absolute instant after which it is no longer accepted.
///
/// Credentials are immutable: a new login produces a new `Credential` rather
/// than updating an existing one.
#[derive(Clone)]
pub struct Credential {
    token: String,
    expires_at: DateTime<Utc>,
}

impl Credential {
    /// Create a credential that expires `ttl_secs` seconds from now.
    pub fn new(token: impl Into<String>, ttl_secs: i64) -> Self {
        Self::issued_at(token, ttl_secs, Utc::now())
    }

    /// Create a credential issued at an explicit instant.
    pub fn issued_at(token: impl Into<String>, ttl_secs: i64, issued: DateTime<Utc>) -> Self {
        let expires_at = Duration::try_seconds(ttl_secs)
            .and_then(|ttl| issued.checked_add_signed(ttl))
            .unwrap_or(if ttl_secs < 0 {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            });

        Self {
            token: token.into(),
            expires_at,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// True once the current time is strictly past `expires_at`.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Expiry check against an explicit instant. The expiry instant itself is still valid.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Time left before expiry, clamped at zero.
    pub fn time_until_expiry(&self) -> Duration {
        (self.expires_at - Utc::now()).max(Duration::zero())
    }

    fn token_preview(&self) -> String {
        self.token.chars().take(TOKEN_PREVIEW_CHARS).collect()
    }
}

/// Credentials compare by token only; expiry is ignored.
impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token
    }
}

impl Eq for Credential {}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &format_args!("{}...", self.token_preview()))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token {} expiring at {}", self.token_preview(), self.expires_at)
    }
}
