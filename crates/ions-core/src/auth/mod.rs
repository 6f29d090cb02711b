//! Credential lifecycle and request authorization.
//!
//! This module provides:
//! - `Credential`: an immutable bearer token with an absolute expiry
//! - `Authorizer`: stamps requests with `Authorization: Bearer <token>`
//!   or refuses them with an `AuthError`
//!
//! Expired tokens are never refreshed here; the caller logs in again.

pub mod authorizer;
pub mod credential;

pub use authorizer::{authorize, AuthError, Authorizer};
pub use credential::{Credential, DEFAULT_TOKEN_TTL_SECS};
