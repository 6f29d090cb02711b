//! REST API module for the ONS integration service.
//!
//! This module provides the `Session` that logs in and sends authorized
//! requests, the `Transport` boundary it sends through, and the `Ions`
//! client that fetches hydrology data.
//!
//! The API uses bearer token authentication obtained from the
//! `/autenticar` endpoint.

pub mod client;
pub mod error;
pub mod session;
pub mod transport;

pub use client::Ions;
pub use error::{ApiError, BoxError};
pub use session::{RequestOptions, Session, SessionBuilder};
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};
