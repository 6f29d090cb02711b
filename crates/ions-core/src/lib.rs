//! ions-core - client library for the ONS integration API.
//!
//! Logs in with a username and password, keeps the issued bearer token
//! with its expiry, attaches it to every request, and fetches reservoir
//! data from the hydrology endpoints.
//!
//! ```no_run
//! # async fn run() -> Result<(), ions_core::ApiError> {
//! let ions = ions_core::Ions::connect("user", "secret").await?;
//! let reservoirs = ions.fetch_reservoirs().await?;
//! println!("{}", reservoirs);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;

pub use api::{ApiError, ApiRequest, ApiResponse, Ions, RequestOptions, Session, Transport};
pub use auth::{AuthError, Authorizer, Credential};
pub use config::{SessionConfig, Timeouts};
