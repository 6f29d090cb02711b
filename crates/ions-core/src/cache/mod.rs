//! URL caching.
//!
//! `UrlBuilder` joins the base URL and path segments and memoizes the
//! result in a `UrlCache`. Each session owns its own cache by default.

pub mod url;

pub use url::{MemoryUrlCache, UrlBuilder, UrlCache, UrlKey};
