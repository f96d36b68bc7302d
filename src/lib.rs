//! Link-rewriting forwarding proxy library.
//!
//! Requests for `/{domain}/{path}` are forwarded to `{scheme}://{domain}/{path}`.
//! HTML responses get their links rewritten into the same path-prefix form so
//! browsing stays inside the proxy, and every fetched body is cached by its
//! upstream URL.

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod rewrite;

pub use cache::{MemoryCache, ResponseCache};
pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
