//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID + trace middleware)
//!     → target.rs (decode /{domain}{path} into the upstream target)
//!     → proxy.rs (cache lookup, forward, rewrite, cache store)
//!     → Send to client
//! ```

pub mod proxy;
pub mod server;
pub mod target;

pub use server::{AppState, HttpServer};
pub use target::ProxyTarget;
