//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional TOML file
//!     → loader.rs (read & deserialize)
//!     → validation.rs (semantic checks)
//!     → CLI overrides (port, log level) applied in main
//!     → ProxyConfig (immutable) handed to HttpServer
//! ```
//!
//! # Design Decisions
//! - Every field has a default, running without a file is the normal case
//! - Validation separates syntactic (serde) from semantic checks
//! - No hot reload; upstream hosts are never configured, they come from
//!   request paths

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::{ListenerConfig, LogFormat, ObservabilityConfig, ProxyConfig, UpstreamConfig};
