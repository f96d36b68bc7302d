//! Response caching subsystem.
//!
//! # Data Flow
//! ```text
//! dispatcher
//!     → get(target URL)   hit: cached bytes go straight to the client
//!     → set(target URL)   after a successful upstream fetch (+ rewrite)
//! ```
//!
//! The cache is a component handed to the server, never a global, so tests
//! and embedders can swap in their own [`ResponseCache`].

pub mod memory;

use axum::body::Bytes;

pub use memory::MemoryCache;

/// Concurrency-safe store of response bodies keyed by upstream URL.
///
/// `get` returns a complete value from an earlier `set` or nothing; readers
/// never observe a partially written body.
pub trait ResponseCache: Send + Sync {
    /// Look up the body stored for `key`.
    fn get(&self, key: &str) -> Option<Bytes>;

    /// Store `value` for `key`, replacing any previous body.
    fn set(&self, key: String, value: Bytes);

    /// Number of stored entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
