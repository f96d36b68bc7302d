//! In-memory response cache.

use std::sync::Arc;

use axum::body::Bytes;
use dashmap::DashMap;

use crate::cache::ResponseCache;
use crate::observability::metrics;

/// Unbounded in-memory cache living for the lifetime of the process.
///
/// Values are `Bytes`, so a hit hands out a reference-counted read-only
/// view instead of copying the body. Cloning the cache shares the map.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    inner: Arc<DashMap<String, Bytes>>,
}

impl MemoryCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResponseCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Bytes> {
        self.inner.get(key).map(|r| r.value().clone())
    }

    fn set(&self, key: String, value: Bytes) {
        let size = value.len();
        if self.inner.insert(key, value).is_none() {
            metrics::record_cache_size(self.inner.len());
        }
        tracing::trace!(bytes = size, entries = self.inner.len(), "Cache entry stored");
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}
