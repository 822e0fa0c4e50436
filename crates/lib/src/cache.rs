//! Keyed expiring cache store (get / put with TTL).
//!
//! Values are opaque strings, as in an external KV store. Expiry is the store's concern:
//! an entry past its TTL simply stops being returned. Callers never check freshness.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Shared key-value store with per-entry expiry. Concurrent writers to the same key are
/// allowed; the last write wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn put(&self, key: &str, value: String, ttl: Duration);
}

/// In-process store shared across request handlers.
#[derive(Clone)]
pub struct MemoryCache {
    inner: Arc<RwLock<HashMap<String, Entry>>>,
}

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Drop expired entries. Called on every put so the map stays bounded by live keys.
    async fn purge_expired(&self, now: Instant) {
        let mut g = self.inner.write().await;
        g.retain(|_, e| e.expires_at > now);
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let g = self.inner.read().await;
        g.get(key)
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| e.value.clone())
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) {
        let now = Instant::now();
        self.purge_expired(now).await;
        let mut g = self.inner.write().await;
        g.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: now + ttl,
            },
        );
    }
}
