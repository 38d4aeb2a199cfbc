//! Bounded LRU cache for idempotent source calls.
//!
//! Keyed by call signature (adapter name + candidate + question). Shared
//! across concurrent queries; all LRU bookkeeping happens under one lock
//! so a read-then-promote is atomic per entry. The lock is never held
//! across the fetch await: on a miss the fetch runs unlocked, so two
//! concurrent misses for the same key may both fetch and the second
//! insert wins. That is the intended last-write-wins policy for
//! idempotent calls.

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;
use tracing::trace;

pub struct FetchCache<V> {
    inner: Mutex<LruCache<String, V>>,
}

impl<V: Clone> FetchCache<V> {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self { inner: Mutex::new(LruCache::new(cap)) }
    }

    /// Return the cached value for `key`, or run `fetch` and store its
    /// result. A hit promotes the entry to most-recently-used and never
    /// invokes `fetch`. Errors are not cached: a failed fetch leaves the
    /// cache unchanged for that key.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &str, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.inner.lock().unwrap().get(key) {
            trace!(key, "fetch cache hit");
            return Ok(hit.clone());
        }

        let value = fetch().await?;
        self.inner.lock().unwrap().put(key.to_string(), value.clone());
        Ok(value)
    }

    /// Whether `key` is currently cached. Does not touch LRU order.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().unwrap().contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
