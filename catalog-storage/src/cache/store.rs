//! Cache store: typed get/set/delete over a [`KeyValueCache`].
//!
//! This is the boundary where cache failures stop. Every error from the
//! backend, and every entry that fails to decode, is logged and turned into
//! a miss or a no-op, so callers can treat the cache as always available.

use std::sync::Arc;
use std::time::Duration;

use catalog_core::DEFAULT_CACHE_TTL_SECS;
use serde::{de::DeserializeOwned, Serialize};

use super::backend::KeyValueCache;
use super::key::CacheKey;

/// Configuration for the cache store.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL used by [`CacheStore::set`].
    pub default_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }
}

/// JSON (de)serializing wrapper around a shared [`KeyValueCache`].
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn KeyValueCache>,
    config: CacheConfig,
}

impl CacheStore {
    pub fn new(backend: Arc<dyn KeyValueCache>, config: CacheConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> &Arc<dyn KeyValueCache> {
        &self.backend
    }

    pub fn default_ttl(&self) -> Duration {
        self.config.default_ttl
    }

    /// Read and decode `key`. Missing, expired, undecodable and unreachable
    /// entries all come back as `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let raw = match self.backend.get(key.as_str()).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding malformed cache entry");
                None
            }
        }
    }

    /// Encode and store `value` under `key` with the default TTL.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &CacheKey, value: &T) {
        self.set_with_ttl(key, value, self.config.default_ttl).await
    }

    pub async fn set_with_ttl<T: Serialize + ?Sized>(
        &self,
        key: &CacheKey,
        value: &T,
        ttl: Duration,
    ) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to encode cache entry");
                return;
            }
        };
        if let Err(e) = self.backend.set(key.as_str(), &raw, ttl).await {
            tracing::warn!(key = %key, error = %e, "Cache write failed");
        }
    }

    pub async fn delete(&self, key: &CacheKey) {
        self.delete_raw(key.as_str()).await;
    }

    /// Delete an exact key given as a string (family listing keys).
    pub(crate) async fn delete_raw(&self, key: &str) -> u64 {
        match self.backend.delete(key).await {
            Ok(true) => 1,
            Ok(false) => 0,
            Err(e) => {
                tracing::warn!(key, error = %e, "Cache delete failed");
                0
            }
        }
    }

    /// Delete every key starting with `prefix`. Failures count as zero removed.
    pub(crate) async fn delete_prefix(&self, prefix: &str) -> u64 {
        match self.backend.delete_prefix(prefix).await {
            Ok(removed) => removed,
            Err(e) => {
                tracing::warn!(prefix, error = %e, "Cache prefix delete failed");
                0
            }
        }
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
