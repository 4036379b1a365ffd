//! Key-value cache backend trait.

use std::time::Duration;

use async_trait::async_trait;

/// Error type for key-value cache operations.
///
/// Never leaves the cache layer: [`CacheStore`](super::CacheStore) and
/// [`StatsCounters`](super::StatsCounters) log it and carry on.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CacheError {
    /// The cache could not be reached.
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    /// The backend failed while executing a command.
    #[error("Cache backend error: {0}")]
    Backend(String),

    /// A counter held a value that is not an integer.
    #[error("Value at {key} is not an integer")]
    NotAnInteger { key: String },
}

pub type CacheResult<T> = Result<T, CacheError>;

/// String-keyed key-value cache with per-entry expiry.
///
/// Values are opaque text; serialization happens one layer up.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// Read a value. Expired entries read as `None`.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Write a value that expires after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Remove a key. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Remove every key starting with `prefix`, returning how many were removed.
    async fn delete_prefix(&self, prefix: &str) -> CacheResult<u64>;

    /// Atomically increment the integer at `key` (absent counts as 0) and
    /// return the new value. Counters never expire.
    async fn incr(&self, key: &str) -> CacheResult<u64>;
}
