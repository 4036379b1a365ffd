//! Cache layer for query results.
//!
//! Reads are cache-aside: the caller builds a key from a [`QueryKind`],
//! consults the [`CacheStore`], and on a miss loads from the document store
//! and populates the cache. Writes go to the document store first; the
//! [`InvalidationCoordinator`] then drops every entry that might be stale.
//!
//! # Failure Model
//!
//! The key-value cache is optional for correctness. [`CacheError`] never
//! escapes [`CacheStore`], [`StatsCounters`] or [`InvalidationCoordinator`]:
//! failures are logged, reads become misses and writes become no-ops.
//!
//! # Example
//!
//! ```ignore
//! let key = QueryKind::AlbumsByGenre("Jazz".into()).cache_key();
//! if let Some(albums) = store.get::<Vec<Album>>(&key).await {
//!     stats.record_hit(EntityType::Album).await;
//!     return Ok(albums);
//! }
//! ```

pub mod backend;
pub mod invalidation;
pub mod key;
pub mod lmdb_backend;
pub mod memory;
pub mod stats;
pub mod store;

pub use backend::{CacheError, CacheResult, KeyValueCache};
pub use invalidation::{dependent_families, InvalidationCoordinator};
pub use key::{stats_key, CacheKey, Outcome, QueryFamily, QueryKind};
pub use lmdb_backend::{LmdbCacheError, LmdbKeyValueCache};
pub use memory::InMemoryKeyValueCache;
pub use stats::{CacheStats, StatsCounters};
pub use store::{CacheConfig, CacheStore};
