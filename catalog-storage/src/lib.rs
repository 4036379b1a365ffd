//! Catalog Storage - Document Store and Cache
//!
//! The authoritative document store abstraction with an in-memory
//! implementation, and the cache subsystem that keeps query results
//! coherent with it.

pub mod cache;
pub mod document;
pub mod filter;

pub use cache::{
    dependent_families, CacheConfig, CacheError, CacheKey, CacheStats, CacheStore,
    InMemoryKeyValueCache, InvalidationCoordinator, KeyValueCache, LmdbCacheError,
    LmdbKeyValueCache, QueryFamily, QueryKind, StatsCounters,
};
pub use document::{DocumentStore, InMemoryDocumentStore, StorageResult};
pub use filter::{Filter, UpdateOp};
