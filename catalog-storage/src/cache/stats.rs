//! Hit/miss counters per entity kind.
//!
//! Counters live in the key-value cache itself (`stats:<kind>:hits`,
//! `stats:<kind>:misses`), so they persist exactly as long as the cache
//! does.

use std::sync::Arc;

use catalog_core::EntityType;
use serde::{Deserialize, Serialize};

use super::backend::KeyValueCache;
use super::key::{stats_key, Outcome};

/// Statistics about cache usage for one entity kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Clone)]
pub struct StatsCounters {
    backend: Arc<dyn KeyValueCache>,
}

impl StatsCounters {
    pub fn new(backend: Arc<dyn KeyValueCache>) -> Self {
        Self { backend }
    }

    pub async fn record_hit(&self, kind: EntityType) {
        self.bump(kind, Outcome::Hit).await;
    }

    pub async fn record_miss(&self, kind: EntityType) {
        self.bump(kind, Outcome::Miss).await;
    }

    async fn bump(&self, kind: EntityType, outcome: Outcome) {
        let key = stats_key(kind, outcome);
        if let Err(e) = self.backend.incr(&key).await {
            tracing::warn!(key = %key, error = %e, "Failed to increment stats counter");
        }
    }

    /// Current counters for `kind`. Unreadable counters read as zero.
    pub async fn read_stats(&self, kind: EntityType) -> CacheStats {
        CacheStats {
            hits: self.read_counter(kind, Outcome::Hit).await,
            misses: self.read_counter(kind, Outcome::Miss).await,
        }
    }

    async fn read_counter(&self, kind: EntityType, outcome: Outcome) -> u64 {
        let key = stats_key(kind, outcome);
        match self.backend.get(&key).await {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(key = %key, value = %raw, "Stats counter is not an integer");
                0
            }),
            Ok(None) => 0,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to read stats counter");
                0
            }
        }
    }
}

impl std::fmt::Debug for StatsCounters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsCounters").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::memory::InMemoryKeyValueCache;

    #[test]
    fn test_hit_rate() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
        let stats = CacheStats { hits: 3, misses: 1 };
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_counters_are_per_kind() {
        let cache = InMemoryKeyValueCache::new();
        let stats = StatsCounters::new(Arc::new(cache.clone()));

        stats.record_hit(EntityType::Artist).await;
        stats.record_hit(EntityType::Artist).await;
        stats.record_miss(EntityType::Artist).await;
        stats.record_miss(EntityType::Album).await;

        assert_eq!(
            stats.read_stats(EntityType::Artist).await,
            CacheStats { hits: 2, misses: 1 }
        );
        assert_eq!(
            stats.read_stats(EntityType::Album).await,
            CacheStats { hits: 0, misses: 1 }
        );
        assert_eq!(stats.read_stats(EntityType::Listener).await, CacheStats::default());
        assert_eq!(cache.get("stats:artist:hits").await, Ok(Some("2".to_string())));
    }

    #[tokio::test]
    async fn test_offline_counters_read_zero() {
        let cache = InMemoryKeyValueCache::new();
        let stats = StatsCounters::new(Arc::new(cache.clone()));
        stats.record_hit(EntityType::Listener).await;

        cache.set_offline(true);
        stats.record_hit(EntityType::Listener).await;
        assert_eq!(stats.read_stats(EntityType::Listener).await, CacheStats::default());

        cache.set_offline(false);
        assert_eq!(stats.read_stats(EntityType::Listener).await.hits, 1);
    }
}
