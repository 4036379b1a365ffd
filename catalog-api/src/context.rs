//! Process-wide handles shared by every catalog operation.
//!
//! A [`CatalogContext`] is built once by the entry point, passed by
//! reference into each service call and closed with
//! [`CatalogContext::shutdown`].

use std::collections::BTreeMap;
use std::sync::Arc;

use catalog_core::{
    CacheBackendKind, CatalogConfig, CatalogDate, CatalogEntity, CatalogError, CatalogResult,
    EntityType,
};
use catalog_storage::{
    CacheConfig, CacheStats, CacheStore, DocumentStore, InMemoryDocumentStore,
    InMemoryKeyValueCache, InvalidationCoordinator, KeyValueCache, LmdbKeyValueCache,
    StatsCounters,
};

/// Document store, cache store, stats counters and invalidation coordinator.
pub struct CatalogContext<S = InMemoryDocumentStore> {
    store: Arc<S>,
    cache: CacheStore,
    stats: StatsCounters,
    invalidation: InvalidationCoordinator,
    /// Overrides the wall clock for age checks.
    fixed_today: Option<CatalogDate>,
}

impl<S> Clone for CatalogContext<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: self.cache.clone(),
            stats: self.stats.clone(),
            invalidation: self.invalidation.clone(),
            fixed_today: self.fixed_today,
        }
    }
}

impl<S: DocumentStore> CatalogContext<S> {
    /// Wire a context from already-open handles.
    pub fn new(store: Arc<S>, backend: Arc<dyn KeyValueCache>, cache_config: CacheConfig) -> Self {
        let cache = CacheStore::new(Arc::clone(&backend), cache_config);
        Self {
            store,
            stats: StatsCounters::new(backend),
            invalidation: InvalidationCoordinator::new(cache.clone()),
            cache,
            fixed_today: None,
        }
    }

    /// Open the cache backend described by `config` and wire it to `store`.
    ///
    /// An LMDB cache that fails to open is replaced by an in-memory one: the
    /// catalog stays correct without a persistent cache.
    pub fn open(config: &CatalogConfig, store: S) -> CatalogResult<Self> {
        config.validate()?;

        let backend: Arc<dyn KeyValueCache> = match (config.cache_backend, &config.cache_path) {
            (CacheBackendKind::Lmdb, Some(path)) => {
                match LmdbKeyValueCache::new(path, config.cache_max_size_mb) {
                    Ok(cache) => Arc::new(cache),
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "LMDB cache unavailable, falling back to in-memory cache"
                        );
                        Arc::new(InMemoryKeyValueCache::new())
                    }
                }
            }
            _ => Arc::new(InMemoryKeyValueCache::new()),
        };

        tracing::info!(
            backend = %config.cache_backend,
            ttl_secs = config.cache_ttl.as_secs(),
            "Catalog context opened"
        );

        Ok(Self::new(
            Arc::new(store),
            backend,
            CacheConfig::new().with_ttl(config.cache_ttl),
        ))
    }

    /// Pin "today" for listener age validation.
    pub fn with_today(mut self, today: CatalogDate) -> Self {
        self.fixed_today = Some(today);
        self
    }

    /// Release the handles. Outstanding clones keep their own references.
    pub fn shutdown(self) {
        tracing::info!("Catalog context closed");
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn stats(&self) -> &StatsCounters {
        &self.stats
    }

    pub fn invalidation(&self) -> &InvalidationCoordinator {
        &self.invalidation
    }

    pub fn today(&self) -> CatalogDate {
        self.fixed_today.unwrap_or_else(CatalogDate::today)
    }

    /// Hit/miss counters for every entity kind.
    pub async fn cache_stats(&self) -> BTreeMap<EntityType, CacheStats> {
        let mut all = BTreeMap::new();
        for kind in EntityType::ALL {
            all.insert(kind, self.stats.read_stats(kind).await);
        }
        all
    }

    /// Fetch a document or fail with `NotFound` for its kind.
    pub(crate) async fn require<D: CatalogEntity>(&self, id: &str) -> CatalogResult<D> {
        self.store
            .find_one::<D>(id)
            .await?
            .ok_or_else(|| CatalogError::not_found(D::entity_type(), id))
    }

    pub(crate) async fn invalidate(&self, affected: &[EntityType]) {
        self.invalidation.invalidate_after_mutation(affected).await;
    }
}

impl<S> std::fmt::Debug for CatalogContext<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogContext")
            .field("cache", &self.cache)
            .field("fixed_today", &self.fixed_today)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::{Artist, ConfigError};
    use std::time::Duration;

    #[tokio::test]
    async fn test_open_rejects_invalid_config() {
        let config = CatalogConfig::default().with_cache_ttl(Duration::ZERO);
        let result = CatalogContext::open(&config, InMemoryDocumentStore::new());
        assert!(matches!(
            result,
            Err(CatalogError::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[tokio::test]
    async fn test_open_with_lmdb_backend() {
        let dir = tempfile::TempDir::new().expect("TempDir creation should succeed");
        let config = CatalogConfig::default().with_lmdb(dir.path());
        let ctx = CatalogContext::open(&config, InMemoryDocumentStore::new())
            .expect("open should succeed");
        assert_eq!(ctx.cache().default_ttl(), Duration::from_secs(3600));
        ctx.shutdown();
    }

    #[tokio::test]
    async fn test_cache_stats_covers_every_kind() {
        let ctx = CatalogContext::open(&CatalogConfig::default(), InMemoryDocumentStore::new())
            .expect("open should succeed");
        ctx.stats().record_miss(EntityType::Album).await;

        let stats = ctx.cache_stats().await;
        assert_eq!(stats.len(), 3);
        assert_eq!(stats[&EntityType::Album].misses, 1);
        assert_eq!(stats[&EntityType::Artist], CacheStats::default());
    }

    #[tokio::test]
    async fn test_require_missing_is_not_found() {
        let ctx = CatalogContext::open(&CatalogConfig::default(), InMemoryDocumentStore::new())
            .expect("open should succeed");
        let result = ctx.require::<Artist>("ghost").await;
        assert!(matches!(
            result,
            Err(CatalogError::NotFound { entity_type: EntityType::Artist, .. })
        ));
    }
}
