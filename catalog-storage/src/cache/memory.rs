//! In-process key-value cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::backend::{CacheError, CacheResult, KeyValueCache};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// A `HashMap`-backed [`KeyValueCache`].
///
/// Expired entries read as missing and are swept out on every `set`.
///
/// [`set_offline`](Self::set_offline) makes every call fail with
/// [`CacheError::Unavailable`], which is how tests exercise the
/// degrade-to-miss path.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKeyValueCache {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    offline: Arc<AtomicBool>,
}

impl InMemoryKeyValueCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of entries held in the map, expired ones included.
    pub async fn held(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Number of live entries, counters included.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| e.is_live(now))
            .count()
    }

    pub async fn contains_key(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .get(key)
            .is_some_and(|e| e.is_live(now))
    }

    fn check_online(&self) -> CacheResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("in-memory cache is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueCache for InMemoryKeyValueCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.check_online()?;
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.check_online()?;
        let now = Instant::now();
        let entry = Entry {
            value: value.to_string(),
            expires_at: Some(now + ttl),
        };
        let mut entries = self.entries.write().await;
        entries.retain(|_, e| e.is_live(now));
        entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        self.check_online()?;
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn delete_prefix(&self, prefix: &str) -> CacheResult<u64> {
        self.check_online()?;
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }

    async fn incr(&self, key: &str) -> CacheResult<u64> {
        self.check_online()?;
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let current = match entries.get(key).filter(|e| e.is_live(now)) {
            Some(entry) => entry
                .value
                .parse::<u64>()
                .map_err(|_| CacheError::NotAnInteger {
                    key: key.to_string(),
                })?,
            None => 0,
        };
        let next = current + 1;
        entries.insert(
            key.to_string(),
            Entry {
                value: next.to_string(),
                expires_at: None,
            },
        );
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let cache = InMemoryKeyValueCache::new();
        assert_eq!(cache.get("cache:artists").await, Ok(None));
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = InMemoryKeyValueCache::new();
        cache
            .set("k", "v", Duration::from_secs(60))
            .await
            .expect("set should succeed");
        assert_eq!(cache.get("k").await, Ok(Some("v".to_string())));
        assert_eq!(cache.delete("k").await, Ok(true));
        assert_eq!(cache.delete("k").await, Ok(false));
        assert_eq!(cache.get("k").await, Ok(None));
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_missing() {
        let cache = InMemoryKeyValueCache::new();
        cache
            .set("k", "v", Duration::from_millis(1))
            .await
            .expect("set should succeed");
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.get("k").await, Ok(None));
        assert!(!cache.contains_key("k").await);
    }

    #[tokio::test]
    async fn test_set_sweeps_expired_entries() {
        let cache = InMemoryKeyValueCache::new();
        for i in 0..1000 {
            cache
                .set(&format!("cache:searchListenersByLastName:{}", i), "[]", Duration::from_millis(1))
                .await
                .expect("set");
        }
        cache.incr("stats:listener:misses").await.expect("incr");
        tokio::time::sleep(Duration::from_millis(20)).await;

        for i in 0..10 {
            assert_eq!(cache.get(&format!("cache:searchListenersByLastName:{}", i)).await, Ok(None));
        }
        for i in 0..10 {
            cache
                .set(&format!("cache:getListenerById:{}", i), "{}", Duration::from_secs(60))
                .await
                .expect("set");
        }

        assert_eq!(cache.len().await, 11);
        assert_eq!(cache.held().await, 11);
        assert_eq!(cache.get("stats:listener:misses").await, Ok(Some("1".to_string())));
    }

    #[tokio::test]
    async fn test_delete_prefix() {
        let cache = InMemoryKeyValueCache::new();
        let ttl = Duration::from_secs(60);
        cache.set("cache:getAlbumsByGenre:jazz", "[]", ttl).await.expect("set");
        cache.set("cache:getAlbumsByGenre:rock", "[]", ttl).await.expect("set");
        cache.set("cache:albums", "[]", ttl).await.expect("set");

        let removed = cache
            .delete_prefix("cache:getAlbumsByGenre:")
            .await
            .expect("delete_prefix should succeed");
        assert_eq!(removed, 2);
        assert!(cache.contains_key("cache:albums").await);
    }

    #[tokio::test]
    async fn test_incr_counts_from_zero() {
        let cache = InMemoryKeyValueCache::new();
        assert_eq!(cache.incr("stats:artist:hits").await, Ok(1));
        assert_eq!(cache.incr("stats:artist:hits").await, Ok(2));
        assert_eq!(cache.get("stats:artist:hits").await, Ok(Some("2".to_string())));
    }

    #[tokio::test]
    async fn test_incr_rejects_non_integer() {
        let cache = InMemoryKeyValueCache::new();
        cache
            .set("k", "not-a-number", Duration::from_secs(60))
            .await
            .expect("set");
        assert!(matches!(
            cache.incr("k").await,
            Err(CacheError::NotAnInteger { .. })
        ));
    }

    #[tokio::test]
    async fn test_offline_cache_fails_every_call() {
        let cache = InMemoryKeyValueCache::new();
        cache.set_offline(true);
        assert!(matches!(cache.get("k").await, Err(CacheError::Unavailable(_))));
        assert!(cache.set("k", "v", Duration::from_secs(1)).await.is_err());
        assert!(cache.incr("k").await.is_err());

        cache.set_offline(false);
        assert_eq!(cache.get("k").await, Ok(None));
    }
}
