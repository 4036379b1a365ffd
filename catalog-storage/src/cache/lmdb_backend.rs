//! LMDB-backed key-value cache.
//!
//! Uses the heed crate (Rust bindings for LMDB) so that cached query
//! results and stats counters survive process restarts.
//!
//! # Value Layout
//!
//! `[expires_at: 8 bytes, i64 LE unix millis][utf-8 value]`. An expiry of
//! `0` means the entry never expires (stats counters).
//!
//! # Thread Safety
//!
//! LMDB provides ACID transactions. Reads use a read transaction; writes,
//! prefix deletes and counter increments each run inside a single write
//! transaction.
//!
//! # Eviction
//!
//! An expired entry found by `get` is deleted on the spot, and every `set`
//! sweeps expired entries inside its write transaction, so the map does not
//! fill up with dead parameterised keys.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use super::backend::{CacheError, CacheResult, KeyValueCache};

const HEADER_LEN: usize = 8;
const NO_EXPIRY: i64 = 0;

/// Error type for opening the LMDB environment.
#[derive(Debug, thiserror::Error)]
pub enum LmdbCacheError {
    /// The environment could not be opened or created.
    #[error("Failed to open LMDB environment: {0}")]
    EnvOpen(String),

    /// The unnamed database could not be opened or created.
    #[error("Failed to open database: {0}")]
    DbOpen(String),

    /// A read or write transaction failed.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// A stored entry does not follow the value layout.
    #[error("Corrupt entry: {0}")]
    Corrupt(String),

    /// Creating the cache directory failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LmdbCacheError> for CacheError {
    fn from(e: LmdbCacheError) -> Self {
        CacheError::Backend(e.to_string())
    }
}

fn txn_error(e: heed::Error) -> CacheError {
    LmdbCacheError::Transaction(e.to_string()).into()
}

fn encode_entry(value: &str, expires_at: i64) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(HEADER_LEN + value.len());
    bytes.extend_from_slice(&expires_at.to_le_bytes());
    bytes.extend_from_slice(value.as_bytes());
    bytes
}

/// Split a stored entry into its expiry and value.
fn decode_entry(bytes: &[u8]) -> Result<(i64, String), LmdbCacheError> {
    if bytes.len() < HEADER_LEN {
        return Err(LmdbCacheError::Corrupt("entry shorter than header".into()));
    }
    let header: [u8; HEADER_LEN] = bytes[..HEADER_LEN]
        .try_into()
        .map_err(|_| LmdbCacheError::Corrupt("invalid expiry header".into()))?;
    let value = std::str::from_utf8(&bytes[HEADER_LEN..])
        .map_err(|e| LmdbCacheError::Corrupt(e.to_string()))?;
    Ok((i64::from_le_bytes(header), value.to_string()))
}

fn is_live(expires_at: i64, now_millis: i64) -> bool {
    expires_at == NO_EXPIRY || now_millis < expires_at
}

/// True when the entry carries an expiry that has passed. Entries too short
/// to hold a header are left alone.
fn has_expired(bytes: &[u8], now_millis: i64) -> bool {
    match bytes.get(..HEADER_LEN).and_then(|h| <[u8; HEADER_LEN]>::try_from(h).ok()) {
        Some(header) => !is_live(i64::from_le_bytes(header), now_millis),
        None => false,
    }
}

/// LMDB-backed [`KeyValueCache`].
///
/// # Example
///
/// ```ignore
/// let cache = LmdbKeyValueCache::new("/var/lib/catalog/cache", 64)?;
/// cache.set("cache:artists", "[]", Duration::from_secs(3600)).await?;
/// ```
pub struct LmdbKeyValueCache {
    env: Env,
    db: Database<Bytes, Bytes>,
}

impl LmdbKeyValueCache {
    /// Open (or create) the cache under `path` with a map of `max_size_mb`.
    pub fn new<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, LmdbCacheError> {
        std::fs::create_dir_all(&path)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb * 1024 * 1024)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(|e| LmdbCacheError::EnvOpen(e.to_string()))?;

        let mut wtxn = env
            .write_txn()
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;

        let db: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, None)
            .map_err(|e| LmdbCacheError::DbOpen(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;

        Ok(Self { env, db })
    }

    /// Number of entries stored, expired ones included.
    pub fn stored_entries(&self) -> CacheResult<u64> {
        let rtxn = self.env.read_txn().map_err(txn_error)?;
        self.db.len(&rtxn).map_err(txn_error)
    }

    /// Delete `key` if it is still expired under a write transaction.
    fn evict_if_expired(&self, key: &str) -> CacheResult<()> {
        let mut wtxn = self.env.write_txn().map_err(txn_error)?;
        let expired = self
            .db
            .get(&wtxn, key.as_bytes())
            .map_err(txn_error)?
            .is_some_and(|bytes| has_expired(bytes, Utc::now().timestamp_millis()));
        if expired {
            self.db
                .delete(&mut wtxn, key.as_bytes())
                .map_err(txn_error)?;
        }
        wtxn.commit().map_err(txn_error)
    }

    /// Delete every expired entry visible to `wtxn`.
    fn sweep_expired(&self, wtxn: &mut heed::RwTxn<'_>, now_millis: i64) -> CacheResult<u64> {
        let mut swept = 0u64;
        let mut iter = self.db.iter_mut(wtxn).map_err(txn_error)?;
        while let Some(result) = iter.next() {
            let (_, bytes) = result.map_err(txn_error)?;
            if has_expired(bytes, now_millis) {
                // SAFETY: no reference into the current entry is held past this point.
                if unsafe { iter.del_current() }.map_err(txn_error)? {
                    swept += 1;
                }
            }
        }
        Ok(swept)
    }
}

#[async_trait]
impl KeyValueCache for LmdbKeyValueCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let rtxn = self.env.read_txn().map_err(txn_error)?;
        let Some(bytes) = self.db.get(&rtxn, key.as_bytes()).map_err(txn_error)? else {
            return Ok(None);
        };
        let (expires_at, value) = decode_entry(bytes)?;
        if is_live(expires_at, Utc::now().timestamp_millis()) {
            return Ok(Some(value));
        }
        drop(rtxn);
        self.evict_if_expired(key)?;
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let now_millis = Utc::now().timestamp_millis();
        let expires_at = now_millis.saturating_add(ttl_millis).max(1);
        let bytes = encode_entry(value, expires_at);

        let mut wtxn = self.env.write_txn().map_err(txn_error)?;
        self.sweep_expired(&mut wtxn, now_millis)?;
        self.db
            .put(&mut wtxn, key.as_bytes(), &bytes)
            .map_err(txn_error)?;
        wtxn.commit().map_err(txn_error)
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let mut wtxn = self.env.write_txn().map_err(txn_error)?;
        let deleted = self
            .db
            .delete(&mut wtxn, key.as_bytes())
            .map_err(txn_error)?;
        wtxn.commit().map_err(txn_error)?;
        Ok(deleted)
    }

    async fn delete_prefix(&self, prefix: &str) -> CacheResult<u64> {
        let mut wtxn = self.env.write_txn().map_err(txn_error)?;

        let mut deleted = 0u64;
        {
            let mut iter = self
                .db
                .prefix_iter_mut(&mut wtxn, prefix.as_bytes())
                .map_err(txn_error)?;
            while let Some(result) = iter.next() {
                result.map_err(txn_error)?;
                // SAFETY: the key and value of the current entry are not kept.
                if unsafe { iter.del_current() }.map_err(txn_error)? {
                    deleted += 1;
                }
            }
        }

        wtxn.commit().map_err(txn_error)?;
        Ok(deleted)
    }

    async fn incr(&self, key: &str) -> CacheResult<u64> {
        let mut wtxn = self.env.write_txn().map_err(txn_error)?;

        let current = match self.db.get(&wtxn, key.as_bytes()).map_err(txn_error)? {
            Some(bytes) => {
                let (expires_at, value) = decode_entry(bytes)?;
                if is_live(expires_at, Utc::now().timestamp_millis()) {
                    value.parse::<u64>().map_err(|_| CacheError::NotAnInteger {
                        key: key.to_string(),
                    })?
                } else {
                    0
                }
            }
            None => 0,
        };

        let next = current + 1;
        let bytes = encode_entry(&next.to_string(), NO_EXPIRY);
        self.db
            .put(&mut wtxn, key.as_bytes(), &bytes)
            .map_err(txn_error)?;
        wtxn.commit().map_err(txn_error)?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_cache() -> (LmdbKeyValueCache, TempDir) {
        let temp_dir = TempDir::new().expect("TempDir creation should succeed");
        let cache =
            LmdbKeyValueCache::new(temp_dir.path(), 10).expect("cache creation should succeed");
        (cache, temp_dir)
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let (cache, _temp_dir) = create_test_cache();
        assert_eq!(cache.get("cache:artists").await, Ok(None));
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let (cache, _temp_dir) = create_test_cache();
        cache
            .set("cache:artists", "[{\"_id\":\"a1\"}]", Duration::from_secs(60))
            .await
            .expect("set should succeed");
        assert_eq!(
            cache.get("cache:artists").await,
            Ok(Some("[{\"_id\":\"a1\"}]".to_string()))
        );
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_missing() {
        let (cache, _temp_dir) = create_test_cache();
        cache
            .set("k", "v", Duration::from_millis(1))
            .await
            .expect("set should succeed");
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.get("k").await, Ok(None));
    }

    #[tokio::test]
    async fn test_expired_entries_are_evicted() {
        let (cache, _temp_dir) = create_test_cache();
        for i in 0..200 {
            cache
                .set(&format!("cache:getAlbumsByGenre:g{}", i), "[]", Duration::from_millis(1))
                .await
                .expect("set");
        }
        cache.incr("stats:album:hits").await.expect("incr");
        tokio::time::sleep(Duration::from_millis(20)).await;

        // The last key set has not been through a sweep yet.
        let before = cache.stored_entries().expect("count");
        assert_eq!(cache.get("cache:getAlbumsByGenre:g199").await, Ok(None));
        assert_eq!(cache.stored_entries(), Ok(before - 1));

        cache
            .set("cache:albums", "[]", Duration::from_secs(60))
            .await
            .expect("set");
        assert_eq!(cache.stored_entries(), Ok(2));
        assert_eq!(cache.get("stats:album:hits").await, Ok(Some("1".to_string())));
        assert_eq!(cache.get("cache:albums").await, Ok(Some("[]".to_string())));
    }

    #[tokio::test]
    async fn test_delete() {
        let (cache, _temp_dir) = create_test_cache();
        cache
            .set("k", "v", Duration::from_secs(60))
            .await
            .expect("set should succeed");
        assert_eq!(cache.delete("k").await, Ok(true));
        assert_eq!(cache.delete("k").await, Ok(false));
        assert_eq!(cache.get("k").await, Ok(None));
    }

    #[tokio::test]
    async fn test_delete_prefix_only_touches_matching_keys() {
        let (cache, _temp_dir) = create_test_cache();
        let ttl = Duration::from_secs(60);
        cache.set("cache:getArtistById:a1", "{}", ttl).await.expect("set");
        cache.set("cache:getArtistById:a2", "{}", ttl).await.expect("set");
        cache.set("cache:artists", "[]", ttl).await.expect("set");
        cache.incr("stats:artist:hits").await.expect("incr");

        let removed = cache
            .delete_prefix("cache:getArtistById:")
            .await
            .expect("delete_prefix should succeed");
        assert_eq!(removed, 2);
        assert_eq!(cache.get("cache:artists").await, Ok(Some("[]".to_string())));
        assert_eq!(cache.get("stats:artist:hits").await, Ok(Some("1".to_string())));
    }

    #[tokio::test]
    async fn test_counters_survive_reopen() {
        let temp_dir = TempDir::new().expect("TempDir creation should succeed");
        {
            let cache = LmdbKeyValueCache::new(temp_dir.path(), 10).expect("open");
            cache.incr("stats:album:misses").await.expect("incr");
            cache.incr("stats:album:misses").await.expect("incr");
        }
        let cache = LmdbKeyValueCache::new(temp_dir.path(), 10).expect("reopen");
        assert_eq!(cache.incr("stats:album:misses").await, Ok(3));
    }

    #[test]
    fn test_decode_rejects_short_entry() {
        assert!(decode_entry(&[1, 2, 3]).is_err());
        let bytes = encode_entry("v", NO_EXPIRY);
        assert_eq!(decode_entry(&bytes).expect("decode"), (NO_EXPIRY, "v".to_string()));
    }
}
