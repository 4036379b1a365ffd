//! Catalog configuration
//!
//! Loaded from environment variables with development-friendly defaults.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{CatalogError, CatalogResult, ConfigError};

/// Default lifetime of a cached query result: one hour.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Default LMDB map size.
pub const DEFAULT_CACHE_MAX_SIZE_MB: usize = 64;

/// Which key-value cache backs the cache store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    #[default]
    Memory,
    Lmdb,
}

impl fmt::Display for CacheBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheBackendKind::Memory => f.write_str("memory"),
            CacheBackendKind::Lmdb => f.write_str("lmdb"),
        }
    }
}

impl FromStr for CacheBackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(CacheBackendKind::Memory),
            "lmdb" => Ok(CacheBackendKind::Lmdb),
            _ => Err(ConfigError::InvalidValue {
                field: "cache_backend".to_string(),
                value: s.to_string(),
                reason: "expected memory or lmdb".to_string(),
            }),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::InvalidValue {
                field: "log_format".to_string(),
                value: s.to_string(),
                reason: "expected pretty or json".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Lifetime applied to every cached query result.
    pub cache_ttl: Duration,

    pub cache_backend: CacheBackendKind,

    /// LMDB environment directory. Required when `cache_backend` is `lmdb`.
    pub cache_path: Option<PathBuf>,

    /// LMDB map size in megabytes.
    pub cache_max_size_mb: usize,

    pub log_format: LogFormat,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            cache_backend: CacheBackendKind::Memory,
            cache_path: None,
            cache_max_size_mb: DEFAULT_CACHE_MAX_SIZE_MB,
            log_format: LogFormat::Pretty,
        }
    }
}

impl CatalogConfig {
    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `CATALOG_CACHE_TTL_SECS`: Cached result lifetime (default: 3600)
    /// - `CATALOG_CACHE_BACKEND`: "memory" or "lmdb" (default: memory)
    /// - `CATALOG_CACHE_PATH`: LMDB directory (no default)
    /// - `CATALOG_CACHE_MAX_SIZE_MB`: LMDB map size (default: 64)
    /// - `CATALOG_LOG_FORMAT`: "pretty" or "json" (default: pretty)
    ///
    /// Absent or unparsable values fall back to the default. Call
    /// [`validate`](Self::validate) before use.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let cache_ttl = std::env::var("CATALOG_CACHE_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.cache_ttl);

        let cache_backend = std::env::var("CATALOG_CACHE_BACKEND")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.cache_backend);

        let cache_path = std::env::var("CATALOG_CACHE_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let cache_max_size_mb = std::env::var("CATALOG_CACHE_MAX_SIZE_MB")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.cache_max_size_mb);

        let log_format = std::env::var("CATALOG_LOG_FORMAT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.log_format);

        Self {
            cache_ttl,
            cache_backend,
            cache_path,
            cache_max_size_mb,
            log_format,
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Switch to the LMDB backend rooted at `path`.
    pub fn with_lmdb(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_backend = CacheBackendKind::Lmdb;
        self.cache_path = Some(path.into());
        self
    }

    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - cache_ttl > 0
    /// - cache_max_size_mb > 0
    /// - cache_path is set when the backend is lmdb
    pub fn validate(&self) -> CatalogResult<()> {
        if self.cache_ttl.is_zero() {
            return Err(CatalogError::Config(ConfigError::InvalidValue {
                field: "cache_ttl".to_string(),
                value: "0".to_string(),
                reason: "cache_ttl must be greater than 0".to_string(),
            }));
        }

        if self.cache_max_size_mb == 0 {
            return Err(CatalogError::Config(ConfigError::InvalidValue {
                field: "cache_max_size_mb".to_string(),
                value: "0".to_string(),
                reason: "cache_max_size_mb must be greater than 0".to_string(),
            }));
        }

        if self.cache_backend == CacheBackendKind::Lmdb && self.cache_path.is_none() {
            return Err(CatalogError::Config(ConfigError::MissingRequired {
                field: "cache_path".to_string(),
            }));
        }

        Ok(())
    }
}
