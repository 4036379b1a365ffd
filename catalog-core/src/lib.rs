//! Catalog Core - Entity Types
//!
//! Data types shared by every other crate: entities and their ids, caller
//! inputs, validation rules, errors and configuration. No storage access
//! and no caching lives here.

pub mod config;
pub mod date;
pub mod entities;
pub mod enums;
pub mod error;
pub mod identity;
pub mod input;
pub mod validation;

pub use config::{CacheBackendKind, CatalogConfig, LogFormat, DEFAULT_CACHE_TTL_SECS};
pub use date::CatalogDate;
pub use entities::{fields, Album, Artist, CatalogEntity, Listener};
pub use enums::{EntityType, SubscriptionTier};
pub use error::{
    CatalogError, CatalogResult, ConfigError, ErrorCode, StorageError, ValidationError,
};
pub use identity::{new_entity_id, AlbumId, ArtistId, EntityIdType, ListenerId};
pub use input::{
    AlbumChanges, AlbumPatch, ArtistChanges, ArtistPatch, ListenerChanges, ListenerPatch,
    NewAlbum, NewArtist, NewListener,
};
pub use validation::{HasUpdates, ValidateNonEmpty};
