//! Referential integrity engine.
//!
//! The write path for each entity kind. Every mutation follows the same
//! order: authoritative write, then cascades on dependent collections, then
//! cache invalidation. Cascades are bulk updates that can be re-run safely.

pub mod album;
pub mod artist;
pub mod listener;

use catalog_core::{CatalogError, EntityType, StorageError, ValidateNonEmpty};

pub use album::{
    add_album, cascade_album_removal, edit_album, remove_album, update_album_artist,
};
pub use artist::{add_artist, cascade_artist_removal, edit_artist, remove_artist};
pub use listener::{
    add_listener, edit_listener, favorite_album, remove_listener, unfavorite_album,
};

fn not_added(entity_type: EntityType) -> CatalogError {
    StorageError::NotAdded {
        entity_type,
        reason: "insert was not acknowledged".to_string(),
    }
    .into()
}

fn not_updated(entity_type: EntityType, id: impl Into<String>) -> CatalogError {
    StorageError::NotUpdated {
        entity_type,
        id: id.into(),
    }
    .into()
}

/// Validate a caller-supplied id as a non-empty trimmed string.
pub(crate) fn require_id(field: &str, raw: &str) -> Result<String, CatalogError> {
    Ok(raw.validate_non_empty(field)?)
}
