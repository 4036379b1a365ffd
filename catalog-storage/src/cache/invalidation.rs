//! Coarse-grained cache invalidation after mutations.
//!
//! The dependency table below maps each entity kind to every query family
//! whose results can change when an entity of that kind is written. After a
//! mutation all entries of those families are dropped, whatever their
//! parameters.

use catalog_core::EntityType;

use super::key::QueryFamily;
use super::store::CacheStore;

/// Query families whose cached results derive from `kind`.
pub fn dependent_families(kind: EntityType) -> &'static [QueryFamily] {
    match kind {
        EntityType::Artist => &[
            QueryFamily::AllArtists,
            QueryFamily::ArtistById,
            QueryFamily::ArtistsByLabel,
            QueryFamily::ArtistsSignedBetween,
        ],
        EntityType::Album => &[
            QueryFamily::AllAlbums,
            QueryFamily::AlbumById,
            QueryFamily::AlbumsByArtistId,
            QueryFamily::AlbumsByGenre,
            QueryFamily::AlbumsByPromoDateRange,
        ],
        EntityType::Listener => &[
            QueryFamily::AllListeners,
            QueryFamily::ListenerById,
            QueryFamily::ListenersByAlbumId,
            QueryFamily::ListenersBySubscription,
            QueryFamily::SearchListenersByLastName,
        ],
    }
}

#[derive(Debug, Clone)]
pub struct InvalidationCoordinator {
    store: CacheStore,
}

impl InvalidationCoordinator {
    pub fn new(store: CacheStore) -> Self {
        Self { store }
    }

    /// Drop every cached entry derived from the given entity kinds.
    ///
    /// Cache failures are absorbed by the store; entries that could not be
    /// removed expire with their TTL. Returns the number of entries removed.
    pub async fn invalidate_after_mutation(&self, affected: &[EntityType]) -> u64 {
        let mut removed = 0u64;
        for &kind in affected {
            for family in dependent_families(kind) {
                let prefix = family.key_prefix();
                removed += if family.is_listing() {
                    self.store.delete_raw(&prefix).await
                } else {
                    self.store.delete_prefix(&prefix).await
                };
            }
        }
        tracing::debug!(affected = ?affected, removed, "Invalidated cached queries");
        removed
    }
}
