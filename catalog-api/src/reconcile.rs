//! Reconciliation pass.
//!
//! Mutations write the authoritative document first and cascade second, with
//! no transaction around the pair. A crash in between leaves albums pointing
//! at a deleted artist or listeners holding a deleted album id. `reconcile`
//! re-runs both cascades against whatever dangling references it finds.

use std::collections::BTreeSet;

use catalog_core::{Album, AlbumId, Artist, ArtistId, CatalogResult, EntityType, Listener};
use catalog_storage::{DocumentStore, Filter};
use serde::Serialize;

use crate::context::CatalogContext;
use crate::services::{cascade_album_removal, cascade_artist_removal};

/// What a reconciliation pass repaired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Albums whose artist no longer existed.
    pub albums_unlinked: u64,
    /// Listener documents that had at least one dangling favorite removed.
    pub favorites_pulled: u64,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.albums_unlinked == 0 && self.favorites_pulled == 0
    }
}

/// Repair dangling references left by interrupted cascades.
pub async fn reconcile<S: DocumentStore>(ctx: &CatalogContext<S>) -> CatalogResult<ReconcileReport> {
    let store = ctx.store();
    let mut report = ReconcileReport::default();

    let artist_ids: BTreeSet<ArtistId> = store
        .find::<Artist>(&Filter::All)
        .await?
        .into_iter()
        .map(|artist| artist.id)
        .collect();
    let albums = store.find::<Album>(&Filter::All).await?;

    let dangling_artists: BTreeSet<ArtistId> = albums
        .iter()
        .filter_map(|album| album.artist.clone())
        .filter(|artist_id| !artist_ids.contains(artist_id))
        .collect();
    for artist_id in &dangling_artists {
        report.albums_unlinked += cascade_artist_removal(store, artist_id).await?;
    }

    let album_ids: BTreeSet<AlbumId> = albums.into_iter().map(|album| album.id).collect();
    let dangling_albums: BTreeSet<AlbumId> = store
        .find::<Listener>(&Filter::All)
        .await?
        .into_iter()
        .flat_map(|listener| listener.favorite_albums)
        .filter(|album_id| !album_ids.contains(album_id))
        .collect();
    for album_id in &dangling_albums {
        report.favorites_pulled += cascade_album_removal(store, album_id).await?;
    }

    if !report.is_clean() {
        ctx.invalidate(&[EntityType::Album, EntityType::Listener]).await;
    }
    tracing::info!(
        albums_unlinked = report.albums_unlinked,
        favorites_pulled = report.favorites_pulled,
        "Reconciliation finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::{CatalogConfig, EntityIdType};
    use catalog_storage::InMemoryDocumentStore;
    use serde_json::json;

    fn context() -> CatalogContext {
        CatalogContext::open(&CatalogConfig::default(), InMemoryDocumentStore::new())
            .expect("open should succeed")
    }

    fn seed_orphans(ctx: &CatalogContext) {
        ctx.store()
            .insert_raw(
                EntityType::Album,
                json!({
                    "_id": "album-1",
                    "title": "Night Drive",
                    "genre": "Synthwave",
                    "track_count": 9,
                    "artist": "artist-gone",
                    "release_date": "03/01/2024",
                    "promo_start": "02/01/2024",
                    "promo_end": "03/15/2024"
                }),
            )
            .expect("seed album");
        ctx.store()
            .insert_raw(
                EntityType::Listener,
                json!({
                    "_id": "listener-1",
                    "first_name": "Ada",
                    "last_name": "Moss",
                    "email": "ada@example.com",
                    "date_of_birth": "05/20/1990",
                    "subscription_tier": "FREE",
                    "favorite_albums": ["album-1", "album-gone"]
                }),
            )
            .expect("seed listener");
    }

    #[tokio::test]
    async fn test_reconcile_repairs_dangling_references() {
        let ctx = context();
        seed_orphans(&ctx);

        let report = reconcile(&ctx).await.expect("reconcile should succeed");
        assert_eq!(
            report,
            ReconcileReport {
                albums_unlinked: 1,
                favorites_pulled: 1
            }
        );

        let album = ctx.require::<Album>("album-1").await.expect("album exists");
        assert_eq!(album.artist, None);
        let listener = ctx
            .require::<Listener>("listener-1")
            .await
            .expect("listener exists");
        assert!(listener.has_favorited(&AlbumId::new("album-1")));
        assert!(!listener.has_favorited(&AlbumId::new("album-gone")));
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let ctx = context();
        seed_orphans(&ctx);

        reconcile(&ctx).await.expect("first pass");
        let second = reconcile(&ctx).await.expect("second pass");
        assert!(second.is_clean());
    }

    #[tokio::test]
    async fn test_reconcile_on_empty_store_is_clean() {
        let report = reconcile(&context()).await.expect("reconcile should succeed");
        assert!(report.is_clean());
    }
}
