//! Album mutations.

use catalog_core::{
    fields, Album, AlbumId, AlbumPatch, Artist, ArtistId, CatalogError, CatalogResult,
    EntityIdType, EntityType, Listener, NewAlbum,
};
use catalog_storage::{DocumentStore, Filter, UpdateOp};

use super::{not_added, not_updated, require_id};
use crate::context::CatalogContext;

fn check_promo_window(album: &Album) -> CatalogResult<()> {
    if !album.has_valid_promo_window() {
        return Err(CatalogError::invalid_range(
            "promo",
            album.promo_start,
            album.promo_end,
        ));
    }
    Ok(())
}

async fn check_artist_exists<S: DocumentStore>(
    ctx: &CatalogContext<S>,
    artist: Option<&ArtistId>,
) -> CatalogResult<()> {
    if let Some(artist_id) = artist {
        ctx.require::<Artist>(artist_id.as_str()).await?;
    }
    Ok(())
}

/// Create an album. A supplied artist must already exist.
pub async fn add_album<S: DocumentStore>(
    ctx: &CatalogContext<S>,
    input: &NewAlbum,
) -> CatalogResult<Album> {
    let album = input.validate(AlbumId::generate())?;
    check_promo_window(&album)?;
    check_artist_exists(ctx, album.artist.as_ref()).await?;

    if !ctx.store().insert(&album).await? {
        return Err(not_added(EntityType::Album));
    }
    tracing::info!(album_id = %album.id, artist_id = ?album.artist, "Album added");

    ctx.invalidate(&[EntityType::Album]).await;
    Ok(album)
}

/// Apply the fields present in `patch` to an existing album.
///
/// The promo window is checked on the merged record, so moving only one end
/// of the window past the other is rejected.
pub async fn edit_album<S: DocumentStore>(
    ctx: &CatalogContext<S>,
    id: &str,
    patch: &AlbumPatch,
) -> CatalogResult<Album> {
    let id = require_id("id", id)?;
    let changes = patch.validate()?;

    let mut album = ctx.require::<Album>(&id).await?;
    check_artist_exists(ctx, changes.artist.as_ref()).await?;
    changes.apply_to(&mut album);
    check_promo_window(&album)?;

    let updated = ctx
        .store()
        .replace(&album)
        .await?
        .ok_or_else(|| not_updated(EntityType::Album, &id))?;
    tracing::info!(album_id = %updated.id, "Album updated");

    ctx.invalidate(&[EntityType::Album]).await;
    Ok(updated)
}

/// Delete an album and pull its id from every listener's favorites.
///
/// Returns the album as it was before deletion.
pub async fn remove_album<S: DocumentStore>(
    ctx: &CatalogContext<S>,
    id: &str,
) -> CatalogResult<Album> {
    let id = require_id("id", id)?;

    let removed = ctx
        .store()
        .delete::<Album>(&id)
        .await?
        .ok_or_else(|| CatalogError::not_found(EntityType::Album, &id))?;
    tracing::info!(album_id = %removed.id, "Album removed");

    let cascaded = cascade_album_removal(ctx.store(), &removed.id).await;
    ctx.invalidate(&[EntityType::Album, EntityType::Listener]).await;
    if let Err(e) = &cascaded {
        tracing::error!(album_id = %removed.id, error = %e, "Favorite pull failed after album removal");
    }
    cascaded?;
    Ok(removed)
}

/// Point an album at a different artist.
///
/// The album is resolved first, so a request where both ids are unknown
/// reports the album.
pub async fn update_album_artist<S: DocumentStore>(
    ctx: &CatalogContext<S>,
    album_id: &str,
    artist_id: &str,
) -> CatalogResult<Album> {
    let album_id = require_id("album_id", album_id)?;
    let artist_id = require_id("artist_id", artist_id)?;

    ctx.require::<Album>(&album_id).await?;
    let artist = ctx.require::<Artist>(&artist_id).await?;

    let updated = ctx
        .store()
        .find_one_and_update::<Album>(
            &album_id,
            &UpdateOp::set(fields::ARTIST, artist.id.as_str()),
        )
        .await?
        .ok_or_else(|| not_updated(EntityType::Album, &album_id))?;
    tracing::info!(album_id = %updated.id, artist_id = %artist.id, "Album artist updated");

    ctx.invalidate(&[EntityType::Album]).await;
    Ok(updated)
}

/// Remove `album_id` from every listener's favorites.
///
/// Idempotent: a second run finds nothing to modify. Returns the number of
/// listeners changed.
pub async fn cascade_album_removal<S: DocumentStore>(
    store: &S,
    album_id: &AlbumId,
) -> CatalogResult<u64> {
    let pulled = store
        .update_many::<Listener>(
            &Filter::array_contains(fields::FAVORITE_ALBUMS, album_id.as_str()),
            &UpdateOp::pull(fields::FAVORITE_ALBUMS, album_id.as_str()),
        )
        .await?;
    tracing::debug!(album_id = %album_id, pulled, "Cascaded album removal to listeners");
    Ok(pulled)
}
