//! Artist mutations.

use catalog_core::{
    fields, Album, Artist, ArtistId, ArtistPatch, CatalogError, CatalogResult, EntityIdType,
    EntityType, NewArtist,
};
use catalog_storage::{DocumentStore, Filter, UpdateOp};
use serde_json::Value;

use super::{not_added, not_updated, require_id};
use crate::context::CatalogContext;

/// Create an artist under a freshly generated id.
pub async fn add_artist<S: DocumentStore>(
    ctx: &CatalogContext<S>,
    input: &NewArtist,
) -> CatalogResult<Artist> {
    let artist = input.validate(ArtistId::generate())?;

    if !ctx.store().insert(&artist).await? {
        return Err(not_added(EntityType::Artist));
    }
    tracing::info!(artist_id = %artist.id, "Artist added");

    ctx.invalidate(&[EntityType::Artist]).await;
    Ok(artist)
}

/// Apply the fields present in `patch` to an existing artist.
pub async fn edit_artist<S: DocumentStore>(
    ctx: &CatalogContext<S>,
    id: &str,
    patch: &ArtistPatch,
) -> CatalogResult<Artist> {
    let id = require_id("id", id)?;
    let changes = patch.validate()?;

    let mut artist = ctx.require::<Artist>(&id).await?;
    changes.apply_to(&mut artist);

    let updated = ctx
        .store()
        .replace(&artist)
        .await?
        .ok_or_else(|| not_updated(EntityType::Artist, &id))?;
    tracing::info!(artist_id = %updated.id, "Artist updated");

    ctx.invalidate(&[EntityType::Artist]).await;
    Ok(updated)
}

/// Delete an artist and unlink every album that referenced it.
///
/// Returns the artist as it was before deletion.
pub async fn remove_artist<S: DocumentStore>(
    ctx: &CatalogContext<S>,
    id: &str,
) -> CatalogResult<Artist> {
    let id = require_id("id", id)?;

    let removed = ctx
        .store()
        .delete::<Artist>(&id)
        .await?
        .ok_or_else(|| CatalogError::not_found(EntityType::Artist, &id))?;
    tracing::info!(artist_id = %removed.id, "Artist removed");

    // The delete has landed, so invalidate even when the cascade fails.
    let cascaded = cascade_artist_removal(ctx.store(), &removed.id).await;
    ctx.invalidate(&[EntityType::Artist, EntityType::Album]).await;
    if let Err(e) = &cascaded {
        tracing::error!(artist_id = %removed.id, error = %e, "Album unlink failed after artist removal");
    }
    cascaded?;
    Ok(removed)
}

/// Set `artist = null` on every album referencing `artist_id`.
///
/// Idempotent: a second run finds nothing to modify. Returns the number of
/// albums unlinked.
pub async fn cascade_artist_removal<S: DocumentStore>(
    store: &S,
    artist_id: &ArtistId,
) -> CatalogResult<u64> {
    let unlinked = store
        .update_many::<Album>(
            &Filter::eq(fields::ARTIST, artist_id.as_str()),
            &UpdateOp::set(fields::ARTIST, Value::Null),
        )
        .await?;
    tracing::debug!(artist_id = %artist_id, unlinked, "Cascaded artist removal to albums");
    Ok(unlinked)
}
