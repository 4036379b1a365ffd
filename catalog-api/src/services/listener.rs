//! Listener mutations, including the favorites set.

use catalog_core::{
    fields, Album, CatalogError, CatalogResult, EntityIdType, EntityType, Listener, ListenerId,
    ListenerPatch, NewListener,
};
use catalog_storage::{DocumentStore, UpdateOp};

use super::{not_added, not_updated, require_id};
use crate::context::CatalogContext;

/// Create a listener with an empty favorites set.
pub async fn add_listener<S: DocumentStore>(
    ctx: &CatalogContext<S>,
    input: &NewListener,
) -> CatalogResult<Listener> {
    let listener = input.validate(ListenerId::generate(), ctx.today())?;

    if !ctx.store().insert(&listener).await? {
        return Err(not_added(EntityType::Listener));
    }
    tracing::info!(listener_id = %listener.id, "Listener added");

    ctx.invalidate(&[EntityType::Listener]).await;
    Ok(listener)
}

/// Apply the fields present in `patch` to an existing listener.
pub async fn edit_listener<S: DocumentStore>(
    ctx: &CatalogContext<S>,
    id: &str,
    patch: &ListenerPatch,
) -> CatalogResult<Listener> {
    let id = require_id("id", id)?;
    let changes = patch.validate(ctx.today())?;

    let mut listener = ctx.require::<Listener>(&id).await?;
    changes.apply_to(&mut listener);

    let updated = ctx
        .store()
        .replace(&listener)
        .await?
        .ok_or_else(|| not_updated(EntityType::Listener, &id))?;
    tracing::info!(listener_id = %updated.id, "Listener updated");

    ctx.invalidate(&[EntityType::Listener]).await;
    Ok(updated)
}

/// Delete a listener. Nothing references listeners, so there is no cascade.
pub async fn remove_listener<S: DocumentStore>(
    ctx: &CatalogContext<S>,
    id: &str,
) -> CatalogResult<Listener> {
    let id = require_id("id", id)?;

    let removed = ctx
        .store()
        .delete::<Listener>(&id)
        .await?
        .ok_or_else(|| CatalogError::not_found(EntityType::Listener, &id))?;
    tracing::info!(listener_id = %removed.id, "Listener removed");

    ctx.invalidate(&[EntityType::Listener]).await;
    Ok(removed)
}

/// Add an album to a listener's favorites. Adding one already present is a
/// no-op.
pub async fn favorite_album<S: DocumentStore>(
    ctx: &CatalogContext<S>,
    listener_id: &str,
    album_id: &str,
) -> CatalogResult<Listener> {
    let listener_id = require_id("listener_id", listener_id)?;
    let album_id = require_id("album_id", album_id)?;

    ctx.require::<Listener>(&listener_id).await?;
    let album = ctx.require::<Album>(&album_id).await?;

    let updated = ctx
        .store()
        .find_one_and_update::<Listener>(
            &listener_id,
            &UpdateOp::add_to_set(fields::FAVORITE_ALBUMS, album.id.as_str()),
        )
        .await?
        .ok_or_else(|| not_updated(EntityType::Listener, &listener_id))?;
    tracing::info!(listener_id = %updated.id, album_id = %album.id, "Album favorited");

    ctx.invalidate(&[EntityType::Listener]).await;
    Ok(updated)
}

/// Remove an album from a listener's favorites. The album need not exist;
/// removing an id that is not in the set is a no-op.
pub async fn unfavorite_album<S: DocumentStore>(
    ctx: &CatalogContext<S>,
    listener_id: &str,
    album_id: &str,
) -> CatalogResult<Listener> {
    let listener_id = require_id("listener_id", listener_id)?;
    let album_id = require_id("album_id", album_id)?;

    ctx.require::<Listener>(&listener_id).await?;

    let updated = ctx
        .store()
        .find_one_and_update::<Listener>(
            &listener_id,
            &UpdateOp::pull(fields::FAVORITE_ALBUMS, album_id.as_str()),
        )
        .await?
        .ok_or_else(|| not_updated(EntityType::Listener, &listener_id))?;
    tracing::info!(listener_id = %updated.id, album_id = %album_id, "Album unfavorited");

    ctx.invalidate(&[EntityType::Listener]).await;
    Ok(updated)
}
