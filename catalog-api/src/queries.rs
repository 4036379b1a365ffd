//! Cache-aside query surface.
//!
//! Each query builds its [`QueryKind`], consults the cache store, and on a
//! miss loads from the document store and populates the cache. Hits and
//! misses are counted under the entity kind the query returns. Failed loads
//! (for example `NotFound`) are never cached.

use catalog_core::validation::{validate_date, validate_tier};
use catalog_core::{
    fields, Album, AlbumId, Artist, ArtistId, CatalogDate, CatalogError, CatalogResult,
    EntityIdType, Listener, ListenerId, ValidateNonEmpty,
};
use catalog_storage::{DocumentStore, Filter, QueryKind};
use serde::{de::DeserializeOwned, Serialize};

use crate::context::CatalogContext;
use crate::services::require_id;

/// Consult the cache for `query`, counting the outcome under the kind the
/// query returns.
async fn lookup<S, T>(ctx: &CatalogContext<S>, query: &QueryKind) -> Option<T>
where
    S: DocumentStore,
    T: DeserializeOwned,
{
    let key = query.cache_key();
    let kind = query.family().result_kind();
    match ctx.cache().get::<T>(&key).await {
        Some(value) => {
            ctx.stats().record_hit(kind).await;
            tracing::debug!(key = %key, "Cache hit");
            Some(value)
        }
        None => {
            ctx.stats().record_miss(kind).await;
            tracing::debug!(key = %key, "Cache miss");
            None
        }
    }
}

/// Populate the cache with a freshly loaded result.
async fn fill<S, T>(ctx: &CatalogContext<S>, query: &QueryKind, value: &T)
where
    S: DocumentStore,
    T: Serialize,
{
    ctx.cache().set(&query.cache_key(), value).await;
}

/// Parse a `start`/`end` pair and require `start < end`.
fn date_range(field: &str, start: &str, end: &str) -> CatalogResult<(CatalogDate, CatalogDate)> {
    let start = validate_date("start", start)?;
    let end = validate_date("end", end)?;
    if start >= end {
        return Err(CatalogError::invalid_range(field, start, end));
    }
    Ok((start, end))
}

// ============================================================================
// LISTINGS AND LOOKUPS
// ============================================================================

pub async fn artists<S: DocumentStore>(ctx: &CatalogContext<S>) -> CatalogResult<Vec<Artist>> {
    let query = QueryKind::AllArtists;
    if let Some(hit) = lookup(ctx, &query).await {
        return Ok(hit);
    }
    let artists = ctx.store().find::<Artist>(&Filter::All).await?;
    fill(ctx, &query, &artists).await;
    Ok(artists)
}

pub async fn albums<S: DocumentStore>(ctx: &CatalogContext<S>) -> CatalogResult<Vec<Album>> {
    let query = QueryKind::AllAlbums;
    if let Some(hit) = lookup(ctx, &query).await {
        return Ok(hit);
    }
    let albums = ctx.store().find::<Album>(&Filter::All).await?;
    fill(ctx, &query, &albums).await;
    Ok(albums)
}

pub async fn listeners<S: DocumentStore>(ctx: &CatalogContext<S>) -> CatalogResult<Vec<Listener>> {
    let query = QueryKind::AllListeners;
    if let Some(hit) = lookup(ctx, &query).await {
        return Ok(hit);
    }
    let listeners = ctx.store().find::<Listener>(&Filter::All).await?;
    fill(ctx, &query, &listeners).await;
    Ok(listeners)
}

pub async fn get_artist_by_id<S: DocumentStore>(
    ctx: &CatalogContext<S>,
    id: &str,
) -> CatalogResult<Artist> {
    let id = ArtistId::new(require_id("id", id)?);
    let query = QueryKind::ArtistById(id.clone());
    if let Some(hit) = lookup(ctx, &query).await {
        return Ok(hit);
    }
    let artist = ctx.require::<Artist>(id.as_str()).await?;
    fill(ctx, &query, &artist).await;
    Ok(artist)
}

pub async fn get_album_by_id<S: DocumentStore>(
    ctx: &CatalogContext<S>,
    id: &str,
) -> CatalogResult<Album> {
    let id = AlbumId::new(require_id("id", id)?);
    let query = QueryKind::AlbumById(id.clone());
    if let Some(hit) = lookup(ctx, &query).await {
        return Ok(hit);
    }
    let album = ctx.require::<Album>(id.as_str()).await?;
    fill(ctx, &query, &album).await;
    Ok(album)
}

pub async fn get_listener_by_id<S: DocumentStore>(
    ctx: &CatalogContext<S>,
    id: &str,
) -> CatalogResult<Listener> {
    let id = ListenerId::new(require_id("id", id)?);
    let query = QueryKind::ListenerById(id.clone());
    if let Some(hit) = lookup(ctx, &query).await {
        return Ok(hit);
    }
    let listener = ctx.require::<Listener>(id.as_str()).await?;
    fill(ctx, &query, &listener).await;
    Ok(listener)
}

// ============================================================================
// RELATIONSHIP QUERIES
// ============================================================================

/// Albums whose artist is `artist_id`. Fails with `NotFound` for an unknown
/// artist.
pub async fn get_albums_by_artist_id<S: DocumentStore>(
    ctx: &CatalogContext<S>,
    artist_id: &str,
) -> CatalogResult<Vec<Album>> {
    let artist_id = ArtistId::new(require_id("artist_id", artist_id)?);
    let query = QueryKind::AlbumsByArtistId(artist_id.clone());
    if let Some(hit) = lookup(ctx, &query).await {
        return Ok(hit);
    }
    ctx.require::<Artist>(artist_id.as_str()).await?;
    let albums = ctx
        .store()
        .find::<Album>(&Filter::eq(fields::ARTIST, artist_id.as_str()))
        .await?;
    fill(ctx, &query, &albums).await;
    Ok(albums)
}

/// Listeners who favorited `album_id`. Fails with `NotFound` for an unknown
/// album.
pub async fn get_listeners_by_album_id<S: DocumentStore>(
    ctx: &CatalogContext<S>,
    album_id: &str,
) -> CatalogResult<Vec<Listener>> {
    let album_id = AlbumId::new(require_id("album_id", album_id)?);
    let query = QueryKind::ListenersByAlbumId(album_id.clone());
    if let Some(hit) = lookup(ctx, &query).await {
        return Ok(hit);
    }
    ctx.require::<Album>(album_id.as_str()).await?;
    let listeners = ctx
        .store()
        .find::<Listener>(&Filter::array_contains(
            fields::FAVORITE_ALBUMS,
            album_id.as_str(),
        ))
        .await?;
    fill(ctx, &query, &listeners).await;
    Ok(listeners)
}

/// The albums a listener has favorited, in id order.
///
/// Built on the cached by-id reads. A favorite whose album no longer exists
/// is skipped.
pub async fn favorite_albums_of<S: DocumentStore>(
    ctx: &CatalogContext<S>,
    listener_id: &str,
) -> CatalogResult<Vec<Album>> {
    let listener = get_listener_by_id(ctx, listener_id).await?;
    let mut albums = Vec::with_capacity(listener.favorite_albums.len());
    for album_id in &listener.favorite_albums {
        match get_album_by_id(ctx, album_id.as_str()).await {
            Ok(album) => albums.push(album),
            Err(CatalogError::NotFound { .. }) => {
                tracing::warn!(
                    listener_id = %listener.id,
                    album_id = %album_id,
                    "Favorite references a missing album"
                );
            }
            Err(e) => return Err(e),
        }
    }
    Ok(albums)
}

/// The artist an album is linked to, or `None` for an unlinked album or a
/// link to an artist that no longer exists.
pub async fn artist_of<S: DocumentStore>(
    ctx: &CatalogContext<S>,
    album_id: &str,
) -> CatalogResult<Option<Artist>> {
    let album = get_album_by_id(ctx, album_id).await?;
    let Some(artist_id) = album.artist else {
        return Ok(None);
    };
    match get_artist_by_id(ctx, artist_id.as_str()).await {
        Ok(artist) => Ok(Some(artist)),
        Err(CatalogError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

// ============================================================================
// FILTERED LOOKUPS
// ============================================================================

/// Albums in `genre`, compared case-insensitively.
pub async fn get_albums_by_genre<S: DocumentStore>(
    ctx: &CatalogContext<S>,
    genre: &str,
) -> CatalogResult<Vec<Album>> {
    let genre = genre.validate_non_empty("genre")?;
    let query = QueryKind::AlbumsByGenre(genre.clone());
    if let Some(hit) = lookup(ctx, &query).await {
        return Ok(hit);
    }
    let albums = ctx
        .store()
        .find::<Album>(&Filter::eq_ignore_case(fields::GENRE, genre.as_str()))
        .await?;
    fill(ctx, &query, &albums).await;
    Ok(albums)
}

/// Artists on `label`, compared case-insensitively.
pub async fn get_artists_by_label<S: DocumentStore>(
    ctx: &CatalogContext<S>,
    label: &str,
) -> CatalogResult<Vec<Artist>> {
    let label = label.validate_non_empty("label")?;
    let query = QueryKind::ArtistsByLabel(label.clone());
    if let Some(hit) = lookup(ctx, &query).await {
        return Ok(hit);
    }
    let artists = ctx
        .store()
        .find::<Artist>(&Filter::eq_ignore_case(fields::LABEL, label.as_str()))
        .await?;
    fill(ctx, &query, &artists).await;
    Ok(artists)
}

/// Listeners on a subscription tier. The tier is accepted in any case.
pub async fn get_listeners_by_subscription<S: DocumentStore>(
    ctx: &CatalogContext<S>,
    tier: &str,
) -> CatalogResult<Vec<Listener>> {
    let tier = validate_tier(tier)?;
    let query = QueryKind::ListenersBySubscription(tier);
    if let Some(hit) = lookup(ctx, &query).await {
        return Ok(hit);
    }
    let listeners = ctx
        .store()
        .find::<Listener>(&Filter::eq(fields::SUBSCRIPTION_TIER, tier.as_str()))
        .await?;
    fill(ctx, &query, &listeners).await;
    Ok(listeners)
}

/// Artists signed within `start..=end`. Requires `start < end`.
pub async fn get_artists_signed_between<S: DocumentStore>(
    ctx: &CatalogContext<S>,
    start: &str,
    end: &str,
) -> CatalogResult<Vec<Artist>> {
    let (start, end) = date_range("date_signed", start, end)?;
    let query = QueryKind::ArtistsSignedBetween { start, end };
    if let Some(hit) = lookup(ctx, &query).await {
        return Ok(hit);
    }
    let artists: Vec<Artist> = ctx
        .store()
        .find::<Artist>(&Filter::All)
        .await?
        .into_iter()
        .filter(|a| a.date_signed >= start && a.date_signed <= end)
        .collect();
    fill(ctx, &query, &artists).await;
    Ok(artists)
}

/// Albums whose whole promo window lies within `start..=end`. Requires
/// `start < end`.
pub async fn get_albums_by_promo_date_range<S: DocumentStore>(
    ctx: &CatalogContext<S>,
    start: &str,
    end: &str,
) -> CatalogResult<Vec<Album>> {
    let (start, end) = date_range("promo", start, end)?;
    let query = QueryKind::AlbumsByPromoDateRange { start, end };
    if let Some(hit) = lookup(ctx, &query).await {
        return Ok(hit);
    }
    let albums: Vec<Album> = ctx
        .store()
        .find::<Album>(&Filter::All)
        .await?
        .into_iter()
        .filter(|a| a.promo_within(start, end))
        .collect();
    fill(ctx, &query, &albums).await;
    Ok(albums)
}

/// Listeners whose last name contains `term`, ignoring case.
pub async fn search_listeners_by_last_name<S: DocumentStore>(
    ctx: &CatalogContext<S>,
    term: &str,
) -> CatalogResult<Vec<Listener>> {
    let term = term.validate_non_empty("search_term")?;
    let query = QueryKind::SearchListenersByLastName(term.clone());
    if let Some(hit) = lookup(ctx, &query).await {
        return Ok(hit);
    }
    let listeners = ctx
        .store()
        .find::<Listener>(&Filter::contains_text(fields::LAST_NAME, term.as_str()))
        .await?;
    fill(ctx, &query, &listeners).await;
    Ok(listeners)
}

// ============================================================================
// DERIVED COUNTS
// ============================================================================

/// Number of albums linked to an artist.
pub async fn num_of_albums<S: DocumentStore>(
    ctx: &CatalogContext<S>,
    artist_id: &str,
) -> CatalogResult<usize> {
    Ok(get_albums_by_artist_id(ctx, artist_id).await?.len())
}

/// Number of albums a listener has favorited.
pub async fn num_of_favorite_albums<S: DocumentStore>(
    ctx: &CatalogContext<S>,
    listener_id: &str,
) -> CatalogResult<usize> {
    Ok(get_listener_by_id(ctx, listener_id)
        .await?
        .favorite_albums
        .len())
}

/// Number of listeners who favorited an album.
pub async fn num_of_listeners_who_favorited<S: DocumentStore>(
    ctx: &CatalogContext<S>,
    album_id: &str,
) -> CatalogResult<usize> {
    Ok(get_listeners_by_album_id(ctx, album_id).await?.len())
}
