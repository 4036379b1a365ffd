//! Catalog smoke run
//!
//! Loads configuration from the environment, opens a catalog over an
//! in-memory document store and walks the mutation and query surface once.

use catalog_api::{
    add_album, add_artist, add_listener, favorite_album, get_album_by_id, get_albums_by_artist_id,
    get_artist_by_id, get_listeners_by_album_id, init_tracing, reconcile, remove_artist,
    CatalogContext,
};
use catalog_core::{CatalogConfig, CatalogResult, EntityIdType, NewAlbum, NewArtist, NewListener};
use catalog_storage::InMemoryDocumentStore;

#[tokio::main]
async fn main() -> CatalogResult<()> {
    let config = CatalogConfig::from_env();
    config.validate()?;
    init_tracing(config.log_format)?;

    let ctx = CatalogContext::open(&config, InMemoryDocumentStore::new())?;

    let artist = add_artist(
        &ctx,
        &NewArtist {
            stage_name: "Nova Ray".to_string(),
            genre: "Synthwave".to_string(),
            label: "Neon Tide".to_string(),
            management_email: "mgmt@novaray.com".to_string(),
            management_phone: "555-010-2030".to_string(),
            home_city: "Austin".to_string(),
            date_signed: "01/15/2020".to_string(),
        },
    )
    .await?;

    let album = add_album(
        &ctx,
        &NewAlbum {
            title: "Night Drive".to_string(),
            genre: "Synthwave".to_string(),
            track_count: 11,
            artist: Some(artist.id.to_string()),
            release_date: "06/01/2024".to_string(),
            promo_start: "05/01/2024".to_string(),
            promo_end: "07/01/2024".to_string(),
        },
    )
    .await?;

    let listener = add_listener(
        &ctx,
        &NewListener {
            first_name: "Ada".to_string(),
            last_name: "Moss".to_string(),
            email: "ada@example.com".to_string(),
            date_of_birth: "05/20/1990".to_string(),
            subscription_tier: "premium".to_string(),
        },
    )
    .await?;

    favorite_album(&ctx, listener.id.as_str(), album.id.as_str()).await?;

    // Second read of each query is served from the cache.
    for _ in 0..2 {
        get_artist_by_id(&ctx, artist.id.as_str()).await?;
        get_albums_by_artist_id(&ctx, artist.id.as_str()).await?;
        get_listeners_by_album_id(&ctx, album.id.as_str()).await?;
    }

    remove_artist(&ctx, artist.id.as_str()).await?;
    let orphaned = get_album_by_id(&ctx, album.id.as_str()).await?;
    tracing::info!(album_id = %orphaned.id, artist = ?orphaned.artist, "Album after artist removal");

    let report = reconcile(&ctx).await?;
    tracing::info!(?report, "Reconciliation report");

    for (kind, stats) in ctx.cache_stats().await {
        tracing::info!(
            entity_type = %kind,
            hits = stats.hits,
            misses = stats.misses,
            hit_rate = stats.hit_rate(),
            "Cache stats"
        );
    }

    ctx.shutdown();
    Ok(())
}
