//! Catalog API - Integrity Engine and Query Surface
//!
//! The service layer over a document store and a key/value cache:
//! - Mutations that keep album/artist links and listener favorites
//!   consistent, then invalidate the affected cached queries
//! - Cache-aside reads for every catalog query
//! - A reconciliation pass for references left dangling by interrupted
//!   cascades

pub mod context;
pub mod queries;
pub mod reconcile;
pub mod services;
pub mod telemetry;

// Re-export commonly used types
pub use context::CatalogContext;
pub use queries::{
    albums, artist_of, artists, favorite_albums_of, get_album_by_id, get_albums_by_artist_id,
    get_albums_by_genre, get_albums_by_promo_date_range, get_artist_by_id, get_artists_by_label,
    get_artists_signed_between, get_listener_by_id, get_listeners_by_album_id,
    get_listeners_by_subscription, listeners, num_of_albums, num_of_favorite_albums,
    num_of_listeners_who_favorited, search_listeners_by_last_name,
};
pub use reconcile::{reconcile, ReconcileReport};
pub use services::{
    add_album, add_artist, add_listener, cascade_album_removal, cascade_artist_removal,
    edit_album, edit_artist, edit_listener, favorite_album, remove_album, remove_artist,
    remove_listener, unfavorite_album, update_album_artist,
};
pub use telemetry::init_tracing;
