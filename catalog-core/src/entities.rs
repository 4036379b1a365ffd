//! Core entity structures
//!
//! One document collection per entity kind, documents keyed by `_id`.
//! Relationships are stored by value: an album names its artist, a listener
//! holds the set of album ids it favorited.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    AlbumId, ArtistId, CatalogDate, EntityIdType, EntityType, ListenerId, SubscriptionTier,
};

/// Artist - owns zero or more albums (the link lives on [`Album::artist`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    #[serde(rename = "_id")]
    pub id: ArtistId,
    pub stage_name: String,
    pub genre: String,
    pub label: String,
    pub management_email: String,
    pub management_phone: String,
    pub home_city: String,
    pub date_signed: CatalogDate,
}

/// Album - optionally linked to an artist, favorited by listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    #[serde(rename = "_id")]
    pub id: AlbumId,
    pub title: String,
    pub genre: String,
    pub track_count: u32,
    /// `None` once the referenced artist has been removed.
    pub artist: Option<ArtistId>,
    pub release_date: CatalogDate,
    pub promo_start: CatalogDate,
    pub promo_end: CatalogDate,
}

impl Album {
    /// `promo_start` must be strictly before `promo_end`.
    pub fn has_valid_promo_window(&self) -> bool {
        self.promo_start < self.promo_end
    }

    /// Whether the whole promo window lies inside `start..=end`.
    pub fn promo_within(&self, start: CatalogDate, end: CatalogDate) -> bool {
        self.promo_start >= start && self.promo_end <= end
    }
}

/// Listener - holds a duplicate-free set of favorite album ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listener {
    #[serde(rename = "_id")]
    pub id: ListenerId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_of_birth: CatalogDate,
    pub subscription_tier: SubscriptionTier,
    #[serde(default)]
    pub favorite_albums: BTreeSet<AlbumId>,
}

impl Listener {
    pub fn has_favorited(&self, album_id: &AlbumId) -> bool {
        self.favorite_albums.contains(album_id)
    }
}

/// Field names shared between entity structs and document-store filters.
pub mod fields {
    pub const ID: &str = "_id";
    pub const GENRE: &str = "genre";
    pub const LABEL: &str = "label";
    pub const ARTIST: &str = "artist";
    pub const LAST_NAME: &str = "last_name";
    pub const SUBSCRIPTION_TIER: &str = "subscription_tier";
    pub const FAVORITE_ALBUMS: &str = "favorite_albums";
}

/// A stored catalog document: knows its collection and its id.
pub trait CatalogEntity:
    Clone + Serialize + serde::de::DeserializeOwned + Send + Sync + 'static
{
    /// The entity kind (and therefore the collection) of this document.
    fn entity_type() -> EntityType;

    /// The document id.
    fn entity_id(&self) -> &str;
}

impl CatalogEntity for Artist {
    fn entity_type() -> EntityType {
        EntityType::Artist
    }

    fn entity_id(&self) -> &str {
        self.id.as_str()
    }
}

impl CatalogEntity for Album {
    fn entity_type() -> EntityType {
        EntityType::Album
    }

    fn entity_id(&self) -> &str {
        self.id.as_str()
    }
}

impl CatalogEntity for Listener {
    fn entity_type() -> EntityType {
        EntityType::Listener
    }

    fn entity_id(&self) -> &str {
        self.id.as_str()
    }
}
