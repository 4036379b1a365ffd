//! Caller-supplied inputs for the mutation surface.
//!
//! `New*` types carry every required field as raw text; `*Patch` types use
//! one `Option` per field, where `None` means "leave unchanged". There is no
//! representation for clearing a field.

use serde::{Deserialize, Serialize};

use crate::validation::{
    validate_date, validate_date_of_birth, validate_email, validate_phone, validate_present,
    validate_tier, validate_track_count, HasUpdates, ValidateNonEmpty,
};
use crate::{
    Album, AlbumId, Artist, ArtistId, CatalogDate, EntityIdType, Listener, ListenerId,
    SubscriptionTier, ValidationError,
};

// ============================================================================
// ARTIST
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewArtist {
    pub stage_name: String,
    pub genre: String,
    pub label: String,
    pub management_email: String,
    pub management_phone: String,
    pub home_city: String,
    pub date_signed: String,
}

impl NewArtist {
    /// Validate every field and build the record that will be stored under `id`.
    pub fn validate(&self, id: ArtistId) -> Result<Artist, ValidationError> {
        Ok(Artist {
            id,
            stage_name: self.stage_name.validate_non_empty("stage_name")?,
            genre: self.genre.validate_non_empty("genre")?,
            label: self.label.validate_non_empty("label")?,
            management_email: validate_email(&self.management_email)?,
            management_phone: validate_phone(&self.management_phone)?,
            home_city: self.home_city.validate_non_empty("home_city")?,
            date_signed: validate_date("date_signed", &self.date_signed)?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistPatch {
    pub stage_name: Option<String>,
    pub genre: Option<String>,
    pub label: Option<String>,
    pub management_email: Option<String>,
    pub management_phone: Option<String>,
    pub home_city: Option<String>,
    pub date_signed: Option<String>,
}

impl HasUpdates for ArtistPatch {
    fn has_any_updates(&self) -> bool {
        self.stage_name.is_some()
            || self.genre.is_some()
            || self.label.is_some()
            || self.management_email.is_some()
            || self.management_phone.is_some()
            || self.home_city.is_some()
            || self.date_signed.is_some()
    }
}

/// A validated [`ArtistPatch`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtistChanges {
    pub stage_name: Option<String>,
    pub genre: Option<String>,
    pub label: Option<String>,
    pub management_email: Option<String>,
    pub management_phone: Option<String>,
    pub home_city: Option<String>,
    pub date_signed: Option<CatalogDate>,
}

impl ArtistPatch {
    pub fn validate(&self) -> Result<ArtistChanges, ValidationError> {
        self.validate_has_updates()?;
        Ok(ArtistChanges {
            stage_name: validate_present(self.stage_name.as_ref(), |v| {
                v.validate_non_empty("stage_name")
            })?,
            genre: validate_present(self.genre.as_ref(), |v| v.validate_non_empty("genre"))?,
            label: validate_present(self.label.as_ref(), |v| v.validate_non_empty("label"))?,
            management_email: validate_present(self.management_email.as_deref(), validate_email)?,
            management_phone: validate_present(self.management_phone.as_deref(), validate_phone)?,
            home_city: validate_present(self.home_city.as_ref(), |v| {
                v.validate_non_empty("home_city")
            })?,
            date_signed: validate_present(self.date_signed.as_deref(), |v| {
                validate_date("date_signed", v)
            })?,
        })
    }
}

impl ArtistChanges {
    pub fn apply_to(self, artist: &mut Artist) {
        if let Some(stage_name) = self.stage_name {
            artist.stage_name = stage_name;
        }
        if let Some(genre) = self.genre {
            artist.genre = genre;
        }
        if let Some(label) = self.label {
            artist.label = label;
        }
        if let Some(email) = self.management_email {
            artist.management_email = email;
        }
        if let Some(phone) = self.management_phone {
            artist.management_phone = phone;
        }
        if let Some(home_city) = self.home_city {
            artist.home_city = home_city;
        }
        if let Some(date_signed) = self.date_signed {
            artist.date_signed = date_signed;
        }
    }
}

// ============================================================================
// ALBUM
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAlbum {
    pub title: String,
    pub genre: String,
    pub track_count: i64,
    /// Artist to link; existence is checked by the integrity engine.
    pub artist: Option<String>,
    pub release_date: String,
    pub promo_start: String,
    pub promo_end: String,
}

impl NewAlbum {
    /// Validate scalar fields. Promo ordering and the artist reference are
    /// checked by the caller, since both fail with non-validation errors.
    pub fn validate(&self, id: AlbumId) -> Result<Album, ValidationError> {
        Ok(Album {
            id,
            title: self.title.validate_non_empty("title")?,
            genre: self.genre.validate_non_empty("genre")?,
            track_count: validate_track_count(self.track_count)?,
            artist: validate_present(self.artist.as_ref(), |v| {
                v.validate_non_empty("artist").map(ArtistId::new)
            })?,
            release_date: validate_date("release_date", &self.release_date)?,
            promo_start: validate_date("promo_start", &self.promo_start)?,
            promo_end: validate_date("promo_end", &self.promo_end)?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumPatch {
    pub title: Option<String>,
    pub genre: Option<String>,
    pub track_count: Option<i64>,
    pub artist: Option<String>,
    pub release_date: Option<String>,
    pub promo_start: Option<String>,
    pub promo_end: Option<String>,
}

impl HasUpdates for AlbumPatch {
    fn has_any_updates(&self) -> bool {
        self.title.is_some()
            || self.genre.is_some()
            || self.track_count.is_some()
            || self.artist.is_some()
            || self.release_date.is_some()
            || self.promo_start.is_some()
            || self.promo_end.is_some()
    }
}

/// A validated [`AlbumPatch`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlbumChanges {
    pub title: Option<String>,
    pub genre: Option<String>,
    pub track_count: Option<u32>,
    pub artist: Option<ArtistId>,
    pub release_date: Option<CatalogDate>,
    pub promo_start: Option<CatalogDate>,
    pub promo_end: Option<CatalogDate>,
}

impl AlbumPatch {
    pub fn validate(&self) -> Result<AlbumChanges, ValidationError> {
        self.validate_has_updates()?;
        Ok(AlbumChanges {
            title: validate_present(self.title.as_ref(), |v| v.validate_non_empty("title"))?,
            genre: validate_present(self.genre.as_ref(), |v| v.validate_non_empty("genre"))?,
            track_count: validate_present(self.track_count.as_ref(), |v| validate_track_count(*v))?,
            artist: validate_present(self.artist.as_ref(), |v| {
                v.validate_non_empty("artist").map(ArtistId::new)
            })?,
            release_date: validate_present(self.release_date.as_deref(), |v| {
                validate_date("release_date", v)
            })?,
            promo_start: validate_present(self.promo_start.as_deref(), |v| {
                validate_date("promo_start", v)
            })?,
            promo_end: validate_present(self.promo_end.as_deref(), |v| {
                validate_date("promo_end", v)
            })?,
        })
    }
}

impl AlbumChanges {
    pub fn apply_to(self, album: &mut Album) {
        if let Some(title) = self.title {
            album.title = title;
        }
        if let Some(genre) = self.genre {
            album.genre = genre;
        }
        if let Some(track_count) = self.track_count {
            album.track_count = track_count;
        }
        if let Some(artist) = self.artist {
            album.artist = Some(artist);
        }
        if let Some(release_date) = self.release_date {
            album.release_date = release_date;
        }
        if let Some(promo_start) = self.promo_start {
            album.promo_start = promo_start;
        }
        if let Some(promo_end) = self.promo_end {
            album.promo_end = promo_end;
        }
    }
}

// ============================================================================
// LISTENER
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewListener {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_of_birth: String,
    pub subscription_tier: String,
}

impl NewListener {
    /// Validate every field; the age check is evaluated against `today`.
    pub fn validate(&self, id: ListenerId, today: CatalogDate) -> Result<Listener, ValidationError> {
        Ok(Listener {
            id,
            first_name: self.first_name.validate_non_empty("first_name")?,
            last_name: self.last_name.validate_non_empty("last_name")?,
            email: validate_email(&self.email)?,
            date_of_birth: validate_date_of_birth(&self.date_of_birth, today)?,
            subscription_tier: validate_tier(&self.subscription_tier)?,
            favorite_albums: Default::default(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub date_of_birth: Option<String>,
    pub subscription_tier: Option<String>,
}

impl HasUpdates for ListenerPatch {
    fn has_any_updates(&self) -> bool {
        self.first_name.is_some()
            || self.last_name.is_some()
            || self.email.is_some()
            || self.date_of_birth.is_some()
            || self.subscription_tier.is_some()
    }
}

/// A validated [`ListenerPatch`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenerChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub date_of_birth: Option<CatalogDate>,
    pub subscription_tier: Option<SubscriptionTier>,
}

impl ListenerPatch {
    pub fn validate(&self, today: CatalogDate) -> Result<ListenerChanges, ValidationError> {
        self.validate_has_updates()?;
        Ok(ListenerChanges {
            first_name: validate_present(self.first_name.as_ref(), |v| {
                v.validate_non_empty("first_name")
            })?,
            last_name: validate_present(self.last_name.as_ref(), |v| {
                v.validate_non_empty("last_name")
            })?,
            email: validate_present(self.email.as_deref(), validate_email)?,
            date_of_birth: validate_present(self.date_of_birth.as_deref(), |v| {
                validate_date_of_birth(v, today)
            })?,
            subscription_tier: validate_present(self.subscription_tier.as_deref(), validate_tier)?,
        })
    }
}

impl ListenerChanges {
    /// Favorites are never touched by a patch; they change only through
    /// favorite/unfavorite and the album-removal cascade.
    pub fn apply_to(self, listener: &mut Listener) {
        if let Some(first_name) = self.first_name {
            listener.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            listener.last_name = last_name;
        }
        if let Some(email) = self.email {
            listener.email = email;
        }
        if let Some(date_of_birth) = self.date_of_birth {
            listener.date_of_birth = date_of_birth;
        }
        if let Some(tier) = self.subscription_tier {
            listener.subscription_tier = tier;
        }
    }
}
