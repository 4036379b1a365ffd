//! Catalog Test Utilities
//!
//! Shared test infrastructure for the catalog workspace:
//! - Proptest generators for ids, dates and creation inputs
//! - Fixtures for valid inputs and a ready-made in-memory context
//! - A document store that can be told to refuse writes
//! - Assertions for catalog error variants

pub use catalog_api::CatalogContext;
pub use catalog_core::{
    Album, AlbumId, Artist, ArtistId, CatalogDate, CatalogError, CatalogResult, EntityIdType,
    EntityType, Listener, ListenerId, NewAlbum, NewArtist, NewListener, SubscriptionTier,
};
pub use catalog_storage::{InMemoryDocumentStore, InMemoryKeyValueCache};

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use catalog_core::CatalogEntity;
use catalog_core::StorageError;
use catalog_storage::{DocumentStore, Filter, StorageResult, UpdateOp};

// ============================================================================
// REFUSING DOCUMENT STORE
// ============================================================================

/// An [`InMemoryDocumentStore`] whose writes can be switched off.
///
/// With `refuse_inserts` set, `insert` reports an unacknowledged write. With
/// `refuse_updates` set, `replace` and `find_one_and_update` report that no
/// document was updated. With `fail_bulk_updates` set, `update_many` fails
/// with a backend error. Reads and deletes always pass through.
#[derive(Debug, Default)]
pub struct RefusingDocumentStore {
    inner: InMemoryDocumentStore,
    refuse_inserts: AtomicBool,
    refuse_updates: AtomicBool,
    fail_bulk_updates: AtomicBool,
}

impl RefusingDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &InMemoryDocumentStore {
        &self.inner
    }

    pub fn refuse_inserts(&self, refuse: bool) {
        self.refuse_inserts.store(refuse, Ordering::SeqCst);
    }

    pub fn refuse_updates(&self, refuse: bool) {
        self.refuse_updates.store(refuse, Ordering::SeqCst);
    }

    pub fn fail_bulk_updates(&self, fail: bool) {
        self.fail_bulk_updates.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for RefusingDocumentStore {
    async fn insert<D: CatalogEntity>(&self, doc: &D) -> StorageResult<bool> {
        if self.refuse_inserts.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.insert::<D>(doc).await
    }

    async fn find_one<D: CatalogEntity>(&self, id: &str) -> StorageResult<Option<D>> {
        self.inner.find_one::<D>(id).await
    }

    async fn find<D: CatalogEntity>(&self, filter: &Filter) -> StorageResult<Vec<D>> {
        self.inner.find::<D>(filter).await
    }

    async fn replace<D: CatalogEntity>(&self, doc: &D) -> StorageResult<Option<D>> {
        if self.refuse_updates.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.replace::<D>(doc).await
    }

    async fn delete<D: CatalogEntity>(&self, id: &str) -> StorageResult<Option<D>> {
        self.inner.delete::<D>(id).await
    }

    async fn update_many<D: CatalogEntity>(
        &self,
        filter: &Filter,
        op: &UpdateOp,
    ) -> StorageResult<u64> {
        if self.fail_bulk_updates.load(Ordering::SeqCst) {
            return Err(StorageError::Backend {
                reason: "bulk update rejected".to_string(),
            });
        }
        self.inner.update_many::<D>(filter, op).await
    }

    async fn find_one_and_update<D: CatalogEntity>(
        &self,
        id: &str,
        op: &UpdateOp,
    ) -> StorageResult<Option<D>> {
        if self.refuse_updates.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.find_one_and_update::<D>(id, op).await
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for catalog inputs.

    use super::*;
    use proptest::prelude::*;

    pub fn arb_entity_type() -> impl Strategy<Value = EntityType> {
        prop_oneof![
            Just(EntityType::Artist),
            Just(EntityType::Album),
            Just(EntityType::Listener),
        ]
    }

    pub fn arb_subscription_tier() -> impl Strategy<Value = SubscriptionTier> {
        prop_oneof![Just(SubscriptionTier::Free), Just(SubscriptionTier::Premium)]
    }

    /// Short alphanumeric ids, so that collisions between independently
    /// generated ids stay rare but possible.
    pub fn arb_raw_id() -> impl Strategy<Value = String> {
        "[a-z0-9]{4,12}"
    }

    pub fn arb_artist_id() -> impl Strategy<Value = ArtistId> {
        arb_raw_id().prop_map(ArtistId::new)
    }

    pub fn arb_album_id() -> impl Strategy<Value = AlbumId> {
        arb_raw_id().prop_map(AlbumId::new)
    }

    /// Non-empty display text without leading or trailing spaces.
    pub fn arb_name() -> impl Strategy<Value = String> {
        "[A-Z][a-z]{1,10}( [A-Z][a-z]{1,10})?"
    }

    /// A real calendar date within `years`, rendered `MM/DD/YYYY`.
    pub fn arb_date_in(years: std::ops::RangeInclusive<i32>) -> impl Strategy<Value = String> {
        (years, 1u32..=12, 1u32..=28)
            .prop_map(|(year, month, day)| format!("{:02}/{:02}/{}", month, day, year))
    }

    pub fn arb_date() -> impl Strategy<Value = String> {
        arb_date_in(1950..=2030)
    }

    /// A promo window with `start < end`, both inside one year.
    pub fn arb_promo_window() -> impl Strategy<Value = (String, String)> {
        (2000..=2030i32, 1u32..=6, 1u32..=28, 7u32..=12, 1u32..=28).prop_map(
            |(year, start_month, start_day, end_month, end_day)| {
                (
                    format!("{:02}/{:02}/{}", start_month, start_day, year),
                    format!("{:02}/{:02}/{}", end_month, end_day, year),
                )
            },
        )
    }

    pub fn arb_new_artist() -> impl Strategy<Value = NewArtist> {
        (arb_name(), arb_name(), arb_name(), arb_date()).prop_map(
            |(stage_name, genre, label, date_signed)| NewArtist {
                management_email: format!("{}@mgmt.example.com", stage_name.replace(' ', ".")),
                stage_name,
                genre,
                label,
                management_phone: "555-010-2030".to_string(),
                home_city: "Austin".to_string(),
                date_signed,
            },
        )
    }

    /// An album with a valid promo window, linked to `artist` when given.
    pub fn arb_new_album(artist: Option<ArtistId>) -> impl Strategy<Value = NewAlbum> {
        (arb_name(), arb_name(), 1i64..=40, arb_promo_window()).prop_map(
            move |(title, genre, track_count, (promo_start, promo_end))| NewAlbum {
                title,
                genre,
                track_count,
                artist: artist.as_ref().map(|id| id.as_str().to_string()),
                release_date: promo_start.clone(),
                promo_start,
                promo_end,
            },
        )
    }

    /// A listener aged between 20 and 70 on [`super::fixtures::TODAY`].
    pub fn arb_new_listener() -> impl Strategy<Value = NewListener> {
        (
            arb_name(),
            arb_name(),
            arb_date_in(1957..=2005),
            arb_subscription_tier(),
        )
            .prop_map(|(first_name, last_name, date_of_birth, tier)| NewListener {
                email: format!("{}@listen.example.com", first_name.replace(' ', ".")),
                first_name,
                last_name,
                date_of_birth,
                subscription_tier: tier.as_str().to_string(),
            })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Valid inputs and ready-made contexts.

    use super::*;

    /// The date every fixture context treats as today.
    pub const TODAY: &str = "10/16/2026";

    pub fn today() -> CatalogDate {
        CatalogDate::parse("today", TODAY).expect("fixture date is valid")
    }

    /// A context over an in-memory store and cache, with a pinned today.
    pub fn test_context() -> CatalogContext {
        context_over(InMemoryDocumentStore::new())
    }

    /// A context over `store` with an in-memory cache and a pinned today.
    pub fn context_over<S: catalog_storage::DocumentStore>(store: S) -> CatalogContext<S> {
        CatalogContext::new(
            std::sync::Arc::new(store),
            std::sync::Arc::new(InMemoryKeyValueCache::new()),
            catalog_storage::CacheConfig::default(),
        )
        .with_today(today())
    }

    pub fn new_artist(stage_name: &str) -> NewArtist {
        NewArtist {
            stage_name: stage_name.to_string(),
            genre: "Synthwave".to_string(),
            label: "Neon Tide".to_string(),
            management_email: "mgmt@example.com".to_string(),
            management_phone: "555-010-2030".to_string(),
            home_city: "Austin".to_string(),
            date_signed: "01/15/2020".to_string(),
        }
    }

    pub fn new_album(title: &str, artist: Option<&ArtistId>) -> NewAlbum {
        NewAlbum {
            title: title.to_string(),
            genre: "Synthwave".to_string(),
            track_count: 11,
            artist: artist.map(|id| id.as_str().to_string()),
            release_date: "06/01/2024".to_string(),
            promo_start: "05/01/2024".to_string(),
            promo_end: "07/01/2024".to_string(),
        }
    }

    pub fn new_listener(last_name: &str) -> NewListener {
        NewListener {
            first_name: "Ada".to_string(),
            last_name: last_name.to_string(),
            email: "ada@example.com".to_string(),
            date_of_birth: "05/20/1990".to_string(),
            subscription_tier: "FREE".to_string(),
        }
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions on catalog error variants.

    use super::*;
    use catalog_core::{StorageError, ValidationError};

    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &CatalogResult<T>, entity_type: EntityType) {
        match result {
            Err(CatalogError::NotFound { entity_type: et, .. }) => {
                assert_eq!(*et, entity_type, "Wrong entity type in NotFound error");
            }
            other => panic!("Expected NotFound error for {:?}, got: {:?}", entity_type, other),
        }
    }

    #[track_caller]
    pub fn assert_validation_error<T: std::fmt::Debug>(result: &CatalogResult<T>) -> ValidationError {
        match result {
            Err(CatalogError::Validation(e)) => e.clone(),
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_invalid_range<T: std::fmt::Debug>(result: &CatalogResult<T>) {
        match result {
            Err(CatalogError::InvalidRange { .. }) => {}
            other => panic!("Expected InvalidRange error, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_not_added<T: std::fmt::Debug>(result: &CatalogResult<T>, entity_type: EntityType) {
        match result {
            Err(CatalogError::Storage(StorageError::NotAdded { entity_type: et, .. })) => {
                assert_eq!(*et, entity_type, "Wrong entity type in NotAdded error");
            }
            other => panic!("Expected NotAdded error for {:?}, got: {:?}", entity_type, other),
        }
    }

    #[track_caller]
    pub fn assert_not_updated<T: std::fmt::Debug>(
        result: &CatalogResult<T>,
        entity_type: EntityType,
    ) {
        match result {
            Err(CatalogError::Storage(StorageError::NotUpdated { entity_type: et, .. })) => {
                assert_eq!(*et, entity_type, "Wrong entity type in NotUpdated error");
            }
            other => panic!("Expected NotUpdated error for {:?}, got: {:?}", entity_type, other),
        }
    }
}
