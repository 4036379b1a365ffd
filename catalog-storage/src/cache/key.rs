//! Key scheme for cached query results and stats counters.
//!
//! Every cacheable query is a [`QueryKind`] variant carrying its typed
//! parameters, so the mapping to a key string is exhaustive and checked at
//! compile time. Keys have the form `cache:<queryKind>:<params>`, with fixed
//! names for the unparameterised listings.

use std::fmt;

use catalog_core::{
    AlbumId, ArtistId, CatalogDate, EntityIdType, EntityType, ListenerId, SubscriptionTier,
};

/// Prefix shared by all cached query results.
pub const CACHE_PREFIX: &str = "cache";

/// Prefix shared by all stats counters.
pub const STATS_PREFIX: &str = "stats";

/// A cacheable query shape together with its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKind {
    AllArtists,
    AllAlbums,
    AllListeners,
    ArtistById(ArtistId),
    AlbumById(AlbumId),
    ListenerById(ListenerId),
    AlbumsByArtistId(ArtistId),
    ListenersByAlbumId(AlbumId),
    AlbumsByGenre(String),
    ArtistsByLabel(String),
    ListenersBySubscription(SubscriptionTier),
    ArtistsSignedBetween { start: CatalogDate, end: CatalogDate },
    AlbumsByPromoDateRange { start: CatalogDate, end: CatalogDate },
    SearchListenersByLastName(String),
}

/// The parameter-free discriminant of a [`QueryKind`].
///
/// Invalidation works per family: dropping a family removes every cached
/// entry of that query shape regardless of its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryFamily {
    AllArtists,
    AllAlbums,
    AllListeners,
    ArtistById,
    AlbumById,
    ListenerById,
    AlbumsByArtistId,
    ListenersByAlbumId,
    AlbumsByGenre,
    ArtistsByLabel,
    ListenersBySubscription,
    ArtistsSignedBetween,
    AlbumsByPromoDateRange,
    SearchListenersByLastName,
}

impl QueryFamily {
    pub const ALL: [QueryFamily; 14] = [
        QueryFamily::AllArtists,
        QueryFamily::AllAlbums,
        QueryFamily::AllListeners,
        QueryFamily::ArtistById,
        QueryFamily::AlbumById,
        QueryFamily::ListenerById,
        QueryFamily::AlbumsByArtistId,
        QueryFamily::ListenersByAlbumId,
        QueryFamily::AlbumsByGenre,
        QueryFamily::ArtistsByLabel,
        QueryFamily::ListenersBySubscription,
        QueryFamily::ArtistsSignedBetween,
        QueryFamily::AlbumsByPromoDateRange,
        QueryFamily::SearchListenersByLastName,
    ];

    /// The `<queryKind>` segment of the key.
    pub fn segment(&self) -> &'static str {
        match self {
            QueryFamily::AllArtists => "artists",
            QueryFamily::AllAlbums => "albums",
            QueryFamily::AllListeners => "listeners",
            QueryFamily::ArtistById => "getArtistById",
            QueryFamily::AlbumById => "getAlbumById",
            QueryFamily::ListenerById => "getListenerById",
            QueryFamily::AlbumsByArtistId => "getAlbumsByArtistId",
            QueryFamily::ListenersByAlbumId => "getListenersByAlbumId",
            QueryFamily::AlbumsByGenre => "getAlbumsByGenre",
            QueryFamily::ArtistsByLabel => "getArtistsByLabel",
            QueryFamily::ListenersBySubscription => "getListenersBySubscription",
            QueryFamily::ArtistsSignedBetween => "getArtistsSignedBetween",
            QueryFamily::AlbumsByPromoDateRange => "getAlbumsByPromoDateRange",
            QueryFamily::SearchListenersByLastName => "searchListenersByLastName",
        }
    }

    /// Whether the family is a single fixed key (`cache:artists`, ...).
    pub fn is_listing(&self) -> bool {
        matches!(
            self,
            QueryFamily::AllArtists | QueryFamily::AllAlbums | QueryFamily::AllListeners
        )
    }

    /// The entity kind the query returns; hit/miss stats are recorded under it.
    pub fn result_kind(&self) -> EntityType {
        match self {
            QueryFamily::AllArtists
            | QueryFamily::ArtistById
            | QueryFamily::ArtistsByLabel
            | QueryFamily::ArtistsSignedBetween => EntityType::Artist,
            QueryFamily::AllAlbums
            | QueryFamily::AlbumById
            | QueryFamily::AlbumsByArtistId
            | QueryFamily::AlbumsByGenre
            | QueryFamily::AlbumsByPromoDateRange => EntityType::Album,
            QueryFamily::AllListeners
            | QueryFamily::ListenerById
            | QueryFamily::ListenersByAlbumId
            | QueryFamily::ListenersBySubscription
            | QueryFamily::SearchListenersByLastName => EntityType::Listener,
        }
    }

    /// Key prefix that every entry of this family starts with. For listings
    /// this is the full key.
    pub fn key_prefix(&self) -> String {
        if self.is_listing() {
            format!("{CACHE_PREFIX}:{}", self.segment())
        } else {
            format!("{CACHE_PREFIX}:{}:", self.segment())
        }
    }
}

impl QueryKind {
    pub fn family(&self) -> QueryFamily {
        match self {
            QueryKind::AllArtists => QueryFamily::AllArtists,
            QueryKind::AllAlbums => QueryFamily::AllAlbums,
            QueryKind::AllListeners => QueryFamily::AllListeners,
            QueryKind::ArtistById(_) => QueryFamily::ArtistById,
            QueryKind::AlbumById(_) => QueryFamily::AlbumById,
            QueryKind::ListenerById(_) => QueryFamily::ListenerById,
            QueryKind::AlbumsByArtistId(_) => QueryFamily::AlbumsByArtistId,
            QueryKind::ListenersByAlbumId(_) => QueryFamily::ListenersByAlbumId,
            QueryKind::AlbumsByGenre(_) => QueryFamily::AlbumsByGenre,
            QueryKind::ArtistsByLabel(_) => QueryFamily::ArtistsByLabel,
            QueryKind::ListenersBySubscription(_) => QueryFamily::ListenersBySubscription,
            QueryKind::ArtistsSignedBetween { .. } => QueryFamily::ArtistsSignedBetween,
            QueryKind::AlbumsByPromoDateRange { .. } => QueryFamily::AlbumsByPromoDateRange,
            QueryKind::SearchListenersByLastName(_) => QueryFamily::SearchListenersByLastName,
        }
    }

    /// Normalised parameters. Ids are kept verbatim; free text is trimmed and
    /// lower-cased.
    fn params(&self) -> Vec<String> {
        match self {
            QueryKind::AllArtists | QueryKind::AllAlbums | QueryKind::AllListeners => Vec::new(),
            QueryKind::ArtistById(id) | QueryKind::AlbumsByArtistId(id) => {
                vec![id.as_str().to_string()]
            }
            QueryKind::AlbumById(id) | QueryKind::ListenersByAlbumId(id) => {
                vec![id.as_str().to_string()]
            }
            QueryKind::ListenerById(id) => vec![id.as_str().to_string()],
            QueryKind::AlbumsByGenre(text)
            | QueryKind::ArtistsByLabel(text)
            | QueryKind::SearchListenersByLastName(text) => vec![fold(text)],
            QueryKind::ListenersBySubscription(tier) => vec![fold(tier.as_str())],
            QueryKind::ArtistsSignedBetween { start, end }
            | QueryKind::AlbumsByPromoDateRange { start, end } => {
                vec![start.to_string(), end.to_string()]
            }
        }
    }

    /// Build the cache key for this query.
    pub fn cache_key(&self) -> CacheKey {
        let family = self.family();
        let params = self.params();
        if params.is_empty() {
            CacheKey(family.key_prefix())
        } else {
            CacheKey(format!("{}{}", family.key_prefix(), params.join(":")))
        }
    }
}

fn fold(text: &str) -> String {
    text.trim().to_lowercase()
}

/// A fully built cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which stats counter to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Hit,
    Miss,
}

impl Outcome {
    fn suffix(&self) -> &'static str {
        match self {
            Outcome::Hit => "hits",
            Outcome::Miss => "misses",
        }
    }
}

/// `stats:<kind>:hits` / `stats:<kind>:misses`.
pub fn stats_key(kind: EntityType, outcome: Outcome) -> String {
    format!("{STATS_PREFIX}:{}:{}", kind.stats_segment(), outcome.suffix())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn date(raw: &str) -> CatalogDate {
        CatalogDate::parse("test", raw).expect("valid date")
    }

    #[test]
    fn test_listing_keys_are_fixed() {
        assert_eq!(QueryKind::AllArtists.cache_key().as_str(), "cache:artists");
        assert_eq!(QueryKind::AllAlbums.cache_key().as_str(), "cache:albums");
        assert_eq!(QueryKind::AllListeners.cache_key().as_str(), "cache:listeners");
    }

    #[test]
    fn test_parameterised_keys() {
        assert_eq!(
            QueryKind::ArtistById(ArtistId::new("A-1")).cache_key().as_str(),
            "cache:getArtistById:A-1"
        );
        assert_eq!(
            QueryKind::AlbumsByGenre("  Synthwave ".to_string()).cache_key().as_str(),
            "cache:getAlbumsByGenre:synthwave"
        );
        assert_eq!(
            QueryKind::ListenersBySubscription(SubscriptionTier::Premium)
                .cache_key()
                .as_str(),
            "cache:getListenersBySubscription:premium"
        );
        assert_eq!(
            QueryKind::ArtistsSignedBetween {
                start: date("01/01/2020"),
                end: date("12/31/2020"),
            }
            .cache_key()
            .as_str(),
            "cache:getArtistsSignedBetween:01/01/2020:12/31/2020"
        );
    }

    #[test]
    fn test_stats_keys() {
        assert_eq!(stats_key(EntityType::Artist, Outcome::Hit), "stats:artist:hits");
        assert_eq!(
            stats_key(EntityType::Listener, Outcome::Miss),
            "stats:listener:misses"
        );
    }

    #[test]
    fn test_every_family_has_a_distinct_segment() {
        let segments: HashSet<&str> = QueryFamily::ALL.iter().map(|f| f.segment()).collect();
        assert_eq!(segments.len(), QueryFamily::ALL.len());
    }

    #[test]
    fn test_same_id_under_different_families_does_not_collide() {
        let by_id = QueryKind::ArtistById(ArtistId::new("x")).cache_key();
        let albums = QueryKind::AlbumsByArtistId(ArtistId::new("x")).cache_key();
        assert_ne!(by_id, albums);
    }

    #[test]
    fn test_key_starts_with_family_prefix() {
        let query = QueryKind::AlbumsByPromoDateRange {
            start: date("01/01/2024"),
            end: date("02/01/2024"),
        };
        assert!(query
            .cache_key()
            .as_str()
            .starts_with(&query.family().key_prefix()));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_key_is_deterministic(genre in "[A-Za-z ]{1,20}") {
            let a = QueryKind::AlbumsByGenre(genre.clone()).cache_key();
            let b = QueryKind::AlbumsByGenre(genre).cache_key();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_free_text_is_case_folded(label in "[a-z]{1,20}") {
            let lower = QueryKind::ArtistsByLabel(label.clone()).cache_key();
            let upper = QueryKind::ArtistsByLabel(label.to_uppercase()).cache_key();
            prop_assert_eq!(lower, upper);
        }

        #[test]
        fn prop_distinct_ids_give_distinct_keys(a in "[a-z0-9-]{1,16}", b in "[a-z0-9-]{1,16}") {
            prop_assume!(a != b);
            let ka = QueryKind::ListenerById(ListenerId::new(a)).cache_key();
            let kb = QueryKind::ListenerById(ListenerId::new(b)).cache_key();
            prop_assert_ne!(ka, kb);
        }
    }
}
