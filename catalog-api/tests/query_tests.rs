//! Filtered lookups, date ranges and derived counts.

use catalog_api::{
    add_album, add_artist, add_listener, albums, artist_of, favorite_album, favorite_albums_of,
    remove_artist, get_albums_by_genre,
    get_albums_by_promo_date_range, get_artists_by_label, get_artists_signed_between,
    get_listeners_by_subscription, listeners, num_of_albums, num_of_favorite_albums,
    num_of_listeners_who_favorited, search_listeners_by_last_name,
};
use catalog_core::{EntityIdType, EntityType, SubscriptionTier, ValidationError};
use catalog_test_utils::assertions::{assert_invalid_range, assert_not_found, assert_validation_error};
use catalog_test_utils::fixtures::{new_album, new_artist, new_listener, test_context};

#[tokio::test]
async fn test_genre_and_label_match_ignoring_case() {
    let ctx = test_context();
    let mut artist = new_artist("Nova Ray");
    artist.label = "Neon Tide".to_string();
    add_artist(&ctx, &artist).await.expect("add artist");
    let mut other = new_artist("Quiet Hours");
    other.label = "Slow Burn".to_string();
    add_artist(&ctx, &other).await.expect("add artist");

    let mut album = new_album("Night Drive", None);
    album.genre = "Synthwave".to_string();
    add_album(&ctx, &album).await.expect("add album");

    assert_eq!(get_artists_by_label(&ctx, "neon tide").await.expect("read").len(), 1);
    assert_eq!(get_artists_by_label(&ctx, "NEON TIDE").await.expect("read").len(), 1);
    assert_eq!(get_albums_by_genre(&ctx, "SYNTHWAVE").await.expect("read").len(), 1);
    assert!(get_albums_by_genre(&ctx, "jazz").await.expect("read").is_empty());
}

#[tokio::test]
async fn test_subscription_filter_normalizes_tier() {
    let ctx = test_context();
    let mut premium = new_listener("Moss");
    premium.subscription_tier = "PREMIUM".to_string();
    add_listener(&ctx, &premium).await.expect("add listener");
    add_listener(&ctx, &new_listener("Reed")).await.expect("add listener");

    let found = get_listeners_by_subscription(&ctx, "premium").await.expect("read");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].subscription_tier, SubscriptionTier::Premium);

    let result = get_listeners_by_subscription(&ctx, "GOLD").await;
    assert!(matches!(
        assert_validation_error(&result),
        ValidationError::InvalidSubscriptionTier { .. }
    ));
}

#[tokio::test]
async fn test_last_name_search_is_case_insensitive_substring() {
    let ctx = test_context();
    add_listener(&ctx, &new_listener("McAllister")).await.expect("add listener");
    add_listener(&ctx, &new_listener("Allison")).await.expect("add listener");
    add_listener(&ctx, &new_listener("Reed")).await.expect("add listener");

    let found = search_listeners_by_last_name(&ctx, "ALLIS").await.expect("read");
    assert_eq!(found.len(), 2);
    assert_eq!(listeners(&ctx).await.expect("read").len(), 3);
}

#[tokio::test]
async fn test_signed_between_is_inclusive() {
    let ctx = test_context();
    for (name, signed) in [("Early", "01/01/2019"), ("Edge", "01/01/2020"), ("Late", "06/30/2022")] {
        let mut artist = new_artist(name);
        artist.date_signed = signed.to_string();
        add_artist(&ctx, &artist).await.expect("add artist");
    }

    let found = get_artists_signed_between(&ctx, "01/01/2020", "06/30/2022")
        .await
        .expect("read");
    let mut names: Vec<_> = found.into_iter().map(|a| a.stage_name).collect();
    names.sort();
    assert_eq!(names, vec!["Edge".to_string(), "Late".to_string()]);
}

#[tokio::test]
async fn test_inverted_or_empty_ranges_are_invalid() {
    let ctx = test_context();
    assert_invalid_range(&get_artists_signed_between(&ctx, "06/30/2022", "01/01/2020").await);
    assert_invalid_range(&get_artists_signed_between(&ctx, "01/01/2020", "01/01/2020").await);
    assert_invalid_range(&get_albums_by_promo_date_range(&ctx, "12/01/2024", "01/01/2024").await);

    let result = get_artists_signed_between(&ctx, "2020-01-01", "06/30/2022").await;
    assert!(matches!(
        assert_validation_error(&result),
        ValidationError::InvalidDateFormat { .. }
    ));
}

#[tokio::test]
async fn test_promo_range_requires_whole_window_inside() {
    let ctx = test_context();
    // Fixture window: 05/01/2024..07/01/2024.
    let inside = add_album(&ctx, &new_album("Inside", None)).await.expect("add album");
    let mut straddling = new_album("Straddling", None);
    straddling.promo_end = "09/01/2024".to_string();
    add_album(&ctx, &straddling).await.expect("add album");

    let found = get_albums_by_promo_date_range(&ctx, "05/01/2024", "07/01/2024")
        .await
        .expect("read");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, inside.id);
    assert_eq!(albums(&ctx).await.expect("read").len(), 2);
}

#[tokio::test]
async fn test_derived_counts() {
    let ctx = test_context();
    let artist = add_artist(&ctx, &new_artist("Nova Ray")).await.expect("add artist");
    let first = add_album(&ctx, &new_album("One", Some(&artist.id))).await.expect("add album");
    let second = add_album(&ctx, &new_album("Two", Some(&artist.id))).await.expect("add album");
    let moss = add_listener(&ctx, &new_listener("Moss")).await.expect("add listener");
    let reed = add_listener(&ctx, &new_listener("Reed")).await.expect("add listener");

    favorite_album(&ctx, moss.id.as_str(), first.id.as_str()).await.expect("favorite");
    favorite_album(&ctx, moss.id.as_str(), second.id.as_str()).await.expect("favorite");
    favorite_album(&ctx, reed.id.as_str(), first.id.as_str()).await.expect("favorite");

    assert_eq!(num_of_albums(&ctx, artist.id.as_str()).await.expect("count"), 2);
    assert_eq!(num_of_favorite_albums(&ctx, moss.id.as_str()).await.expect("count"), 2);
    assert_eq!(num_of_favorite_albums(&ctx, reed.id.as_str()).await.expect("count"), 1);
    assert_eq!(
        num_of_listeners_who_favorited(&ctx, first.id.as_str()).await.expect("count"),
        2
    );
    assert_eq!(
        num_of_listeners_who_favorited(&ctx, second.id.as_str()).await.expect("count"),
        1
    );

    assert_not_found(&num_of_albums(&ctx, "ghost").await, EntityType::Artist);
}

#[tokio::test]
async fn test_favorite_albums_resolve_to_full_albums() {
    let ctx = test_context();
    let first = add_album(&ctx, &new_album("One", None)).await.expect("add album");
    let second = add_album(&ctx, &new_album("Two", None)).await.expect("add album");
    add_album(&ctx, &new_album("Three", None)).await.expect("add album");
    let moss = add_listener(&ctx, &new_listener("Moss")).await.expect("add listener");

    assert!(favorite_albums_of(&ctx, moss.id.as_str()).await.expect("read").is_empty());

    favorite_album(&ctx, moss.id.as_str(), first.id.as_str()).await.expect("favorite");
    favorite_album(&ctx, moss.id.as_str(), second.id.as_str()).await.expect("favorite");

    let mut titles: Vec<_> = favorite_albums_of(&ctx, moss.id.as_str())
        .await
        .expect("read")
        .into_iter()
        .map(|a| a.title)
        .collect();
    titles.sort();
    assert_eq!(titles, vec!["One".to_string(), "Two".to_string()]);

    assert_not_found(&favorite_albums_of(&ctx, "ghost").await, EntityType::Listener);
}

#[tokio::test]
async fn test_artist_of_follows_the_album_link() {
    let ctx = test_context();
    let artist = add_artist(&ctx, &new_artist("Nova Ray")).await.expect("add artist");
    let linked = add_album(&ctx, &new_album("One", Some(&artist.id))).await.expect("add album");
    let unlinked = add_album(&ctx, &new_album("Two", None)).await.expect("add album");

    let resolved = artist_of(&ctx, linked.id.as_str()).await.expect("read");
    assert_eq!(resolved.map(|a| a.id), Some(artist.id.clone()));
    assert_eq!(artist_of(&ctx, unlinked.id.as_str()).await.expect("read"), None);

    remove_artist(&ctx, artist.id.as_str()).await.expect("remove artist");
    assert_eq!(artist_of(&ctx, linked.id.as_str()).await.expect("read"), None);

    assert_not_found(&artist_of(&ctx, "ghost").await, EntityType::Album);
}
