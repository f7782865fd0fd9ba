//! Event ingestion against the in-memory store.

#![allow(clippy::expect_used, clippy::unwrap_used)] // Test code can use unwrap/expect

use album_invitations_core::event::{SerializedEvent, topics};
use album_invitations_core::{
    AlbumId, EventIngestor, IngestError, IngestOutcome, MirrorStore, ProfileId, StoreError,
};
use album_invitations_testing::fixtures::{album_created, profile_created};
use album_invitations_testing::{InMemoryMirrorStore, TestHarness};
use std::sync::Arc;

#[tokio::test]
async fn test_new_profile_is_mirrored_without_invitations() {
    let h = TestHarness::new();

    let outcome = h.ingestor.ingest(&profile_created(1, "alice")).await.unwrap();

    assert_eq!(outcome, IngestOutcome::Created);
    let profile = h.store.profile_snapshot(ProfileId::new(1)).unwrap();
    assert_eq!(profile.name, "alice");
    assert!(profile.invitations.is_empty());
}

#[tokio::test]
async fn test_repeated_profile_keeps_existing_state() {
    let h = TestHarness::new().with_album(10, "Demo", &[]).await;
    h.ingestor.ingest(&profile_created(1, "alice")).await.unwrap();
    h.engine
        .propose(ProfileId::new(1), AlbumId::new(10))
        .await
        .unwrap();

    let outcome = h.ingestor.ingest(&profile_created(1, "alice-renamed")).await.unwrap();

    assert_eq!(outcome, IngestOutcome::Duplicate);
    let profile = h.store.profile_snapshot(ProfileId::new(1)).unwrap();
    assert_eq!(profile.name, "alice");
    assert_eq!(profile.invitations, vec![AlbumId::new(10)]);
}

#[tokio::test]
async fn test_album_artists_are_optional_and_deduplicated() {
    let h = TestHarness::new();

    h.ingestor.ingest(&album_created(10, "Demo", None)).await.unwrap();
    h.ingestor
        .ingest(&album_created(11, "Duo", Some(&["bob", "carol", "bob"])))
        .await
        .unwrap();

    assert!(h.store.album_snapshot(AlbumId::new(10)).unwrap().artists.is_empty());
    assert_eq!(
        h.store.album_snapshot(AlbumId::new(11)).unwrap().artists,
        vec!["bob".to_string(), "carol".to_string()]
    );
}

#[tokio::test]
async fn test_raw_producer_payloads_are_accepted() {
    let h = TestHarness::new();
    let profile = SerializedEvent::new(topics::NEW_PROFILE, br#"{"userid": 3, "name": "dana"}"#.to_vec());
    let album = SerializedEvent::new(
        topics::NEW_ALBUM,
        br#"{"id": 30, "artists": null, "name": "Live"}"#.to_vec(),
    );

    assert_eq!(h.ingestor.ingest(&profile).await.unwrap(), IngestOutcome::Created);
    assert_eq!(h.ingestor.ingest(&album).await.unwrap(), IngestOutcome::Created);
    assert_eq!(h.store.album_snapshot(AlbumId::new(30)).unwrap().name, "Live");
}

#[tokio::test]
async fn test_malformed_payload_is_reported_and_store_untouched() {
    let h = TestHarness::new();
    let event = SerializedEvent::new(topics::NEW_PROFILE, b"{not json".to_vec());

    let err = h.ingestor.ingest(&event).await.unwrap_err();

    assert!(matches!(err, IngestError::Malformed { ref topic, .. } if topic == topics::NEW_PROFILE));
    assert_eq!(h.store.profile_count(), 0);
}

#[tokio::test]
async fn test_out_of_range_id_is_malformed() {
    let h = TestHarness::new();
    let event = SerializedEvent::new(
        topics::NEW_ALBUM,
        br#"{"id": 4294967296, "name": "Too big"}"#.to_vec(),
    );

    let err = h.ingestor.ingest(&event).await.unwrap_err();

    assert!(matches!(err, IngestError::Malformed { .. }));
    assert_eq!(h.store.album_count(), 0);
}

#[tokio::test]
async fn test_unknown_topic_is_ignored() {
    let h = TestHarness::new();
    let event = SerializedEvent::new("something_else", b"{}".to_vec());

    assert_eq!(h.ingestor.ingest(&event).await.unwrap(), IngestOutcome::Ignored);
}

#[tokio::test]
async fn test_storage_failure_is_surfaced() {
    let h = TestHarness::new();
    h.store.set_unavailable(true);

    let err = h.ingestor.ingest(&profile_created(1, "alice")).await.unwrap_err();

    assert!(matches!(err, IngestError::Storage(StoreError::Unavailable(_))));
}

#[tokio::test]
async fn test_custom_topics_route_events() {
    let store = InMemoryMirrorStore::new();
    let ingestor = EventIngestor::with_topics(Arc::new(store.clone()), "profiles.v2", "albums.v2");
    assert_eq!(ingestor.topics(), vec!["profiles.v2", "albums.v2"]);

    let mut event = profile_created(5, "eve");
    event.topic = "profiles.v2".to_string();
    assert_eq!(ingestor.ingest(&event).await.unwrap(), IngestOutcome::Created);

    // The default topic name is no longer routed.
    let default = profile_created(6, "frank");
    assert_eq!(ingestor.ingest(&default).await.unwrap(), IngestOutcome::Ignored);
    assert!(store.profile(ProfileId::new(6)).await.unwrap().is_none());
}
