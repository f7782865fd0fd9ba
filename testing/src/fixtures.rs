//! Ready-made engines, stores and events for tests.

use crate::{InMemoryEventBus, InMemoryMirrorStore};
use album_invitations_core::event::{AlbumCreated, ProfileCreated, SerializedEvent, topics};
use album_invitations_core::{
    Album, AlbumId, ChangePublisher, EventIngestor, InvitationEngine, MirrorStore, Profile,
    ProfileId,
};
use std::sync::Arc;

/// An engine wired to in-memory fakes, with handles to inspect them.
#[derive(Clone)]
pub struct TestHarness {
    /// Engine under test.
    pub engine: InvitationEngine,
    /// Ingestor writing to the same store.
    pub ingestor: EventIngestor,
    /// Backing store.
    pub store: InMemoryMirrorStore,
    /// Bus the engine publishes to.
    pub bus: InMemoryEventBus,
}

impl TestHarness {
    /// Empty store, default topics.
    #[must_use]
    pub fn new() -> Self {
        let store = InMemoryMirrorStore::new();
        let bus = InMemoryEventBus::new();
        let shared: Arc<dyn MirrorStore> = Arc::new(store.clone());
        let engine = InvitationEngine::new(shared.clone(), ChangePublisher::new(Arc::new(bus.clone())));
        let ingestor = EventIngestor::new(shared);

        Self {
            engine,
            ingestor,
            store,
            bus,
        }
    }

    /// Mirror a profile directly.
    ///
    /// # Panics
    ///
    /// Panics if the store is switched off.
    #[allow(clippy::expect_used)]
    pub async fn with_profile(self, id: u32, name: &str) -> Self {
        self.store
            .insert_profile(Profile::new(ProfileId::new(id), name))
            .await
            .expect("seed profile");
        self
    }

    /// Mirror an album directly.
    ///
    /// # Panics
    ///
    /// Panics if the store is switched off.
    #[allow(clippy::expect_used)]
    pub async fn with_album(self, id: u32, name: &str, artists: &[&str]) -> Self {
        let artists = artists.iter().map(ToString::to_string).collect();
        self.store
            .insert_album(Album::new(AlbumId::new(id), name, artists))
            .await
            .expect("seed album");
        self
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// A `new_profile` event.
///
/// # Panics
///
/// Never; the payload always encodes.
#[must_use]
#[allow(clippy::expect_used)]
pub fn profile_created(id: u32, name: &str) -> SerializedEvent {
    SerializedEvent::from_json(
        topics::NEW_PROFILE,
        &ProfileCreated {
            user_id: ProfileId::new(id),
            name: name.to_string(),
        },
    )
    .expect("encode profile")
}

/// A `new_album` event.
///
/// # Panics
///
/// Never; the payload always encodes.
#[must_use]
#[allow(clippy::expect_used)]
pub fn album_created(id: u32, name: &str, artists: Option<&[&str]>) -> SerializedEvent {
    SerializedEvent::from_json(
        topics::NEW_ALBUM,
        &AlbumCreated {
            album_id: AlbumId::new(id),
            name: name.to_string(),
            artists: artists.map(|a| a.iter().map(ToString::to_string).collect()),
        },
    )
    .expect("encode album")
}
