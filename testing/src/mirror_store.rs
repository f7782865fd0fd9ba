//! In-memory mirror store.
//!
//! Every [`MirrorStore`] call runs inside one critical section over a single
//! mutex, so guard evaluation and write are atomic with respect to every other
//! call. That makes it a faithful stand-in for the Postgres store in
//! concurrency tests.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on a poisoned lock

use album_invitations_core::mirror_store::{
    MirrorStore, ProposeOutcome, ProposeRejection, StoreError, StoreFuture,
};
use album_invitations_core::types::{Album, AlbumId, InvitationSummary, Profile, ProfileId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Tables {
    profiles: HashMap<ProfileId, Profile>,
    albums: HashMap<AlbumId, Album>,
}

/// `HashMap`-backed mirror store for fast, deterministic tests.
///
/// Clones share the same tables.
///
/// # Example
///
/// ```
/// use album_invitations_testing::InMemoryMirrorStore;
/// use album_invitations_core::mirror_store::MirrorStore;
/// use album_invitations_core::types::{Profile, ProfileId};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryMirrorStore::new();
/// assert!(store.insert_profile(Profile::new(ProfileId::new(1), "alice")).await?);
/// assert!(!store.insert_profile(Profile::new(ProfileId::new(1), "mallory")).await?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryMirrorStore {
    tables: Arc<Mutex<Tables>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryMirrorStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`]
    /// (or succeed again, with `false`).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Snapshot of a profile, bypassing the failure switch.
    #[must_use]
    pub fn profile_snapshot(&self, id: ProfileId) -> Option<Profile> {
        self.tables.lock().unwrap().profiles.get(&id).cloned()
    }

    /// Snapshot of an album, bypassing the failure switch.
    #[must_use]
    pub fn album_snapshot(&self, id: AlbumId) -> Option<Album> {
        self.tables.lock().unwrap().albums.get(&id).cloned()
    }

    /// Number of mirrored profiles.
    #[must_use]
    pub fn profile_count(&self) -> usize {
        self.tables.lock().unwrap().profiles.len()
    }

    /// Number of mirrored albums.
    #[must_use]
    pub fn album_count(&self) -> usize {
        self.tables.lock().unwrap().albums.len()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("in-memory store switched off".into()))
        } else {
            Ok(())
        }
    }

    fn with_tables<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> Result<T, StoreError> {
        self.check_available()?;
        let mut tables = self.tables.lock().unwrap();
        Ok(f(&mut tables))
    }
}

impl MirrorStore for InMemoryMirrorStore {
    fn insert_profile(&self, profile: Profile) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            self.with_tables(|t| {
                if t.profiles.contains_key(&profile.user_id) {
                    false
                } else {
                    t.profiles.insert(profile.user_id, profile);
                    true
                }
            })
        })
    }

    fn insert_album(&self, album: Album) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            self.with_tables(|t| {
                if t.albums.contains_key(&album.album_id) {
                    false
                } else {
                    t.albums.insert(album.album_id, album);
                    true
                }
            })
        })
    }

    fn profile(&self, id: ProfileId) -> StoreFuture<'_, Option<Profile>> {
        Box::pin(async move { self.with_tables(|t| t.profiles.get(&id).cloned()) })
    }

    fn album(&self, id: AlbumId) -> StoreFuture<'_, Option<Album>> {
        Box::pin(async move { self.with_tables(|t| t.albums.get(&id).cloned()) })
    }

    fn add_invitation(
        &self,
        profile: ProfileId,
        album: AlbumId,
    ) -> StoreFuture<'_, ProposeOutcome> {
        Box::pin(async move {
            self.with_tables(|t| {
                let Some(album_row) = t.albums.get(&album) else {
                    return ProposeOutcome::Rejected(ProposeRejection::AlbumMissing);
                };
                let Some(profile_row) = t.profiles.get_mut(&profile) else {
                    return ProposeOutcome::Rejected(ProposeRejection::ProfileMissing);
                };
                if profile_row.is_invited_to(album) {
                    return ProposeOutcome::Rejected(ProposeRejection::AlreadyInvited);
                }
                if album_row.has_collaborator(&profile_row.name) {
                    return ProposeOutcome::Rejected(ProposeRejection::AlreadyCollaborator);
                }
                profile_row.invitations.push(album);
                ProposeOutcome::Added
            })
        })
    }

    fn remove_invitation(
        &self,
        profile: ProfileId,
        album: AlbumId,
    ) -> StoreFuture<'_, Option<Vec<AlbumId>>> {
        Box::pin(async move {
            self.with_tables(|t| {
                if !t.albums.contains_key(&album) {
                    return None;
                }
                let profile_row = t.profiles.get_mut(&profile)?;
                if !profile_row.is_invited_to(album) {
                    return None;
                }
                profile_row.invitations.retain(|id| *id != album);
                Some(profile_row.invitations.clone())
            })
        })
    }

    fn accept_invitation(
        &self,
        profile: ProfileId,
        album: AlbumId,
    ) -> StoreFuture<'_, Option<Vec<String>>> {
        Box::pin(async move {
            self.with_tables(|t| {
                let Tables { profiles, albums } = t;
                let album_row = albums.get_mut(&album)?;
                let profile_row = profiles.get_mut(&profile)?;
                if !profile_row.is_invited_to(album) {
                    return None;
                }
                profile_row.invitations.retain(|id| *id != album);
                if !album_row.has_collaborator(&profile_row.name) {
                    album_row.artists.push(profile_row.name.clone());
                }
                Some(album_row.artists.clone())
            })
        })
    }

    fn invitations(&self, profile: ProfileId) -> StoreFuture<'_, Vec<InvitationSummary>> {
        Box::pin(async move {
            self.with_tables(|t| {
                let Some(profile_row) = t.profiles.get(&profile) else {
                    return Vec::new();
                };
                profile_row
                    .invitations
                    .iter()
                    .filter_map(|id| {
                        t.albums.get(id).map(|album| InvitationSummary {
                            album_id: *id,
                            album_name: album.name.clone(),
                        })
                    })
                    .collect()
            })
        })
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move { self.check_available() })
    }
}
