//! Storage contract for the profile and album mirrors.
//!
//! The [`MirrorStore`] trait is the only way any component touches shared
//! state. Every mutating method is a single atomic operation: the guard
//! (e.g. "album exists and the profile is not yet invited") is evaluated by the
//! store together with the write, never as a separate read by the caller.
//! Multiple service instances may share one store, so in-process locking in
//! callers cannot provide these guarantees.
//!
//! # Implementations
//!
//! - `PostgresMirrorStore` (`album-invitations-postgres`) - conditional
//!   `UPDATE` statements inside row-locking transactions
//! - `InMemoryMirrorStore` (`album-invitations-testing`) - every call runs in
//!   one critical section
//!
//! # Example
//!
//! ```rust,ignore
//! use album_invitations_core::mirror_store::{MirrorStore, ProposeOutcome};
//!
//! async fn invite(store: &dyn MirrorStore) -> Result<(), StoreError> {
//!     match store.add_invitation(ProfileId::new(1), AlbumId::new(10)).await? {
//!         ProposeOutcome::Added => println!("invited"),
//!         ProposeOutcome::Rejected(reason) => println!("rejected: {reason:?}"),
//!     }
//!     Ok(())
//! }
//! ```

use crate::types::{Album, AlbumId, InvitationSummary, Profile, ProfileId};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors raised by a mirror store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Connection, pool or transaction failure. Nothing was committed.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A stored value cannot be represented in the domain types.
    #[error("corrupted record: {0}")]
    Corrupted(String),
}

/// Boxed future returned by [`MirrorStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Which precondition of a proposal did not hold.
///
/// When several fail at once, the first in declaration order is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposeRejection {
    /// No album mirror with that id.
    AlbumMissing,
    /// No profile mirror with that id.
    ProfileMissing,
    /// The album id is already in the profile's invitation set.
    AlreadyInvited,
    /// The profile name is already in the album's artists.
    AlreadyCollaborator,
}

/// Result of a conditional invitation insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposeOutcome {
    /// The album id was added to the profile's invitation set.
    Added,
    /// Nothing changed.
    Rejected(ProposeRejection),
}

/// Durable storage for mirrored profiles and albums.
///
/// # Atomicity
///
/// - `add_invitation`, `remove_invitation` and `accept_invitation` evaluate
///   their guard and apply their write as one indivisible step.
/// - `accept_invitation` spans both records: either the invitation is removed
///   *and* the collaborator appended, or neither change becomes visible.
/// - Concurrent calls on the same `(profile, album)` pair behave as if run in
///   some total order.
///
/// # Dyn Compatibility
///
/// Methods return boxed futures so the store can be shared as
/// `Arc<dyn MirrorStore>` between the HTTP layer and the event consumers.
pub trait MirrorStore: Send + Sync {
    /// Insert a profile unless one with the same id exists.
    ///
    /// Returns `true` if the row was inserted, `false` if it already existed
    /// (the existing row is left untouched).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the write cannot be performed.
    fn insert_profile(&self, profile: Profile) -> StoreFuture<'_, bool>;

    /// Insert an album unless one with the same id exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the write cannot be performed.
    fn insert_album(&self, album: Album) -> StoreFuture<'_, bool>;

    /// Point lookup of a profile.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read fails or the row is malformed.
    fn profile(&self, id: ProfileId) -> StoreFuture<'_, Option<Profile>>;

    /// Point lookup of an album.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read fails or the row is malformed.
    fn album(&self, id: AlbumId) -> StoreFuture<'_, Option<Album>>;

    /// Add `album` to the profile's invitation set if the album exists, the
    /// profile exists, the invitation is not already pending and the profile
    /// is not already a collaborator.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on infrastructure failure. A failed precondition
    /// is not an error; it is reported as [`ProposeOutcome::Rejected`].
    fn add_invitation(&self, profile: ProfileId, album: AlbumId)
        -> StoreFuture<'_, ProposeOutcome>;

    /// Remove a pending invitation.
    ///
    /// Returns the profile's remaining invitation set, or `None` if the album
    /// does not exist or no invitation was pending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on infrastructure failure.
    fn remove_invitation(
        &self,
        profile: ProfileId,
        album: AlbumId,
    ) -> StoreFuture<'_, Option<Vec<AlbumId>>>;

    /// Turn a pending invitation into a collaboration.
    ///
    /// Removes `album` from the profile's invitations and appends the profile
    /// name to the album's artists in one transaction. Returns the album's
    /// resulting artists, or `None` if no invitation was pending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on infrastructure failure; in that case neither
    /// record was modified.
    fn accept_invitation(
        &self,
        profile: ProfileId,
        album: AlbumId,
    ) -> StoreFuture<'_, Option<Vec<String>>>;

    /// Pending invitations of a profile, joined with album names, in the
    /// order they were proposed. Unknown profiles have no invitations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read fails or a row is malformed.
    fn invitations(&self, profile: ProfileId) -> StoreFuture<'_, Vec<InvitationSummary>>;

    /// Cheap round trip used by readiness probes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the store cannot be reached.
    fn ping(&self) -> StoreFuture<'_, ()>;
}
