//! The invitation engine: propose, withdraw, accept and query.
//!
//! Each operation maps to exactly one atomic [`MirrorStore`] call. The engine
//! never reads state to decide whether to write; it asks the store to write
//! conditionally and translates the outcome into a typed result. This is what
//! keeps the invariants intact when several service instances handle requests
//! for the same pair at once:
//!
//! - at most one pending invitation per `(profile, album)`
//! - a pending invitation implies the album exists
//! - a profile is never both invitee and collaborator of one album
//! - acceptance moves a profile from invitee to collaborator in one step
//!
//! # Lifecycle
//!
//! ```text
//!            propose                 accept
//!   (none) ──────────► pending ──────────────► collaborator
//!      ▲                  │
//!      └──────────────────┘
//!            withdraw
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let engine = InvitationEngine::new(store, ChangePublisher::new(bus));
//!
//! engine.propose(ProfileId::new(1), AlbumId::new(10)).await?;
//! let accepted = engine.accept(ProfileId::new(1), AlbumId::new(10)).await?;
//! assert_eq!(accepted.artists, vec!["alice"]);
//! ```

use crate::error::{InvitationError, Result};
use crate::mirror_store::{MirrorStore, ProposeOutcome, ProposeRejection};
use crate::publisher::ChangePublisher;
use crate::types::{AcceptedInvitation, AlbumId, InvitationSummary, ProfileId};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Applies invitation state transitions to the mirror store.
///
/// Cheap to share: hold it in an `Arc` and hand it to every request handler.
#[derive(Clone)]
pub struct InvitationEngine {
    store: Arc<dyn MirrorStore>,
    publisher: ChangePublisher,
}

impl InvitationEngine {
    /// Create an engine over `store`, announcing acceptances through
    /// `publisher`.
    #[must_use]
    pub fn new(store: Arc<dyn MirrorStore>, publisher: ChangePublisher) -> Self {
        Self { store, publisher }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn MirrorStore> {
        &self.store
    }

    /// Invite `profile` to collaborate on `album`.
    ///
    /// # Errors
    ///
    /// - [`InvitationError::AlbumNotFound`] if the album has no mirror
    /// - [`InvitationError::ProfileNotFound`] if the profile has no mirror
    /// - [`InvitationError::AlreadyInvited`] if the invitation is pending
    /// - [`InvitationError::AlreadyCollaborator`] if the profile already
    ///   collaborates on the album
    /// - [`InvitationError::StorageUnavailable`] on infrastructure failure
    #[tracing::instrument(skip(self), fields(operation = "propose"))]
    pub async fn propose(&self, profile: ProfileId, album: AlbumId) -> Result<()> {
        let outcome = self
            .store
            .add_invitation(profile, album)
            .await
            .map_err(|e| failed("propose", e.into()))?;

        match outcome {
            ProposeOutcome::Added => {
                info!(%profile, %album, "Invitation proposed");
                metrics::counter!("invitations_proposed_total").increment(1);
                Ok(())
            },
            ProposeOutcome::Rejected(reason) => {
                Err(failed("propose", rejection_error(reason, profile, album)))
            },
        }
    }

    /// Remove a pending invitation.
    ///
    /// Returns the profile's remaining pending album ids.
    ///
    /// # Errors
    ///
    /// - [`InvitationError::InvitationNotFound`] if nothing was pending
    /// - [`InvitationError::StorageUnavailable`] on infrastructure failure
    #[tracing::instrument(skip(self), fields(operation = "withdraw"))]
    pub async fn withdraw(&self, profile: ProfileId, album: AlbumId) -> Result<Vec<AlbumId>> {
        let remaining = self
            .store
            .remove_invitation(profile, album)
            .await
            .map_err(|e| failed("withdraw", e.into()))?
            .ok_or_else(|| failed("withdraw", InvitationError::InvitationNotFound { profile, album }))?;

        info!(%profile, %album, remaining = remaining.len(), "Invitation withdrawn");
        metrics::counter!("invitations_withdrawn_total").increment(1);
        Ok(remaining)
    }

    /// Accept a pending invitation: the profile becomes a collaborator of the
    /// album.
    ///
    /// The store commits the invitation removal and the collaborator append
    /// together. Only after that commit is the change announced; a publish
    /// failure is logged and does not undo the acceptance.
    ///
    /// # Errors
    ///
    /// - [`InvitationError::InvitationNotFound`] if nothing was pending
    /// - [`InvitationError::StorageUnavailable`] on infrastructure failure;
    ///   neither record changed
    #[tracing::instrument(skip(self), fields(operation = "accept"))]
    pub async fn accept(&self, profile: ProfileId, album: AlbumId) -> Result<AcceptedInvitation> {
        let artists = self
            .store
            .accept_invitation(profile, album)
            .await
            .map_err(|e| failed("accept", e.into()))?
            .ok_or_else(|| failed("accept", InvitationError::InvitationNotFound { profile, album }))?;

        info!(%profile, %album, collaborators = artists.len(), "Invitation accepted");
        metrics::counter!("invitations_accepted_total").increment(1);

        if let Err(e) = self.publisher.collaborators_changed(album, &artists).await {
            warn!(
                %album,
                topic = self.publisher.topic(),
                error = %e,
                "Failed to publish collaborator update; acceptance stays committed"
            );
            metrics::counter!("collaborator_updates_failed_total").increment(1);
        }

        Ok(AcceptedInvitation {
            album_id: album,
            artists,
        })
    }

    /// Pending invitations of `profile` with album names.
    ///
    /// # Errors
    ///
    /// Returns [`InvitationError::StorageUnavailable`] on infrastructure
    /// failure.
    #[tracing::instrument(skip(self), fields(operation = "query"))]
    pub async fn query(&self, profile: ProfileId) -> Result<Vec<InvitationSummary>> {
        let invitations = self
            .store
            .invitations(profile)
            .await
            .map_err(|e| failed("query", e.into()))?;

        debug!(%profile, count = invitations.len(), "Invitations listed");
        Ok(invitations)
    }
}

fn rejection_error(reason: ProposeRejection, profile: ProfileId, album: AlbumId) -> InvitationError {
    match reason {
        ProposeRejection::AlbumMissing => InvitationError::AlbumNotFound(album),
        ProposeRejection::ProfileMissing => InvitationError::ProfileNotFound(profile),
        ProposeRejection::AlreadyInvited => InvitationError::AlreadyInvited { profile, album },
        ProposeRejection::AlreadyCollaborator => {
            InvitationError::AlreadyCollaborator { profile, album }
        },
    }
}

/// Log and count a failed operation, then hand the error back.
fn failed(operation: &'static str, err: InvitationError) -> InvitationError {
    if err.is_rejection() {
        debug!(operation, reason = err.kind(), error = %err, "Invitation operation rejected");
        metrics::counter!(
            "invitations_rejected_total",
            "operation" => operation,
            "reason" => err.kind()
        )
        .increment(1);
    } else {
        warn!(operation, error = %err, "Invitation operation failed");
        metrics::counter!("invitations_storage_errors_total", "operation" => operation)
            .increment(1);
    }
    err
}
