//! Errors returned by the invitation engine.

use crate::mirror_store::StoreError;
use crate::types::{AlbumId, ProfileId};
use thiserror::Error;

/// Result type alias for invitation operations.
pub type Result<T> = std::result::Result<T, InvitationError>;

/// Why an invitation operation did not take effect.
///
/// Business-rule rejections and infrastructure failures are separate variants
/// so callers can tell "your request conflicts with current state" apart from
/// "try again later".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvitationError {
    // ═══════════════════════════════════════════════════════════
    // Precondition failures
    // ═══════════════════════════════════════════════════════════

    /// The album has no mirror record.
    #[error("album {0} does not exist")]
    AlbumNotFound(AlbumId),

    /// The profile has no mirror record.
    #[error("profile {0} does not exist")]
    ProfileNotFound(ProfileId),

    /// An invitation for this pair is already pending.
    #[error("profile {profile} already has a pending invitation to album {album}")]
    AlreadyInvited {
        /// Invited profile
        profile: ProfileId,
        /// Album
        album: AlbumId,
    },

    /// The profile already collaborates on the album.
    #[error("profile {profile} already collaborates on album {album}")]
    AlreadyCollaborator {
        /// Profile
        profile: ProfileId,
        /// Album
        album: AlbumId,
    },

    /// No pending invitation exists for this pair.
    #[error("profile {profile} has no pending invitation to album {album}")]
    InvitationNotFound {
        /// Profile
        profile: ProfileId,
        /// Album
        album: AlbumId,
    },

    // ═══════════════════════════════════════════════════════════
    // Infrastructure failures
    // ═══════════════════════════════════════════════════════════

    /// The mirror store could not complete the operation. Nothing was
    /// committed; the call is safe to retry.
    #[error("mirror store unavailable: {0}")]
    StorageUnavailable(String),

    /// The mirror store returned data that violates a type bound.
    #[error("mirror store returned invalid data: {0}")]
    StorageCorrupted(String),
}

impl InvitationError {
    /// Stable snake-case name, used as a metrics label and an API error code.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AlbumNotFound(_) => "album_not_found",
            Self::ProfileNotFound(_) => "profile_not_found",
            Self::AlreadyInvited { .. } => "already_invited",
            Self::AlreadyCollaborator { .. } => "already_collaborator",
            Self::InvitationNotFound { .. } => "invitation_not_found",
            Self::StorageUnavailable(_) => "storage_unavailable",
            Self::StorageCorrupted(_) => "storage_corrupted",
        }
    }

    /// True for failures caused by the request conflicting with current state.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        !matches!(
            self,
            Self::StorageUnavailable(_) | Self::StorageCorrupted(_)
        )
    }

    /// True when retrying the same call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }
}

impl From<StoreError> for InvitationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(reason) => Self::StorageUnavailable(reason),
            StoreError::Corrupted(reason) => Self::StorageCorrupted(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_infrastructure_kinds() {
        let err = InvitationError::from(StoreError::Unavailable("connection reset".into()));
        assert_eq!(err.kind(), "storage_unavailable");
        assert!(err.is_retryable());
        assert!(!err.is_rejection());

        let err = InvitationError::from(StoreError::Corrupted("id out of range".into()));
        assert!(!err.is_retryable());
        assert!(!err.is_rejection());
    }

    #[test]
    fn precondition_failures_are_rejections() {
        let err = InvitationError::AlreadyInvited {
            profile: ProfileId::new(1),
            album: AlbumId::new(10),
        };
        assert!(err.is_rejection());
        assert_eq!(
            err.to_string(),
            "profile 1 already has a pending invitation to album 10"
        );
    }
}
