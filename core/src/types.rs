//! Mirrored records and identifiers.
//!
//! `Profile` and `Album` are local copies of data owned by the profile and
//! album services. An invitation is not a record of its own: it exists exactly
//! when an album id is a member of [`Profile::invitations`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a user profile, assigned by the profile service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(pub u32);

impl ProfileId {
    /// Wrap a raw profile id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// The raw id.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an album, assigned by the album service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlbumId(pub u32);

impl AlbumId {
    /// Wrap a raw album id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// The raw id.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for AlbumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Local mirror of a user profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Profile id.
    pub user_id: ProfileId,
    /// Display name, written into `Album::artists` on acceptance.
    pub name: String,
    /// Albums this profile currently has a pending invitation to.
    pub invitations: Vec<AlbumId>,
}

impl Profile {
    /// A freshly mirrored profile with no pending invitations.
    #[must_use]
    pub fn new(user_id: ProfileId, name: impl Into<String>) -> Self {
        Self {
            user_id,
            name: name.into(),
            invitations: Vec::new(),
        }
    }

    /// Whether an invitation to `album` is pending.
    #[must_use]
    pub fn is_invited_to(&self, album: AlbumId) -> bool {
        self.invitations.contains(&album)
    }
}

/// Local mirror of an album.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    /// Album id.
    pub album_id: AlbumId,
    /// Display name.
    pub name: String,
    /// Collaborator names in acceptance order.
    pub artists: Vec<String>,
}

impl Album {
    /// Build an album mirror. Repeated artist names are collapsed, keeping the
    /// first occurrence.
    #[must_use]
    pub fn new(album_id: AlbumId, name: impl Into<String>, artists: Vec<String>) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(artists.len());
        for artist in artists {
            if !unique.contains(&artist) {
                unique.push(artist);
            }
        }

        Self {
            album_id,
            name: name.into(),
            artists: unique,
        }
    }

    /// Whether `name` is already an accepted collaborator.
    #[must_use]
    pub fn has_collaborator(&self, name: &str) -> bool {
        self.artists.iter().any(|artist| artist == name)
    }
}

/// One row of a profile's pending invitation list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationSummary {
    /// Album the invitation is for.
    pub album_id: AlbumId,
    /// Name of that album.
    pub album_name: String,
}

/// The album's collaborator set after a successful acceptance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedInvitation {
    /// Album that gained a collaborator.
    pub album_id: AlbumId,
    /// Full collaborator list, new collaborator last.
    pub artists: Vec<String>,
}

/// Authenticated caller, resolved from a bearer token outside the core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Profile the caller acts as.
    pub user_id: ProfileId,
    /// Caller's e-mail address.
    pub email: String,
}

impl Identity {
    /// Create an identity.
    #[must_use]
    pub fn new(user_id: ProfileId, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
        }
    }
}
