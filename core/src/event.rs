//! Wire envelope and payloads of the events this service consumes and emits.
//!
//! The profile and album services publish plain JSON, so payloads travel as
//! raw JSON bytes inside a [`SerializedEvent`]. The envelope carries the topic
//! the message arrived on (or is destined for) and an optional partition key.
//!
//! # Topics
//!
//! | Topic | Direction | Payload |
//! |-------|-----------|---------|
//! | `new_profile` | inbound | [`ProfileCreated`] |
//! | `new_album` | inbound | [`AlbumCreated`] |
//! | `update_collaborators` | outbound | [`CollaboratorsUpdated`] |
//!
//! # Example
//!
//! ```
//! use album_invitations_core::event::{ProfileCreated, SerializedEvent};
//!
//! let event = SerializedEvent::new("new_profile", br#"{"userid": 1, "name": "alice"}"#.to_vec());
//! let payload: ProfileCreated = event.decode().unwrap();
//! assert_eq!(payload.name, "alice");
//! ```

use crate::types::{AlbumId, ProfileId};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt;
use thiserror::Error;

/// Default topic names.
pub mod topics {
    /// A profile was created in the profile service.
    pub const NEW_PROFILE: &str = "new_profile";
    /// An album was created in the album service.
    pub const NEW_ALBUM: &str = "new_album";
    /// An album's collaborator set changed.
    pub const UPDATE_COLLABORATORS: &str = "update_collaborators";
}

/// Error types for event encoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    /// Failed to encode a payload.
    #[error("Failed to serialize event: {0}")]
    SerializationError(String),

    /// Payload bytes do not match the expected shape.
    #[error("Failed to deserialize event: {0}")]
    DeserializationError(String),
}

/// A message on the event bus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SerializedEvent {
    /// Topic the message belongs to.
    pub topic: String,

    /// Partition key. Messages sharing a key are delivered in order.
    pub key: Option<String>,

    /// JSON payload.
    pub data: Vec<u8>,
}

impl SerializedEvent {
    /// Create an unkeyed message.
    #[must_use]
    pub fn new(topic: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            topic: topic.into(),
            key: None,
            data,
        }
    }

    /// Set the partition key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Encode `payload` as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::SerializationError`] if the payload cannot be
    /// represented as JSON.
    pub fn from_json<T: Serialize>(topic: impl Into<String>, payload: &T) -> Result<Self, EventError> {
        let data = serde_json::to_vec(payload)
            .map_err(|e| EventError::SerializationError(e.to_string()))?;
        Ok(Self::new(topic, data))
    }

    /// Decode the JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::DeserializationError`] if the bytes are not valid
    /// JSON for `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, EventError> {
        serde_json::from_slice(&self.data)
            .map_err(|e| EventError::DeserializationError(e.to_string()))
    }
}

impl fmt::Display for SerializedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SerializedEvent {{ topic: {}, size: {} bytes }}",
            self.topic,
            self.data.len()
        )
    }
}

/// `new_profile` payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileCreated {
    /// Id of the new profile.
    #[serde(rename = "userid")]
    pub user_id: ProfileId,
    /// Display name. Older producers send it as `username`.
    #[serde(alias = "username")]
    pub name: String,
}

/// `new_album` payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumCreated {
    /// Id of the new album.
    #[serde(rename = "id")]
    pub album_id: AlbumId,
    /// Display name.
    pub name: String,
    /// Initial collaborators. Missing and `null` both mean none.
    #[serde(default)]
    pub artists: Option<Vec<String>>,
}

/// Outbound payload describing an album's collaborator set after a change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaboratorsUpdated {
    /// Full collaborator list.
    pub artists: Vec<String>,
    /// Album that changed.
    #[serde(rename = "id")]
    pub album_id: AlbumId,
}
