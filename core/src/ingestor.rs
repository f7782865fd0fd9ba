//! Mirrors inbound profile and album events into the store.
//!
//! Delivery is at-least-once, so every ingest is an insert-if-absent: a
//! repeated `new_profile` or `new_album` leaves the existing mirror untouched
//! (including any invitations or collaborators added since).

use crate::event::{AlbumCreated, ProfileCreated, SerializedEvent, topics};
use crate::mirror_store::{MirrorStore, StoreError};
use crate::types::{Album, Profile};
use std::sync::Arc;
use thiserror::Error;

/// What ingesting one event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A new mirror record was written.
    Created,
    /// A record with that id already existed; nothing changed.
    Duplicate,
    /// The event's topic is not one this ingestor mirrors.
    Ignored,
}

/// Why an event could not be ingested. The event is dropped either way.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IngestError {
    /// Payload is not valid JSON for the topic's schema.
    #[error("malformed event on '{topic}': {reason}")]
    Malformed {
        /// Topic the event arrived on
        topic: String,
        /// Decoder message
        reason: String,
    },

    /// The store rejected the write.
    #[error("failed to store mirror record: {0}")]
    Storage(#[from] StoreError),
}

/// Writes profile and album mirrors from inbound events.
#[derive(Clone)]
pub struct EventIngestor {
    store: Arc<dyn MirrorStore>,
    profile_topic: String,
    album_topic: String,
}

impl EventIngestor {
    /// Ingestor for the default `new_profile` and `new_album` topics.
    #[must_use]
    pub fn new(store: Arc<dyn MirrorStore>) -> Self {
        Self::with_topics(store, topics::NEW_PROFILE, topics::NEW_ALBUM)
    }

    /// Ingestor for custom topic names.
    #[must_use]
    pub fn with_topics(
        store: Arc<dyn MirrorStore>,
        profile_topic: impl Into<String>,
        album_topic: impl Into<String>,
    ) -> Self {
        Self {
            store,
            profile_topic: profile_topic.into(),
            album_topic: album_topic.into(),
        }
    }

    /// Topics to subscribe to.
    #[must_use]
    pub fn topics(&self) -> Vec<&str> {
        vec![self.profile_topic.as_str(), self.album_topic.as_str()]
    }

    /// Route an event by topic and mirror its payload.
    ///
    /// # Errors
    ///
    /// - [`IngestError::Malformed`] if the payload does not decode
    /// - [`IngestError::Storage`] if the store write fails
    pub async fn ingest(&self, event: &SerializedEvent) -> Result<IngestOutcome, IngestError> {
        let outcome = if event.topic == self.profile_topic {
            let payload: ProfileCreated = decode(event)?;
            self.profile_created(payload).await?
        } else if event.topic == self.album_topic {
            let payload: AlbumCreated = decode(event)?;
            self.album_created(payload).await?
        } else {
            tracing::debug!(topic = %event.topic, "Ignoring event on unmirrored topic");
            return Ok(IngestOutcome::Ignored);
        };

        let result = match outcome {
            IngestOutcome::Created => "created",
            IngestOutcome::Duplicate => "duplicate",
            IngestOutcome::Ignored => "ignored",
        };
        metrics::counter!(
            "events_ingested_total",
            "topic" => event.topic.clone(),
            "result" => result
        )
        .increment(1);

        Ok(outcome)
    }

    /// Mirror a newly created profile with no pending invitations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the insert fails.
    #[tracing::instrument(skip(self, payload), fields(user_id = %payload.user_id))]
    pub async fn profile_created(&self, payload: ProfileCreated) -> Result<IngestOutcome, StoreError> {
        let inserted = self
            .store
            .insert_profile(Profile::new(payload.user_id, payload.name))
            .await?;

        if inserted {
            tracing::info!("Profile mirrored");
            Ok(IngestOutcome::Created)
        } else {
            tracing::debug!("Profile already mirrored");
            Ok(IngestOutcome::Duplicate)
        }
    }

    /// Mirror a newly created album with its initial collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the insert fails.
    #[tracing::instrument(skip(self, payload), fields(album_id = %payload.album_id))]
    pub async fn album_created(&self, payload: AlbumCreated) -> Result<IngestOutcome, StoreError> {
        let album = Album::new(
            payload.album_id,
            payload.name,
            payload.artists.unwrap_or_default(),
        );
        let inserted = self.store.insert_album(album).await?;

        if inserted {
            tracing::info!("Album mirrored");
            Ok(IngestOutcome::Created)
        } else {
            tracing::debug!("Album already mirrored");
            Ok(IngestOutcome::Duplicate)
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(event: &SerializedEvent) -> Result<T, IngestError> {
    event.decode().map_err(|e| {
        metrics::counter!("events_malformed_total", "topic" => event.topic.clone()).increment(1);
        IngestError::Malformed {
            topic: event.topic.clone(),
            reason: e.to_string(),
        }
    })
}
