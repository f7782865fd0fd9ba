//! Outbound notification of collaborator changes.

use crate::event::{CollaboratorsUpdated, SerializedEvent, topics};
use crate::event_bus::{EventBus, EventBusError};
use crate::types::AlbumId;
use std::sync::Arc;

/// Publishes `{artists, id}` after an album gains a collaborator.
///
/// Messages are keyed by album id so consumers see the updates of one album in
/// order.
#[derive(Clone)]
pub struct ChangePublisher {
    bus: Arc<dyn EventBus>,
    topic: String,
}

impl ChangePublisher {
    /// Publisher writing to the default `update_collaborators` topic.
    #[must_use]
    pub fn new(bus: Arc<dyn EventBus>) -> Self {
        Self::with_topic(bus, topics::UPDATE_COLLABORATORS)
    }

    /// Publisher writing to a custom topic.
    #[must_use]
    pub fn with_topic(bus: Arc<dyn EventBus>, topic: impl Into<String>) -> Self {
        Self {
            bus,
            topic: topic.into(),
        }
    }

    /// Destination topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Announce the album's new collaborator set.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError`] if encoding fails or the bus rejects the
    /// message.
    pub async fn collaborators_changed(
        &self,
        album_id: AlbumId,
        artists: &[String],
    ) -> Result<(), EventBusError> {
        let payload = CollaboratorsUpdated {
            artists: artists.to_vec(),
            album_id,
        };
        let event = SerializedEvent::from_json(self.topic.as_str(), &payload)
            .map_err(|e| EventBusError::PublishFailed {
                topic: self.topic.clone(),
                reason: e.to_string(),
            })?
            .with_key(album_id.to_string());

        self.bus.publish(&self.topic, &event).await?;

        tracing::debug!(
            topic = %self.topic,
            album_id = %album_id,
            collaborators = artists.len(),
            "Collaborator change published"
        );
        metrics::counter!("collaborator_updates_published_total").increment(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::event::CollaboratorsUpdated;
    use crate::event_bus::EventStream;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingBus {
        sent: Mutex<Vec<(String, SerializedEvent)>>,
        fail: bool,
    }

    impl EventBus for RecordingBus {
        fn publish(
            &self,
            topic: &str,
            event: &SerializedEvent,
        ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
            let topic = topic.to_string();
            let event = event.clone();
            Box::pin(async move {
                if self.fail {
                    return Err(EventBusError::PublishFailed {
                        topic,
                        reason: "broker down".into(),
                    });
                }
                self.sent.lock().expect("lock").push((topic, event));
                Ok(())
            })
        }

        fn subscribe(
            &self,
            topics: &[&str],
        ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>> {
            let topics = topics.iter().map(ToString::to_string).collect();
            Box::pin(async move {
                Err(EventBusError::SubscriptionFailed {
                    topics,
                    reason: "not supported".into(),
                })
            })
        }
    }

    #[tokio::test]
    async fn publishes_keyed_payload_to_configured_topic() {
        let bus = Arc::new(RecordingBus::default());
        let publisher = ChangePublisher::with_topic(bus.clone(), "new_collaborator");

        publisher
            .collaborators_changed(AlbumId::new(10), &["alice".to_string()])
            .await
            .expect("publish");

        let sent = bus.sent.lock().expect("lock");
        assert_eq!(sent.len(), 1);
        let (topic, event) = &sent[0];
        assert_eq!(topic, "new_collaborator");
        assert_eq!(event.key.as_deref(), Some("10"));
        let payload: CollaboratorsUpdated = event.decode().expect("decode");
        assert_eq!(payload.album_id, AlbumId::new(10));
        assert_eq!(payload.artists, vec!["alice".to_string()]);
    }

    #[tokio::test]
    async fn surfaces_bus_failures() {
        let bus = Arc::new(RecordingBus {
            fail: true,
            ..RecordingBus::default()
        });
        let publisher = ChangePublisher::new(bus);
        assert_eq!(publisher.topic(), "update_collaborators");

        let result = publisher.collaborators_changed(AlbumId::new(10), &[]).await;
        assert!(matches!(result, Err(EventBusError::PublishFailed { .. })));
    }
}
