//! In-memory event bus.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on a poisoned lock

use album_invitations_core::event::SerializedEvent;
use album_invitations_core::event_bus::{EventBus, EventBusError, EventStream};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 1024;

/// Broadcast-channel event bus that also records everything published.
///
/// Subscribers only see messages published after they subscribed, filtered to
/// their topics. Clones share the channel and the record.
///
/// # Example
///
/// ```
/// use album_invitations_testing::InMemoryEventBus;
/// use album_invitations_core::event::SerializedEvent;
/// use album_invitations_core::event_bus::EventBus;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let bus = InMemoryEventBus::new();
/// bus.publish("update_collaborators", &SerializedEvent::new("update_collaborators", b"{}".to_vec()))
///     .await?;
/// assert_eq!(bus.published_to("update_collaborators").len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct InMemoryEventBus {
    sender: broadcast::Sender<SerializedEvent>,
    published: Arc<Mutex<Vec<SerializedEvent>>>,
    fail_publishes: Arc<AtomicBool>,
}

impl InMemoryEventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            published: Arc::new(Mutex::new(Vec::new())),
            fail_publishes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every subsequent publish fail (or succeed again, with `false`).
    pub fn set_fail_publishes(&self, fail: bool) {
        self.fail_publishes.store(fail, Ordering::SeqCst);
    }

    /// Every successfully published message, in publish order.
    #[must_use]
    pub fn published(&self) -> Vec<SerializedEvent> {
        self.published.lock().unwrap().clone()
    }

    /// Successfully published messages for one topic.
    #[must_use]
    pub fn published_to(&self, topic: &str) -> Vec<SerializedEvent> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .filter(|event| event.topic == topic)
            .cloned()
            .collect()
    }

    /// Forget all recorded messages.
    pub fn clear(&self) {
        self.published.lock().unwrap().clear();
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus for InMemoryEventBus {
    fn publish(
        &self,
        topic: &str,
        event: &SerializedEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        let mut event = event.clone();
        event.topic = topic.to_string();

        Box::pin(async move {
            if self.fail_publishes.load(Ordering::SeqCst) {
                return Err(EventBusError::PublishFailed {
                    topic: event.topic,
                    reason: "in-memory bus switched off".into(),
                });
            }

            self.published.lock().unwrap().push(event.clone());
            // No subscribers is not an error
            let _ = self.sender.send(event);
            Ok(())
        })
    }

    fn subscribe(
        &self,
        topics: &[&str],
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>> {
        let topics: Vec<String> = topics.iter().map(ToString::to_string).collect();
        let mut receiver = self.sender.subscribe();

        Box::pin(async move {
            let stream = async_stream::stream! {
                loop {
                    match receiver.recv().await {
                        Ok(event) if topics.contains(&event.topic) => yield Ok(event),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            yield Err(EventBusError::TransportError(format!(
                                "subscriber lagged, {skipped} messages skipped"
                            )));
                        },
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            };
            Ok(Box::pin(stream) as EventStream)
        })
    }
}
