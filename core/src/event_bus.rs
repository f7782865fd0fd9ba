//! Event bus abstraction.
//!
//! The core depends on exactly two transport operations: "publish this message"
//! and "deliver messages on these topics". Connection setup, retries and
//! framing belong to the implementation.
//!
//! # Architecture
//!
//! ```text
//!  profile service        album service
//!        │                      │
//!   new_profile             new_album
//!        └─────────┬────────────┘
//!                  ▼
//!          ┌───────────────┐
//!          │   Event Bus   │◄─── At-least-once delivery
//!          └───────┬───────┘
//!                  ▼
//!          ┌───────────────┐        ┌───────────────┐
//!          │ EventIngestor │──────► │  MirrorStore  │
//!          └───────────────┘        └───────┬───────┘
//!                                           │
//!          ┌───────────────┐        ┌───────┴───────┐
//!          │ChangePublisher│◄───────│InvitationEngine│
//!          └───────┬───────┘        └───────────────┘
//!                  ▼
//!         update_collaborators
//! ```
//!
//! # Key Principles
//!
//! - **At-least-once delivery**: inbound messages may arrive more than once,
//!   so every consumer is idempotent
//! - **Ordered within key**: messages sharing a partition key keep their order
//!
//! # Implementations
//!
//! - `InMemoryEventBus` (`album-invitations-testing`) - for tests
//! - `RedpandaEventBus` (`album-invitations-redpanda`) - Kafka-compatible, for production

use crate::event::SerializedEvent;
use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during event bus operations.
#[derive(Error, Debug, Clone)]
pub enum EventBusError {
    /// Failed to connect to the event bus
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Failed to publish an event to a topic
    #[error("Publish failed for topic '{topic}': {reason}")]
    PublishFailed {
        /// The topic that failed
        topic: String,
        /// The reason for failure
        reason: String,
    },

    /// Failed to subscribe to topics
    #[error("Subscription failed for topics {topics:?}: {reason}")]
    SubscriptionFailed {
        /// The topics that failed to subscribe
        topics: Vec<String>,
        /// The reason for failure
        reason: String,
    },

    /// A received message could not be turned into an event
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Network or transport error
    #[error("Transport error: {0}")]
    TransportError(String),
}

/// Stream of events from subscriptions.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<SerializedEvent, EventBusError>> + Send>>;

/// Publish/subscribe transport.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: one bus instance is shared by the
/// change publisher (request path) and every event consumer.
///
/// # Dyn Compatibility
///
/// Methods return `Pin<Box<dyn Future>>` instead of using `async fn` so the
/// bus can be held as `Arc<dyn EventBus>`.
pub trait EventBus: Send + Sync {
    /// Publish a message to `topic`.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::PublishFailed`] if the broker did not accept
    /// the message.
    fn publish(
        &self,
        topic: &str,
        event: &SerializedEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>>;

    /// Subscribe to one or more topics.
    ///
    /// The returned stream yields every message published to those topics
    /// after the subscription (or from the committed offset, for durable
    /// implementations). Each yielded event's `topic` field names the topic it
    /// arrived on.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::SubscriptionFailed`] if subscription fails.
    fn subscribe(
        &self,
        topics: &[&str],
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>>;
}
