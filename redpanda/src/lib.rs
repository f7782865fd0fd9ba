//! Redpanda (Kafka-compatible) transport for the album invitations event bus.
//!
//! Payloads are the raw JSON the profile and album services publish. A
//! received message becomes a [`SerializedEvent`] whose `data` is the payload,
//! whose `key` is the UTF-8 message key, and whose `topic` is the topic it
//! arrived on. Publishing writes `data` and `key` back unchanged.
//!
//! ```text
//!  new_profile ─┐                       ┌──► update_collaborators
//!  new_album  ──┤                       │     key = album id
//!               ▼                       │
//!      ┌─────────────────┐     ┌────────┴────────┐
//!      │  StreamConsumer │     │  FutureProducer │
//!      └────────┬────────┘     └────────▲────────┘
//!               │ mpsc                  │
//!               ▼                       │
//!         EventIngestor          ChangePublisher
//! ```
//!
//! Offsets are committed by hand once a message has been handed to the
//! subscriber, so delivery is at-least-once. Mirror inserts are
//! insert-if-absent, which makes redelivery harmless.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use album_invitations_core::event::SerializedEvent;
use album_invitations_core::event_bus::{EventBus, EventBusError, EventStream};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

const DEFAULT_ACKS: &str = "1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_BUFFER_SIZE: usize = 1000;
const DEFAULT_OFFSET_RESET: &str = "latest";

/// Event bus backed by a Redpanda cluster.
///
/// One producer serves every publish. Each subscription gets its own consumer
/// in the configured group, so service instances sharing a group split the
/// inbound partitions.
///
/// ```no_run
/// use album_invitations_redpanda::RedpandaEventBus;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let bus = RedpandaEventBus::builder()
///     .brokers("localhost:9092")
///     .consumer_group("album-invitations")
///     .auto_offset_reset("earliest")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct RedpandaEventBus {
    producer: FutureProducer,
    brokers: String,
    timeout: Duration,
    consumer_group: Option<String>,
    buffer_size: usize,
    auto_offset_reset: String,
}

impl RedpandaEventBus {
    /// Start configuring a bus.
    #[must_use]
    pub fn builder() -> RedpandaEventBusBuilder {
        RedpandaEventBusBuilder::default()
    }

    /// Bootstrap servers this bus connects to.
    #[must_use]
    pub fn brokers(&self) -> &str {
        &self.brokers
    }

    fn consumer(&self, topics: &[String]) -> Result<StreamConsumer, EventBusError> {
        let group = self
            .consumer_group
            .clone()
            .unwrap_or_else(|| group_for(topics));
        let subscription_failed = |reason: String| EventBusError::SubscriptionFailed {
            topics: topics.to_vec(),
            reason,
        };

        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .set("group.id", &group)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", &self.auto_offset_reset)
            .set("session.timeout.ms", "6000")
            .set("enable.partition.eof", "false")
            .create()
            .map_err(|e| subscription_failed(format!("Failed to create consumer: {e}")))?;

        let topic_refs: Vec<&str> = topics.iter().map(String::as_str).collect();
        consumer
            .subscribe(&topic_refs)
            .map_err(|e| subscription_failed(format!("Failed to subscribe: {e}")))?;

        tracing::info!(
            ?topics,
            consumer_group = %group,
            auto_offset_reset = %self.auto_offset_reset,
            "Subscribed to topics"
        );
        Ok(consumer)
    }
}

/// Builder for [`RedpandaEventBus`]. Only `brokers` is required.
#[derive(Default)]
pub struct RedpandaEventBusBuilder {
    brokers: Option<String>,
    producer_acks: Option<String>,
    timeout: Option<Duration>,
    consumer_group: Option<String>,
    buffer_size: Option<usize>,
    auto_offset_reset: Option<String>,
}

impl RedpandaEventBusBuilder {
    /// Comma-separated bootstrap servers.
    #[must_use]
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = Some(brokers.into());
        self
    }

    /// Producer `acks` setting (default `"1"`).
    #[must_use]
    pub fn producer_acks(mut self, acks: impl Into<String>) -> Self {
        self.producer_acks = Some(acks.into());
        self
    }

    /// How long a publish may wait for the broker (default 5s).
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Consumer group for subscriptions. Without one, the group is derived
    /// from the subscribed topics.
    #[must_use]
    pub fn consumer_group(mut self, consumer_group: impl Into<String>) -> Self {
        self.consumer_group = Some(consumer_group.into());
        self
    }

    /// Messages that may queue between the consumer and the subscriber
    /// (default 1000). Zero is treated as one.
    #[must_use]
    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = Some(buffer_size.max(1));
        self
    }

    /// Where a group with no committed offset starts reading (default
    /// `"latest"`). The service uses `"earliest"` so profiles and albums
    /// created before its first start are mirrored.
    #[must_use]
    pub fn auto_offset_reset(mut self, policy: impl Into<String>) -> Self {
        self.auto_offset_reset = Some(policy.into());
        self
    }

    /// Create the producer and the bus.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::ConnectionFailed`] if no brokers were given or
    /// the producer cannot be created.
    pub fn build(self) -> Result<RedpandaEventBus, EventBusError> {
        let brokers = self
            .brokers
            .ok_or_else(|| EventBusError::ConnectionFailed("Brokers not configured".to_string()))?;
        let acks = self.producer_acks.as_deref().unwrap_or(DEFAULT_ACKS);

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &brokers)
            .set("message.timeout.ms", "5000")
            .set("acks", acks)
            .create()
            .map_err(|e| {
                EventBusError::ConnectionFailed(format!("Failed to create producer: {e}"))
            })?;

        let buffer_size = self.buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE);
        let auto_offset_reset = self
            .auto_offset_reset
            .unwrap_or_else(|| DEFAULT_OFFSET_RESET.to_string());
        tracing::info!(%brokers, acks, buffer_size, %auto_offset_reset, "Redpanda event bus created");

        Ok(RedpandaEventBus {
            producer,
            brokers,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            consumer_group: self.consumer_group,
            buffer_size,
            auto_offset_reset,
        })
    }
}

/// Group id used when none is configured: stable for a given topic set.
fn group_for(topics: &[String]) -> String {
    let mut sorted = topics.to_vec();
    sorted.sort();
    format!("album-invitations-{}", sorted.join("-"))
}

/// Lift a received message into a [`SerializedEvent`].
fn to_event<M: Message>(message: &M) -> Result<SerializedEvent, EventBusError> {
    let payload = message.payload().ok_or_else(|| {
        EventBusError::DeserializationFailed(format!(
            "message on {} has no payload",
            message.topic()
        ))
    })?;
    // Non-UTF-8 keys are dropped; nothing downstream reads inbound keys.
    let key = message
        .key()
        .and_then(|key| std::str::from_utf8(key).ok())
        .map(str::to_string);

    Ok(SerializedEvent {
        topic: message.topic().to_string(),
        key,
        data: payload.to_vec(),
    })
}

/// Forward messages to `tx` until the subscriber goes away, committing each
/// offset only after the hand-off.
async fn forward(
    consumer: StreamConsumer,
    tx: tokio::sync::mpsc::Sender<Result<SerializedEvent, EventBusError>>,
) {
    use futures::StreamExt;

    let mut stream = consumer.stream();
    while let Some(received) = stream.next().await {
        let message = match received {
            Ok(message) => message,
            Err(e) => {
                let err = EventBusError::TransportError(format!("Failed to receive message: {e}"));
                if tx.send(Err(err)).await.is_err() {
                    break;
                }
                continue;
            },
        };

        tracing::trace!(
            topic = message.topic(),
            partition = message.partition(),
            offset = message.offset(),
            "Received message"
        );
        if tx.send(to_event(&message)).await.is_err() {
            // Uncommitted: the next consumer in the group gets it again.
            break;
        }
        if let Err(e) = consumer.commit_message(&message, CommitMode::Async) {
            tracing::warn!(
                topic = message.topic(),
                partition = message.partition(),
                offset = message.offset(),
                error = %e,
                "Failed to commit offset, message may be redelivered"
            );
        }
    }
    tracing::debug!("Consumer task exiting");
}

impl EventBus for RedpandaEventBus {
    fn publish(
        &self,
        topic: &str,
        event: &SerializedEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        let topic = topic.to_string();
        let event = event.clone();

        Box::pin(async move {
            let mut record = FutureRecord::<str, [u8]>::to(&topic).payload(event.data.as_slice());
            // One key, one partition: updates to an album stay ordered.
            if let Some(key) = event.key.as_deref() {
                record = record.key(key);
            }

            match self.producer.send(record, Timeout::After(self.timeout)).await {
                Ok((partition, offset)) => {
                    tracing::debug!(
                        %topic,
                        partition,
                        offset,
                        key = event.key.as_deref().unwrap_or_default(),
                        bytes = event.data.len(),
                        "Message published"
                    );
                    Ok(())
                },
                Err((kafka_error, _)) => {
                    tracing::error!(%topic, error = %kafka_error, "Failed to publish message");
                    Err(EventBusError::PublishFailed {
                        topic,
                        reason: kafka_error.to_string(),
                    })
                },
            }
        })
    }

    fn subscribe(
        &self,
        topics: &[&str],
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>> {
        let topics: Vec<String> = topics.iter().map(|s| (*s).to_string()).collect();

        Box::pin(async move {
            let consumer = self.consumer(&topics)?;
            let (tx, mut rx) = tokio::sync::mpsc::channel(self.buffer_size);
            tokio::spawn(forward(consumer, tx));

            let stream = async_stream::stream! {
                while let Some(result) = rx.recv().await {
                    yield result;
                }
            };
            Ok(Box::pin(stream) as EventStream)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redpanda_event_bus_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<RedpandaEventBus>();
        assert_sync::<RedpandaEventBus>();
    }

    #[test]
    fn build_requires_brokers() {
        let result = RedpandaEventBus::builder().consumer_group("album-invitations").build();
        assert!(matches!(result, Err(EventBusError::ConnectionFailed(_))));
    }

    #[test]
    fn zero_buffer_size_is_clamped() {
        let builder = RedpandaEventBus::builder().buffer_size(0);
        assert_eq!(builder.buffer_size, Some(1));
    }

    #[test]
    fn derived_group_ignores_topic_order() {
        let a = group_for(&["new_profile".to_string(), "new_album".to_string()]);
        let b = group_for(&["new_album".to_string(), "new_profile".to_string()]);
        assert_eq!(a, b);
        assert_eq!(a, "album-invitations-new_album-new_profile");
    }
}
