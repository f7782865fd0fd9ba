//! Event bus consumer with automatic reconnection.
//!
//! `EventConsumer` subscribes to its topics, hands each event to an
//! [`EventHandler`], and resubscribes when the stream ends or subscribing
//! fails. It stops when the shutdown broadcast fires.
//!
//! ```text
//! loop {
//!     subscribe (or wait retry_delay and try again)
//!     loop {
//!         handle event, log and drop on failure
//!         stop on shutdown
//!     }
//!     stream ended: wait retry_delay, resubscribe
//! }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let consumer = EventConsumer::builder()
//!     .name("mirror")
//!     .topics(vec!["new_profile".to_string(), "new_album".to_string()])
//!     .event_bus(event_bus)
//!     .handler(handler)
//!     .shutdown(shutdown_rx)
//!     .build()?;
//!
//! let handle = consumer.spawn();
//! ```

use super::EventHandler;
use album_invitations_core::event_bus::{EventBus, EventStream};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Why the stream loop returned.
enum StreamEnd {
    Shutdown,
    Closed,
}

/// Event bus consumer.
///
/// - `name`: consumer name (for logging and metrics)
/// - `topics`: topics to subscribe to
/// - `event_bus`: bus to consume from
/// - `handler`: handler that processes each event
/// - `shutdown`: broadcast receiver for graceful shutdown
/// - `retry_delay`: wait before resubscribing (default: 5s)
pub struct EventConsumer {
    name: String,
    topics: Vec<String>,
    event_bus: Arc<dyn EventBus>,
    handler: Arc<dyn EventHandler>,
    shutdown: broadcast::Receiver<()>,
    retry_delay: Duration,
}

impl EventConsumer {
    /// Create a builder for configuring a consumer.
    #[must_use]
    pub fn builder() -> EventConsumerBuilder {
        EventConsumerBuilder::default()
    }

    /// Consumer name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Spawn the consumer as a background task.
    ///
    /// The task runs until the shutdown signal is received.
    #[must_use]
    pub fn spawn(mut self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(&mut self) {
        info!(consumer = %self.name, "Event consumer started");

        loop {
            let topics: Vec<&str> = self.topics.iter().map(String::as_str).collect();

            let subscribed = tokio::select! {
                _ = self.shutdown.recv() => {
                    info!(consumer = %self.name, "Event consumer received shutdown signal");
                    break;
                }
                result = self.event_bus.subscribe(&topics) => result,
            };

            match subscribed {
                Ok(mut stream) => {
                    info!(consumer = %self.name, topics = ?self.topics, "Subscribed to event bus");
                    if let StreamEnd::Shutdown = self.process_stream(&mut stream).await {
                        break;
                    }
                    warn!(
                        consumer = %self.name,
                        "Event stream ended, reconnecting in {:?}",
                        self.retry_delay
                    );
                },
                Err(e) => {
                    error!(
                        consumer = %self.name,
                        error = %e,
                        "Failed to subscribe to event bus, retrying in {:?}",
                        self.retry_delay
                    );
                },
            }

            metrics::counter!("consumer_reconnects_total", "consumer" => self.name.clone())
                .increment(1);
            tokio::select! {
                _ = self.shutdown.recv() => {
                    info!(consumer = %self.name, "Event consumer received shutdown signal");
                    break;
                }
                () = tokio::time::sleep(self.retry_delay) => {}
            }
        }

        info!(consumer = %self.name, "Event consumer stopped");
    }

    async fn process_stream(&mut self, stream: &mut EventStream) -> StreamEnd {
        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    info!(consumer = %self.name, "Event consumer received shutdown signal during processing");
                    return StreamEnd::Shutdown;
                }
                next = stream.next() => match next {
                    Some(Ok(event)) => {
                        if let Err(e) = self.handler.handle(&event).await {
                            error!(
                                consumer = %self.name,
                                topic = %event.topic,
                                error = %e,
                                "Failed to handle event, dropping it"
                            );
                            metrics::counter!("events_dropped_total", "consumer" => self.name.clone())
                                .increment(1);
                        }
                    },
                    Some(Err(e)) => {
                        error!(consumer = %self.name, error = %e, "Error receiving event from stream");
                    },
                    None => return StreamEnd::Closed,
                },
            }
        }
    }
}

/// A required builder field was not set.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("event consumer {0} is required")]
pub struct MissingField(pub &'static str);

/// Builder for configuring an `EventConsumer`.
#[derive(Default)]
pub struct EventConsumerBuilder {
    name: Option<String>,
    topics: Option<Vec<String>>,
    event_bus: Option<Arc<dyn EventBus>>,
    handler: Option<Arc<dyn EventHandler>>,
    shutdown: Option<broadcast::Receiver<()>>,
    retry_delay: Option<Duration>,
}

impl EventConsumerBuilder {
    /// Set consumer name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set topics to subscribe to.
    #[must_use]
    pub fn topics(mut self, topics: Vec<String>) -> Self {
        self.topics = Some(topics);
        self
    }

    /// Set event bus instance.
    #[must_use]
    pub fn event_bus(mut self, event_bus: Arc<dyn EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Set event handler.
    #[must_use]
    pub fn handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Set shutdown signal receiver.
    #[must_use]
    pub fn shutdown(mut self, shutdown: broadcast::Receiver<()>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Set custom retry delay (default: 5 seconds).
    #[must_use]
    pub const fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    /// Build the `EventConsumer`.
    ///
    /// # Errors
    ///
    /// Returns [`MissingField`] if name, topics, event bus, handler or
    /// shutdown receiver is not set.
    pub fn build(self) -> Result<EventConsumer, MissingField> {
        Ok(EventConsumer {
            name: self.name.ok_or(MissingField("name"))?,
            topics: self.topics.ok_or(MissingField("topics"))?,
            event_bus: self.event_bus.ok_or(MissingField("event_bus"))?,
            handler: self.handler.ok_or(MissingField("handler"))?,
            shutdown: self.shutdown.ok_or(MissingField("shutdown"))?,
            retry_delay: self.retry_delay.unwrap_or(DEFAULT_RETRY_DELAY),
        })
    }
}
