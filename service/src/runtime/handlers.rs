//! Event handler trait and the mirror ingestion handler.
//!
//! `EventConsumer` hands every received event to an [`EventHandler`]. Errors
//! are logged by the consumer and the event is dropped; they never stop the
//! consumer.

use album_invitations_core::{EventIngestor, IngestOutcome, SerializedEvent};
use async_trait::async_trait;

/// Error type handlers report back to the consumer.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Processes one received event.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle `event`.
    ///
    /// # Errors
    ///
    /// Any error is logged by the consumer, which then moves on to the next
    /// event.
    async fn handle(&self, event: &SerializedEvent) -> Result<(), HandlerError>;
}

/// Mirrors profiles and albums into the store.
#[derive(Clone)]
pub struct IngestionHandler {
    ingestor: EventIngestor,
}

impl IngestionHandler {
    /// Wrap an ingestor.
    #[must_use]
    pub const fn new(ingestor: EventIngestor) -> Self {
        Self { ingestor }
    }

    /// Topics this handler understands.
    #[must_use]
    pub fn topics(&self) -> Vec<String> {
        self.ingestor.topics().into_iter().map(str::to_string).collect()
    }
}

#[async_trait]
impl EventHandler for IngestionHandler {
    async fn handle(&self, event: &SerializedEvent) -> Result<(), HandlerError> {
        match self.ingestor.ingest(event).await? {
            IngestOutcome::Created => {
                tracing::info!(topic = %event.topic, "Mirrored new record");
            },
            IngestOutcome::Duplicate => {
                tracing::debug!(topic = %event.topic, "Record already mirrored");
            },
            IngestOutcome::Ignored => {},
        }
        Ok(())
    }
}
