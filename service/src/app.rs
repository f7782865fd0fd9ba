//! Wiring: store, bus, engine, consumers and HTTP server.
//!
//! Everything is constructed here and passed down by `Arc`; nothing lives in
//! globals.

use crate::config::Config;
use crate::runtime::{Application, EventConsumer, IngestionHandler};
use album_invitations_core::{ChangePublisher, EventBus, EventIngestor, InvitationEngine, MirrorStore};
use album_invitations_postgres::PostgresMirrorStore;
use album_invitations_redpanda::RedpandaEventBus;
use album_invitations_web::{AppState, StaticTokenVerifier, build_router};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// The invitations service before it starts running.
pub struct InvitationsApp {
    config: Config,
    store: Arc<dyn MirrorStore>,
    bus: Arc<dyn EventBus>,
}

impl InvitationsApp {
    /// Connect to Postgres (running migrations) and Redpanda.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable, migrations fail, or
    /// the Kafka clients cannot be created.
    pub async fn connect(config: Config) -> anyhow::Result<Self> {
        let store = PostgresMirrorStore::connect(&config.postgres.url, &config.postgres.pool_settings())
            .await
            .context("failed to connect to PostgreSQL")?;
        store.migrate().await.context("failed to run migrations")?;
        tracing::info!("Mirror store ready");

        let bus = RedpandaEventBus::builder()
            .brokers(config.redpanda.brokers.clone())
            .consumer_group(config.redpanda.consumer_group.clone())
            .auto_offset_reset(config.redpanda.auto_offset_reset.clone())
            .build()
            .context("failed to create Redpanda event bus")?;
        tracing::info!(brokers = %config.redpanda.brokers, "Event bus ready");

        Ok(Self::with_components(config, Arc::new(store), Arc::new(bus)))
    }

    /// Use already constructed store and bus.
    #[must_use]
    pub fn with_components(config: Config, store: Arc<dyn MirrorStore>, bus: Arc<dyn EventBus>) -> Self {
        Self { config, store, bus }
    }

    /// Engine publishing to the configured collaborators topic.
    #[must_use]
    pub fn engine(&self) -> InvitationEngine {
        let publisher = ChangePublisher::with_topic(
            self.bus.clone(),
            self.config.redpanda.collaborators_topic.clone(),
        );
        InvitationEngine::new(self.store.clone(), publisher)
    }

    /// Ingestor reading the configured profile and album topics.
    #[must_use]
    pub fn ingestor(&self) -> EventIngestor {
        EventIngestor::with_topics(
            self.store.clone(),
            self.config.redpanda.profile_topic.clone(),
            self.config.redpanda.album_topic.clone(),
        )
    }

    /// HTTP router with the static token table from `AUTH_TOKENS`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token table does not parse.
    pub fn router(&self) -> anyhow::Result<axum::Router> {
        let verifier = StaticTokenVerifier::parse(&self.config.auth.tokens)?;
        if verifier.is_empty() {
            tracing::warn!("AUTH_TOKENS is empty; every API request will be rejected");
        }
        Ok(build_router(AppState::new(self.engine(), Arc::new(verifier))))
    }

    /// Bind the HTTP listener and assemble the consumers.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound or the token table
    /// does not parse.
    pub async fn build(self) -> anyhow::Result<Application> {
        let router = self.router()?;
        let address = self.config.server.address();
        let listener = tokio::net::TcpListener::bind(&address)
            .await
            .with_context(|| format!("failed to bind {address}"))?;

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handler = IngestionHandler::new(self.ingestor());
        let consumer = EventConsumer::builder()
            .name("mirror")
            .topics(handler.topics())
            .event_bus(self.bus.clone())
            .handler(Arc::new(handler))
            .shutdown(shutdown_rx)
            .build()?;

        Ok(Application::new(
            listener,
            router,
            vec![consumer],
            shutdown_tx,
            Duration::from_secs(self.config.server.shutdown_timeout),
        ))
    }
}
