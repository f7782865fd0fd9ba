//! Album invitations server.
//!
//! - Connects to `PostgreSQL` and runs migrations
//! - Connects to `RedPanda`
//! - Mirrors profiles and albums from the event bus
//! - Serves the invitation API until Ctrl+C or SIGTERM
//!
//! # Usage
//!
//! ```bash
//! docker compose up -d
//! cargo run --bin server
//! ```

use album_invitations::{Config, InvitationsApp, metrics};
use anyhow::Context;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,album_invitations=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting album invitations server...");

    let config = Config::from_env();
    tracing::info!(
        redpanda = %config.redpanda.brokers,
        http = %config.server.address(),
        "Configuration loaded"
    );

    let metrics_addr: SocketAddr = config
        .server
        .metrics_address()
        .parse()
        .context("invalid METRICS_HOST/METRICS_PORT")?;
    metrics::install_exporter(metrics_addr)?;

    let app = InvitationsApp::connect(config).await?.build().await?;
    app.run().await
}
