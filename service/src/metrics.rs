//! Prometheus metrics for the invitations service.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `invitations_proposed_total`, `invitations_withdrawn_total`,
//!   `invitations_accepted_total` - successful engine operations
//! - `invitations_rejected_total{operation, reason}` - business-rule rejections
//! - `invitations_storage_errors_total{operation}` - infrastructure failures
//! - `collaborator_updates_published_total`, `collaborator_updates_failed_total`
//! - `events_ingested_total{topic, result}`, `events_malformed_total{topic}`
//! - `events_dropped_total{consumer}` - inbound events the consumer gave up on
//! - `consumer_reconnects_total{consumer}`
//! - `mirror_store_errors_total` - Postgres errors
//! - `http_errors_total{status, code}` - error responses

use metrics::describe_counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Register all metric descriptions.
///
/// Call once at startup, before any metrics are recorded.
pub fn register_metrics() {
    describe_counter!("invitations_proposed_total", "Invitations created");
    describe_counter!("invitations_withdrawn_total", "Invitations withdrawn or declined");
    describe_counter!("invitations_accepted_total", "Invitations accepted");
    describe_counter!(
        "invitations_rejected_total",
        "Invitation operations rejected by a precondition, by operation and reason"
    );
    describe_counter!(
        "invitations_storage_errors_total",
        "Invitation operations that failed in the mirror store, by operation"
    );

    describe_counter!(
        "collaborator_updates_published_total",
        "Collaborator updates published after an acceptance"
    );
    describe_counter!(
        "collaborator_updates_failed_total",
        "Collaborator updates that could not be published; the acceptance stays committed"
    );

    describe_counter!(
        "events_ingested_total",
        "Inbound events applied to the mirror, by topic and result"
    );
    describe_counter!(
        "events_malformed_total",
        "Inbound events whose payload did not decode, by topic"
    );
    describe_counter!(
        "events_dropped_total",
        "Inbound events dropped after a handler failure, by consumer"
    );
    describe_counter!(
        "consumer_reconnects_total",
        "Times a consumer resubscribed after its stream ended or subscribing failed"
    );

    describe_counter!("mirror_store_errors_total", "Mirror store operations that failed");
    describe_counter!("http_errors_total", "HTTP error responses, by status and code");

    tracing::info!("Metrics registered");
}

/// Install the Prometheus exporter on `addr` and register descriptions.
///
/// # Errors
///
/// Returns an error if a recorder is already installed or the listener cannot
/// be started.
pub fn install_exporter(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus exporter: {e}"))?;

    register_metrics();
    tracing::info!(%addr, "Prometheus metrics available at http://{addr}/metrics");
    Ok(())
}
