//! Application lifecycle and graceful shutdown.
//!
//! 1. **Startup**: spawn the event consumers
//! 2. **Runtime**: serve HTTP and process events
//! 3. **Shutdown**: on Ctrl+C or SIGTERM stop accepting connections, signal
//!    the consumers, and wait for them up to the configured timeout

use crate::runtime::EventConsumer;
use std::future::Future;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// A fully wired application, ready to run.
pub struct Application {
    /// TCP listener for HTTP server
    listener: tokio::net::TcpListener,

    /// Axum router with all HTTP routes
    app: axum::Router,

    /// Background event consumers
    consumers: Vec<EventConsumer>,

    /// Shutdown signal broadcaster
    shutdown_tx: broadcast::Sender<()>,

    /// How long each consumer gets to stop
    shutdown_timeout: Duration,
}

impl Application {
    /// Create a new application instance.
    #[must_use]
    pub const fn new(
        listener: tokio::net::TcpListener,
        app: axum::Router,
        consumers: Vec<EventConsumer>,
        shutdown_tx: broadcast::Sender<()>,
        shutdown_timeout: Duration,
    ) -> Self {
        Self {
            listener,
            app,
            consumers,
            shutdown_tx,
            shutdown_timeout,
        }
    }

    /// Address the HTTP listener is bound to.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be read.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Run until Ctrl+C or SIGTERM, then shut down gracefully.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP server fails.
    pub async fn run(self) -> anyhow::Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Run until `signal` resolves, then shut down gracefully.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP server fails.
    pub async fn run_until(self, signal: impl Future<Output = ()> + Send + 'static) -> anyhow::Result<()> {
        let address = self.listener.local_addr()?;
        info!(%address, "Starting HTTP server");

        info!(consumer_count = self.consumers.len(), "Starting event consumers");
        let consumer_handles: Vec<_> = self
            .consumers
            .into_iter()
            .map(|consumer| {
                let name = consumer.name().to_string();
                (name, consumer.spawn())
            })
            .collect();

        let served = axum::serve(self.listener, self.app)
            .with_graceful_shutdown(signal)
            .await;

        finish(served, &self.shutdown_tx, consumer_handles, self.shutdown_timeout).await
    }
}

/// Stop the consumers whether or not the server exited cleanly, then report
/// the server's result.
async fn finish(
    served: std::io::Result<()>,
    shutdown_tx: &broadcast::Sender<()>,
    handles: Vec<(String, tokio::task::JoinHandle<()>)>,
    timeout: Duration,
) -> anyhow::Result<()> {
    match &served {
        Ok(()) => info!("HTTP server stopped, initiating graceful shutdown..."),
        Err(e) => error!(error = %e, "HTTP server failed, stopping consumers"),
    }

    // Receivers may already be gone if a consumer task ended early.
    let _ = shutdown_tx.send(());
    await_shutdown(handles, timeout).await;

    served?;
    info!("Graceful shutdown complete");
    Ok(())
}

async fn await_shutdown(handles: Vec<(String, tokio::task::JoinHandle<()>)>, timeout: Duration) {
    for (name, handle) in handles {
        match tokio::time::timeout(timeout, handle).await {
            Ok(Ok(())) => info!(consumer = %name, "Consumer stopped gracefully"),
            Ok(Err(e)) => warn!(consumer = %name, error = %e, "Consumer task failed"),
            Err(_) => warn!(consumer = %name, "Consumer shutdown timed out"),
        }
    }
}

/// Resolves on SIGINT (Ctrl+C) or SIGTERM.
///
/// If a handler cannot be installed it is logged and that signal is ignored.
pub async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        () = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
