//! Shutdown fan-out from the process signal to every subsystem.

use std::future::Future;

use tokio::sync::broadcast;

/// Wait for `signal` and broadcast shutdown once it fires.
///
/// If the signal handler could not be installed nothing is sent, so the
/// sampler and HTTP server keep running.
pub async fn forward_signal<F>(signal: F, shutdown_tx: broadcast::Sender<()>)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            tracing::info!("Shutdown signal received");
            let _ = shutdown_tx.send(());
        }
        Err(e) => tracing::error!("Failed to listen for Ctrl+C: {}", e),
    }
}
