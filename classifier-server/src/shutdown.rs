//! Graceful shutdown on Ctrl+C or SIGTERM.

use tokio::signal;
use tracing::{info, warn};

/// Resolves once the process is asked to stop.
///
/// In-flight requests are allowed to finish; axum stops accepting new
/// connections as soon as this returns.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use signal::unix::{signal as unix_signal, SignalKind};

        match unix_signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = ctrl_c() => {}
                    _ = terminate.recv() => info!("Received SIGTERM, draining requests"),
                }
            }
            Err(e) => {
                warn!("SIGTERM handler unavailable ({}), listening for Ctrl+C only", e);
                ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c().await;
}

async fn ctrl_c() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Ctrl+C handler unavailable: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, draining requests");
}
