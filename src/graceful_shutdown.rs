//! Graceful shutdown

use tokio::signal;

/// Wait for a shutdown signal
///
/// Listens to Ctrl+C, and to SIGTERM on unix, so in-flight requests can finish
pub async fn handler() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("Valid CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Valid terminate handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal = tokio::select! {
        () = ctrl_c => "Ctrl+C",
        () = terminate => "terminate",
    };

    tracing::info!("{signal} signal received, finishing open requests before shutting down");
}
