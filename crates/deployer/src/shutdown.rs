//! Cancellation of a running deployment through process signals.

/// Resolves once the process receives SIGINT or SIGTERM.
///
/// If the handlers can't be installed the future never resolves and the run
/// can only end on its own.
#[cfg(unix)]
pub async fn signal_handler() {
    use tokio::signal::unix::{SignalKind, signal};

    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
        (Err(err), _) | (_, Err(err)) => {
            tracing::warn!(?err, "failed to install signal handlers");
            return std::future::pending().await;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => {
            tracing::info!("received SIGTERM signal, cancelling deployment");
        }
        _ = sigint.recv() => {
            tracing::info!("received SIGINT signal, cancelling deployment");
        }
    }
}

#[cfg(not(unix))]
pub async fn signal_handler() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(?err, "failed to install CTRL+C handler");
        return std::future::pending().await;
    }
    tracing::info!("received CTRL+C signal, cancelling deployment");
}
