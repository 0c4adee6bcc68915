//! Process signals that stop the accept loop.

use std::future::Future;
use std::io;

use tracing::{error, warn};

/// Resolves on SIGINT (Ctrl-C) or, on unix, SIGTERM.
#[cfg(unix)]
pub async fn signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = wait_for(tokio::signal::ctrl_c()) => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            warn!(error = %e, "Cannot register SIGTERM handler");
            wait_for(tokio::signal::ctrl_c()).await;
        }
    }
}

#[cfg(not(unix))]
pub async fn signal() {
    wait_for(tokio::signal::ctrl_c()).await;
}

/// Waits for a signal listener to fire.
///
/// A listener that fails to install never resolves, so the server keeps
/// running instead of shutting down at once.
pub async fn wait_for<F>(listener: F)
where
    F: Future<Output = io::Result<()>>,
{
    if let Err(e) = listener.await {
        error!(error = %e, "Cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
