use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::server::registry::ConnectionRegistry;

/// Accepts connections forever, handing each one to the registry.
pub async fn run(listener: TcpListener, registry: Arc<ConnectionRegistry>) -> anyhow::Result<()> {
    info!("Listening on {}", listener.local_addr()?);

    loop {
        let (socket, peer) = listener.accept().await?;
        info!("Accepted connection from {}", peer);

        if registry.register(socket, peer).await.is_err() {
            return Ok(());
        }
    }
}

/// Binds the configured address and runs the accept loop.
pub async fn bind_and_run(addr: &str, registry: Arc<ConnectionRegistry>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    run(listener, registry).await
}
