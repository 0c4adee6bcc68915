use std::sync::Arc;

use webd::config::Config;
use webd::server::{ConnectionRegistry, listener, shutdown};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Arc::new(Config::load()?);
    tracing::info!(
        root = %cfg.static_files.root.display(),
        index = %cfg.static_files.index_file,
        "Serving files"
    );

    let registry = ConnectionRegistry::new(Arc::clone(&cfg));
    let addr = cfg.listen_addr();

    let result = tokio::select! {
        res = listener::bind_and_run(&addr, Arc::clone(&registry)) => res,

        _ = shutdown::signal() => {
            tracing::info!("Shutdown signal received");
            Ok(())
        }
    };

    let closed = registry.teardown().await;
    tracing::info!(connections = closed, "Shutdown complete");

    result
}
