//! Process-wide registry of live connections.
//!
//! Registration and teardown take the same lock, so a connection accepted
//! while shutdown is in progress is refused instead of leaking past it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::http::connection::Connection;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("registry is shutting down")]
    ShuttingDown,
}

/// Registry entry for one connection.
#[derive(Debug)]
pub struct ConnectionHandle {
    pub id: u64,
    pub peer: SocketAddr,
    running: Arc<AtomicBool>,
    closer: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ConnectionHandle {
    /// Closes the connection's socket if its worker is still running, then
    /// waits for the worker to exit.
    async fn kill(mut self) {
        if self.running.swap(false, Ordering::AcqRel) {
            if let Some(closer) = self.closer.take() {
                let _ = closer.send(());
            }
        }
        if let Err(e) = self.task.await {
            warn!(id = self.id, peer = %self.peer, error = %e, "Connection worker did not exit cleanly");
        }
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    handles: Vec<ConnectionHandle>,
    closed: bool,
}

#[derive(Debug)]
pub struct ConnectionRegistry {
    inner: Mutex<RegistryInner>,
    next_id: AtomicU64,
    config: Arc<Config>,
}

impl ConnectionRegistry {
    pub fn new(config: Arc<Config>) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(RegistryInner::default()),
            next_id: AtomicU64::new(1),
            config,
        })
    }

    /// Records the connection and spawns its worker.
    ///
    /// After [`ConnectionRegistry::teardown`] has started, the stream is
    /// dropped (closing it) and `ShuttingDown` is returned.
    pub async fn register<S>(
        self: &Arc<Self>,
        stream: S,
        peer: SocketAddr,
    ) -> Result<u64, RegistryError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            warn!(peer = %peer, "Refusing connection during shutdown");
            return Err(RegistryError::ShuttingDown);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let running = Arc::new(AtomicBool::new(true));
        let (closer, closed) = oneshot::channel();

        // The lock is held until the handle is stored, so the worker's
        // deregistration can never run ahead of it.
        let task = tokio::spawn(worker(
            Arc::clone(self),
            id,
            stream,
            peer,
            Arc::clone(&running),
            closed,
        ));

        inner.handles.push(ConnectionHandle {
            id,
            peer,
            running,
            closer: Some(closer),
            task,
        });

        Ok(id)
    }

    /// Closes every live connection and joins every worker.
    ///
    /// Only the first call does any work; later calls return 0. Returns the
    /// number of connections torn down.
    pub async fn teardown(&self) -> usize {
        let handles = {
            let mut inner = self.inner.lock().await;
            if inner.closed {
                return 0;
            }
            inner.closed = true;
            std::mem::take(&mut inner.handles)
        };

        let count = handles.len();
        info!(connections = count, "Closing live connections");
        for handle in handles.into_iter().rev() {
            handle.kill().await;
        }
        count
    }

    /// Number of connections whose worker has not yet deregistered.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.handles.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.closed
    }

    /// Drops the handle for `id` if teardown has not already claimed it.
    async fn deregister(&self, id: u64) {
        let mut inner = self.inner.lock().await;
        if let Some(pos) = inner.handles.iter().position(|h| h.id == id) {
            inner.handles.swap_remove(pos);
        }
    }
}

async fn worker<S>(
    registry: Arc<ConnectionRegistry>,
    id: u64,
    stream: S,
    peer: SocketAddr,
    running: Arc<AtomicBool>,
    closed: oneshot::Receiver<()>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let mut conn = Connection::new(stream, peer, &registry.config);

    tokio::select! {
        res = conn.run() => match res {
            Ok(signal) => debug!(id, peer = %peer, ?signal, "Connection finished"),
            Err(e) => {
                if running.load(Ordering::Acquire) {
                    error!(id, peer = %peer, error = %e, "Connection error");
                }
            }
        },
        Ok(()) = closed => {
            debug!(id, peer = %peer, "Connection closed by shutdown");
        }
    }

    // Socket, line buffer and request are released here.
    drop(conn);
    running.store(false, Ordering::Release);
    registry.deregister(id).await;
}
