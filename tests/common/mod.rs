#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use webd::config::Config;
use webd::http::connection::{Connection, Signal};

static NEXT_DIR: AtomicU64 = AtomicU64::new(0);

/// A scratch directory under the system temp dir, removed on drop.
pub struct TestDir {
    path: PathBuf,
}

impl TestDir {
    pub fn new(label: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "webd-test-{}-{}-{}",
            label,
            std::process::id(),
            NEXT_DIR.fetch_add(1, Ordering::SeqCst)
        ));
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, rel: &str, contents: &[u8]) -> PathBuf {
        let path = self.path.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn mkdir(&self, rel: &str) -> PathBuf {
        let path = self.path.join(rel);
        std::fs::create_dir_all(&path).unwrap();
        path
    }
}

impl Drop for TestDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

pub fn config_for(root: &Path) -> Config {
    let mut cfg = Config::default();
    cfg.static_files.root = root.to_path_buf();
    cfg.server.linger_ms = 50;
    cfg
}

pub fn test_peer() -> SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

/// Sends `request` to a fresh connection worker and collects everything it
/// writes back before closing.
pub async fn exchange(cfg: &Config, request: &[u8]) -> (Signal, Vec<u8>) {
    let (mut client, server) = tokio::io::duplex(64 * 1024);
    let cfg = cfg.clone();
    let task = tokio::spawn(async move {
        let mut conn = Connection::new(server, test_peer(), &cfg);
        conn.run().await
    });

    client.write_all(request).await.unwrap();
    let mut response = Vec::new();
    client.read_to_end(&mut response).await.unwrap();
    drop(client);

    let signal = task.await.unwrap().unwrap();
    (signal, response)
}

/// Splits a raw response into its head (status line and headers) and body.
pub fn split_response(raw: &[u8]) -> (String, Vec<u8>) {
    let end = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response has no header terminator");
    let head = String::from_utf8(raw[..end].to_vec()).unwrap();
    (head, raw[end + 4..].to_vec())
}

pub fn status_line(head: &str) -> &str {
    head.lines().next().unwrap_or_default()
}

pub fn header<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines().skip(1).find_map(|line| {
        let (key, value) = line.split_once(": ")?;
        key.eq_ignore_ascii_case(name).then_some(value)
    })
}
