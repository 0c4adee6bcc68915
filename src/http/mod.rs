//! HTTP protocol implementation.
//!
//! This module implements the per-connection core of a static file server
//! speaking a subset of HTTP/1.x. Every connection carries exactly one
//! request and is closed after its response.
//!
//! # Architecture
//!
//! The HTTP layer is organized into several submodules:
//!
//! - **`connection`**: The connection worker driving the read → handle → close state machine
//! - **`line_buffer`**: Reassembles CRLF-terminated lines from socket bytes
//! - **`parser`**: Line-driven request parser
//! - **`request`**: HTTP request representation
//! - **`resolver`**: Maps request paths onto files under the document root
//! - **`compress`**: Optional deflate of the selected file
//! - **`handler`**: Turns a parsed request into a response
//! - **`response`**: HTTP response representation with builder pattern
//! - **`writer`**: Serializes and writes HTTP responses to the client
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Read bytes, feed complete lines to the parser
//!        └──────┬──────┘
//!               │ Blank line received
//!               ▼
//!        ┌──────────────────┐
//!        │    Handling      │ ← Resolve, compress, write the response
//!        └──────┬───────────┘
//!               │ Response sent / malformed request / peer hung up
//!               ▼
//!        ┌──────────────────┐
//!        │     Closed       │
//!        └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use webd::config::Config;
//! use webd::http::connection::Connection;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cfg = Config::default();
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!
//!     loop {
//!         let (socket, peer) = listener.accept().await?;
//!         let cfg = cfg.clone();
//!         tokio::spawn(async move {
//!             let mut conn = Connection::new(socket, peer, &cfg);
//!             if let Err(e) = conn.run().await {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

pub mod compress;
pub mod connection;
pub mod handler;
pub mod line_buffer;
pub mod mime;
pub mod parser;
pub mod request;
pub mod resolver;
pub mod response;
pub mod writer;
