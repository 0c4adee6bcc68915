use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::config::Config;
use crate::http::handler::handle_request;
use crate::http::line_buffer::LineBuffer;
use crate::http::parser::{ParserState, RequestParser};
use crate::http::request::Request;
use crate::http::resolver::PathResolver;
use crate::http::writer::ResponseWriter;

/// Bytes requested from the socket per read.
const READ_WINDOW: usize = 128;

/// How a connection ended. Either flag stops the read loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signal {
    /// A response was written and the connection closed.
    pub done: bool,
    /// The request line was malformed; nothing was written.
    pub err: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Reading,
    Handling,
    Closed,
}

/// One client connection, from first byte to close.
pub struct Connection<S> {
    stream: S,
    peer: SocketAddr,
    lines: LineBuffer,
    parser: RequestParser,
    resolver: PathResolver,
    temp_dir: PathBuf,
    linger_timeout: Duration,
    linger_bytes: usize,
    state: ConnectionState,
    signal: Signal,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, peer: SocketAddr, cfg: &Config) -> Self {
        Self {
            stream,
            peer,
            lines: LineBuffer::new(cfg.server.max_line_length),
            parser: RequestParser::new(),
            resolver: PathResolver::from_config(&cfg.static_files),
            temp_dir: cfg.static_files.temp_dir(),
            linger_timeout: cfg.server.linger_timeout(),
            linger_bytes: cfg.server.linger_bytes,
            state: ConnectionState::Reading,
            signal: Signal::default(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn request(&self) -> &Request {
        self.parser.request()
    }

    /// Drives the connection until it closes.
    ///
    /// A peer that hangs up early yields an empty signal, not an error.
    /// `Err` is reserved for socket and file I/O failures.
    pub async fn run(&mut self) -> anyhow::Result<Signal> {
        loop {
            match self.state {
                ConnectionState::Reading => self.read_lines().await?,
                ConnectionState::Handling => {
                    self.respond().await?;
                    self.signal.done = true;
                    self.state = ConnectionState::Closed;
                }
                ConnectionState::Closed => break,
            }
        }

        Ok(self.signal)
    }

    async fn read_lines(&mut self) -> anyhow::Result<()> {
        let mut window = [0u8; READ_WINDOW];
        let n = self.stream.read(&mut window).await?;

        if n == 0 {
            // Client closed connection
            debug!(peer = %self.peer, "Connection closed before request completed");
            self.state = ConnectionState::Closed;
            return Ok(());
        }

        for &byte in &window[..n] {
            let line = match self.lines.push(byte) {
                Ok(Some(line)) => line,
                Ok(None) => continue,
                Err(e) => {
                    debug!(peer = %self.peer, error = %e, "Dropping connection");
                    self.signal.err = true;
                    self.state = ConnectionState::Closed;
                    return Ok(());
                }
            };

            match self.parser.feed_line(&line) {
                Ok(ParserState::Complete) => {
                    // Whatever follows the head (a POST body) is never read here.
                    self.state = ConnectionState::Handling;
                    return Ok(());
                }
                Ok(_) => {}
                Err(e) => {
                    debug!(peer = %self.peer, error = %e, "Malformed request, closing");
                    self.signal.err = true;
                    self.state = ConnectionState::Closed;
                    return Ok(());
                }
            }
        }

        Ok(())
    }

    async fn respond(&mut self) -> anyhow::Result<()> {
        let request = self.parser.request();
        let response = handle_request(request, &self.resolver, &self.temp_dir).await;

        info!(
            peer = %self.peer,
            method = ?request.method,
            path = %request.raw_path,
            status = response.status.as_u16(),
            "Request served"
        );

        let mut writer = ResponseWriter::new(response, request.method.sends_body());
        writer.write_to_stream(&mut self.stream).await?;

        self.linger().await;
        Ok(())
    }

    /// Sends FIN, then discards input for a bounded time so unread request
    /// bytes do not turn the close into a reset.
    async fn linger(&mut self) {
        if let Err(e) = self.stream.shutdown().await {
            debug!(peer = %self.peer, error = %e, "Shutdown failed");
            return;
        }

        let limit = self.linger_bytes;
        let wait = self.linger_timeout;
        let stream = &mut self.stream;
        let mut drained = 0usize;
        let mut sink = [0u8; 1024];
        let drain = async {
            while drained < limit {
                match stream.read(&mut sink).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => drained += n,
                }
            }
        };
        let timed_out = tokio::time::timeout(wait, drain).await.is_err();

        debug!(peer = %self.peer, drained, timed_out, "Connection closed");
    }
}
