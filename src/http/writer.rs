use std::time::SystemTime;

use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::http::response::{Body, Response};

/// Size of each read from a file body.
const BUFFER_SIZE: usize = 8192;

fn serialize_head(resp: &Response, date: SystemTime) -> Vec<u8> {
    let mut buf = Vec::new();

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        resp.version,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    write_header(&mut buf, "Date", &httpdate::fmt_http_date(date));
    write_header(&mut buf, "Connection", "close");
    for (k, v) in &resp.headers {
        write_header(&mut buf, k, v);
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf
}

fn write_header(buf: &mut Vec<u8>, key: &str, value: &str) {
    buf.extend_from_slice(key.as_bytes());
    buf.extend_from_slice(b": ");
    buf.extend_from_slice(value.as_bytes());
    buf.extend_from_slice(b"\r\n");
}

/// Writes one response: the head, then the body unless suppressed.
pub struct ResponseWriter {
    head: Vec<u8>,
    body: Option<Body>,
    written: u64,
}

impl ResponseWriter {
    /// `send_body` is false for HEAD and OPTIONS; headers still report the
    /// real length.
    pub fn new(response: Response, send_body: bool) -> Self {
        Self::with_date(response, send_body, SystemTime::now())
    }

    pub fn with_date(response: Response, send_body: bool, date: SystemTime) -> Self {
        let head = serialize_head(&response, date);
        Self {
            head,
            body: send_body.then_some(response.body),
            written: 0,
        }
    }

    /// Head bytes as they will go on the wire.
    pub fn head(&self) -> &[u8] {
        &self.head
    }

    /// Writes the response and returns the number of body bytes sent.
    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> anyhow::Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        stream.write_all(&self.head).await?;

        match self.body.take() {
            None => {}
            Some(Body::Bytes(bytes)) => {
                stream.write_all(&bytes).await?;
                self.written += bytes.len() as u64;
            }
            Some(Body::File { mut file, len }) => {
                let mut chunk = vec![0u8; BUFFER_SIZE];
                while self.written < len {
                    let want = (len - self.written).min(BUFFER_SIZE as u64) as usize;
                    let n = file.read(&mut chunk[..want]).await?;
                    if n == 0 {
                        return Err(anyhow::anyhow!(
                            "file ended after {} of {} bytes",
                            self.written,
                            len
                        ));
                    }
                    stream.write_all(&chunk[..n]).await?;
                    self.written += n as u64;
                }
            }
        }

        stream.flush().await?;
        Ok(self.written)
    }
}
