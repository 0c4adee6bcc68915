use bytes::{Bytes, BytesMut};

/// Capacity added each time the buffer runs out of room.
pub const GROW_STEP: usize = 256;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("line exceeds {limit} bytes without a CRLF terminator")]
pub struct LineTooLong {
    pub limit: usize,
}

/// Reassembles CRLF-terminated lines from a byte stream fed one byte at a
/// time.
#[derive(Debug)]
pub struct LineBuffer {
    buf: BytesMut,
    max_len: usize,
}

impl LineBuffer {
    pub fn new(max_len: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            max_len,
        }
    }

    /// Appends one byte. Returns the finished line, terminator included,
    /// once the byte completes a `\r\n` pair.
    pub fn push(&mut self, byte: u8) -> Result<Option<Bytes>, LineTooLong> {
        if self.buf.len() >= self.max_len {
            return Err(LineTooLong { limit: self.max_len });
        }
        if self.buf.len() == self.buf.capacity() {
            self.buf.reserve(GROW_STEP);
        }
        self.buf.extend_from_slice(&[byte]);

        if byte == b'\n' && self.buf.len() >= 2 && self.buf[self.buf.len() - 2] == b'\r' {
            return Ok(Some(self.buf.split().freeze()));
        }
        Ok(None)
    }

    /// Bytes of the line currently being assembled.
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }
}
