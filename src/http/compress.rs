//! On-the-fly deflate of response bodies.
//!
//! The selected file is compressed into an unlinked temporary file before
//! the response head is written, so Content-Length always describes the
//! bytes actually sent. Any failure falls back to the original file.

use std::fs::{self, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use flate2::{Compress, Compression, FlushCompress, Status};
use tokio::fs::File;
use tracing::{debug, warn};

use crate::http::request::AcceptedEncodings;

/// Size of both the input and the output buffer of the encoder.
pub const CHUNK_SIZE: usize = 64 * 1024;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    Deflate,
}

impl ContentEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentEncoding::Deflate => "deflate",
        }
    }
}

/// The file to send and the encoding applied to it, if any.
#[derive(Debug)]
pub struct Transformed {
    pub file: File,
    pub encoding: Option<ContentEncoding>,
}

enum Outcome {
    Compressed(fs::File),
    Fallback(fs::File, io::Error),
}

/// Applies deflate to `file` when the client accepts it, staging the
/// output under `temp_dir`.
///
/// `path` is only used to reopen the source if the blocking worker
/// panicked and took the handle with it. An `Err` means the original file
/// could not be restored.
pub async fn negotiate(
    path: &Path,
    file: File,
    accepted: AcceptedEncodings,
    temp_dir: &Path,
) -> io::Result<Transformed> {
    if !accepted.deflate {
        return Ok(Transformed {
            file,
            encoding: None,
        });
    }

    let source = file.into_std().await;
    let temp_dir = temp_dir.to_path_buf();
    let joined =
        tokio::task::spawn_blocking(move || deflate_or_rewind(source, &temp_dir)).await;

    match joined {
        Ok(Ok(Outcome::Compressed(compressed))) => Ok(Transformed {
            file: File::from_std(compressed),
            encoding: Some(ContentEncoding::Deflate),
        }),
        Ok(Ok(Outcome::Fallback(source, e))) => {
            debug!(error = %e, path = %path.display(), "Deflate failed, sending identity");
            Ok(Transformed {
                file: File::from_std(source),
                encoding: None,
            })
        }
        Ok(Err(e)) => Err(e),
        Err(e) => {
            warn!(error = %e, path = %path.display(), "Compression task failed");
            Ok(Transformed {
                file: File::open(path).await?,
                encoding: None,
            })
        }
    }
}

fn deflate_or_rewind(mut source: fs::File, temp_dir: &Path) -> io::Result<Outcome> {
    match deflate_to_temp(&mut source, temp_dir) {
        Ok(compressed) => Ok(Outcome::Compressed(compressed)),
        Err(e) => {
            source.seek(SeekFrom::Start(0))?;
            Ok(Outcome::Fallback(source, e))
        }
    }
}

/// Removes its path when dropped.
struct TempPath(PathBuf);

impl TempPath {
    fn new(dir: &Path) -> Self {
        let name = format!(
            "webd-{}-{}.deflate",
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        );
        Self(dir.join(name))
    }
}

impl Drop for TempPath {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.0);
    }
}

/// Compresses `source` into a fresh temporary file positioned at its start.
///
/// The file's directory entry is gone once this returns; on error the
/// partial output is discarded as well.
pub fn deflate_to_temp<R: Read>(source: &mut R, dir: &Path) -> io::Result<fs::File> {
    let temp = TempPath::new(dir);
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create_new(true)
        .open(&temp.0)?;

    deflate_stream(source, &mut file)?;
    file.seek(SeekFrom::Start(0))?;
    Ok(file)
}

/// Streams `src` through a zlib-wrapped deflate encoder into `dst` and
/// returns the number of compressed bytes written.
pub fn deflate_stream<R: Read, W: Write>(src: &mut R, dst: &mut W) -> io::Result<u64> {
    let mut encoder = Compress::new(Compression::default(), true);
    let mut input = vec![0u8; CHUNK_SIZE];
    let mut output = vec![0u8; CHUNK_SIZE];

    loop {
        let filled = read_chunk(src, &mut input)?;
        let finishing = filled == 0;
        let flush = if finishing {
            FlushCompress::Finish
        } else {
            FlushCompress::None
        };

        let mut consumed = 0;
        loop {
            let before_in = encoder.total_in();
            let before_out = encoder.total_out();
            let status = encoder
                .compress(&input[consumed..filled], &mut output, flush)
                .map_err(io::Error::other)?;
            let read = (encoder.total_in() - before_in) as usize;
            let produced = (encoder.total_out() - before_out) as usize;
            consumed += read;
            dst.write_all(&output[..produced])?;

            if matches!(status, Status::StreamEnd) {
                dst.flush()?;
                return Ok(encoder.total_out());
            }
            // Output may outgrow input, so drain until the buffer comes back short.
            if !finishing && produced < output.len() && consumed == filled {
                break;
            }
            if read == 0 && produced == 0 && matches!(status, Status::BufError) {
                return Err(io::Error::other("deflate encoder made no progress"));
            }
        }
    }
}

fn read_chunk<R: Read>(src: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match src.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
