//! Maps request syspaths onto files under the document root.

use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};

use crate::config::StaticConfig;
use crate::http::response::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The request target contained a `..` segment.
    #[error("Illegal directory traversal in path")]
    Traversal,
    /// Canonicalization failed. The message is the OS error text and is
    /// sent to the client as-is.
    #[error("{0}")]
    Resolution(#[source] io::Error),
    #[error("File not found")]
    NotFound,
}

impl ResolveError {
    pub fn status(&self) -> StatusCode {
        match self {
            ResolveError::Traversal => StatusCode::BadRequest,
            ResolveError::Resolution(_) => StatusCode::InternalServerError,
            ResolveError::NotFound => StatusCode::NotFound,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    index_file: String,
}

impl PathResolver {
    pub fn new(root: impl Into<PathBuf>, index_file: impl Into<String>) -> Self {
        let root = root.into();
        Self {
            root: if root.as_os_str().is_empty() {
                PathBuf::from(".")
            } else {
                root
            },
            index_file: index_file.into(),
        }
    }

    pub fn from_config(cfg: &StaticConfig) -> Self {
        Self::new(cfg.root.clone(), cfg.index_file.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Root and syspath concatenated, before any filesystem access.
    ///
    /// A syspath that does not start with `/` gets one inserted so it can
    /// never extend the root directory's own name.
    pub fn candidate(&self, sys_path: &[u8]) -> PathBuf {
        let mut joined = OsString::from(self.root.as_os_str());
        if !sys_path.starts_with(b"/") {
            joined.push("/");
        }
        joined.push(&*os_str_from_bytes(sys_path));
        PathBuf::from(joined)
    }

    /// Resolves a syspath to the canonical path of the file to serve.
    ///
    /// Directories are rewritten to their index file. `None` means the
    /// parser already rejected the target.
    pub async fn resolve(&self, sys_path: Option<&[u8]>) -> Result<PathBuf, ResolveError> {
        let sys_path = sys_path.ok_or(ResolveError::Traversal)?;

        let mut path = tokio::fs::canonicalize(self.candidate(sys_path))
            .await
            .map_err(ResolveError::Resolution)?;

        let is_dir = tokio::fs::metadata(&path)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false);
        if is_dir {
            path.push(&self.index_file);
        }

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            _ => Err(ResolveError::NotFound),
        }
    }
}

/// Request bytes as a path component, untouched on unix.
#[cfg(unix)]
fn os_str_from_bytes(bytes: &[u8]) -> Cow<'_, OsStr> {
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn os_str_from_bytes(bytes: &[u8]) -> Cow<'_, OsStr> {
    match String::from_utf8_lossy(bytes) {
        Cow::Borrowed(s) => Cow::Borrowed(OsStr::new(s)),
        Cow::Owned(s) => Cow::Owned(s.into()),
    }
}
