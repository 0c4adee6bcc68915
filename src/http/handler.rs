use std::path::Path;

use tracing::warn;

use crate::http::compress;
use crate::http::mime::mime_type;
use crate::http::request::{Method, Request};
use crate::http::resolver::{PathResolver, ResolveError};
use crate::http::response::{Response, StatusCode};

/// Builds the response for a fully parsed request.
///
/// Every outcome is a well-formed response; filesystem errors become 4xx
/// or 5xx answers and compression problems fall back to identity.
/// Compressed bodies are staged under `temp_dir`.
pub async fn handle_request(
    request: &Request,
    resolver: &PathResolver,
    temp_dir: &Path,
) -> Response {
    let version = request.version;

    match request.method {
        Method::UNSUPPORTED => {
            return Response::error(
                version,
                StatusCode::MethodNotAllowed,
                "Method not allowed",
            );
        }
        Method::OPTIONS => return Response::options(version),
        Method::GET | Method::POST | Method::HEAD => {}
    }

    let path = match resolver.resolve(request.sys_path.as_deref()).await {
        Ok(path) => path,
        Err(e) => {
            if let ResolveError::Resolution(io) = &e {
                warn!(
                    path = %request.raw_path,
                    error = %io,
                    "Path resolution failed, OS error returned to client"
                );
            }
            return Response::error(version, e.status(), &e.to_string());
        }
    };

    match open_for_transfer(request, &path, temp_dir).await {
        Ok((file, len, encoding)) => {
            Response::file(version, file, len, mime_type(&path), encoding)
        }
        Err(e) => Response::error(version, StatusCode::InternalServerError, &e.to_string()),
    }
}

async fn open_for_transfer(
    request: &Request,
    path: &Path,
    temp_dir: &Path,
) -> std::io::Result<(tokio::fs::File, u64, Option<&'static str>)> {
    let file = tokio::fs::File::open(path).await?;
    let transformed =
        compress::negotiate(path, file, request.accepted_encodings, temp_dir).await?;
    // Measured after compression so the header matches what is sent.
    let len = transformed.file.metadata().await?.len();
    Ok((
        transformed.file,
        len,
        transformed.encoding.map(|e| e.as_str()),
    ))
}
