use tokio::fs::File;

use crate::http::request::{ALLOWED_METHODS, HttpVersion};

/// HTTP status codes produced by the server.
///
/// - `Ok` (200): File served, or OPTIONS answered
/// - `BadRequest` (400): Request target tried to leave the document root
/// - `NotFound` (404): Resolved file does not exist
/// - `MethodNotAllowed` (405): Method outside GET/POST/HEAD/OPTIONS
/// - `InternalServerError` (500): Path could not be resolved or opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
    /// 405 Method Not Allowed
    MethodNotAllowed,
    /// 500 Internal Server Error
    InternalServerError,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use webd::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
            StatusCode::InternalServerError => 500,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

/// Response payload.
#[derive(Debug)]
pub enum Body {
    /// In-memory bytes, used for error messages and empty bodies
    Bytes(Vec<u8>),
    /// An open file streamed to the client; `len` is what Content-Length
    /// announced
    File { file: File, len: u64 },
}

impl Body {
    pub fn len(&self) -> u64 {
        match self {
            Body::Bytes(bytes) => bytes.len() as u64,
            Body::File { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A complete HTTP response ready to be written to a client.
///
/// `Date` and `Connection` are not stored here; the writer adds them to
/// every response.
#[derive(Debug)]
pub struct Response {
    /// Version echoed from the request line
    pub version: HttpVersion,
    /// The HTTP status code
    pub status: StatusCode,
    /// Headers in the order they are written
    pub headers: Vec<(String, String)>,
    pub body: Body,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .version(request.version)
///     .header("Content-Type", "text/plain")
///     .body(b"hello".to_vec())
///     .build();
/// ```
pub struct ResponseBuilder {
    version: HttpVersion,
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Body,
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            version: HttpVersion::default(),
            status,
            headers: Vec::new(),
            body: Body::Bytes(Vec::new()),
        }
    }

    pub fn version(mut self, version: HttpVersion) -> Self {
        self.version = version;
        self
    }

    /// Adds or replaces a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&key)) {
            Some(entry) => entry.1 = value,
            None => self.headers.push((key, value)),
        }
        self
    }

    /// Sets an in-memory body.
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Body::Bytes(body);
        self
    }

    /// Sets a file body of `len` bytes.
    pub fn file(mut self, file: File, len: u64) -> Self {
        self.body = Body::File { file, len };
        self
    }

    /// Builds the final Response.
    ///
    /// Adds the Content-Length header from the body size if not already
    /// present.
    pub fn build(self) -> Response {
        let len = self.body.len();
        let has_length = self
            .headers
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case("Content-Length"));
        let builder = if has_length {
            self
        } else {
            self.header("Content-Length", len.to_string())
        };

        Response {
            version: builder.version,
            status: builder.status,
            headers: builder.headers,
            body: builder.body,
        }
    }
}

impl Response {
    /// Plain-text error response carrying `message` as its body.
    pub fn error(version: HttpVersion, status: StatusCode, message: &str) -> Self {
        let builder = ResponseBuilder::new(status)
            .version(version)
            .header("Content-Type", "text/plain");
        let builder = if status == StatusCode::MethodNotAllowed {
            builder.header("Allow", ALLOWED_METHODS)
        } else {
            builder
        };
        builder.body(message.as_bytes().to_vec()).build()
    }

    /// 200 answer to an OPTIONS request: an `Allow` header and no body.
    pub fn options(version: HttpVersion) -> Self {
        ResponseBuilder::new(StatusCode::Ok)
            .version(version)
            .header("Allow", ALLOWED_METHODS)
            .build()
    }

    /// 200 response streaming `file`.
    pub fn file(
        version: HttpVersion,
        file: File,
        len: u64,
        content_type: &str,
        encoding: Option<&str>,
    ) -> Self {
        let builder = ResponseBuilder::new(StatusCode::Ok)
            .version(version)
            .header("Content-Type", content_type)
            .header("Content-Length", len.to_string());
        let builder = match encoding {
            Some(encoding) => builder.header("Content-Encoding", encoding),
            None => builder,
        };
        builder.file(file, len).build()
    }

    /// Looks up a header value by case-insensitive name.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}
