use std::fmt;

/// HTTP request methods.
///
/// The server serves GET, POST and HEAD from the filesystem and answers
/// OPTIONS itself. Every other token parses as `UNSUPPORTED` and is
/// answered with 405 Method Not Allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// POST - Served exactly like GET; the request body is never read
    POST,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// OPTIONS - Describe communication options
    OPTIONS,
    /// Any other method token
    UNSUPPORTED,
}

/// Value of the `Allow` header sent with OPTIONS and 405 responses.
pub const ALLOWED_METHODS: &str = "GET, POST, HEAD, OPTIONS";

impl Method {
    /// Parses an HTTP method token.
    ///
    /// Matching is case-sensitive. Unknown tokens are not an error, they
    /// map to [`Method::UNSUPPORTED`].
    ///
    /// # Example
    ///
    /// ```
    /// # use webd::http::request::Method;
    /// assert_eq!(Method::from_bytes(b"GET"), Method::GET);
    /// assert_eq!(Method::from_bytes(b"get"), Method::UNSUPPORTED);
    /// ```
    pub fn from_bytes(token: &[u8]) -> Self {
        match token {
            b"GET" => Method::GET,
            b"POST" => Method::POST,
            b"HEAD" => Method::HEAD,
            b"OPTIONS" => Method::OPTIONS,
            _ => Method::UNSUPPORTED,
        }
    }

    /// Whether the response to this method carries a body.
    pub fn sends_body(&self) -> bool {
        !matches!(self, Method::HEAD | Method::OPTIONS)
    }
}

/// Protocol version as declared on the request line, echoed back verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpVersion {
    pub major: u8,
    pub minor: u8,
}

impl HttpVersion {
    pub const HTTP_1_0: HttpVersion = HttpVersion { major: 1, minor: 0 };
    pub const HTTP_1_1: HttpVersion = HttpVersion { major: 1, minor: 1 };

    pub fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

impl Default for HttpVersion {
    fn default() -> Self {
        Self::HTTP_1_1
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP/{}.{}", self.major, self.minor)
    }
}

/// Encodings the client listed in `Accept-Encoding`.
///
/// Only `deflate` is ever produced; `gzip` is recorded for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcceptedEncodings {
    pub gzip: bool,
    pub deflate: bool,
}

impl AcceptedEncodings {
    /// Scans a header value for the literal tokens `gzip` and `deflate`.
    pub fn scan(value: &[u8]) -> Self {
        Self {
            gzip: contains(value, b"gzip"),
            deflate: contains(value, b"deflate"),
        }
    }

    pub fn merge(&mut self, other: AcceptedEncodings) {
        self.gzip |= other.gzip;
        self.deflate |= other.deflate;
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// A request as assembled by the parser, one per connection.
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// The HTTP method
    pub method: Method,
    /// The percent-decoded request target, query string included
    pub raw_path: String,
    /// Root-relative filesystem path as raw decoded bytes, query string
    /// removed; `None` when the target tried to climb out of the document
    /// root
    pub sys_path: Option<Vec<u8>>,
    /// Version from the request line
    pub version: HttpVersion,
    pub accepted_encodings: AcceptedEncodings,
    /// Complete lines consumed so far, request line included
    pub lines_received: usize,
}

impl Default for Method {
    fn default() -> Self {
        Method::UNSUPPORTED
    }
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wants_deflate(&self) -> bool {
        self.accepted_encodings.deflate
    }
}
