use crate::http::request::{AcceptedEncodings, HttpVersion, Method, Request};

const ACCEPT_ENCODING: &[u8] = b"Accept-Encoding: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("request line has no method token")]
    MissingMethod,
    #[error("request line has no request target")]
    MissingPath,
    #[error("request line does not end in HTTP/<major>.<minor>")]
    InvalidVersion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    AwaitRequestLine,
    AwaitHeaderOrBlank,
    Complete,
    Failed(ParseError),
}

/// Line-driven request parser.
///
/// Each call to [`RequestParser::feed_line`] takes one complete line,
/// terminator included. The first line is the request line, every later
/// line is a header until a bare CRLF completes the request.
#[derive(Debug)]
pub struct RequestParser {
    state: ParserState,
    request: Request,
}

impl RequestParser {
    pub fn new() -> Self {
        Self {
            state: ParserState::AwaitRequestLine,
            request: Request::new(),
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn into_request(self) -> Request {
        self.request
    }

    /// Consumes one line and returns the state it left the parser in.
    ///
    /// Lines fed after the request completed are ignored. Once failed, the
    /// parser keeps returning the original error.
    pub fn feed_line(&mut self, line: &[u8]) -> Result<ParserState, ParseError> {
        self.state = match self.state {
            ParserState::Complete => return Ok(ParserState::Complete),
            ParserState::Failed(e) => return Err(e),
            ParserState::AwaitRequestLine => {
                self.request.lines_received += 1;
                match parse_request_line(line, &mut self.request) {
                    Ok(()) => ParserState::AwaitHeaderOrBlank,
                    Err(e) => ParserState::Failed(e),
                }
            }
            ParserState::AwaitHeaderOrBlank => {
                self.request.lines_received += 1;
                if line == b"\r\n" {
                    ParserState::Complete
                } else {
                    if let Some(value) = line.strip_prefix(ACCEPT_ENCODING) {
                        self.request
                            .accepted_encodings
                            .merge(AcceptedEncodings::scan(value));
                    }
                    ParserState::AwaitHeaderOrBlank
                }
            }
        };

        match self.state {
            ParserState::Failed(e) => Err(e),
            state => Ok(state),
        }
    }
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses `<METHOD> <target> HTTP/<major>.<minor>\r\n` into `request`.
///
/// The target is percent-decoded and its syspath computed here, once.
pub fn parse_request_line(line: &[u8], request: &mut Request) -> Result<(), ParseError> {
    let line = line.strip_suffix(b"\r\n").unwrap_or(line);

    let space = find(line, b' ').ok_or(ParseError::MissingMethod)?;
    let (method, rest) = (&line[..space], &line[space + 1..]);

    let space = find(rest, b' ').ok_or(ParseError::MissingPath)?;
    let (target, rest) = (&rest[..space], &rest[space + 1..]);

    let version = parse_version(rest).ok_or(ParseError::InvalidVersion)?;

    request.method = Method::from_bytes(method);
    request.raw_path = String::from_utf8_lossy(&percent_decode(target)).into_owned();
    request.sys_path = sys_path(target);
    request.version = version;
    Ok(())
}

/// Replaces each `%XX` triplet with the byte it encodes.
///
/// A `%` whose two following bytes do not both lie inside the token, or
/// are not both hex digits, is copied through unchanged.
pub fn percent_decode(token: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(token.len());
    let mut i = 0;
    while i < token.len() {
        let byte = token[i];
        if byte == b'%' && i + 2 < token.len() {
            if let (Some(hi), Some(lo)) = (hex_value(token[i + 1]), hex_value(token[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(byte);
        i += 1;
    }
    out
}

/// Filesystem-relative path for a raw request target.
///
/// The query string is cut at the first literal `?` before decoding, so an
/// encoded `%3F` stays part of the name. The result is kept as bytes; any
/// `..` segment rejects the whole path.
pub fn sys_path(target: &[u8]) -> Option<Vec<u8>> {
    let path = match find(target, b'?') {
        Some(query) => &target[..query],
        None => target,
    };
    let decoded = percent_decode(path);
    if has_parent_segment(&decoded) {
        None
    } else {
        Some(decoded)
    }
}

/// True when some `/`-delimited segment of `path` is exactly `..`.
pub fn has_parent_segment(path: &[u8]) -> bool {
    path.split(|&b| b == b'/').any(|segment| segment == b"..")
}

fn parse_version(rest: &[u8]) -> Option<HttpVersion> {
    let digits = rest.strip_prefix(b"HTTP/")?;
    let dot = find(digits, b'.')?;
    Some(HttpVersion::new(
        small_int(&digits[..dot])?,
        small_int(&digits[dot + 1..])?,
    ))
}

fn small_int(digits: &[u8]) -> Option<u8> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

fn hex_value(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|d| d as u8)
}

fn find(haystack: &[u8], needle: u8) -> Option<usize> {
    haystack.iter().position(|&b| b == needle)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_line_fills_request() {
        let mut request = Request::new();
        parse_request_line(b"GET /a%20b?x=1 HTTP/1.1\r\n", &mut request).unwrap();

        assert_eq!(request.method, Method::GET);
        assert_eq!(request.raw_path, "/a b?x=1");
        assert_eq!(request.sys_path.as_deref(), Some(&b"/a b"[..]));
        assert_eq!(request.version, HttpVersion::HTTP_1_1);
    }

    #[test]
    fn percent_at_token_end_is_kept() {
        assert_eq!(percent_decode(b"/a%41"), b"/aA");
        assert_eq!(percent_decode(b"/a%4"), b"/a%4");
        assert_eq!(percent_decode(b"/a%"), b"/a%");
        assert_eq!(percent_decode(b"/%zz"), b"/%zz");
    }
}
