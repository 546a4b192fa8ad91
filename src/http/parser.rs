use thiserror::Error;

use crate::http::request::Request;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty request")]
    Empty,
    #[error("malformed request line: expected method, path and version, got {0} token(s)")]
    MissingTokens(usize),
}

/// Parses the request line out of the bytes read from a connection.
///
/// The bytes are decoded lossily and split on whitespace; the first three tokens
/// are method, path and version. Anything after them (headers, body) is ignored.
pub fn parse_request_line(buf: &[u8]) -> Result<Request, ParseError> {
    let text = String::from_utf8_lossy(buf);
    let mut tokens = text.split_whitespace();

    let method = tokens.next().ok_or(ParseError::Empty)?;
    let path = tokens.next().ok_or(ParseError::MissingTokens(1))?;
    let version = tokens.next().ok_or(ParseError::MissingTokens(2))?;

    Ok(Request::new(method, path, version))
}

/// Returns true once `buf` holds a line terminator, i.e. a full request line.
pub fn has_complete_line(buf: &[u8]) -> bool {
    buf.contains(&b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let req = parse_request_line(b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n").unwrap();

        assert_eq!(req.method(), "GET");
        assert_eq!(req.path(), "/");
        assert_eq!(req.version(), "HTTP/1.1");
    }

    #[test]
    fn detects_line_terminator() {
        assert!(!has_complete_line(b"GET / HTTP/1.1"));
        assert!(has_complete_line(b"GET / HTTP/1.1\r\n"));
    }
}
