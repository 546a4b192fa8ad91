/// Body sent when the requested resource does not exist.
pub const NOT_FOUND_BODY: &[u8] = b"<b>404 - Not found!</b>";

/// Content type of the not-found page.
pub const NOT_FOUND_CONTENT_TYPE: &str = "text/html";

/// HTTP status codes the server produces.
///
/// Only two outcomes exist: the file was found, or it was not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 404 Not Found
    NotFound,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use reactor_http::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::NotFound => 404,
        }
    }

    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::NotFound => "Not Found",
        }
    }

    /// The status as it appears after the protocol version, e.g. "404 Not Found".
    pub fn status_line(&self) -> String {
        format!("{} {}", self.as_u16(), self.reason_phrase())
    }
}

/// A resolved response, ready to be encoded onto the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// Value of the single Content-Type header
    pub content_type: String,
    /// Response body as bytes
    pub body: Vec<u8>,
}

impl Response {
    /// Creates a 200 OK response carrying a file's bytes.
    pub fn ok(content_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: StatusCode::Ok,
            content_type: content_type.into(),
            body: body.into(),
        }
    }

    /// Creates the fixed 404 Not Found response.
    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NotFound,
            content_type: NOT_FOUND_CONTENT_TYPE.to_string(),
            body: NOT_FOUND_BODY.to_vec(),
        }
    }
}
