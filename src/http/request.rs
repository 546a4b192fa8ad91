use std::fmt;

/// A parsed HTTP request line.
///
/// Only the request line is ever read: headers and bodies are ignored. A request
/// lives for exactly one exchange and is consumed by the write phase of the
/// connection that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: String,
    path: String,
    version: String,
}

impl Request {
    /// Builds a request, upper-casing the method. Path and version are kept verbatim.
    pub fn new(
        method: impl AsRef<str>,
        path: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            method: method.as_ref().to_uppercase(),
            path: path.into(),
            version: version.into(),
        }
    }

    /// The HTTP method, upper-cased (e.g. "GET")
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The request path exactly as sent (e.g. "/index.html")
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The protocol version token (typically "HTTP/1.1")
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.method, self.path, self.version)
    }
}
