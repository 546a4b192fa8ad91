use std::io::{self, Write};

use bytes::{BufMut, Bytes, BytesMut};

use crate::http::response::Response;

const HTTP_VERSION: &str = "HTTP/1.1";
const HTML: &str = "text/html";
const HTML_TRAILER: &[u8] = b"\r\n\r\n\r\n";

/// Serializes a response: status line, one Content-Type header, blank line, body.
///
/// No Content-Length is emitted; the connection close marks the end of the body.
/// HTML bodies are followed by an extra "\r\n\r\n\r\n". Every other body is
/// written as raw bytes.
pub fn encode_response(resp: &Response) -> Bytes {
    let mut buf = BytesMut::with_capacity(64 + resp.content_type.len() + resp.body.len());

    // Status line
    buf.put_slice(HTTP_VERSION.as_bytes());
    buf.put_u8(b' ');
    buf.put_slice(resp.status.status_line().as_bytes());
    buf.put_slice(b"\r\n");

    buf.put_slice(b"Content-Type: ");
    buf.put_slice(resp.content_type.as_bytes());
    buf.put_slice(b"\r\n\r\n");

    buf.put_slice(&resp.body);
    if resp.content_type == HTML {
        buf.put_slice(HTML_TRAILER);
    }

    buf.freeze()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// Every byte has been handed to the transport
    Complete,
    /// The transport would block; wait for the next writable event
    Pending,
}

/// Tracks how much of an encoded response has reached a non-blocking socket.
#[derive(Debug)]
pub struct ResponseWriter {
    buffer: Bytes,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            buffer: encode_response(response),
            written: 0,
        }
    }

    /// Size of the encoded response in bytes.
    pub fn total(&self) -> usize {
        self.buffer.len()
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// Writes as much of the remaining response as the stream accepts.
    ///
    /// Stops at `WouldBlock` and returns `Pending`; a zero-length write means the
    /// peer is gone and is reported as `WriteZero`.
    pub fn write_to<W: Write>(&mut self, stream: &mut W) -> io::Result<WriteStatus> {
        while self.written < self.buffer.len() {
            match stream.write(&self.buffer[self.written..]) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "connection closed while writing",
                    ));
                }
                Ok(n) => self.written += n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    return Ok(WriteStatus::Pending);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }

        Ok(WriteStatus::Complete)
    }
}
