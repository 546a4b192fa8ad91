use std::io::{self, Read};
use std::net::{Shutdown, SocketAddr};

use anyhow::Context;
use bytes::BytesMut;
use mio::event::Event;
use mio::net::TcpStream;
use mio::{Interest, Registry, Token};

use crate::files::StaticResolver;
use crate::http::parser::{has_complete_line, parse_request_line};
use crate::http::request::Request;
use crate::http::writer::{ResponseWriter, WriteStatus};

/// Upper bound on the bytes buffered while waiting for a request line.
pub const READ_BUFFER_SIZE: usize = 8192;

const DISCARD_ROUNDS: usize = 64;

/// One accepted socket as the reactor sees it.
///
/// The connection owns its stream, the bytes read so far and, once a request line
/// has been parsed, the request itself. Nothing is shared between connections.
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    token: Token,
    buffer: BytesMut,
    state: ConnectionState,
}

#[derive(Debug)]
pub enum ConnectionState {
    /// Accepted but not yet registered with the selector
    Accepted,
    /// Registered for readable events, waiting for a request line
    AwaitingRead,
    /// Request parsed and attached; registered for writable events
    AwaitingWrite(Request),
    /// Response encoded, part of it still waiting for socket buffer space
    Flushing(ResponseWriter),
    /// Terminal: deregistered and shut down
    Closed,
}

/// What the reactor should do with a connection after an event was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Keep the registration and wait for the next event
    Open,
    /// The exchange is over; cancel the registration and close the socket
    Done,
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr, token: Token) -> Self {
        Self {
            stream,
            peer,
            token,
            buffer: BytesMut::with_capacity(READ_BUFFER_SIZE),
            state: ConnectionState::Accepted,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// The attached request, present only between a successful read and the write.
    pub fn request(&self) -> Option<&Request> {
        match &self.state {
            ConnectionState::AwaitingWrite(req) => Some(req),
            _ => None,
        }
    }

    pub fn interest(&self) -> Option<Interest> {
        match self.state {
            ConnectionState::Accepted | ConnectionState::AwaitingRead => Some(Interest::READABLE),
            ConnectionState::AwaitingWrite(_) | ConnectionState::Flushing(_) => {
                Some(Interest::WRITABLE)
            }
            ConnectionState::Closed => None,
        }
    }

    /// Whether `event` concerns what this connection is currently waiting for,
    /// as a (readable, writable) pair.
    ///
    /// Errors and hang-ups count as readiness so the next I/O call surfaces them.
    pub fn readiness(&self, event: &Event) -> (bool, bool) {
        let failed = event.is_error();
        match self.interest() {
            Some(i) if i.is_readable() => (
                event.is_readable() || event.is_read_closed() || failed,
                false,
            ),
            Some(i) if i.is_writable() => (
                false,
                event.is_writable() || event.is_write_closed() || failed,
            ),
            _ => (false, false),
        }
    }

    /// Registers the socket for readable events with no request attached.
    pub fn register(&mut self, registry: &Registry) -> io::Result<()> {
        registry.register(&mut self.stream, self.token, Interest::READABLE)?;
        self.state = ConnectionState::AwaitingRead;
        Ok(())
    }

    /// Reads until a full request line is buffered, the socket would block,
    /// or the peer closes; then parses it and switches to writable interest.
    pub fn on_readable(&mut self, registry: &Registry) -> anyhow::Result<Progress> {
        if !matches!(self.state, ConnectionState::AwaitingRead) {
            tracing::debug!(peer = %self.peer, state = ?self.state, "Ignoring readable event");
            return Ok(Progress::Open);
        }

        let mut chunk = [0u8; READ_BUFFER_SIZE];
        let mut eof = false;

        while self.buffer.len() < READ_BUFFER_SIZE && !has_complete_line(&self.buffer) {
            let room = READ_BUFFER_SIZE - self.buffer.len();
            match self.stream.read(&mut chunk[..room]) {
                Ok(0) => {
                    eof = true;
                    break;
                }
                Ok(n) => self.buffer.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e).context("failed to read from socket"),
            }
        }

        if eof && self.buffer.is_empty() {
            tracing::info!(peer = %self.peer, "Peer closed connection without a request");
            return Ok(Progress::Done);
        }

        let full = self.buffer.len() >= READ_BUFFER_SIZE;
        if !eof && !full && !has_complete_line(&self.buffer) {
            return Ok(Progress::Open);
        }
        if full && !has_complete_line(&self.buffer) {
            tracing::warn!(peer = %self.peer, "Request line exceeds read buffer, parsing what was read");
        }

        let request = parse_request_line(&self.buffer)
            .with_context(|| format!("malformed request from {}", self.peer))?;
        self.buffer.clear();

        tracing::info!(
            peer = %self.peer,
            method = %request.method(),
            path = %request.path(),
            version = %request.version(),
            "Request received"
        );

        registry
            .reregister(&mut self.stream, self.token, Interest::WRITABLE)
            .context("failed to switch to writable interest")?;
        self.state = ConnectionState::AwaitingWrite(request);

        Ok(Progress::Open)
    }

    /// Consumes the attached request, resolves it and writes the response.
    ///
    /// Returns `Done` once every byte has been written, or when no request is
    /// attached at all.
    pub fn on_writable(&mut self, resolver: &StaticResolver) -> anyhow::Result<Progress> {
        match std::mem::replace(&mut self.state, ConnectionState::Closed) {
            ConnectionState::AwaitingWrite(request) => {
                let response = resolver
                    .resolve(request.path())
                    .with_context(|| format!("failed to read resource for {}", request.path()))?;

                tracing::info!(
                    peer = %self.peer,
                    method = %request.method(),
                    path = %request.path(),
                    status = response.status.as_u16(),
                    "Writing response"
                );

                self.flush(ResponseWriter::new(&response))
            }
            ConnectionState::Flushing(writer) => self.flush(writer),
            other => {
                tracing::warn!(
                    peer = %self.peer,
                    state = ?other,
                    "Connection has no request attached, closing"
                );
                self.state = other;
                Ok(Progress::Done)
            }
        }
    }

    fn flush(&mut self, mut writer: ResponseWriter) -> anyhow::Result<Progress> {
        match writer
            .write_to(&mut self.stream)
            .context("failed to write response")?
        {
            WriteStatus::Complete => {
                tracing::debug!(peer = %self.peer, bytes = writer.written(), "Response sent");
                Ok(Progress::Done)
            }
            WriteStatus::Pending => {
                tracing::debug!(
                    peer = %self.peer,
                    written = writer.written(),
                    total = writer.total(),
                    "Socket buffer full, waiting for writable"
                );
                self.state = ConnectionState::Flushing(writer);
                Ok(Progress::Open)
            }
        }
    }

    /// Cancels the registration and shuts the socket down. Terminal.
    pub fn close(&mut self, registry: &Registry) {
        if let Err(e) = registry.deregister(&mut self.stream) {
            tracing::debug!(peer = %self.peer, error = %e, "Deregister failed");
        }

        // Unread input at close time turns the FIN into a RST, which can
        // discard a response the peer has not read yet.
        self.discard_unread();
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            tracing::debug!(peer = %self.peer, error = %e, "Shutdown failed");
        }
        self.state = ConnectionState::Closed;
    }

    fn discard_unread(&mut self) {
        let mut scratch = [0u8; 1024];
        for _ in 0..DISCARD_ROUNDS {
            match self.stream.read(&mut scratch) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(_) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    use mio::{Events, Poll};

    fn socket_pair() -> (TcpStream, std::net::TcpStream, SocketAddr) {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let client = std::net::TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (server, peer) = listener.accept().unwrap();
        server.set_nonblocking(true).unwrap();
        (TcpStream::from_std(server), client, peer)
    }

    fn missing_root() -> StaticResolver {
        StaticResolver::new(env!("CARGO_MANIFEST_DIR"), "no-such-index.html")
    }

    #[test]
    fn request_attached_on_read_and_consumed_on_write() {
        let mut poll = Poll::new().unwrap();
        let mut events = Events::with_capacity(8);
        let (stream, mut client, peer) = socket_pair();

        let mut conn = Connection::new(stream, peer, Token(7));
        conn.register(poll.registry()).unwrap();
        assert!(conn.request().is_none());
        assert_eq!(conn.interest(), Some(Interest::READABLE));

        client.write_all(b"get /missing HTTP/1.1\r\n\r\n").unwrap();
        poll.poll(&mut events, Some(Duration::from_secs(5))).unwrap();

        assert_eq!(conn.on_readable(poll.registry()).unwrap(), Progress::Open);
        assert_eq!(conn.request().map(|r| r.method()), Some("GET"));
        assert_eq!(conn.interest(), Some(Interest::WRITABLE));

        assert_eq!(conn.on_writable(&missing_root()).unwrap(), Progress::Done);
        assert!(conn.request().is_none());

        conn.close(poll.registry());
        assert!(matches!(conn.state(), ConnectionState::Closed));
        assert_eq!(conn.interest(), None);

        let mut out = String::new();
        client.read_to_string(&mut out).unwrap();
        assert!(out.starts_with("HTTP/1.1 404 Not Found\r\n"));
    }

    #[test]
    fn full_buffer_without_terminator_is_parsed() {
        let mut poll = Poll::new().unwrap();
        let mut events = Events::with_capacity(8);
        let (stream, mut client, peer) = socket_pair();

        let mut conn = Connection::new(stream, peer, Token(5));
        conn.register(poll.registry()).unwrap();

        let mut raw = b"GET / HTTP/1.1 ".to_vec();
        raw.extend(std::iter::repeat_n(b'x', READ_BUFFER_SIZE + 100));
        client.write_all(&raw).unwrap();
        poll.poll(&mut events, Some(Duration::from_secs(5))).unwrap();

        assert_eq!(conn.on_readable(poll.registry()).unwrap(), Progress::Open);
        assert_eq!(conn.request().map(|r| r.path()), Some("/"));

        let www = StaticResolver::new(
            concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/www"),
            "index.html",
        );
        assert_eq!(conn.on_writable(&www).unwrap(), Progress::Done);
        conn.close(poll.registry());

        let mut out = String::new();
        client.read_to_string(&mut out).unwrap();
        assert!(out.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(out.contains("<h1>hi</h1>"));
    }

    #[test]
    fn write_without_request_is_refused() {
        let poll = Poll::new().unwrap();
        let (stream, mut client, peer) = socket_pair();

        let mut conn = Connection::new(stream, peer, Token(3));
        conn.register(poll.registry()).unwrap();

        assert_eq!(conn.on_writable(&missing_root()).unwrap(), Progress::Done);
        assert!(matches!(conn.state(), ConnectionState::AwaitingRead));

        conn.close(poll.registry());
        let mut out = Vec::new();
        client.read_to_end(&mut out).unwrap();
        assert!(out.is_empty());
    }
}
