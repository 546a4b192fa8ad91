//! Single-threaded readiness loop
//!
//! One selector drives the listening socket and every accepted connection.
//! Connections live in a slab; a connection's slab key, offset past the
//! reserved tokens, is its selector token.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use anyhow::{Context, anyhow};
use mio::event::Event;
use mio::net::TcpListener;
use mio::{Events, Interest, Poll, Token, Waker};
use slab::Slab;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::files::StaticResolver;
use crate::http::connection::{Connection, Progress};

const LISTENER: Token = Token(0);
const WAKER: Token = Token(1);
const FIRST_CONNECTION: usize = 2;

const EVENTS_CAPACITY: usize = 1024;

/// The kind of readiness a registration is handled for in one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Acceptable,
    Readable,
    Writable,
}

impl Readiness {
    /// Picks the single readiness to handle, in priority order
    /// acceptable > readable > writable.
    pub fn classify(token: Token, readable: bool, writable: bool) -> Option<Self> {
        if token == LISTENER {
            Some(Readiness::Acceptable)
        } else if readable {
            Some(Readiness::Readable)
        } else if writable {
            Some(Readiness::Writable)
        } else {
            None
        }
    }
}

fn connection_key(token: Token) -> Option<usize> {
    token.0.checked_sub(FIRST_CONNECTION)
}

/// The reactor: selector, listening socket and all live registrations.
pub struct Server {
    poll: Poll,
    listener: TcpListener,
    connections: Slab<Connection>,
    resolver: StaticResolver,
    stop: Arc<AtomicBool>,
    waker: Arc<Waker>,
}

impl Server {
    /// Binds the listening socket and registers it for acceptable events.
    ///
    /// Failing here is the only error allowed to stop the process.
    pub fn bind(cfg: Config) -> anyhow::Result<Self> {
        let addr = cfg
            .listen_addr
            .to_socket_addrs()
            .with_context(|| format!("invalid listen address {}", cfg.listen_addr))?
            .next()
            .ok_or_else(|| anyhow!("listen address {} resolved to nothing", cfg.listen_addr))?;

        let poll = Poll::new().context("failed to create selector")?;
        let mut listener =
            TcpListener::bind(addr).with_context(|| format!("failed to bind {}", addr))?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)
            .context("failed to register listener")?;
        let waker = Waker::new(poll.registry(), WAKER).context("failed to create waker")?;

        Ok(Self {
            poll,
            listener,
            connections: Slab::new(),
            resolver: StaticResolver::from_config(&cfg),
            stop: Arc::new(AtomicBool::new(false)),
            waker: Arc::new(waker),
        })
    }

    /// Binds and runs the loop on its own thread, returning as soon as the
    /// listener is registered.
    pub fn start(cfg: Config) -> anyhow::Result<ServerHandle> {
        Self::bind(cfg)?.spawn()
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn spawn(self) -> anyhow::Result<ServerHandle> {
        let local_addr = self.local_addr()?;
        let stop = Arc::clone(&self.stop);
        let waker = Arc::clone(&self.waker);

        let thread = thread::Builder::new()
            .name("reactor".to_string())
            .spawn(move || self.run())
            .context("failed to spawn reactor thread")?;

        Ok(ServerHandle {
            local_addr,
            stop,
            waker,
            thread,
        })
    }

    /// Runs the loop on the calling thread until a stop is requested.
    pub fn run(mut self) -> anyhow::Result<()> {
        info!(
            addr = %self.local_addr()?,
            root = %self.resolver.root().display(),
            "Listening"
        );

        let mut events = Events::with_capacity(EVENTS_CAPACITY);

        loop {
            if let Err(e) = self.poll.poll(&mut events, None) {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(e).context("selector wait failed");
            }

            for event in events.iter() {
                if event.token() != WAKER {
                    self.dispatch(event);
                }
            }

            if self.stop.load(Ordering::Acquire) {
                self.close_all();
                info!("Reactor stopped");
                return Ok(());
            }
        }
    }

    /// Handles one ready registration. Per-connection failures end here.
    fn dispatch(&mut self, event: &Event) {
        let token = event.token();

        let (readable, writable) = if token == LISTENER {
            (event.is_readable(), false)
        } else {
            match connection_key(token).and_then(|key| self.connections.get(key)) {
                Some(conn) => conn.readiness(event),
                None => {
                    debug!(?token, "Event for a closed registration");
                    return;
                }
            }
        };

        let result = match Readiness::classify(token, readable, writable) {
            Some(Readiness::Acceptable) => {
                self.accept();
                return;
            }
            Some(Readiness::Readable) => self.read(token),
            Some(Readiness::Writable) => self.write(token),
            None => return,
        };

        match result {
            Ok(Progress::Open) => {}
            Ok(Progress::Done) => self.close(token),
            Err(e) => {
                let peer = connection_key(token)
                    .and_then(|key| self.connections.get(key))
                    .map(|conn| conn.peer().to_string())
                    .unwrap_or_default();
                error!(?token, %peer, error = %format!("{e:#}"), "Error on handling connection, closing");
                self.close(token);
            }
        }
    }

    fn accept(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    let entry = self.connections.vacant_entry();
                    let token = Token(entry.key() + FIRST_CONNECTION);
                    let mut conn = Connection::new(stream, peer, token);

                    if let Err(e) = conn.register(self.poll.registry()) {
                        error!(%peer, error = %e, "Failed to register connection");
                        continue;
                    }

                    entry.insert(conn);
                    info!(%peer, ?token, "Accepted connection");
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                    break;
                }
            }
        }
    }

    fn read(&mut self, token: Token) -> anyhow::Result<Progress> {
        let conn = connection_key(token)
            .and_then(|key| self.connections.get_mut(key))
            .ok_or_else(|| anyhow!("no registration for {:?}", token))?;
        conn.on_readable(self.poll.registry())
    }

    fn write(&mut self, token: Token) -> anyhow::Result<Progress> {
        let conn = connection_key(token)
            .and_then(|key| self.connections.get_mut(key))
            .ok_or_else(|| anyhow!("no registration for {:?}", token))?;
        conn.on_writable(&self.resolver)
    }

    /// Cancels the registration and closes the socket. Nothing is dispatched
    /// for the token afterwards.
    fn close(&mut self, token: Token) {
        let Some(mut conn) = connection_key(token).and_then(|key| self.connections.try_remove(key))
        else {
            return;
        };

        conn.close(self.poll.registry());
        debug!(peer = %conn.peer(), ?token, "Connection closed");
    }

    fn close_all(&mut self) {
        for mut conn in self.connections.drain() {
            conn.close(self.poll.registry());
        }
    }
}

/// Handle to a reactor running on its own thread.
pub struct ServerHandle {
    local_addr: SocketAddr,
    stop: Arc<AtomicBool>,
    waker: Arc<Waker>,
    thread: JoinHandle<anyhow::Result<()>>,
}

impl ServerHandle {
    /// The address the listener is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Asks the loop to close every connection and return.
    pub fn shutdown(&self) -> io::Result<()> {
        self.stop.store(true, Ordering::Release);
        self.waker.wake()
    }

    pub fn join(self) -> anyhow::Result<()> {
        self.thread
            .join()
            .map_err(|_| anyhow!("reactor thread panicked"))?
    }
}
