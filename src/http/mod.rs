//! HTTP protocol implementation.
//!
//! Just enough HTTP/1.1 to serve static files: one request line in, one
//! response out, then the connection closes.
//!
//! # Architecture
//!
//! - **`connection`**: Per-socket registration record and its state machine
//! - **`parser`**: Extracts method, path and version from the request line
//! - **`request`**: The parsed request
//! - **`response`**: Status codes and the resolved response
//! - **`writer`**: Encodes responses and pushes them onto non-blocking sockets
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │  Accepted   │ ← accept() returned the socket
//!        └──────┬──────┘
//!               │ Registered for readable
//!               ▼
//!        ┌──────────────────┐
//!        │  AwaitingRead    │ ← Wait for the request line
//!        └──────┬───────────┘
//!               │ Request parsed and attached, interest → writable
//!               ▼
//!        ┌──────────────────┐
//!        │  AwaitingWrite   │ ← Resolve the path, encode the response
//!        └──────┬───────────┘
//!               │ Socket buffer full
//!               ├─ Flushing → (writable again) ─┐
//!               ▼                               │
//!        ┌──────────────────┐                   │
//!        │     Closed       │ ←─────────────────┘
//!        └──────────────────┘
//! ```
//!
//! Peer close, a malformed request line or any I/O error moves a connection
//! straight to `Closed` without a response.

pub mod connection;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
