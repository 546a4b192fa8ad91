//! reactor-http - single-threaded static file server
//!
//! A selector-driven reactor that serves files from a resource root, one
//! request per connection.

pub mod config;
pub mod files;
pub mod http;
pub mod server;
