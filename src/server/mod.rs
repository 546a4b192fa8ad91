//! Reactor loop and its handle

pub mod reactor;

pub use reactor::{Readiness, Server, ServerHandle};
