//! Static file lookup
//!
//! Maps request paths onto files under the configured resource root.

pub mod resolver;

pub use resolver::StaticResolver;
