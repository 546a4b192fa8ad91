//! Request path to file resolution
//!
//! "/" is served from the index document; every other path is appended to the
//! resource root. A missing file is a normal 404, not an error.

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::config::Config;
use crate::http::mime::content_type_for;
use crate::http::response::Response;

/// Resolves request paths against a resource root.
#[derive(Debug, Clone)]
pub struct StaticResolver {
    root: PathBuf,
    index: PathBuf,
}

impl StaticResolver {
    pub fn new(root: impl Into<PathBuf>, index_file: impl AsRef<Path>) -> Self {
        let root = root.into();
        let index = root.join(index_file);
        Self { root, index }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self {
            root: cfg.resource_root.clone(),
            index: cfg.index_path(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a request path to the file it names, or `None` when the path is not
    /// absolute or tries to climb out of the resource root.
    ///
    /// Query strings and fragments are dropped before mapping.
    pub fn file_path(&self, request_path: &str) -> Option<PathBuf> {
        let path = request_path
            .split(['?', '#'])
            .next()
            .unwrap_or_default();

        if path == "/" {
            return Some(self.index.clone());
        }
        if !path.starts_with('/') {
            return None;
        }

        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return None;
        }

        Some(self.root.join(relative))
    }

    /// Produces the response for `request_path`.
    ///
    /// A file that exists but cannot be read (a directory, a permission problem)
    /// is returned as an error.
    pub fn resolve(&self, request_path: &str) -> io::Result<Response> {
        let Some(file) = self.file_path(request_path) else {
            tracing::warn!(path = %request_path, "Rejected path that does not map under the resource root");
            return Ok(Response::not_found());
        };

        if !file.exists() {
            tracing::debug!(file = %file.display(), "Resource not found");
            return Ok(Response::not_found());
        }

        let body = std::fs::read(&file)?;
        Ok(Response::ok(content_type_for(&file).to_string(), body))
    }
}
