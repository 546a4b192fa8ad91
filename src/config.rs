use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

const DEFAULT_LISTEN: &str = "127.0.0.1:8080";
const DEFAULT_RESOURCE_ROOT: &str = "resources";
const DEFAULT_INDEX_FILE: &str = "index.html";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Server configuration, built once at startup and handed to the reactor by value.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the listening socket binds to (e.g. "127.0.0.1:8080")
    pub listen_addr: String,
    /// Directory that non-index request paths are resolved against
    pub resource_root: PathBuf,
    /// File under `resource_root` served for "/"
    pub index_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN.to_string(),
            resource_root: PathBuf::from(DEFAULT_RESOURCE_ROOT),
            index_file: DEFAULT_INDEX_FILE.to_string(),
        }
    }
}

impl Config {
    /// Loads the configuration from the process environment.
    ///
    /// `CONFIG` optionally names a YAML file; `LISTEN`, `RESOURCE_ROOT` and
    /// `INDEX_FILE` override whatever the file (or the defaults) provide.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = match lookup("CONFIG") {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };

        if let Some(listen_addr) = lookup("LISTEN") {
            cfg.listen_addr = listen_addr;
        }
        if let Some(root) = lookup("RESOURCE_ROOT") {
            cfg.resource_root = PathBuf::from(root);
        }
        if let Some(index_file) = lookup("INDEX_FILE") {
            cfg.index_file = index_file;
        }

        Ok(cfg)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Full path of the document served for "/".
    pub fn index_path(&self) -> PathBuf {
        self.resource_root.join(&self.index_file)
    }
}
