//! Typed errors at host boundaries.
//!
//! None of these escape a build as a failure except [`BuildError::Cancelled`];
//! SDK and load failures are logged and degraded to "unresolved".

use std::path::PathBuf;

use thiserror::Error;

/// A resolution context build did not complete.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("build cancelled")]
    Cancelled,
}

/// An SDK resolver failed (as opposed to "SDK not found", which is `Ok(None)`).
#[derive(Debug, Error)]
pub enum SdkResolveError {
    #[error("invalid SDK reference '{0}'")]
    InvalidReference(String),
    #[error("failed to read SDK directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("SDK resolver failed: {0}")]
    Resolver(String),
}

/// A document could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            LoadError::NotFound(path)
        } else {
            LoadError::Io { path, source }
        }
    }
}
