//! Error types for project configuration
//!
//! Covers the failure modes of:
//! - Project discovery (no marker file upward from the start directory)
//! - Loading the document (I/O and parse failures)
//! - Path-addressed reads and updates
//! - Writing the document and scaffolding new projects

use std::path::PathBuf;

use crate::path::KeyPath;

/// Configuration error type
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No marker file found in the start directory or any ancestor
    #[error("not a nep project: no {marker} found in '{}' or any parent directory", start.display())]
    NotAProject {
        /// Directory the search started from
        start: PathBuf,
        /// Marker file name that was searched for
        marker: &'static str,
    },

    /// Document could not be read
    #[error("cannot read config '{}': {source}", path.display())]
    Unreadable {
        /// Document path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Document is not valid JSON
    #[error("config '{}' is corrupt: {source}", path.display())]
    Corrupt {
        /// Document path
        path: PathBuf,
        /// Parse error
        #[source]
        source: serde_json::Error,
    },

    /// Document parsed but its top level is not an object
    #[error("config '{}' is corrupt: top level is a {found}, expected an object", path.display())]
    NotAnObject {
        /// Document path
        path: PathBuf,
        /// Kind of the top-level node
        found: &'static str,
    },

    /// A read addressed a key that does not exist
    #[error("path not found: {0}")]
    PathNotFound(KeyPath),

    /// An update addressed the document root
    #[error("update path must contain at least one segment")]
    EmptyPath,

    /// Document could not be serialized
    #[error("cannot serialize config: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Document could not be written
    #[error("cannot write config '{}': {source}", path.display())]
    Unwritable {
        /// Document or directory path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Project already initialised at the target
    #[error("a project already exists at '{}'", path.display())]
    AlreadyExists {
        /// Existing marker file or directory
        path: PathBuf,
    },

    /// Project name is unusable as a directory name
    #[error("invalid project name: '{0}'")]
    InvalidName(String),
}

impl ConfigError {
    /// Create read error for path
    pub fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Unreadable {
            path: path.into(),
            source,
        }
    }

    /// Create write error for path
    pub fn unwritable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Unwritable {
            path: path.into(),
            source,
        }
    }

    /// Check if the error means there is no usable project context
    ///
    /// Such errors abort a whole command rather than a single package.
    #[inline]
    #[must_use]
    pub fn is_context_error(&self) -> bool {
        matches!(
            self,
            Self::NotAProject { .. }
                | Self::Unreadable { .. }
                | Self::Corrupt { .. }
                | Self::NotAnObject { .. }
        )
    }
}

/// Result type alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
