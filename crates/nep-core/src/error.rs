//! Error types for the package lifecycle
//!
//! Two levels:
//! - [`PackageError`] is scoped to one package in a batch. It is recorded in
//!   the batch report and never aborts sibling work.
//! - [`LifecycleError`] stops the whole operation: no project context, an
//!   unusable package root, or a failed config commit.

use std::path::PathBuf;

use nep_config::ConfigError;

use crate::fetcher::{CheckoutError, FetchError};

/// Filesystem step that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsOp {
    /// Creating a directory
    CreateDir,
    /// Removing a directory tree
    RemoveDir,
    /// Moving a directory into place
    Rename,
    /// Writing a file
    WriteFile,
}

impl std::fmt::Display for FsOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::CreateDir => "create directory",
            Self::RemoveDir => "remove directory",
            Self::Rename => "move directory",
            Self::WriteFile => "write file",
        })
    }
}

/// Dependency spec parse errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpecError {
    /// Spec has no package name
    #[error("dependency spec '{0}' has an empty package name")]
    EmptyName(String),

    /// Spec has a `::` separator but no version after it
    #[error("dependency spec '{0}' has an empty version")]
    EmptyVersion(String),

    /// Package name is not a single plain directory name
    #[error("'{0}' is not a valid package name")]
    InvalidName(String),
}

/// Failure of a single package within a batch
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    /// Metadata lookup failed
    #[error("failed to fetch '{package}': {source}")]
    FetchFailed {
        /// Requested package
        package: String,
        /// Collaborator error
        #[source]
        source: FetchError,
    },

    /// Content checkout failed
    #[error("failed to check out '{package}': {source}")]
    CheckoutFailed {
        /// Requested package
        package: String,
        /// Collaborator error
        #[source]
        source: CheckoutError,
    },

    /// A per-package directory operation failed
    #[error("cannot {op} '{}': {source}", path.display())]
    FilesystemFailed {
        /// Path operated on
        path: PathBuf,
        /// Step that failed
        op: FsOp,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Promotion skipped because nothing was staged
    #[error("package '{package}' was not staged, live copy left untouched")]
    NotStaged {
        /// Package name
        package: String,
    },

    /// Worker ended without reporting a result
    #[error("worker for '{package}' stopped before reporting a result")]
    Interrupted {
        /// Requested package
        package: String,
    },
}

impl PackageError {
    /// Create filesystem error
    pub fn filesystem(path: impl Into<PathBuf>, op: FsOp, source: std::io::Error) -> Self {
        Self::FilesystemFailed {
            path: path.into(),
            op,
            source,
        }
    }

    /// Check if the error is a skipped promotion rather than a failure
    #[inline]
    #[must_use]
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::NotStaged { .. })
    }
}

/// Error that aborts a whole lifecycle operation
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// Project context or document failure
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Uninstall was given nothing to remove
    #[error("no packages specified")]
    NoPackagesSpecified,

    /// A target could not be parsed
    #[error(transparent)]
    InvalidSpec(#[from] SpecError),

    /// The package or staging root could not be prepared
    #[error("cannot {op} '{}': {source}", path.display())]
    Filesystem {
        /// Path operated on
        path: PathBuf,
        /// Step that failed
        op: FsOp,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The batch's single config update failed
    ///
    /// Content already placed on disk for `packages` stays in place; the
    /// document does not record it.
    #[error("failed to record {} package(s) in config: {source}", packages.len())]
    CommitFailed {
        /// Packages whose entries were not written
        packages: Vec<String>,
        /// Store error
        #[source]
        source: ConfigError,
    },
}

impl LifecycleError {
    /// Create filesystem error
    pub fn filesystem(path: impl Into<PathBuf>, op: FsOp, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            op,
            source,
        }
    }

    /// Check if the project context itself is broken
    #[inline]
    #[must_use]
    pub fn is_fatal_context(&self) -> bool {
        match self {
            Self::Config(e) => e.is_context_error(),
            Self::CommitFailed { source, .. } => source.is_context_error(),
            _ => false,
        }
    }
}

/// Result type alias for lifecycle operations
pub type LifecycleResult<T> = Result<T, LifecycleError>;
