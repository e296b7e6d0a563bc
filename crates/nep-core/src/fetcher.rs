//! Collaborator seams
//!
//! The lifecycle never talks to the network or a version control tool
//! directly. It calls a [`PackageFetcher`] for metadata and a [`Checkout`]
//! for content; `nep-remote` provides the real implementations.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::record::PackageRecord;
use crate::spec::DependencySpec;

/// Metadata lookup failure
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Request could not be sent or the response not received
    #[error("request to {url} failed: {message}")]
    Transport {
        /// Request URL
        url: String,
        /// Transport error text
        message: String,
    },

    /// Registry answered with a non-success status
    #[error("registry returned {status} for {url}")]
    Status {
        /// Request URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Response body could not be decoded
    #[error("invalid registry response from {url}: {message}")]
    InvalidResponse {
        /// Request URL
        url: String,
        /// Decode error text
        message: String,
    },

    /// Registry has no such package
    #[error("package not found: {0}")]
    NotFound(String),
}

/// Content checkout failure
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    /// Checkout tool could not be started
    #[error("cannot run {program}: {source}")]
    Spawn {
        /// Program name
        program: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Checkout tool ran and failed
    #[error(
        "checkout of {source_url} failed ({}): {stderr}",
        .status.map_or_else(|| "signal".to_string(), |c| format!("exit {c}"))
    )]
    Failed {
        /// Source being checked out
        source_url: String,
        /// Exit code, `None` if killed by a signal
        status: Option<i32>,
        /// Captured error output
        stderr: String,
    },

    /// Target directory could not be populated
    #[error("cannot write '{}': {source}", path.display())]
    Io {
        /// Path written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Resolves a dependency spec to package metadata
#[async_trait]
pub trait PackageFetcher: Send + Sync {
    /// Look up `spec`
    ///
    /// Called once per package per batch; never retried by the caller.
    async fn fetch(&self, spec: &DependencySpec) -> Result<PackageRecord, FetchError>;
}

/// Materializes package content in a directory
#[async_trait]
pub trait Checkout: Send + Sync {
    /// Populate `target` with the content at `record.source`
    ///
    /// `target` exists when this is called. Treated as
    /// all-or-nothing: on error the caller discards whatever was written.
    async fn checkout(&self, record: &PackageRecord, target: &Path) -> Result<(), CheckoutError>;
}
