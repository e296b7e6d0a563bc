//! Staging area for updates
//!
//! Freshly fetched content is checked out under the staging root and later
//! promoted over the live copy.
//!
//! # Atomicity
//! Promotion is two filesystem steps: remove the live directory, then
//! rename the staged one into its place. A crash between the two leaves the
//! package absent until the update is run again.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{FsOp, LifecycleError, LifecycleResult, PackageError};

/// Transient holding directory for staged packages
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    /// Staging area rooted at `root`
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Staging root
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Staged directory for `package`
    #[inline]
    #[must_use]
    pub fn entry(&self, package: &str) -> PathBuf {
        self.root.join(package)
    }

    /// Create the staging root if needed
    ///
    /// # Errors
    /// `LifecycleError::Filesystem` if the directory cannot be created.
    pub async fn ensure(&self) -> LifecycleResult<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| LifecycleError::filesystem(&self.root, FsOp::CreateDir, e))
    }

    /// Remove a stale entry left by an abandoned batch
    ///
    /// # Errors
    /// `PackageError::FilesystemFailed` if an existing entry cannot be removed.
    pub async fn discard(&self, package: &str) -> Result<(), PackageError> {
        let entry = self.entry(package);
        remove_dir_if_present(&entry)
            .await
            .map_err(|e| PackageError::filesystem(entry, FsOp::RemoveDir, e))
    }

    /// Replace `live` with the staged copy of `package`
    ///
    /// # Errors
    /// - `PackageError::NotStaged` if nothing is staged; `live` is untouched
    /// - `PackageError::FilesystemFailed` if removing `live` or the move fails
    pub async fn promote(&self, package: &str, live: &Path) -> Result<(), PackageError> {
        let staged = self.entry(package);
        let is_staged = tokio::fs::metadata(&staged)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_staged {
            return Err(PackageError::NotStaged {
                package: package.to_string(),
            });
        }

        remove_dir_if_present(live)
            .await
            .map_err(|e| PackageError::filesystem(live, FsOp::RemoveDir, e))?;
        tokio::fs::rename(&staged, live)
            .await
            .map_err(|e| PackageError::filesystem(live, FsOp::Rename, e))?;

        tracing::debug!(package, path = %live.display(), "package promoted");
        Ok(())
    }

    /// Remove the staging root and everything under it
    ///
    /// # Errors
    /// The I/O error if the root exists but cannot be removed.
    pub async fn clear(&self) -> std::io::Result<()> {
        remove_dir_if_present(&self.root).await
    }
}

/// Remove a directory tree; a missing directory is not an error.
pub(crate) async fn remove_dir_if_present(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
