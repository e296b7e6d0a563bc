//! Project discovery
//!
//! A project root is the nearest directory, walking upward from a start
//! directory, that contains the marker file.

use std::path::{Component, Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};
use crate::layout::{MARKER_FILE, PACKAGES_DIR, STAGING_DIR};
use crate::store::ConfigStore;

/// Root directory of a nep project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRoot {
    dir: PathBuf,
}

impl ProjectRoot {
    /// Wrap a directory known to be a project root
    ///
    /// No check is made that the marker file exists; use
    /// [`ProjectLocator::locate`] to discover a root.
    #[inline]
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Project directory
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Marker config file
    #[inline]
    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.dir.join(MARKER_FILE)
    }

    /// Live package directory
    #[inline]
    #[must_use]
    pub fn packages_dir(&self) -> PathBuf {
        self.dir.join(PACKAGES_DIR)
    }

    /// Staging directory used by updates
    #[inline]
    #[must_use]
    pub fn staging_dir(&self) -> PathBuf {
        self.dir.join(STAGING_DIR)
    }

    /// Live directory of one package
    #[inline]
    #[must_use]
    pub fn package_dir(&self, name: &str) -> PathBuf {
        self.packages_dir().join(name)
    }

    /// Store for this project's document
    #[inline]
    #[must_use]
    pub fn store(&self) -> ConfigStore {
        ConfigStore::new(self.config_file())
    }
}

/// Finds the project root above a start directory
#[derive(Debug, Clone)]
pub struct ProjectLocator {
    start: PathBuf,
}

impl ProjectLocator {
    /// Search upward from `start`
    ///
    /// Relative paths are resolved against the current directory when
    /// [`locate`](Self::locate) runs.
    #[inline]
    #[must_use]
    pub fn new(start: impl Into<PathBuf>) -> Self {
        Self {
            start: start.into(),
        }
    }

    /// Search upward from the current working directory
    ///
    /// # Errors
    /// `ConfigError::Unreadable` if the working directory cannot be determined.
    pub fn from_current_dir() -> ConfigResult<Self> {
        let cwd = std::env::current_dir().map_err(|e| ConfigError::unreadable(".", e))?;
        Ok(Self::new(cwd))
    }

    /// Directory the search starts from, made absolute
    ///
    /// # Errors
    /// `ConfigError::Unreadable` if a relative start cannot be resolved.
    pub fn start_dir(&self) -> ConfigResult<PathBuf> {
        let absolute = if self.start.is_absolute() {
            self.start.clone()
        } else {
            std::env::current_dir()
                .map_err(|e| ConfigError::unreadable(&self.start, e))?
                .join(&self.start)
        };
        Ok(normalize(&absolute))
    }

    /// Find the nearest project root
    ///
    /// Read-only; repeated calls against an unchanged filesystem return the
    /// same root.
    ///
    /// # Errors
    /// `ConfigError::NotAProject` when the filesystem root is reached without
    /// finding a marker file.
    pub fn locate(&self) -> ConfigResult<ProjectRoot> {
        let start = self.start_dir()?;
        let mut dir = start.clone();
        loop {
            if dir.join(MARKER_FILE).is_file() {
                tracing::debug!(root = %dir.display(), "project located");
                return Ok(ProjectRoot::new(dir));
            }
            if !dir.pop() {
                return Err(ConfigError::NotAProject {
                    start,
                    marker: MARKER_FILE,
                });
            }
        }
    }
}

/// Lexically drop `.` and resolve `..` so that walking upward with
/// [`PathBuf::pop`] visits real ancestors.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
