//! Project initialisation
//!
//! Creates the marker file and the live package directory for a new
//! project, either in place or in a fresh subdirectory.

use std::path::{Path, PathBuf};

use crate::document::ConfigDocument;
use crate::error::{ConfigError, ConfigResult};
use crate::layout::{keys, DEFAULT_PROJECT_NAME};
use crate::locator::ProjectRoot;
use crate::path::KeyPath;
use crate::update::PathUpdate;

/// Options for [`init_project`]
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Project name recorded in the document
    pub name: String,
    /// Initialise the start directory itself instead of `<start>/<name>`
    pub in_place: bool,
    /// Author recorded in the document
    pub author: Option<String>,
    /// Description recorded in the document
    pub description: Option<String>,
    /// License recorded in the document
    pub license: Option<String>,
}

impl InitOptions {
    /// Options for a project named `name`, created in a subdirectory
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            in_place: false,
            author: None,
            description: None,
            license: None,
        }
    }

    /// Initialise the start directory itself
    #[must_use]
    pub fn in_place(mut self, in_place: bool) -> Self {
        self.in_place = in_place;
        self
    }

    /// Set author
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set license
    #[must_use]
    pub fn with_license(mut self, license: impl Into<String>) -> Self {
        self.license = Some(license.into());
        self
    }

    fn metadata_updates(&self) -> Vec<PathUpdate> {
        [
            (keys::AUTHOR, &self.author),
            (keys::DESCRIPTION, &self.description),
            (keys::LICENSE, &self.license),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .as_deref()
                .map(|v| PathUpdate::set(KeyPath::single(key), v))
        })
        .collect()
    }
}

impl Default for InitOptions {
    fn default() -> Self {
        Self::new(DEFAULT_PROJECT_NAME)
    }
}

/// Create a new project under `start`
///
/// With `in_place` the project root is `start` itself; otherwise a new
/// directory named after the project is created inside `start` and must not
/// already exist.
///
/// # Errors
/// - `ConfigError::InvalidName` for an empty name or one containing a path
///   separator (subdirectory mode only)
/// - `ConfigError::AlreadyExists` if the target directory or marker file
///   already exists
/// - `ConfigError::Unwritable` if directories or the marker cannot be
///   written
pub async fn init_project(start: &Path, options: &InitOptions) -> ConfigResult<ProjectRoot> {
    let name = options.name.trim();
    let dir = if options.in_place {
        start.to_path_buf()
    } else {
        let dir = subdirectory(start, name)?;
        let exists = tokio::fs::try_exists(&dir)
            .await
            .map_err(|e| ConfigError::unreadable(&dir, e))?;
        if exists {
            return Err(ConfigError::AlreadyExists { path: dir });
        }
        dir
    };

    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| ConfigError::unwritable(&dir, e))?;

    let root = ProjectRoot::new(dir);
    let store = root.store();
    store
        .create(&ConfigDocument::scaffold(name))
        .await?;
    store.update(&options.metadata_updates()).await?;

    let packages = root.packages_dir();
    tokio::fs::create_dir_all(&packages)
        .await
        .map_err(|e| ConfigError::unwritable(&packages, e))?;

    tracing::info!(name = %name, root = %root.dir().display(), "project initialised");
    Ok(root)
}

fn subdirectory(start: &Path, name: &str) -> ConfigResult<PathBuf> {
    let invalid = name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']);
    if invalid {
        return Err(ConfigError::InvalidName(name.to_string()));
    }
    Ok(start.join(name))
}
