//! On-disk names shared by every nep project

/// Marker config file identifying a project root
pub const MARKER_FILE: &str = "nebula-config.json";

/// Live package directory, relative to the project root
pub const PACKAGES_DIR: &str = "nebpack";

/// Staging directory for updates, relative to the project root
pub const STAGING_DIR: &str = "nebpack-cache";

/// Fetch metadata written inside each installed package
///
/// Deliberately distinct from [`MARKER_FILE`] so an installed package is
/// never mistaken for a project root.
pub const PACKAGE_METADATA_FILE: &str = "nebula-package.json";

/// Project name used when none is given
pub const DEFAULT_PROJECT_NAME: &str = "Nebula-Pack-Project";

/// Wildcard target selecting every recorded dependency
pub const ALL_PACKAGES: &str = "*";

/// Top-level document regions
pub mod keys {
    /// Project name
    pub const NAME: &str = "name";
    /// Project author
    pub const AUTHOR: &str = "author";
    /// License identifier
    pub const LICENSE: &str = "license";
    /// Free-form description
    pub const DESCRIPTION: &str = "description";
    /// Script name → script source
    pub const SCRIPTS: &str = "scripts";
    /// Package name → version
    pub const DEPENDENCIES: &str = "dependencies";
}
