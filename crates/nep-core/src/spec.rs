//! Dependency specs and command target selections

use std::fmt::{self, Display, Formatter};
use std::path::{Component, Path};
use std::str::FromStr;

use nep_config::layout::ALL_PACKAGES;

use crate::error::SpecError;

/// Separator between name and version in a spec string
pub const VERSION_SEPARATOR: &str = "::";

/// Check that `name` can name a package directory and a `dependencies` key
///
/// The name must be exactly one plain path component: not empty, not `.`
/// or `..`, no separators or NUL, and no drive or root prefix.
#[must_use]
pub fn is_valid_package_name(name: &str) -> bool {
    if name.is_empty() || name.contains(['/', '\\', '\0']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// A package identifier with an optional version
///
/// Text form is `name` or `name::version`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DependencySpec {
    name: String,
    version: Option<String>,
}

impl DependencySpec {
    /// Spec for the latest version of `name`
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }

    /// Spec pinned to `version`
    #[inline]
    #[must_use]
    pub fn with_version(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: Some(version.into()),
        }
    }

    /// Re-derive a spec from a recorded dependency entry
    ///
    /// A leading `v` in the stored version is dropped; an empty version
    /// means latest.
    #[must_use]
    pub fn from_recorded(name: &str, version: &str) -> Self {
        let version = version.strip_prefix('v').unwrap_or(version);
        if version.is_empty() {
            Self::new(name)
        } else {
            Self::with_version(name, version)
        }
    }

    /// Package name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Requested version, if pinned
    #[inline]
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

impl Display for DependencySpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}{VERSION_SEPARATOR}{version}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl FromStr for DependencySpec {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, version) = match s.split_once(VERSION_SEPARATOR) {
            Some((name, version)) => (name, Some(version)),
            None => (s, None),
        };

        if name.is_empty() {
            return Err(SpecError::EmptyName(s.to_string()));
        }
        if !is_valid_package_name(name) {
            return Err(SpecError::InvalidName(name.to_string()));
        }
        match version {
            Some("") => Err(SpecError::EmptyVersion(s.to_string())),
            Some(version) => Ok(Self::with_version(name, version)),
            None => Ok(Self::new(name)),
        }
    }
}

/// Target set for update and uninstall
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every recorded dependency
    All,
    /// Explicit packages
    Packages(Vec<DependencySpec>),
}

impl Selection {
    /// Parse command targets
    ///
    /// Any `*` target selects everything; the other targets are then
    /// ignored.
    ///
    /// # Errors
    /// `SpecError` for the first malformed target.
    pub fn parse<I, S>(targets: I) -> Result<Self, SpecError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut specs = Vec::new();
        for target in targets {
            let target = target.as_ref().trim();
            if target == ALL_PACKAGES {
                return Ok(Self::All);
            }
            specs.push(target.parse()?);
        }
        Ok(Self::Packages(specs))
    }

    /// Check if nothing is selected
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Packages(specs) if specs.is_empty())
    }
}
