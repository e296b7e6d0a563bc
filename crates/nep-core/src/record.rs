//! Fetched package metadata

use serde::{Deserialize, Serialize};

use crate::spec::is_valid_package_name;

/// Result of a package metadata lookup
///
/// `canonical_name`, when present and non-empty, replaces the requested
/// name as the `dependencies` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRecord {
    /// Name the package was requested under
    pub requested: String,
    /// Resolved version
    pub version: String,
    /// Where the content is checked out from
    pub source: String,
    /// Registry's own name for the package
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_name: Option<String>,
    /// Raw registry response, kept for the metadata file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<serde_json::Value>,
}

impl PackageRecord {
    /// Create record without canonical name or raw response
    #[must_use]
    pub fn new(
        requested: impl Into<String>,
        version: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            requested: requested.into(),
            version: version.into(),
            source: source.into(),
            canonical_name: None,
            raw: None,
        }
    }

    /// Set canonical name
    #[must_use]
    pub fn with_canonical_name(mut self, name: impl Into<String>) -> Self {
        self.canonical_name = Some(name.into());
        self
    }

    /// Attach the raw registry response
    #[must_use]
    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = Some(raw);
        self
    }

    /// Canonical name, if it is usable as a package name
    #[must_use]
    pub fn usable_canonical_name(&self) -> Option<&str> {
        self.canonical_name
            .as_deref()
            .filter(|name| is_valid_package_name(name))
    }

    /// Key under which the package is recorded in `dependencies`
    ///
    /// Falls back to the requested name when the canonical name is empty
    /// or not a valid package name.
    #[must_use]
    pub fn dependency_key(&self) -> &str {
        self.usable_canonical_name().unwrap_or(&self.requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_key_prefers_canonical_name() {
        let record = PackageRecord::new("json", "1.2", "https://example.com/json.git");
        assert_eq!(record.dependency_key(), "json");

        let record = record.with_canonical_name("lua-json");
        assert_eq!(record.dependency_key(), "lua-json");
    }

    #[test]
    fn empty_canonical_name_is_ignored() {
        let record = PackageRecord::new("json", "1.2", "src").with_canonical_name("");
        assert_eq!(record.dependency_key(), "json");
    }

    #[test]
    fn path_like_canonical_name_is_ignored() {
        let record = PackageRecord::new("json", "1.2", "src").with_canonical_name("../../etc");
        assert_eq!(record.usable_canonical_name(), None);
        assert_eq!(record.dependency_key(), "json");
    }

    #[test]
    fn serializes_without_empty_optionals() {
        let record = PackageRecord::new("json", "1.2", "src");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"requested": "json", "version": "1.2", "source": "src"})
        );
    }
}
