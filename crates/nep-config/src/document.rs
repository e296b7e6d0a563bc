//! The project configuration document
//!
//! An in-memory tree loaded whole from the marker file, mutated through
//! [`PathUpdate`]s and written back whole. Unknown keys are carried through
//! untouched.

use std::collections::BTreeMap;

use crate::error::{ConfigError, ConfigResult};
use crate::layout::keys;
use crate::path::KeyPath;
use crate::update::{PathUpdate, UpdateOp};
use crate::value::{ConfigMap, ConfigValue};

/// Project configuration document
///
/// # Invariants
/// - The root is always an object.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    root: ConfigValue,
}

impl ConfigDocument {
    /// Create an empty document (`{}`)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: ConfigValue::empty_object(),
        }
    }

    /// Default document for a freshly initialised project
    #[must_use]
    pub fn scaffold(name: &str) -> Self {
        let mut root = ConfigMap::new();
        root.insert(keys::NAME.into(), ConfigValue::from(name));
        root.insert(keys::AUTHOR.into(), ConfigValue::from(""));
        root.insert(keys::LICENSE.into(), ConfigValue::from(""));
        root.insert(keys::DESCRIPTION.into(), ConfigValue::from(""));
        root.insert(keys::SCRIPTS.into(), ConfigValue::empty_object());
        root.insert(keys::DEPENDENCIES.into(), ConfigValue::empty_object());
        Self {
            root: ConfigValue::Object(root),
        }
    }

    /// Wrap a tree; returns `None` unless the top level is an object
    #[must_use]
    pub fn from_value(value: ConfigValue) -> Option<Self> {
        value.is_object().then_some(Self { root: value })
    }

    /// Borrow the whole tree
    #[inline]
    #[must_use]
    pub fn as_value(&self) -> &ConfigValue {
        &self.root
    }

    /// Consume into the whole tree
    #[inline]
    #[must_use]
    pub fn into_value(self) -> ConfigValue {
        self.root
    }

    /// Resolve a path
    ///
    /// The empty path resolves to the whole document.
    ///
    /// # Errors
    /// `ConfigError::PathNotFound` if a segment is absent or if a non-object
    /// node would have to be indexed.
    pub fn get(&self, path: &KeyPath) -> ConfigResult<&ConfigValue> {
        let mut current = &self.root;
        for segment in path.iter() {
            current = current
                .as_object()
                .and_then(|map| map.get(segment))
                .ok_or_else(|| ConfigError::PathNotFound(path.clone()))?;
        }
        Ok(current)
    }

    /// Apply a single update
    ///
    /// # Errors
    /// `ConfigError::EmptyPath` if the update targets the document root.
    pub fn apply(&mut self, update: &PathUpdate) -> ConfigResult<()> {
        let Some((last, parents)) = update.path().segments().split_last() else {
            return Err(ConfigError::EmptyPath);
        };

        match update.op() {
            UpdateOp::Set(value) => {
                let mut node = self.root.force_object();
                for segment in parents {
                    node = node
                        .entry(segment.clone())
                        .or_insert_with(ConfigValue::empty_object)
                        .force_object();
                }
                node.insert(last.clone(), value.clone());
            }
            UpdateOp::Remove => remove_at(&mut self.root, parents, last),
        }
        Ok(())
    }

    /// Apply updates in order; later updates to the same path win
    ///
    /// Every path is checked before anything is applied, so a rejected batch
    /// leaves the document untouched.
    ///
    /// # Errors
    /// `ConfigError::EmptyPath` if any update targets the document root.
    pub fn apply_all(&mut self, updates: &[PathUpdate]) -> ConfigResult<()> {
        if updates.iter().any(|u| u.path().is_empty()) {
            return Err(ConfigError::EmptyPath);
        }
        for update in updates {
            self.apply(update)?;
        }
        Ok(())
    }

    /// Project name, if recorded as a string
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.top_level_str(keys::NAME)
    }

    /// Project author, if recorded as a string
    #[must_use]
    pub fn author(&self) -> Option<&str> {
        self.top_level_str(keys::AUTHOR)
    }

    /// License, if recorded as a string
    #[must_use]
    pub fn license(&self) -> Option<&str> {
        self.top_level_str(keys::LICENSE)
    }

    /// Description, if recorded as a string
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.top_level_str(keys::DESCRIPTION)
    }

    /// Raw `dependencies` region; `None` if absent or not an object
    #[must_use]
    pub fn dependency_entries(&self) -> Option<&ConfigMap> {
        self.get(&KeyPath::single(keys::DEPENDENCIES))
            .ok()
            .and_then(ConfigValue::as_object)
    }

    /// Names of every recorded dependency
    #[must_use]
    pub fn dependency_names(&self) -> Vec<String> {
        self.dependency_entries()
            .map(|deps| deps.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Dependencies whose version is a string
    ///
    /// Entries with non-string versions are left out.
    #[must_use]
    pub fn dependencies(&self) -> BTreeMap<String, String> {
        string_entries(self.dependency_entries())
    }

    /// Scripts whose source is a string
    #[must_use]
    pub fn scripts(&self) -> BTreeMap<String, String> {
        let scripts = self
            .get(&KeyPath::single(keys::SCRIPTS))
            .ok()
            .and_then(ConfigValue::as_object);
        string_entries(scripts)
    }

    /// Serialize as two-space indented JSON
    ///
    /// # Errors
    /// `ConfigError::Serialize` if serialization fails.
    pub fn to_json_pretty(&self) -> ConfigResult<String> {
        serde_json::to_string_pretty(&self.root).map_err(ConfigError::Serialize)
    }

    fn top_level_str(&self, key: &str) -> Option<&str> {
        self.root
            .as_object()
            .and_then(|map| map.get(key))
            .and_then(ConfigValue::as_str)
    }
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// Walk existing objects only; a missing or non-object step ends the walk.
fn remove_at(node: &mut ConfigValue, parents: &[String], last: &str) {
    let ConfigValue::Object(map) = node else {
        return;
    };
    match parents.split_first() {
        None => {
            map.remove(last);
        }
        Some((head, rest)) => {
            if let Some(child) = map.get_mut(head) {
                remove_at(child, rest, last);
            }
        }
    }
}

fn string_entries(map: Option<&ConfigMap>) -> BTreeMap<String, String> {
    map.into_iter()
        .flatten()
        .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
        .collect()
}
