//! Path-addressed document updates

use crate::path::KeyPath;
use crate::value::ConfigValue;

/// What an update does at its target path
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOp {
    /// Set the value, creating intermediate objects as needed
    Set(ConfigValue),
    /// Remove the terminal key from its parent object
    Remove,
}

/// A nested-key write or delete instruction
///
/// # Invariants
/// - Applying a `Set` creates every missing intermediate object. An
///   intermediate that holds a non-object value is replaced by a fresh
///   object, discarding the old value.
/// - Applying a `Remove` never creates nodes; removing an absent key is a
///   no-op.
#[derive(Debug, Clone, PartialEq)]
pub struct PathUpdate {
    path: KeyPath,
    op: UpdateOp,
}

impl PathUpdate {
    /// Set `value` at `path`
    #[inline]
    #[must_use]
    pub fn set(path: impl Into<KeyPath>, value: impl Into<ConfigValue>) -> Self {
        Self {
            path: path.into(),
            op: UpdateOp::Set(value.into()),
        }
    }

    /// Remove the key at `path`
    #[inline]
    #[must_use]
    pub fn remove(path: impl Into<KeyPath>) -> Self {
        Self {
            path: path.into(),
            op: UpdateOp::Remove,
        }
    }

    /// Target path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &KeyPath {
        &self.path
    }

    /// Operation
    #[inline]
    #[must_use]
    pub fn op(&self) -> &UpdateOp {
        &self.op
    }

    /// Check if this update deletes its key
    #[inline]
    #[must_use]
    pub fn is_remove(&self) -> bool {
        matches!(self.op, UpdateOp::Remove)
    }
}
