//! Persistent configuration store
//!
//! Every operation is whole-document: the marker file is read fully, the
//! tree is changed in memory, and the file is rewritten fully.
//!
//! # Concurrency
//! All [`ConfigStore::update`] calls in a process share one critical
//! section, so concurrent writers inside the process queue instead of losing
//! each other's changes. Separate processes are not coordinated: two
//! invocations that read before either writes end with the last writer's
//! document.

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use crate::document::ConfigDocument;
use crate::error::{ConfigError, ConfigResult};
use crate::path::KeyPath;
use crate::update::PathUpdate;
use crate::value::ConfigValue;

/// Process-wide serialization point for document writes
static UPDATE_LOCK: Mutex<()> = Mutex::const_new(());

/// Reads and writes one project's marker file
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Create store for the document at `path`
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Document path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and parse the full document
    ///
    /// # Errors
    /// - `ConfigError::Unreadable` if the file cannot be read
    /// - `ConfigError::Corrupt` if it is not valid JSON
    /// - `ConfigError::NotAnObject` if the top level is not an object
    pub async fn load(&self) -> ConfigResult<ConfigDocument> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| ConfigError::unreadable(&self.path, e))?;

        let value: ConfigValue = serde_json::from_str(&text).map_err(|source| ConfigError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        let found = value.kind();
        ConfigDocument::from_value(value).ok_or_else(|| ConfigError::NotAnObject {
            path: self.path.clone(),
            found,
        })
    }

    /// Resolve several paths against one snapshot of the document
    ///
    /// Each path resolves independently: a missing key yields
    /// `Err(ConfigError::PathNotFound)` in that path's slot only.
    ///
    /// # Errors
    /// Fails as a whole only when the document cannot be loaded.
    pub async fn read(&self, paths: &[KeyPath]) -> ConfigResult<Vec<ConfigResult<ConfigValue>>> {
        let document = self.load().await?;
        Ok(paths
            .iter()
            .map(|path| document.get(path).cloned())
            .collect())
    }

    /// Resolve a single path
    ///
    /// # Errors
    /// Load errors, or `ConfigError::PathNotFound`.
    pub async fn read_one(&self, path: &KeyPath) -> ConfigResult<ConfigValue> {
        self.load().await?.get(path).cloned()
    }

    /// Apply a batch of updates and rewrite the document
    ///
    /// Updates apply in the given order. The batch is all-or-nothing: if any
    /// update is rejected, or the document cannot be loaded or written, the
    /// file on disk is left as it was.
    ///
    /// # Errors
    /// Load errors, `ConfigError::EmptyPath`, `ConfigError::Serialize`, or
    /// `ConfigError::Unwritable`.
    pub async fn update(&self, updates: &[PathUpdate]) -> ConfigResult<()> {
        if updates.is_empty() {
            return Ok(());
        }

        let _guard = UPDATE_LOCK.lock().await;

        let mut document = self.load().await?;
        document.apply_all(updates)?;
        self.write(&document).await?;

        tracing::debug!(
            path = %self.path.display(),
            updates = updates.len(),
            "config updated"
        );
        Ok(())
    }

    /// Write a brand-new document, refusing to replace an existing one
    ///
    /// # Errors
    /// `ConfigError::AlreadyExists` if the file exists, otherwise write errors.
    pub async fn create(&self, document: &ConfigDocument) -> ConfigResult<()> {
        let _guard = UPDATE_LOCK.lock().await;

        let exists = tokio::fs::try_exists(&self.path)
            .await
            .map_err(|e| ConfigError::unreadable(&self.path, e))?;
        if exists {
            return Err(ConfigError::AlreadyExists {
                path: self.path.clone(),
            });
        }
        self.write(document).await
    }

    /// Write through a sibling temporary file and rename it into place
    async fn write(&self, document: &ConfigDocument) -> ConfigResult<()> {
        let mut text = document.to_json_pretty()?;
        text.push('\n');

        let tmp = self.temp_path();
        tokio::fs::write(&tmp, text.as_bytes())
            .await
            .map_err(|e| ConfigError::unwritable(&tmp, e))?;

        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(ConfigError::unwritable(&self.path, e));
        }
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.path.with_file_name(format!(".{name}.tmp"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value as JsonValue};

    fn store_with(contents: &str) -> (tempfile::TempDir, ConfigStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nebula-config.json");
        std::fs::write(&path, contents).unwrap();
        (dir, ConfigStore::new(path))
    }

    fn on_disk(store: &ConfigStore) -> JsonValue {
        let text = std::fs::read_to_string(store.path()).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[tokio::test]
    async fn update_then_read_round_trip() {
        let (_dir, store) = store_with("{}");

        store
            .update(&[PathUpdate::set(["a", "b", "c"], "value")])
            .await
            .unwrap();

        let value = store.read_one(&KeyPath::from(["a", "b", "c"])).await.unwrap();
        assert_eq!(value, ConfigValue::from("value"));
        assert_eq!(on_disk(&store), json!({"a": {"b": {"c": "value"}}}));
    }

    #[tokio::test]
    async fn read_reports_missing_paths_per_entry() {
        let (_dir, store) = store_with(r#"{"dependencies": {"foo": "1.2"}}"#);

        let results = store
            .read(&[
                KeyPath::from(["dependencies", "foo"]),
                KeyPath::from(["dependencies", "bar"]),
            ])
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap(), &ConfigValue::from("1.2"));
        assert!(matches!(results[1], Err(ConfigError::PathNotFound(_))));
    }

    #[tokio::test]
    async fn missing_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("nebula-config.json"));
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, ConfigError::Unreadable { .. }));
    }

    #[tokio::test]
    async fn invalid_json_is_corrupt() {
        let (_dir, store) = store_with("{ not json");
        let err = store.read(&[KeyPath::root()]).await.unwrap_err();
        assert!(matches!(err, ConfigError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn array_document_is_not_an_object() {
        let (_dir, store) = store_with("[1, 2]");
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, ConfigError::NotAnObject { found: "list", .. }));
    }

    #[tokio::test]
    async fn rejected_batch_leaves_file_untouched() {
        let original = r#"{"name": "keep"}"#;
        let (_dir, store) = store_with(original);

        let result = store
            .update(&[
                PathUpdate::set(["name"], "changed"),
                PathUpdate::set(KeyPath::root(), "bad"),
            ])
            .await;

        assert!(matches!(result, Err(ConfigError::EmptyPath)));
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), original);
    }

    #[tokio::test]
    async fn update_leaves_no_temp_file() {
        let (dir, store) = store_with("{}");
        store.update(&[PathUpdate::set(["k"], 1i64)]).await.unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["nebula-config.json".to_string()]);
    }

    #[tokio::test]
    async fn create_refuses_existing_document() {
        let (_dir, store) = store_with("{}");
        let err = store.create(&ConfigDocument::new()).await.unwrap_err();
        assert!(matches!(err, ConfigError::AlreadyExists { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_updates_are_not_lost() {
        let (_dir, store) = store_with(r#"{"dependencies": {}}"#);

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .update(&[PathUpdate::set(["dependencies", format!("pkg{i}").as_str()], "1.0")])
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let document = store.load().await.unwrap();
        assert_eq!(document.dependencies().len(), 16);
    }
}
