//! Testing utilities for the Nebula Pack workspace
//!
//! Shared fakes for the lifecycle collaborators and throwaway projects.

#![allow(missing_docs)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nep_config::layout::MARKER_FILE;
use nep_config::{ConfigDocument, ProjectRoot};
use nep_core::{
    Checkout, CheckoutError, DependencySpec, FetchError, OperationContext, PackageFetcher,
    PackageLifecycleManager, PackageRecord,
};
use serde_json::Value as JsonValue;
use tokio::sync::Mutex;

/// File `DirCheckout` writes into every package it checks out
pub const CHECKOUT_FILE: &str = "package.lua";

#[derive(Debug, Clone)]
enum Script {
    Resolve {
        version: Option<String>,
        canonical: Option<String>,
    },
    Fail,
}

/// Fetcher answering from a script instead of a registry
///
/// Unscripted packages resolve to the requested version, or `1.0.0` when
/// unpinned.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    scripts: HashMap<String, Script>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `name` to `version` whatever version is requested
    pub fn with_package(mut self, name: &str, version: &str) -> Self {
        self.scripts.insert(
            name.to_string(),
            Script::Resolve {
                version: Some(version.to_string()),
                canonical: None,
            },
        );
        self
    }

    /// Resolve `name` with a registry-side canonical name
    pub fn with_canonical(mut self, name: &str, version: &str, canonical: &str) -> Self {
        self.scripts.insert(
            name.to_string(),
            Script::Resolve {
                version: Some(version.to_string()),
                canonical: Some(canonical.to_string()),
            },
        );
        self
    }

    /// Make every lookup of `name` fail
    pub fn failing(mut self, name: &str) -> Self {
        self.scripts.insert(name.to_string(), Script::Fail);
        self
    }

    /// Delay the answer for `name`
    pub fn with_delay(mut self, name: &str, delay: Duration) -> Self {
        self.delays.insert(name.to_string(), delay);
        self
    }

    /// Specs looked up so far, in call order
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl PackageFetcher for ScriptedFetcher {
    async fn fetch(&self, spec: &DependencySpec) -> Result<PackageRecord, FetchError> {
        self.calls.lock().await.push(spec.to_string());

        if let Some(delay) = self.delays.get(spec.name()) {
            tokio::time::sleep(*delay).await;
        }

        let (version, canonical) = match self.scripts.get(spec.name()) {
            Some(Script::Fail) => return Err(FetchError::NotFound(spec.to_string())),
            Some(Script::Resolve { version, canonical }) => (version.clone(), canonical.clone()),
            None => (None, None),
        };

        let version = version
            .or_else(|| spec.version().map(str::to_string))
            .unwrap_or_else(|| "1.0.0".to_string());
        let mut record = PackageRecord::new(
            spec.name(),
            version,
            format!("https://packages.test/{}.git", spec.name()),
        );
        if let Some(canonical) = canonical {
            record = record.with_canonical_name(canonical);
        }
        Ok(record)
    }
}

/// Checkout writing a single file, optionally failing for some packages
///
/// A failing checkout writes a partial file first, like an interrupted
/// clone would.
#[derive(Debug, Default)]
pub struct DirCheckout {
    failing: HashSet<String>,
}

impl DirCheckout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail checkouts of packages requested as `name`
    pub fn failing(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }
}

#[async_trait]
impl Checkout for DirCheckout {
    async fn checkout(&self, record: &PackageRecord, target: &Path) -> Result<(), CheckoutError> {
        let path = target.join(CHECKOUT_FILE);
        if self.failing.contains(&record.requested) {
            let _ = tokio::fs::write(target.join(".partial"), b"").await;
            return Err(CheckoutError::Failed {
                source_url: record.source.clone(),
                status: Some(128),
                stderr: "scripted checkout failure".to_string(),
            });
        }
        tokio::fs::write(&path, format!("-- {} {}\n", record.requested, record.version))
            .await
            .map_err(|source| CheckoutError::Io { path, source })
    }
}

/// Throwaway project in a temporary directory
pub struct TestProject {
    dir: tempfile::TempDir,
}

impl TestProject {
    /// Project whose marker file holds `document`
    pub fn new(document: JsonValue) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(MARKER_FILE),
            serde_json::to_string_pretty(&document).unwrap(),
        )
        .unwrap();
        Self { dir }
    }

    /// Project with only a `dependencies` region
    pub fn with_dependencies(dependencies: JsonValue) -> Self {
        Self::new(serde_json::json!({ "dependencies": dependencies }))
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn root(&self) -> ProjectRoot {
        ProjectRoot::new(self.dir.path())
    }

    pub fn ctx(&self) -> OperationContext {
        OperationContext::new(self.root())
    }

    pub fn package_dir(&self, name: &str) -> PathBuf {
        self.root().package_dir(name)
    }

    /// Create a live package directory holding one file
    pub fn add_live_package(&self, name: &str, contents: &str) {
        let dir = self.package_dir(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(CHECKOUT_FILE), contents).unwrap();
    }

    /// Contents of a package's checkout file, if present
    pub fn package_file(&self, name: &str) -> Option<String> {
        std::fs::read_to_string(self.package_dir(name).join(CHECKOUT_FILE)).ok()
    }

    pub async fn document(&self) -> ConfigDocument {
        self.root().store().load().await.unwrap()
    }

    pub async fn dependencies(&self) -> BTreeMap<String, String> {
        self.document().await.dependencies()
    }

    pub fn raw_document(&self) -> JsonValue {
        let text = std::fs::read_to_string(self.dir.path().join(MARKER_FILE)).unwrap();
        serde_json::from_str(&text).unwrap()
    }
}

/// Manager wired to the given fakes
pub fn manager(fetcher: Arc<ScriptedFetcher>, checkout: DirCheckout) -> PackageLifecycleManager {
    PackageLifecycleManager::new(fetcher, Arc::new(checkout))
}
