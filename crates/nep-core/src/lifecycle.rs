//! Package lifecycle orchestration
//!
//! [`PackageLifecycleManager`] turns a batch of dependency specs into
//! per-package fetch and checkout work on a [`WorkerPool`], then records the
//! results with one config update.
//!
//! Per-package failures are best-effort: they are reported and the rest of
//! the batch carries on. The config commit is all-or-nothing: if it fails,
//! content already placed on disk stays, unrecorded.

use std::path::PathBuf;
use std::sync::Arc;

use nep_config::layout::{keys, PACKAGE_METADATA_FILE};
use nep_config::{ConfigDocument, KeyPath, PathUpdate, ProjectRoot};

use crate::aggregate::{commit, BatchAggregator};
use crate::context::{LifecycleConfig, OperationContext};
use crate::error::{FsOp, LifecycleError, LifecycleResult, PackageError, SpecError};
use crate::fetcher::{Checkout, PackageFetcher};
use crate::pool::WorkerPool;
use crate::record::PackageRecord;
use crate::report::{
    BatchReport, InstalledPackage, PackageOutcome, PromotionOutcome, UninstallReport, UpdateReport,
};
use crate::spec::{is_valid_package_name, DependencySpec, Selection};
use crate::staging::{remove_dir_if_present, StagingArea};

/// Orchestrates install, update, and uninstall batches
#[derive(Clone)]
pub struct PackageLifecycleManager {
    fetcher: Arc<dyn PackageFetcher>,
    checkout: Arc<dyn Checkout>,
    config: LifecycleConfig,
}

impl std::fmt::Debug for PackageLifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageLifecycleManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PackageLifecycleManager {
    /// Create manager with default configuration
    #[must_use]
    pub fn new(fetcher: Arc<dyn PackageFetcher>, checkout: Arc<dyn Checkout>) -> Self {
        Self {
            fetcher,
            checkout,
            config: LifecycleConfig::default(),
        }
    }

    /// Replace configuration
    #[must_use]
    pub fn with_config(mut self, config: LifecycleConfig) -> Self {
        self.config = config;
        self
    }

    /// Current configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Install packages into the live package directory
    ///
    /// With no specs, every recorded dependency is reinstalled at its
    /// recorded version; if none are recorded this is a no-op.
    ///
    /// # Errors
    /// - `LifecycleError::InvalidSpec` if a spec names no valid package
    /// - `LifecycleError::Config` if the document cannot be loaded
    /// - `LifecycleError::Filesystem` if the package or staging root cannot
    ///   be created
    /// - `LifecycleError::CommitFailed` if the final config update fails
    pub async fn install(
        &self,
        ctx: &OperationContext,
        specs: Vec<DependencySpec>,
    ) -> LifecycleResult<BatchReport> {
        check_names(&specs)?;
        let root = ctx.root();
        let store = root.store();
        let document = store.load().await?;

        let specs = if specs.is_empty() {
            recorded_specs(&document)
        } else {
            specs
        };
        if specs.is_empty() {
            tracing::info!("no dependencies to install");
            return Ok(BatchReport::default());
        }

        prepare_roots(root).await?;

        let report = self
            .run_batch(ctx, specs, PackageTarget::Live(root.packages_dir()))
            .await;
        commit(&store, &report).await?;

        tracing::info!(
            installed = report.success_count(),
            failed = report.failure_count(),
            "install finished"
        );
        Ok(report)
    }

    /// Refresh packages through the staging area, then promote them
    ///
    /// Phase 1 installs into staging and records the new versions. Phase 2
    /// replaces each live directory with its staged copy; packages that
    /// failed phase 1 keep their live copy and their recorded version.
    /// The staging root is removed afterwards.
    ///
    /// # Errors
    /// As for [`install`](Self::install). A `CommitFailed` error is returned
    /// before anything is promoted.
    pub async fn update(
        &self,
        ctx: &OperationContext,
        selection: Selection,
    ) -> LifecycleResult<UpdateReport> {
        if let Selection::Packages(specs) = &selection {
            check_names(specs)?;
        }
        let root = ctx.root();
        let store = root.store();
        let document = store.load().await?;

        let specs = match selection {
            Selection::All => recorded_names(&document)
                .into_iter()
                .map(DependencySpec::new)
                .collect(),
            Selection::Packages(specs) => specs,
        };
        if specs.is_empty() {
            tracing::info!("no dependencies to update");
            return Ok(UpdateReport::default());
        }

        prepare_roots(root).await?;
        let staging = StagingArea::new(root.staging_dir());

        let staged = self
            .run_batch(ctx, specs, PackageTarget::Staged(staging.clone()))
            .await;
        commit(&store, &staged).await?;

        let mut promotions = Vec::with_capacity(staged.outcomes.len());
        for outcome in &staged.outcomes {
            let package = outcome.spec.name().to_string();
            let result = if outcome.is_success() {
                let live = root.package_dir(&package);
                staging.promote(&package, &live).await.map(|()| live)
            } else {
                Err(PackageError::NotStaged {
                    package: package.clone(),
                })
            };

            match &result {
                Ok(_) => tracing::info!(package = %package, "package updated"),
                Err(e) if e.is_skip() => tracing::warn!(package = %package, "{e}"),
                Err(e) => tracing::error!(package = %package, error = %e, "promotion failed"),
            }
            promotions.push(PromotionOutcome { package, result });
        }

        let mut warnings = Vec::new();
        if let Err(e) = staging.clear().await {
            tracing::warn!(path = %staging.root().display(), error = %e, "cannot remove staging directory");
            warnings.push(format!(
                "cannot remove staging directory '{}': {e}",
                staging.root().display()
            ));
        }

        Ok(UpdateReport {
            staged,
            promotions,
            warnings,
        })
    }

    /// Remove packages and their `dependencies` entries
    ///
    /// Directory removal is best-effort; all entries are removed with one
    /// config update.
    ///
    /// # Errors
    /// - `LifecycleError::NoPackagesSpecified` for an empty explicit selection
    /// - `LifecycleError::InvalidSpec` if a target names no valid package
    /// - `LifecycleError::Config` if the document cannot be loaded
    /// - `LifecycleError::CommitFailed` if the config update fails
    pub async fn uninstall(
        &self,
        ctx: &OperationContext,
        selection: Selection,
    ) -> LifecycleResult<UninstallReport> {
        match &selection {
            Selection::Packages(specs) if specs.is_empty() => {
                return Err(LifecycleError::NoPackagesSpecified)
            }
            Selection::Packages(specs) => check_names(specs)?,
            Selection::All => {}
        }

        let root = ctx.root();
        let store = root.store();
        let document = store.load().await?;

        let names = match selection {
            Selection::All => recorded_names(&document),
            Selection::Packages(specs) => {
                let mut names: Vec<String> = Vec::with_capacity(specs.len());
                for spec in specs {
                    if !names.iter().any(|n| n == spec.name()) {
                        names.push(spec.name().to_string());
                    }
                }
                names
            }
        };

        let mut report = UninstallReport::default();
        for name in &names {
            let dir = root.package_dir(name);
            if let Err(e) = remove_dir_if_present(&dir).await {
                tracing::warn!(package = %name, path = %dir.display(), error = %e, "cannot remove package directory");
                report
                    .warnings
                    .push(format!("cannot remove '{}': {e}", dir.display()));
            }
        }

        let updates: Vec<_> = names
            .iter()
            .map(|name| {
                PathUpdate::remove(KeyPath::from_segments([keys::DEPENDENCIES, name.as_str()]))
            })
            .collect();
        store
            .update(&updates)
            .await
            .map_err(|source| LifecycleError::CommitFailed {
                packages: names.clone(),
                source,
            })?;

        tracing::info!(removed = names.len(), "uninstall finished");
        report.removed = names;
        Ok(report)
    }

    async fn run_batch(
        &self,
        ctx: &OperationContext,
        specs: Vec<DependencySpec>,
        target: PackageTarget,
    ) -> BatchReport {
        let specs = dedup_by_name(specs);
        let pool = if ctx.is_parallel() {
            WorkerPool::new(self.config.max_workers)
        } else {
            WorkerPool::sequential()
        };
        tracing::debug!(packages = specs.len(), workers = pool.max_workers(), "starting batch");

        let job = PackageJob {
            fetcher: Arc::clone(&self.fetcher),
            checkout: Arc::clone(&self.checkout),
            target,
            write_metadata: self.config.write_package_metadata,
        };
        let aggregator = BatchAggregator::new(&specs);
        let results = pool.run(specs, move |spec| job.clone().run(spec));
        aggregator.collect(results).await
    }
}

/// Where a batch places package content
#[derive(Debug, Clone)]
enum PackageTarget {
    /// Straight into the live package directory
    Live(PathBuf),
    /// Into the staging area, for later promotion
    Staged(StagingArea),
}

/// Per-package work, one instance per worker
#[derive(Clone)]
struct PackageJob {
    fetcher: Arc<dyn PackageFetcher>,
    checkout: Arc<dyn Checkout>,
    target: PackageTarget,
    write_metadata: bool,
}

impl PackageJob {
    async fn run(self, spec: DependencySpec) -> PackageOutcome {
        let mut warnings = Vec::new();
        let result = self.install(&spec, &mut warnings).await;
        if let Err(e) = &result {
            tracing::error!(package = %spec, error = %e, "package failed");
        }
        PackageOutcome {
            spec,
            result,
            warnings,
        }
    }

    async fn install(
        &self,
        spec: &DependencySpec,
        warnings: &mut Vec<String>,
    ) -> Result<InstalledPackage, PackageError> {
        let record = self
            .fetcher
            .fetch(spec)
            .await
            .map_err(|source| PackageError::FetchFailed {
                package: spec.to_string(),
                source,
            })?;
        tracing::debug!(package = %spec, version = %record.version, source = %record.source, "fetched");
        if let Some(canonical) = &record.canonical_name {
            if !canonical.is_empty() && record.usable_canonical_name().is_none() {
                tracing::warn!(package = %spec, canonical = %canonical, "ignoring invalid canonical name");
                warnings.push(format!(
                    "registry name '{canonical}' is not a valid package name, recorded as '{}'",
                    spec.name()
                ));
            }
        }

        let dir = match &self.target {
            PackageTarget::Live(packages) => packages.join(spec.name()),
            PackageTarget::Staged(staging) => {
                staging.discard(spec.name()).await?;
                staging.entry(spec.name())
            }
        };

        let existed = tokio::fs::try_exists(&dir).await.unwrap_or(false);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| PackageError::filesystem(&dir, FsOp::CreateDir, e))?;

        if let Err(source) = self.checkout.checkout(&record, &dir).await {
            if !existed {
                if let Err(e) = remove_dir_if_present(&dir).await {
                    tracing::warn!(path = %dir.display(), error = %e, "cannot clean up failed checkout");
                }
            }
            return Err(PackageError::CheckoutFailed {
                package: spec.to_string(),
                source,
            });
        }

        if self.write_metadata {
            if let Err(e) = write_metadata(&record, &dir).await {
                tracing::warn!(package = %spec, error = %e, "cannot write package metadata");
                warnings.push(e.to_string());
            }
        }

        tracing::info!(package = %spec, path = %dir.display(), "package checked out");
        Ok(InstalledPackage {
            spec: spec.clone(),
            key: record.dependency_key().to_string(),
            version: record.version,
            dir,
        })
    }
}

async fn write_metadata(record: &PackageRecord, dir: &std::path::Path) -> Result<(), PackageError> {
    let path = dir.join(PACKAGE_METADATA_FILE);
    let mut text = serde_json::to_string_pretty(record)
        .map_err(|e| PackageError::filesystem(&path, FsOp::WriteFile, e.into()))?;
    text.push('\n');
    tokio::fs::write(&path, text)
        .await
        .map_err(|e| PackageError::filesystem(&path, FsOp::WriteFile, e))
}

/// Specs for every recorded dependency with a string version
fn recorded_specs(document: &ConfigDocument) -> Vec<DependencySpec> {
    let Some(entries) = document.dependency_entries() else {
        return Vec::new();
    };
    entries
        .iter()
        .filter(|(name, _)| usable_name(name))
        .filter_map(|(name, version)| match version.as_str() {
            Some(version) => Some(DependencySpec::from_recorded(name, version)),
            None => {
                tracing::warn!(package = %name, found = version.kind(), "skipping dependency with non-string version");
                None
            }
        })
        .collect()
}

/// Reject explicit targets that cannot name a package directory
fn check_names(specs: &[DependencySpec]) -> LifecycleResult<()> {
    match specs.iter().find(|spec| !is_valid_package_name(spec.name())) {
        Some(spec) => Err(SpecError::InvalidName(spec.name().to_string()).into()),
        None => Ok(()),
    }
}

/// Check a name read from the document, warning when it is unusable
fn usable_name(name: &str) -> bool {
    let usable = is_valid_package_name(name);
    if !usable {
        tracing::warn!(package = %name, "skipping dependency with invalid package name");
    }
    usable
}

/// Recorded dependency names that are valid package names
fn recorded_names(document: &ConfigDocument) -> Vec<String> {
    document
        .dependency_names()
        .into_iter()
        .filter(|name| usable_name(name))
        .collect()
}

/// One spec per package name; a later spec replaces an earlier one in place
fn dedup_by_name(specs: Vec<DependencySpec>) -> Vec<DependencySpec> {
    let mut unique: Vec<DependencySpec> = Vec::with_capacity(specs.len());
    for spec in specs {
        match unique.iter_mut().find(|s| s.name() == spec.name()) {
            Some(existing) => {
                tracing::debug!(package = %spec, replaces = %existing, "duplicate package target");
                *existing = spec;
            }
            None => unique.push(spec),
        }
    }
    unique
}

async fn prepare_roots(root: &ProjectRoot) -> LifecycleResult<()> {
    let packages = root.packages_dir();
    tokio::fs::create_dir_all(&packages)
        .await
        .map_err(|e| LifecycleError::filesystem(&packages, FsOp::CreateDir, e))?;
    StagingArea::new(root.staging_dir()).ensure().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{CheckoutError, FetchError};
    use async_trait::async_trait;
    use std::path::Path;

    struct StaticFetcher;

    #[async_trait]
    impl PackageFetcher for StaticFetcher {
        async fn fetch(&self, spec: &DependencySpec) -> Result<PackageRecord, FetchError> {
            if spec.name() == "missing" {
                return Err(FetchError::NotFound(spec.to_string()));
            }
            let version = spec.version().unwrap_or("9.9").to_string();
            Ok(PackageRecord::new(spec.name(), version, format!("mem://{}", spec.name())))
        }
    }

    struct TouchCheckout;

    #[async_trait]
    impl Checkout for TouchCheckout {
        async fn checkout(&self, record: &PackageRecord, target: &Path) -> Result<(), CheckoutError> {
            let path = target.join("init.lua");
            tokio::fs::write(&path, &record.version)
                .await
                .map_err(|source| CheckoutError::Io { path, source })
        }
    }

    fn manager() -> PackageLifecycleManager {
        PackageLifecycleManager::new(Arc::new(StaticFetcher), Arc::new(TouchCheckout))
    }

    async fn project(deps: serde_json::Value) -> (tempfile::TempDir, OperationContext) {
        let dir = tempfile::tempdir().unwrap();
        let doc = serde_json::json!({ "dependencies": deps });
        tokio::fs::write(dir.path().join("nebula-config.json"), doc.to_string())
            .await
            .unwrap();
        let ctx = OperationContext::new(ProjectRoot::new(dir.path()));
        (dir, ctx)
    }

    #[tokio::test]
    async fn install_records_and_places_package() {
        let (_dir, ctx) = project(serde_json::json!({})).await;
        let report = manager()
            .install(&ctx, vec![DependencySpec::with_version("foo", "1.2")])
            .await
            .unwrap();

        assert!(report.is_complete());
        let pkg = ctx.root().package_dir("foo");
        assert!(pkg.join("init.lua").is_file());
        assert!(pkg.join(PACKAGE_METADATA_FILE).is_file());

        let document = ctx.root().store().load().await.unwrap();
        assert_eq!(document.dependencies().get("foo").map(String::as_str), Some("1.2"));
    }

    #[tokio::test]
    async fn install_without_specs_uses_recorded_versions() {
        let (_dir, ctx) = project(serde_json::json!({"foo": "v1.0", "bad": 3})).await;
        let report = manager().install(&ctx, Vec::new()).await.unwrap();

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].spec.to_string(), "foo::1.0");
    }

    #[tokio::test]
    async fn install_with_nothing_recorded_is_noop() {
        let (_dir, ctx) = project(serde_json::json!({})).await;
        let report = manager().install(&ctx, Vec::new()).await.unwrap();
        assert!(report.is_empty());
        assert!(!ctx.root().packages_dir().exists());
    }

    #[tokio::test]
    async fn metadata_file_can_be_disabled() {
        let (_dir, ctx) = project(serde_json::json!({})).await;
        let manager = manager().with_config(LifecycleConfig::new().with_package_metadata(false));
        manager
            .install(&ctx, vec![DependencySpec::new("foo")])
            .await
            .unwrap();
        assert!(!ctx
            .root()
            .package_dir("foo")
            .join(PACKAGE_METADATA_FILE)
            .exists());
    }

    #[tokio::test]
    async fn failed_fetch_creates_no_directory() {
        let (_dir, ctx) = project(serde_json::json!({})).await;
        let report = manager()
            .install(&ctx, vec![DependencySpec::new("missing")])
            .await
            .unwrap();

        assert_eq!(report.failure_count(), 1);
        assert!(!ctx.root().package_dir("missing").exists());
    }

    #[tokio::test]
    async fn uninstall_empty_selection_fails() {
        let (_dir, ctx) = project(serde_json::json!({})).await;
        let err = manager()
            .uninstall(&ctx, Selection::Packages(Vec::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::NoPackagesSpecified));
    }

    #[test]
    fn recorded_specs_skip_non_strings() {
        let document = ConfigDocument::from_value(
            serde_json::json!({"dependencies": {"a": "v2", "b": {"x": 1}}}).into(),
        )
        .unwrap();
        let specs = recorded_specs(&document);
        assert_eq!(specs, vec![DependencySpec::with_version("a", "2")]);
    }
}
