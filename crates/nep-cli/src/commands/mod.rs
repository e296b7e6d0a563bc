//! Subcommand handlers

pub(crate) mod init;
pub(crate) mod install;
pub(crate) mod list;
pub(crate) mod uninstall;
pub(crate) mod update;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use nep_config::{ProjectLocator, ProjectRoot};
use nep_core::{LifecycleConfig, OperationContext, PackageLifecycleManager};
use nep_remote::{GitCheckout, RegistryConfig, RegistryFetcher};

use crate::cli::{BatchOptions, GlobalOptions};

/// Directory project discovery starts from
pub(crate) fn start_dir(global: &GlobalOptions) -> Result<PathBuf> {
    match &global.path {
        Some(path) => Ok(path.clone()),
        None => std::env::current_dir().context("cannot determine current directory"),
    }
}

/// Find the enclosing project
pub(crate) fn locate(global: &GlobalOptions) -> Result<ProjectRoot> {
    let root = ProjectLocator::new(start_dir(global)?).locate()?;
    tracing::debug!(root = %root.dir().display(), "using project");
    Ok(root)
}

/// Lifecycle manager wired to the registry and git
pub(crate) fn manager(
    global: &GlobalOptions,
    batch: BatchOptions,
) -> Result<PackageLifecycleManager> {
    let fetcher = RegistryFetcher::new(RegistryConfig::new().with_base_url(&global.registry))?;
    let checkout = GitCheckout::new().verbose(global.verbose);
    let config = LifecycleConfig::new().with_max_workers(batch.jobs);
    Ok(PackageLifecycleManager::new(Arc::new(fetcher), Arc::new(checkout)).with_config(config))
}

/// Request context for one lifecycle call
pub(crate) fn context(root: ProjectRoot, batch: BatchOptions) -> OperationContext {
    OperationContext::new(root).parallel(batch.parallel)
}
