//! Batch results
//!
//! Per-package failures never abort a batch; they are collected here and
//! returned alongside the successes.

use std::path::PathBuf;

use crate::error::PackageError;
use crate::spec::DependencySpec;

/// A package that was fetched, checked out, and recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    /// Spec the package was requested with
    pub spec: DependencySpec,
    /// Key written under `dependencies`
    pub key: String,
    /// Resolved version
    pub version: String,
    /// Directory the content was placed in
    pub dir: PathBuf,
}

/// Outcome of one package in an install batch
#[derive(Debug)]
pub struct PackageOutcome {
    /// Requested spec
    pub spec: DependencySpec,
    /// Installed package, or why it failed
    pub result: Result<InstalledPackage, PackageError>,
    /// Non-fatal problems met along the way
    pub warnings: Vec<String>,
}

impl PackageOutcome {
    /// Check if the package was installed
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcomes of an install batch, in submission order
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One entry per requested spec
    pub outcomes: Vec<PackageOutcome>,
}

impl BatchReport {
    /// Installed packages
    pub fn installed(&self) -> impl Iterator<Item = &InstalledPackage> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    /// Failed packages with their errors
    pub fn failures(&self) -> impl Iterator<Item = (&DependencySpec, &PackageError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (&o.spec, e)))
    }

    /// Number of installed packages
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.installed().count()
    }

    /// Number of failed packages
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }

    /// Check if every package succeeded
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(PackageOutcome::is_success)
    }

    /// Check if nothing was requested
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Outcome of promoting one staged package
#[derive(Debug)]
pub struct PromotionOutcome {
    /// Package directory name
    pub package: String,
    /// Live directory on success
    pub result: Result<PathBuf, PackageError>,
}

/// Result of an update: the staging batch and the promotions
#[derive(Debug, Default)]
pub struct UpdateReport {
    /// Phase 1 outcomes (fetch and checkout into staging)
    pub staged: BatchReport,
    /// Phase 2 outcomes, one per package attempted
    pub promotions: Vec<PromotionOutcome>,
    /// Problems that did not fail any package
    pub warnings: Vec<String>,
}

impl UpdateReport {
    /// Packages now live with fresh content
    pub fn promoted(&self) -> impl Iterator<Item = &str> {
        self.promotions
            .iter()
            .filter(|p| p.result.is_ok())
            .map(|p| p.package.as_str())
    }

    /// Check if every package was staged and promoted
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.staged.is_complete() && self.promotions.iter().all(|p| p.result.is_ok())
    }
}

/// Result of an uninstall
#[derive(Debug, Default)]
pub struct UninstallReport {
    /// Dependency names removed from the document
    pub removed: Vec<String>,
    /// Directory removal problems (not fatal)
    pub warnings: Vec<String>,
}
