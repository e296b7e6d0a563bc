//! Single-writer aggregation of worker results
//!
//! Workers only produce [`PackageOutcome`]s. The aggregator is the one
//! consumer of the result stream: it puts outcomes back in submission order,
//! turns the successes into `dependencies` updates, and commits them with a
//! single store update. No update from a successful package can be lost to
//! an interleaving of workers, because workers never write the document.

use nep_config::layout::keys;
use nep_config::{ConfigStore, KeyPath, PathUpdate};
use tokio::sync::mpsc;

use crate::error::{LifecycleError, LifecycleResult, PackageError};
use crate::pool::Completed;
use crate::report::{BatchReport, PackageOutcome};
use crate::spec::DependencySpec;

/// Collects one batch's outcomes
#[derive(Debug)]
pub struct BatchAggregator {
    specs: Vec<DependencySpec>,
    slots: Vec<Option<PackageOutcome>>,
}

impl BatchAggregator {
    /// Aggregator expecting one outcome per spec
    #[must_use]
    pub fn new(specs: &[DependencySpec]) -> Self {
        Self {
            specs: specs.to_vec(),
            slots: specs.iter().map(|_| None).collect(),
        }
    }

    /// Record one outcome; out-of-range or repeated indices are ignored
    pub fn accept(&mut self, completed: Completed<PackageOutcome>) {
        let Some(slot) = self.slots.get_mut(completed.index) else {
            tracing::warn!(index = completed.index, "outcome for unknown package ignored");
            return;
        };
        if slot.is_some() {
            tracing::warn!(index = completed.index, "duplicate outcome ignored");
            return;
        }
        *slot = Some(completed.output);
    }

    /// Drain the result stream and build the report
    pub async fn collect(
        mut self,
        mut results: mpsc::Receiver<Completed<PackageOutcome>>,
    ) -> BatchReport {
        while let Some(completed) = results.recv().await {
            self.accept(completed);
        }
        self.finish()
    }

    /// Build the report; packages without an outcome count as interrupted
    #[must_use]
    pub fn finish(self) -> BatchReport {
        let outcomes = self
            .specs
            .into_iter()
            .zip(self.slots)
            .map(|(spec, slot)| {
                slot.unwrap_or_else(|| PackageOutcome {
                    result: Err(PackageError::Interrupted {
                        package: spec.name().to_string(),
                    }),
                    spec,
                    warnings: Vec::new(),
                })
            })
            .collect();
        BatchReport { outcomes }
    }
}

/// `dependencies.<key> = version` for every installed package
#[must_use]
pub fn dependency_updates(report: &BatchReport) -> Vec<PathUpdate> {
    report
        .installed()
        .map(|pkg| {
            PathUpdate::set(
                KeyPath::from_segments([keys::DEPENDENCIES, pkg.key.as_str()]),
                pkg.version.as_str(),
            )
        })
        .collect()
}

/// Record every installed package with one store update
///
/// # Errors
/// `LifecycleError::CommitFailed` naming the packages that went unrecorded.
pub async fn commit(store: &ConfigStore, report: &BatchReport) -> LifecycleResult<()> {
    let updates = dependency_updates(report);
    if updates.is_empty() {
        return Ok(());
    }

    store
        .update(&updates)
        .await
        .map_err(|source| LifecycleError::CommitFailed {
            packages: report.installed().map(|p| p.key.clone()).collect(),
            source,
        })
}
