//! Lifecycle configuration and per-call context

use nep_config::ProjectRoot;

/// Manager-wide settings
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Concurrency bound for parallel batches
    pub max_workers: usize,
    /// Write the fetched record into each package directory
    pub write_package_metadata: bool,
}

impl LifecycleConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With concurrency bound (minimum 1)
    #[inline]
    #[must_use]
    pub fn with_max_workers(mut self, max: usize) -> Self {
        self.max_workers = max.max(1);
        self
    }

    /// With or without the per-package metadata file
    #[inline]
    #[must_use]
    pub fn with_package_metadata(mut self, enabled: bool) -> Self {
        self.write_package_metadata = enabled;
        self
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            max_workers: 8,
            write_package_metadata: true,
        }
    }
}

/// Explicit request context for one lifecycle call
///
/// Carries what would otherwise be process-global command state.
#[derive(Debug, Clone)]
pub struct OperationContext {
    root: ProjectRoot,
    parallel: bool,
}

impl OperationContext {
    /// Sequential operation on `root`
    #[inline]
    #[must_use]
    pub fn new(root: ProjectRoot) -> Self {
        Self {
            root,
            parallel: false,
        }
    }

    /// Run per-package work in parallel
    #[inline]
    #[must_use]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Project root
    #[inline]
    #[must_use]
    pub fn root(&self) -> &ProjectRoot {
        &self.root
    }

    /// Check if per-package work may run in parallel
    #[inline]
    #[must_use]
    pub fn is_parallel(&self) -> bool {
        self.parallel
    }
}
