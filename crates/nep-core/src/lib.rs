//! nep-core - Package lifecycle for Nebula Pack
//!
//! Drives install, update, and uninstall batches against a project:
//! - Per-package fetch and checkout on a bounded [`WorkerPool`]
//! - Staged updates promoted over the live copy
//! - One serialized config update per batch, built by a single aggregator
//!
//! Network and version control access stay behind the [`PackageFetcher`]
//! and [`Checkout`] traits.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use nep_core::{DependencySpec, OperationContext, PackageLifecycleManager};
//!
//! # async fn example(fetcher: Arc<dyn nep_core::PackageFetcher>, checkout: Arc<dyn nep_core::Checkout>)
//! #     -> Result<(), Box<dyn std::error::Error>> {
//! let root = nep_config::ProjectLocator::from_current_dir()?.locate()?;
//! let manager = PackageLifecycleManager::new(fetcher, checkout);
//!
//! let ctx = OperationContext::new(root).parallel(true);
//! let report = manager.install(&ctx, vec!["json::1.2".parse()?]).await?;
//! println!("installed {} package(s)", report.success_count());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod aggregate;
pub mod context;
pub mod error;
pub mod fetcher;
pub mod lifecycle;
pub mod pool;
pub mod record;
pub mod report;
pub mod spec;
pub mod staging;

pub use aggregate::BatchAggregator;
pub use context::{LifecycleConfig, OperationContext};
pub use error::{FsOp, LifecycleError, LifecycleResult, PackageError, SpecError};
pub use fetcher::{Checkout, CheckoutError, FetchError, PackageFetcher};
pub use lifecycle::PackageLifecycleManager;
pub use pool::{Completed, WorkerPool};
pub use record::PackageRecord;
pub use report::{
    BatchReport, InstalledPackage, PackageOutcome, PromotionOutcome, UninstallReport, UpdateReport,
};
pub use spec::{is_valid_package_name, DependencySpec, Selection};
pub use staging::StagingArea;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving the lifecycle
    pub use crate::{
        Checkout, DependencySpec, LifecycleConfig, OperationContext, PackageFetcher,
        PackageLifecycleManager, PackageRecord, Selection,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
