//! nep-config - Project configuration for Nebula Pack
//!
//! A nep project is a directory holding a marker file
//! (`nebula-config.json`). This crate provides:
//! - Discovery of the project root from any directory inside it
//! - A path-addressed document model with set/remove updates
//! - A store that reads and rewrites the marker file as a whole, with all
//!   in-process writers serialized
//! - Scaffolding of new projects
//!
//! # Example
//!
//! ```rust,ignore
//! use nep_config::{KeyPath, PathUpdate, ProjectLocator};
//!
//! # async fn example() -> Result<(), nep_config::ConfigError> {
//! let root = ProjectLocator::from_current_dir()?.locate()?;
//! let store = root.store();
//!
//! store.update(&[PathUpdate::set(["dependencies", "json"], "1.2")]).await?;
//! let version = store.read_one(&KeyPath::from(["dependencies", "json"])).await?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod document;
pub mod error;
pub mod layout;
pub mod locator;
pub mod path;
pub mod scaffold;
pub mod store;
pub mod update;
pub mod value;

pub use document::ConfigDocument;
pub use error::{ConfigError, ConfigResult};
pub use locator::{ProjectLocator, ProjectRoot};
pub use path::KeyPath;
pub use scaffold::{init_project, InitOptions};
pub use store::ConfigStore;
pub use update::{PathUpdate, UpdateOp};
pub use value::{ConfigMap, ConfigValue};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
