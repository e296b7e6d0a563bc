//! nep-remote - Network and version control collaborators
//!
//! Concrete implementations of the `nep-core` collaborator traits:
//! - [`RegistryFetcher`]: package metadata from the HTTP registry
//! - [`GitCheckout`]: package content via `git clone`

#![warn(unreachable_pub)]

pub mod error;
pub mod git;
pub mod registry;

pub use error::RemoteError;
pub use git::GitCheckout;
pub use registry::{RegistryConfig, RegistryFetcher, DEFAULT_REGISTRY_URL, REGISTRY_URL_ENV};
