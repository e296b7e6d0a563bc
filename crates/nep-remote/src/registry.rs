//! HTTP package registry
//!
//! `GET {base}/api/{name}` resolves the latest version,
//! `GET {base}/api/{name}:v{version}` a pinned one. The response is
//! `{ "data": { "github_url", "version", ... }, "key": "<canonical name>" }`;
//! an empty `key` means the requested name is canonical.

use std::time::Duration;

use async_trait::async_trait;
use nep_core::{DependencySpec, FetchError, PackageFetcher, PackageRecord};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::RemoteError;

/// Registry used when none is configured
pub const DEFAULT_REGISTRY_URL: &str = "http://127.0.0.1:8090";

/// Environment variable overriding the registry URL
pub const REGISTRY_URL_ENV: &str = "NEP_REGISTRY_URL";

/// Registry connection settings
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Base URL, without the `/api` suffix
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl RegistryConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With base URL
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REGISTRY_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RegistryResponse {
    data: RegistryPackage,
    #[serde(default)]
    key: String,
}

#[derive(Debug, Deserialize)]
struct RegistryPackage {
    #[serde(default)]
    github_url: String,
    #[serde(default)]
    version: String,
}

/// [`PackageFetcher`] backed by the HTTP registry
#[derive(Debug, Clone)]
pub struct RegistryFetcher {
    http: Client,
    base: Url,
    config: RegistryConfig,
}

impl RegistryFetcher {
    /// Create fetcher
    ///
    /// # Errors
    /// - `RemoteError::InvalidBaseUrl` if the base URL does not parse or
    ///   cannot carry a path
    /// - `RemoteError::Client` if the HTTP client cannot be built
    pub fn new(config: RegistryConfig) -> Result<Self, RemoteError> {
        let invalid = |message: String| RemoteError::InvalidBaseUrl {
            url: config.base_url.clone(),
            message,
        };
        let base = Url::parse(&config.base_url).map_err(|e| invalid(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(invalid("URL cannot have a path".to_string()));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("nep/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(RemoteError::Client)?;
        Ok(Self { http, base, config })
    }

    /// Settings in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Lookup URL for `spec`
    ///
    /// The package segment is percent-encoded, so a name cannot add path
    /// segments, a query or a fragment.
    #[must_use]
    pub fn package_url(&self, spec: &DependencySpec) -> Url {
        let package = match spec.version() {
            Some(version) => format!("{}:v{version}", spec.name()),
            None => spec.name().to_string(),
        };
        let mut url = self.base.clone();
        // `new` rejected cannot-be-a-base URLs, so this always applies.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("api").push(&package);
        }
        url
    }
}

#[async_trait]
impl PackageFetcher for RegistryFetcher {
    async fn fetch(&self, spec: &DependencySpec) -> Result<PackageRecord, FetchError> {
        let url = self.package_url(spec).to_string();
        tracing::debug!(package = %spec, url = %url, "querying registry");

        let response = self
            .http
            .get(url.as_str())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(spec.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body: JsonValue = response
            .json()
            .await
            .map_err(|e| FetchError::InvalidResponse {
                url: url.clone(),
                message: e.to_string(),
            })?;
        record_from_response(spec, &url, body)
    }
}

/// Map a registry response body to a record
fn record_from_response(
    spec: &DependencySpec,
    url: &str,
    body: JsonValue,
) -> Result<PackageRecord, FetchError> {
    let invalid = |message: String| FetchError::InvalidResponse {
        url: url.to_string(),
        message,
    };

    let response = RegistryResponse::deserialize(&body).map_err(|e| invalid(e.to_string()))?;
    if response.data.github_url.is_empty() {
        return Err(invalid("missing data.github_url".to_string()));
    }
    if response.data.version.is_empty() {
        return Err(invalid("missing data.version".to_string()));
    }
    if response.data.github_url.starts_with('-') {
        return Err(invalid(format!(
            "data.github_url '{}' looks like a command line option",
            response.data.github_url
        )));
    }

    let mut record = PackageRecord::new(spec.name(), response.data.version, response.data.github_url);
    if !response.key.is_empty() {
        record = record.with_canonical_name(response.key);
    }
    Ok(record.with_raw(body))
}
