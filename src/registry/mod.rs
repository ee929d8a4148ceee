//! Package index adapters for fetching release information
//!
//! This module provides:
//! - HTTP client shared foundation with retry logic
//! - PyPI JSON API adapter

mod client;
mod pypi;

pub use client::HttpClient;
pub use pypi::PyPIIndex;

use crate::error::RegistryError;
use crate::update::ReleaseInfo;
use async_trait::async_trait;

/// Trait for package index adapters
#[async_trait]
pub trait PackageIndex: Send + Sync {
    /// Get the index name
    fn index_name(&self) -> &'static str;

    /// Fetch the releases of a package that are installable on `python_version`.
    ///
    /// Yanked releases and versions that are not valid PEP 440 are left out.
    /// Pre-releases are included.
    async fn fetch_releases(
        &self,
        package: &str,
        python_version: Option<&str>,
    ) -> Result<Vec<ReleaseInfo>, RegistryError>;
}
