//! PyPI JSON API adapter
//!
//! Fetches package release information from PyPI.
//! API endpoint: https://pypi.org/pypi/{package}/json

use crate::error::RegistryError;
use crate::registry::{HttpClient, PackageIndex};
use crate::update::ReleaseInfo;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pep508_rs::pep440_rs::{Version, VersionSpecifiers};
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, warn};

/// PyPI API base URL
const PYPI_API_URL: &str = "https://pypi.org/pypi";

/// PyPI index
pub struct PyPIIndex {
    client: HttpClient,
    base_url: String,
}

/// PyPI package metadata response
#[derive(Debug, Deserialize)]
struct PyPIResponse {
    /// Release files keyed by version
    releases: HashMap<String, Vec<ReleaseFile>>,
}

/// Release file information
#[derive(Debug, Deserialize)]
struct ReleaseFile {
    /// Upload time for the release file
    upload_time_iso_8601: Option<String>,
    #[serde(default)]
    yanked: bool,
    requires_python: Option<String>,
}

impl PyPIIndex {
    /// Create a new PyPI index adapter
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            base_url: PYPI_API_URL.to_string(),
        }
    }

    /// Use a different JSON API root, e.g. a PyPI mirror
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build the URL for a package
    fn build_url(&self, package: &str) -> String {
        format!("{}/{}/json", self.base_url, package)
    }
}

#[async_trait]
impl PackageIndex for PyPIIndex {
    fn index_name(&self) -> &'static str {
        "PyPI"
    }

    async fn fetch_releases(
        &self,
        package: &str,
        python_version: Option<&str>,
    ) -> Result<Vec<ReleaseInfo>, RegistryError> {
        let url = self.build_url(package);
        debug!("Fetching {}", url);
        let response: PyPIResponse = self
            .client
            .get_json(&url, package, self.index_name())
            .await?;

        let python_version = python_version
            .map(Version::from_str)
            .transpose()
            .map_err(|e| {
                RegistryError::invalid_response(
                    package,
                    self.index_name(),
                    format!("invalid Python version: {}", e),
                )
            })?;

        Ok(usable_releases(response, python_version.as_ref()))
    }
}

/// Releases with a valid version, a non-yanked file and a `requires_python`
/// admitting `python_version`, sorted ascending
fn usable_releases(response: PyPIResponse, python_version: Option<&Version>) -> Vec<ReleaseInfo> {
    let mut releases: Vec<ReleaseInfo> = response
        .releases
        .into_iter()
        .filter(|(version, _)| Version::from_str(version).is_ok())
        .filter_map(|(version, files)| {
            let files: Vec<ReleaseFile> = files.into_iter().filter(|f| !f.yanked).collect();
            if files.is_empty() {
                return None;
            }
            if let Some(python) = python_version {
                if !supports_python(&version, &files, python) {
                    debug!("Release {} does not support Python {}", version, python);
                    return None;
                }
            }
            let released_at = files
                .iter()
                .filter_map(|f| f.upload_time_iso_8601.as_deref())
                .filter_map(|t| t.parse::<DateTime<Utc>>().ok())
                .min();
            Some(ReleaseInfo::new(version, released_at))
        })
        .collect();

    releases.sort();
    releases
}

fn supports_python(version: &str, files: &[ReleaseFile], python: &Version) -> bool {
    let Some(requires) = files
        .iter()
        .find_map(|f| f.requires_python.as_deref().filter(|r| !r.trim().is_empty()))
    else {
        return true;
    };

    let Ok(specifiers) = VersionSpecifiers::from_str(requires).inspect_err(|e| {
        warn!(
            "Ignoring invalid requires_python '{}' of release {}: {}",
            requires, version, e
        )
    }) else {
        return true;
    };

    specifiers.contains(python)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> PyPIIndex {
        PyPIIndex::new(HttpClient::new().unwrap())
    }

    fn response(json: &str) -> PyPIResponse {
        serde_json::from_str(json).unwrap()
    }

    const RESPONSE: &str = r#"{
        "info": {"name": "sample"},
        "releases": {
            "1.0.0": [
                {"upload_time_iso_8601": "2023-01-02T10:00:00.000000Z", "yanked": false, "requires_python": ">=3.7"},
                {"upload_time_iso_8601": "2023-01-01T10:00:00.000000Z", "yanked": false, "requires_python": ">=3.7"}
            ],
            "1.1.0": [
                {"upload_time_iso_8601": "2023-06-01T10:00:00.000000Z", "yanked": true, "requires_python": ">=3.7"}
            ],
            "2.0.0": [
                {"upload_time_iso_8601": "2024-01-01T10:00:00.000000Z", "yanked": false, "requires_python": ">=3.10"}
            ],
            "2.1.0b1": [
                {"upload_time_iso_8601": "2024-02-01T10:00:00.000000Z", "yanked": false, "requires_python": null}
            ],
            "0.9": [],
            "not a version": [
                {"upload_time_iso_8601": "2020-01-01T10:00:00.000000Z", "yanked": false, "requires_python": null}
            ]
        }
    }"#;

    fn versions(releases: &[ReleaseInfo]) -> Vec<&str> {
        releases.iter().map(|r| r.version.as_str()).collect()
    }

    #[test]
    fn test_pypi_index_name() {
        assert_eq!(index().index_name(), "PyPI");
    }

    #[test]
    fn test_build_url() {
        assert_eq!(
            index().build_url("requests"),
            "https://pypi.org/pypi/requests/json"
        );
    }

    #[test]
    fn test_build_url_with_base_url() {
        let index = index().with_base_url("http://localhost:8080/pypi/");
        assert_eq!(
            index.build_url("flask-restful"),
            "http://localhost:8080/pypi/flask-restful/json"
        );
    }

    #[test]
    fn test_usable_releases_without_python_version() {
        let releases = usable_releases(response(RESPONSE), None);
        assert_eq!(versions(&releases), vec!["1.0.0", "2.0.0", "2.1.0b1"]);
    }

    #[test]
    fn test_usable_releases_filters_by_python_version() {
        let python = Version::from_str("3.8").unwrap();
        let releases = usable_releases(response(RESPONSE), Some(&python));
        assert_eq!(versions(&releases), vec!["1.0.0", "2.1.0b1"]);
    }

    #[test]
    fn test_usable_releases_earliest_upload_time() {
        let releases = usable_releases(response(RESPONSE), None);
        let expected: DateTime<Utc> = "2023-01-01T10:00:00Z".parse().unwrap();
        assert_eq!(releases[0].released_at, Some(expected));
    }

    #[test]
    fn test_invalid_requires_python_is_ignored() {
        let json = r#"{"releases": {"1.0": [
            {"upload_time_iso_8601": null, "yanked": false, "requires_python": ">=3.x"}
        ]}}"#;
        let python = Version::from_str("3.8").unwrap();
        let releases = usable_releases(response(json), Some(&python));
        assert_eq!(versions(&releases), vec!["1.0"]);
        assert_eq!(releases[0].released_at, None);
    }
}
