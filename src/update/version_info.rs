//! Release information from the package index
//!
//! This module provides the ReleaseInfo struct that represents
//! a released version of a package with its upload time.

use chrono::{DateTime, Utc};
use pep508_rs::pep440_rs::Version;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// A released version of a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    /// The version string as published (e.g., "1.2.3")
    pub version: String,
    /// Earliest upload time of the release's files
    pub released_at: Option<DateTime<Utc>>,
}

impl ReleaseInfo {
    pub fn new(version: impl Into<String>, released_at: Option<DateTime<Utc>>) -> Self {
        Self {
            version: version.into(),
            released_at,
        }
    }

    /// Returns true for pre-releases and development releases
    pub fn is_prerelease(&self) -> bool {
        is_prerelease_version(&self.version)
    }
}

impl Ord for ReleaseInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_versions(&self.version, &other.version)
    }
}

impl PartialOrd for ReleaseInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compares two version strings with PEP 440 ordering.
///
/// Unparseable versions sort below every parseable one.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (Version::from_str(a), Version::from_str(b)) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => Ordering::Greater,
        (Err(_), Ok(_)) => Ordering::Less,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Returns true if the version is a PEP 440 pre-release or development release
pub fn is_prerelease_version(version: &str) -> bool {
    Version::from_str(version)
        .map(|v| v.is_pre() || v.is_dev())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_release_info_new() {
        let date = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let info = ReleaseInfo::new("1.2.3", Some(date));
        assert_eq!(info.version, "1.2.3");
        assert_eq!(info.released_at, Some(date));
    }

    #[test]
    fn test_compare_versions_numeric() {
        assert_eq!(compare_versions("1.10.0", "1.9.0"), Ordering::Greater);
        assert_eq!(compare_versions("0.13", "0.9.1"), Ordering::Greater);
        assert_eq!(compare_versions("1.0", "1.0.0"), Ordering::Equal);
    }

    #[test]
    fn test_compare_versions_pep440() {
        assert_eq!(compare_versions("1.0rc1", "1.0"), Ordering::Less);
        assert_eq!(compare_versions("1.0.post1", "1.0"), Ordering::Greater);
        assert_eq!(compare_versions("1!0.1", "2.0"), Ordering::Greater);
    }

    #[test]
    fn test_compare_versions_unparseable_sorts_low() {
        assert_eq!(compare_versions("not-a-version", "0.0.1"), Ordering::Less);
    }

    #[test]
    fn test_is_prerelease_version() {
        assert!(is_prerelease_version("2.0.0a1"));
        assert!(is_prerelease_version("2.0.0b2"));
        assert!(is_prerelease_version("2.0.0rc1"));
        assert!(is_prerelease_version("2.0.0.dev3"));
        assert!(!is_prerelease_version("2.0.0"));
        assert!(!is_prerelease_version("2.0.0.post1"));
    }

    #[test]
    fn test_release_info_ordering() {
        let mut releases = vec![
            ReleaseInfo::new("1.9.0", None),
            ReleaseInfo::new("1.10.0", None),
            ReleaseInfo::new("1.2.0", None),
        ];
        releases.sort();
        assert_eq!(releases.last().unwrap().version, "1.10.0");
    }
}
