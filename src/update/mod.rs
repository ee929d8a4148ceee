//! Update judgment logic for dependencies
//!
//! This module provides:
//! - Release info from the package index with upload time
//! - Extension of specifier sets to admit a newer version
//! - Selection of the Python version used for index queries
//! - Update judgment engine that decides whether to update or skip

mod python_version;
mod specifier_updater;
mod version_info;

pub use python_version::{min_max_python_version, python_version_for_marker};
pub use specifier_updater::{update_specifier_set, SpecifierUpdate};
pub use version_info::{compare_versions, is_prerelease_version, ReleaseInfo};

use crate::domain::{DependencyLine, SemanticVersion, SkipReason, UpdateResult};
use crate::error::{AppError, RegistryError};
use crate::ignore::{create_ignore_rules, should_ignore, IgnoreRules, ParsedRules};
use tracing::{debug, info};

/// Update judgment engine that decides whether to update a dependency
pub struct UpdateJudge {
    /// Rules from `--ignore` options
    ignore_rules: IgnoreRules,
}

impl UpdateJudge {
    /// Create a new UpdateJudge with the given ignore rules
    pub fn new(ignore_rules: IgnoreRules) -> Self {
        Self { ignore_rules }
    }

    /// Check if a dependency needs an index lookup at all
    /// Returns Some(SkipReason) if it should be skipped, None if it should be processed
    pub fn should_skip(&self, dependency: &DependencyLine) -> Option<SkipReason> {
        if dependency.is_url_pinned() {
            return Some(SkipReason::PinnedToUrl);
        }

        if !dependency.is_version_restricted() {
            return Some(SkipReason::NotVersionRestricted);
        }

        None
    }

    /// Judge whether to update a dependency given the releases available for it
    pub fn judge(
        &self,
        dependency: &DependencyLine,
        releases: &[ReleaseInfo],
    ) -> Result<UpdateResult, AppError> {
        if let Some(reason) = self.should_skip(dependency) {
            return Ok(UpdateResult::skip(dependency.clone(), reason));
        }

        // Only stable releases are update candidates
        let latest = releases
            .iter()
            .filter(|r| !r.is_prerelease())
            .max()
            .ok_or_else(|| RegistryError::no_suitable_version(&dependency.name, "the index"))?;
        debug!(
            "Latest release of {} is {}",
            dependency.display_name(),
            latest.version
        );

        let current = dependency.current_version.as_deref().unwrap_or_default();

        if let Some(rules) = self.ignore_rules.rules_for(&dependency.name)? {
            debug!("Ignore rules for {}: {}", dependency.name, rules);
            if should_ignore(current, &latest.version, &rules)? {
                info!(
                    "Ignoring {} {} due to --ignore rules",
                    dependency.name, latest.version
                );
                return Ok(UpdateResult::skip_with_latest(
                    dependency.clone(),
                    SkipReason::Ignored,
                    &latest.version,
                ));
            }
        }

        for rule in create_ignore_rules(&dependency.specifiers) {
            let implicit = ParsedRules {
                versions: vec![rule],
                ..ParsedRules::default()
            };
            if should_ignore(current, &latest.version, &implicit)? {
                info!(
                    "Ignoring {} {} as it is excluded by the dependency's specifiers",
                    dependency.name, latest.version
                );
                return Ok(UpdateResult::skip_with_latest(
                    dependency.clone(),
                    SkipReason::Excluded,
                    &latest.version,
                ));
            }
        }

        let latest_version = SemanticVersion::parse(&latest.version)?;
        match update_specifier_set(&latest_version, &dependency.specifiers)? {
            SpecifierUpdate::Unchanged => Ok(UpdateResult::skip_with_latest(
                dependency.clone(),
                SkipReason::AlreadySatisfied,
                &latest.version,
            )),
            SpecifierUpdate::Updated(specifiers) => Ok(UpdateResult::update(
                dependency.clone(),
                &latest.version,
                specifiers,
            )
            .with_released_at(latest.released_at)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpecifierError;
    use crate::ignore::{parse_ignore_entries, DEFAULT_IGNORE_SEPARATOR};
    use chrono::{TimeZone, Utc};

    fn make_dependency(raw: &str) -> DependencyLine {
        DependencyLine::parse(raw).unwrap()
    }

    fn make_releases(versions: &[&str]) -> Vec<ReleaseInfo> {
        versions.iter().map(|v| ReleaseInfo::new(*v, None)).collect()
    }

    fn judge_with(ignore: &[&str]) -> UpdateJudge {
        UpdateJudge::new(parse_ignore_entries(ignore, DEFAULT_IGNORE_SEPARATOR).unwrap())
    }

    #[test]
    fn test_judge_simple_update() {
        let judge = judge_with(&[]);
        let dep = make_dependency("requests>=2.0,<3");
        let date = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let releases = vec![
            ReleaseInfo::new("2.31.0", None),
            ReleaseInfo::new("3.0.1", Some(date)),
        ];

        let result = judge.judge(&dep, &releases).unwrap();
        assert!(result.is_update());
        if let UpdateResult::Update {
            new_line,
            latest_version,
            released_at,
            ..
        } = result
        {
            assert_eq!(new_line, "requests>=2.0,<4");
            assert_eq!(latest_version, "3.0.1");
            assert_eq!(released_at, Some(date));
        }
    }

    #[test]
    fn test_judge_already_satisfied() {
        let judge = judge_with(&[]);
        let dep = make_dependency("pydantic~=1.7");
        let result = judge.judge(&dep, &make_releases(&["1.7.0", "1.7.1"])).unwrap();
        assert_eq!(result.skip_reason(), Some(&SkipReason::AlreadySatisfied));
    }

    #[test]
    fn test_judge_skip_url_pinned() {
        let judge = judge_with(&[]);
        let dep = make_dependency("pkg @ https://example.com/pkg-1.0.tar.gz");
        let result = judge.judge(&dep, &make_releases(&["2.0.0"])).unwrap();
        assert_eq!(result.skip_reason(), Some(&SkipReason::PinnedToUrl));
    }

    #[test]
    fn test_judge_skip_not_version_restricted() {
        let judge = judge_with(&[]);
        let dep = make_dependency("numpy");
        assert_eq!(judge.should_skip(&dep), Some(SkipReason::NotVersionRestricted));
    }

    #[test]
    fn test_should_skip_returns_none_for_normal() {
        let judge = judge_with(&[]);
        assert!(judge.should_skip(&make_dependency("numpy>=1.20")).is_none());
    }

    #[test]
    fn test_judge_ignores_prereleases() {
        let judge = judge_with(&[]);
        let dep = make_dependency("httpx<0.25");
        let result = judge
            .judge(&dep, &make_releases(&["0.24.1", "0.25.0", "1.0.0b1"]))
            .unwrap();
        if let UpdateResult::Update { latest_version, .. } = result {
            assert_eq!(latest_version, "0.25.0");
        } else {
            panic!("Expected update");
        }
    }

    #[test]
    fn test_judge_no_stable_release() {
        let judge = judge_with(&[]);
        let dep = make_dependency("httpx<0.25");
        let err = judge.judge(&dep, &make_releases(&["1.0.0b1"])).unwrap_err();
        assert!(matches!(
            err,
            AppError::Registry(RegistryError::NoSuitableVersion { .. })
        ));
    }

    #[test]
    fn test_judge_ignored_update_type() {
        let judge = judge_with(&["dependency-name=pydantic...update-types=version-update:semver-minor"]);
        let dep = make_dependency("pydantic~=2.13");
        let result = judge.judge(&dep, &make_releases(&["2.14.0"])).unwrap();
        assert_eq!(result.skip_reason(), Some(&SkipReason::Ignored));
    }

    #[test]
    fn test_judge_wildcard_rule() {
        let judge = judge_with(&["dependency-name=*...versions=>=3"]);
        let dep = make_dependency("requests>=2.0,<3");
        let result = judge.judge(&dep, &make_releases(&["3.0.0"])).unwrap();
        assert_eq!(result.skip_reason(), Some(&SkipReason::Ignored));
    }

    #[test]
    fn test_judge_rule_for_other_package() {
        let judge = judge_with(&["dependency-name=other"]);
        let dep = make_dependency("requests>=2.0,<3");
        assert!(judge.judge(&dep, &make_releases(&["3.0.0"])).unwrap().is_update());
    }

    #[test]
    fn test_judge_excluded_by_not_equal() {
        let judge = judge_with(&[]);
        let dep = make_dependency("requests>=2.0,!=3.0.0");
        let result = judge.judge(&dep, &make_releases(&["3.0.0"])).unwrap();
        assert_eq!(result.skip_reason(), Some(&SkipReason::Excluded));
    }

    #[test]
    fn test_judge_unresolvable() {
        let judge = judge_with(&[]);
        let dep = make_dependency("pkg===7.0");
        let err = judge.judge(&dep, &make_releases(&["7.0.0"])).unwrap_err();
        assert!(matches!(
            err,
            AppError::Specifier(SpecifierError::Unresolvable { .. })
        ));
    }

    #[test]
    fn test_judge_keeps_extras_and_marker() {
        let judge = judge_with(&[]);
        let dep = make_dependency("uvicorn[standard] (<0.20) ; python_version >= '3.8'");
        let result = judge.judge(&dep, &make_releases(&["0.23.2"])).unwrap();
        if let UpdateResult::Update { new_line, .. } = result {
            assert_eq!(new_line, "uvicorn[standard] <0.24; python_version >= '3.8'");
        } else {
            panic!("Expected update");
        }
    }
}
