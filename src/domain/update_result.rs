//! Update decision result types

use super::{DependencyLine, SpecifierSet};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason why a dependency update was skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Dependency is given as `name @ url`
    PinnedToUrl,
    /// Dependency has no version specifiers
    NotVersionRestricted,
    /// The same package was already handled earlier in the manifest
    Duplicate,
    /// Latest version suppressed by an `--ignore` rule
    Ignored,
    /// Latest version is excluded by a `!=` specifier
    Excluded,
    /// Specifier set already admits the latest version
    AlreadySatisfied,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::PinnedToUrl => write!(f, "pinned to a URL"),
            SkipReason::NotVersionRestricted => write!(f, "not version restricted"),
            SkipReason::Duplicate => write!(f, "already handled"),
            SkipReason::Ignored => write!(f, "ignored by --ignore"),
            SkipReason::Excluded => write!(f, "excluded by '!=' specifier"),
            SkipReason::AlreadySatisfied => write!(f, "already satisfied"),
        }
    }
}

/// Result of an update decision for a single dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpdateResult {
    /// Dependency line will be rewritten
    Update {
        /// The dependency being updated
        dependency: DependencyLine,
        /// Latest version reported by the index
        latest_version: String,
        /// Specifier set admitting the latest version
        new_specifiers: SpecifierSet,
        /// Regenerated dependency line
        new_line: String,
        /// Upload time of the latest version
        #[serde(skip_serializing_if = "Option::is_none", default)]
        released_at: Option<DateTime<Utc>>,
    },
    /// Dependency update was skipped
    Skip {
        /// The dependency that was skipped
        dependency: DependencyLine,
        /// The reason for skipping
        reason: SkipReason,
        /// Latest version, when it was looked up
        #[serde(skip_serializing_if = "Option::is_none", default)]
        latest_version: Option<String>,
    },
}

impl UpdateResult {
    /// Creates an Update result, regenerating the dependency line
    pub fn update(
        dependency: DependencyLine,
        latest_version: impl Into<String>,
        new_specifiers: SpecifierSet,
    ) -> Self {
        let new_line = dependency.regenerate(&new_specifiers);
        UpdateResult::Update {
            dependency,
            latest_version: latest_version.into(),
            new_specifiers,
            new_line,
            released_at: None,
        }
    }

    /// Attaches the release time of the latest version
    pub fn with_released_at(mut self, time: Option<DateTime<Utc>>) -> Self {
        if let UpdateResult::Update { released_at, .. } = &mut self {
            *released_at = time;
        }
        self
    }

    /// Creates a Skip result
    pub fn skip(dependency: DependencyLine, reason: SkipReason) -> Self {
        UpdateResult::Skip {
            dependency,
            reason,
            latest_version: None,
        }
    }

    /// Creates a Skip result made after looking up the latest version
    pub fn skip_with_latest(
        dependency: DependencyLine,
        reason: SkipReason,
        latest_version: impl Into<String>,
    ) -> Self {
        UpdateResult::Skip {
            dependency,
            reason,
            latest_version: Some(latest_version.into()),
        }
    }

    /// Returns true if this is an update result
    pub fn is_update(&self) -> bool {
        matches!(self, UpdateResult::Update { .. })
    }

    /// Returns true if this is a skip result
    pub fn is_skip(&self) -> bool {
        matches!(self, UpdateResult::Skip { .. })
    }

    /// Returns the dependency reference
    pub fn dependency(&self) -> &DependencyLine {
        match self {
            UpdateResult::Update { dependency, .. } => dependency,
            UpdateResult::Skip { dependency, .. } => dependency,
        }
    }

    /// Returns the package name
    pub fn package_name(&self) -> &str {
        &self.dependency().name
    }

    /// Returns the skip reason, if skipped
    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            UpdateResult::Skip { reason, .. } => Some(reason),
            UpdateResult::Update { .. } => None,
        }
    }
}

impl fmt::Display for UpdateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateResult::Update {
                dependency,
                new_specifiers,
                ..
            } => {
                write!(
                    f,
                    "{}: {} → {}",
                    dependency.display_name(),
                    dependency.specifiers,
                    new_specifiers
                )
            }
            UpdateResult::Skip {
                dependency, reason, ..
            } => {
                write!(f, "{}: skipped ({})", dependency.display_name(), reason)
            }
        }
    }
}
