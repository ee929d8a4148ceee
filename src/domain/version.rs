//! Semantic version value type
//!
//! A `SemanticVersion` is read from a SemVer.org string
//! (`major[.minor[.patch]][-pre_release][+build]`). Strings that do not match
//! fall back to a PEP 440 parse, which supports:
//! - epochs (`1!2.0`)
//! - pre/post/dev suffixes (`1.2rc1`, `2.0.post1`, `3.0.dev4`)
//! - local labels (`1.0+ubuntu.1`)
//!
//! Precedence follows SemVer.org rule 11: build metadata is ignored and a release
//! ranks above any of its pre-releases.

use crate::error::VersionError;
use pep508_rs::pep440_rs::Version;
use regex::Regex;
use semver::{BuildMetadata, Prerelease};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::LazyLock;

/// Filler used by `previous_version` when a borrow empties a lower part
pub const DEFAULT_MAX_FILLER: u64 = 99;

static SEMVER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?P<major>0|[1-9]\d*)(?:\.(?P<minor>0|[1-9]\d*))?(?:\.(?P<patch>0|[1-9]\d*))?",
        r"(?:-(?P<pre_release>(?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*)",
        r"(?:\.(?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*))*))?",
        r"(?:\+(?P<build>[0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*))?$",
    ))
    .unwrap()
});

/// A part of a version that can be incremented or decremented
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionPart {
    Major,
    Minor,
    Patch,
}

impl VersionPart {
    /// Returns the lowercase name of the part
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionPart::Major => "major",
            VersionPart::Minor => "minor",
            VersionPart::Patch => "patch",
        }
    }

    /// Number of dotted segments a version of this granularity has
    pub fn segment_count(&self) -> usize {
        match self {
            VersionPart::Major => 1,
            VersionPart::Minor => 2,
            VersionPart::Patch => 3,
        }
    }

    /// Returns the part matching a number of dotted segments, e.g. `2` for `3.6`
    pub fn from_segment_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(VersionPart::Major),
            2 => Some(VersionPart::Minor),
            3 => Some(VersionPart::Patch),
            _ => None,
        }
    }
}

impl fmt::Display for VersionPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VersionPart {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "major" => Ok(VersionPart::Major),
            "minor" => Ok(VersionPart::Minor),
            "patch" => Ok(VersionPart::Patch),
            other => Err(VersionError::invalid_argument(format!(
                "version part must be one of 'major', 'minor', or 'patch', not '{}'",
                other
            ))),
        }
    }
}

/// Fields captured from a SemVer.org string, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionFields {
    pub major: u64,
    pub minor: Option<u64>,
    pub patch: Option<u64>,
    pub pre_release: Option<String>,
    pub build: Option<String>,
}

impl VersionFields {
    /// Captures the fields of a SemVer.org string, or None if the string does not match
    pub fn capture(input: &str) -> Option<Self> {
        let caps = SEMVER_REGEX.captures(input)?;
        let number = |name: &str| -> Option<Option<u64>> {
            match caps.name(name) {
                Some(m) => m.as_str().parse().ok().map(Some),
                None => Some(None),
            }
        };

        Some(Self {
            major: caps.name("major")?.as_str().parse().ok()?,
            minor: number("minor")?,
            patch: number("patch")?,
            pre_release: caps.name("pre_release").map(|m| m.as_str().to_string()),
            build: caps.name("build").map(|m| m.as_str().to_string()),
        })
    }
}

/// PEP 440 details kept for rendering a version that was not SemVer-shaped
#[derive(Debug, Clone, PartialEq, Eq)]
struct Pep440Details {
    epoch: u64,
    /// Normalized pre/post/dev/local suffix, e.g. `rc1.post2+local`
    suffix: String,
}

/// A semantic version with optional PEP 440 details
#[derive(Debug, Clone)]
pub struct SemanticVersion {
    major: u64,
    minor: u64,
    patch: u64,
    pre_release: Option<Prerelease>,
    build: Option<BuildMetadata>,
    pep440: Option<Pep440Details>,
}

impl SemanticVersion {
    /// Parses a SemVer.org string, falling back to PEP 440
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        if let Some(fields) = VersionFields::capture(input) {
            return Self::from_fields(fields);
        }

        let version = Version::from_str(input).map_err(|e| {
            VersionError::parse(
                input,
                format!("not a SemVer.org or PEP 440 version ({})", e),
            )
        })?;
        Self::from_pep440(&version)
    }

    /// Builds a version from captured fields; missing minor/patch default to 0
    pub fn from_fields(fields: VersionFields) -> Result<Self, VersionError> {
        let pre_release = match fields.pre_release.as_deref() {
            Some(pre) if !pre.is_empty() => Some(
                Prerelease::new(pre)
                    .map_err(|e| VersionError::parse(pre, e.to_string()))?,
            ),
            _ => None,
        };
        let build = match fields.build.as_deref() {
            Some(build) if !build.is_empty() => Some(
                BuildMetadata::new(build)
                    .map_err(|e| VersionError::parse(build, e.to_string()))?,
            ),
            _ => None,
        };

        Ok(Self {
            major: fields.major,
            minor: fields.minor.unwrap_or(0),
            patch: fields.patch.unwrap_or(0),
            pre_release,
            build,
            pep440: None,
        })
    }

    /// Builds a version from a PEP 440 version with at most three release segments
    pub fn from_pep440(version: &Version) -> Result<Self, VersionError> {
        let release = version.release();
        if release.is_empty() || release.len() > 3 {
            return Err(VersionError::parse(
                version.to_string(),
                format!(
                    "expected 1 to 3 release segments, found {}",
                    release.len()
                ),
            ));
        }

        let rendered = version.to_string();
        let without_epoch = match rendered.split_once('!') {
            Some((_, rest)) => rest,
            None => rendered.as_str(),
        };
        let release_text = release
            .iter()
            .map(|part| part.to_string())
            .collect::<Vec<_>>()
            .join(".");
        let suffix = without_epoch
            .strip_prefix(&release_text)
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            major: release[0],
            minor: release.get(1).copied().unwrap_or(0),
            patch: release.get(2).copied().unwrap_or(0),
            pre_release: None,
            build: None,
            pep440: Some(Pep440Details {
                epoch: version.epoch(),
                suffix,
            }),
        })
    }

    /// Builds a version from its parts.
    ///
    /// The textual shape must stay unambiguous: `patch` needs `minor`, and
    /// `pre_release`/`build` need `patch`.
    pub fn from_parts(
        major: Option<u64>,
        minor: Option<u64>,
        patch: Option<u64>,
        pre_release: Option<&str>,
        build: Option<&str>,
    ) -> Result<Self, VersionError> {
        let Some(major) = major else {
            return Err(VersionError::parse("", "At least major must be given"));
        };
        let mut text = major.to_string();

        if let Some(minor) = minor {
            text.push_str(&format!(".{}", minor));
        }
        if let Some(patch) = patch {
            if minor.is_none() {
                return Err(VersionError::parse(
                    text,
                    "Minor must be given if patch is given",
                ));
            }
            text.push_str(&format!(".{}", patch));
        }
        if let Some(pre_release) = pre_release {
            if patch.is_none() {
                return Err(VersionError::parse(
                    text,
                    "Patch must be given if pre_release is given",
                ));
            }
            text.push_str(&format!("-{}", pre_release));
        }
        if let Some(build) = build {
            if patch.is_none() {
                return Err(VersionError::parse(
                    text,
                    "Patch must be given if build is given",
                ));
            }
            text.push_str(&format!("+{}", build));
        }

        let fields = VersionFields::capture(&text).ok_or_else(|| {
            VersionError::parse(text.as_str(), "does not match the SemVer.org grammar")
        })?;
        Self::from_fields(fields)
    }

    fn release(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre_release: None,
            build: None,
            pep440: None,
        }
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn patch(&self) -> u64 {
        self.patch
    }

    /// The part after `-` and before `+`
    pub fn pre_release(&self) -> Option<&str> {
        self.pre_release.as_ref().map(|p| p.as_str())
    }

    /// The part after `+`
    pub fn build(&self) -> Option<&str> {
        self.build.as_ref().map(|b| b.as_str())
    }

    /// PEP 440 epoch, 0 for SemVer-shaped versions
    pub fn epoch(&self) -> u64 {
        self.pep440.as_ref().map(|p| p.epoch).unwrap_or(0)
    }

    /// Returns true if this is a SemVer pre-release or a PEP 440 pre/dev-release
    pub fn is_prerelease(&self) -> bool {
        if self.pre_release.is_some() {
            return true;
        }
        match &self.pep440 {
            Some(details) => {
                let public = details.suffix.split('+').next().unwrap_or_default();
                public.starts_with('a')
                    || public.starts_with('b')
                    || public.starts_with("rc")
                    || public.contains("dev")
            }
            None => false,
        }
    }

    /// The `major.minor.patch` segments, with a non-zero epoch prefixed to the first
    pub fn release_segments(&self) -> Vec<String> {
        let epoch = match self.epoch() {
            0 => String::new(),
            n => format!("{}!", n),
        };
        vec![
            format!("{}{}", epoch, self.major),
            self.minor.to_string(),
            self.patch.to_string(),
        ]
    }

    /// Converts to a PEP 440 version for specifier evaluation
    pub fn to_pep440(&self) -> Result<Version, VersionError> {
        let rendered = self.to_string();
        Version::from_str(&rendered).map_err(|e| {
            VersionError::parse(
                rendered.as_str(),
                format!("not a valid PEP 440 version ({})", e),
            )
        })
    }

    /// Returns the next version for the given part, e.g. `1.2.3` -> `1.3.0` for minor
    pub fn next_version(&self, part: VersionPart) -> Result<SemanticVersion, VersionError> {
        let overflow = || {
            VersionError::invalid_argument(format!(
                "version {} has no next {} version",
                self, part
            ))
        };

        Ok(match part {
            VersionPart::Major => {
                Self::release(self.major.checked_add(1).ok_or_else(overflow)?, 0, 0)
            }
            VersionPart::Minor => {
                Self::release(self.major, self.minor.checked_add(1).ok_or_else(overflow)?, 0)
            }
            VersionPart::Patch => Self::release(
                self.major,
                self.minor,
                self.patch.checked_add(1).ok_or_else(overflow)?,
            ),
        })
    }

    /// Returns the previous version for the given part.
    ///
    /// Emptied lower parts are set to `max_filler`: the previous minor of `2.0.x`
    /// is `1.{max_filler}.{max_filler}`. A zero patch borrows like a minor decrement.
    pub fn previous_version(
        &self,
        part: VersionPart,
        max_filler: u64,
    ) -> Result<SemanticVersion, VersionError> {
        let previous_major = || {
            self.major
                .checked_sub(1)
                .map(|major| Self::release(major, max_filler, max_filler))
                .ok_or_else(|| {
                    VersionError::invalid_argument(format!(
                        "version {} has no previous {} version",
                        self, part
                    ))
                })
        };

        match part {
            VersionPart::Major => previous_major(),
            _ if part == VersionPart::Minor || self.patch == 0 => {
                if self.minor == 0 {
                    previous_major()
                } else {
                    Ok(Self::release(self.major, self.minor - 1, max_filler))
                }
            }
            _ => Ok(Self::release(self.major, self.minor, self.patch - 1)),
        }
    }

    /// Drops a zero patch (and then a zero minor), e.g. `3.6.0` -> `3.6`, `3.0.0` -> `3`
    pub fn shortened(&self) -> String {
        if self.patch == 0 {
            if self.minor == 0 {
                return self.major.to_string();
            }
            return format!("{}.{}", self.major, self.minor);
        }
        format!("{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(details) = &self.pep440 {
            if details.epoch != 0 {
                write!(f, "{}!", details.epoch)?;
            }
            return write!(
                f,
                "{}.{}.{}{}",
                self.major, self.minor, self.patch, details.suffix
            );
        }

        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre_release {
            write!(f, "-{}", pre)?;
        }
        if let Some(build) = &self.build {
            write!(f, "+{}", build)?;
        }
        Ok(())
    }
}

impl FromStr for SemanticVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialEq for SemanticVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SemanticVersion {}

impl Hash for SemanticVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.major.hash(state);
        self.minor.hash(state);
        self.patch.hash(state);
        self.pre_release.hash(state);
    }
}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.pre_release, &other.pre_release) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}
