//! PEP 508 dependency lines as found in pyproject.toml
//!
//! Lines are validated and split up by `pep508_rs`. The package name, extras and
//! environment marker are kept as written so that a rewritten line differs from
//! the original only in its specifiers.

use super::{Operator, Specifier, SpecifierSet};
use crate::error::SpecifierError;
use pep508_rs::pep440_rs::{Operator as Pep440Operator, VersionSpecifier};
use pep508_rs::{Requirement, VerbatimUrl, VersionOrUrl};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static NAME_SEPARATOR_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-_.]+").unwrap());

/// Normalizes a package name for comparison (`Foo_Bar` -> `foo-bar`)
pub fn normalize_name(name: &str) -> String {
    NAME_SEPARATOR_REGEX
        .replace_all(&name.to_lowercase(), "-")
        .into_owned()
}

/// A single dependency line, e.g. `tomlkit[test,docs] ~=0.11.4; python_version>'3.7'`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyLine {
    /// The line exactly as written in the manifest
    pub raw: String,
    /// Package name
    pub name: String,
    /// Extras in written order
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub extras: Vec<String>,
    /// Whether whitespace separated the name (and extras) from the specifiers
    #[serde(skip)]
    pub post_name_space: bool,
    /// Version constraints, empty when the dependency is unversioned
    pub specifiers: SpecifierSet,
    /// Version of the first written specifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_version: Option<String>,
    /// Direct reference URL (`name @ url`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Environment marker after `;`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
}

impl DependencyLine {
    /// Parses a dependency line
    pub fn parse(raw: &str) -> Result<Self, SpecifierError> {
        let requirement = Requirement::<VerbatimUrl>::from_str(raw).map_err(|e| {
            SpecifierError::parse(
                raw,
                format!(
                    "could not parse package and version specification ({})",
                    e.message
                ),
            )
        })?;

        let (written_specifiers, url) = match &requirement.version_or_url {
            Some(VersionOrUrl::VersionSpecifier(specifiers)) => (
                specifiers.iter().map(specifier_from_pep440).collect::<Vec<_>>(),
                None,
            ),
            Some(VersionOrUrl::Url(url)) => (
                Vec::new(),
                Some(url.given().map_or_else(|| url.to_string(), str::to_string)),
            ),
            None => (Vec::new(), None),
        };

        let head = WrittenHead::of(raw);
        Ok(Self {
            raw: raw.to_string(),
            name: head.name.to_string(),
            extras: head.extras,
            post_name_space: head.post_name_space,
            current_version: written_specifiers
                .first()
                .map(|specifier| specifier.version().to_string()),
            specifiers: SpecifierSet::new(written_specifiers),
            marker: written_marker(raw, url.as_deref()),
            url,
        })
    }

    /// Name with extras as written, e.g. `tomlkit[test,docs]`
    pub fn display_name(&self) -> String {
        if self.extras.is_empty() {
            self.name.clone()
        } else {
            format!("{}[{}]", self.name, self.extras.join(","))
        }
    }

    /// Normalized package name used for lookups
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    pub fn is_url_pinned(&self) -> bool {
        self.url.is_some()
    }

    pub fn is_version_restricted(&self) -> bool {
        !self.specifiers.is_empty()
    }

    /// Renders the line again with new specifiers.
    ///
    /// Extras are sorted and the set is written in its canonical order; the
    /// space after the name, the URL and the marker are kept.
    pub fn regenerate(&self, specifiers: &SpecifierSet) -> String {
        let mut line = self.name.clone();

        if !self.extras.is_empty() {
            let mut extras = self.extras.clone();
            extras.sort();
            line.push_str(&format!("[{}]", extras.join(",")));
        }
        if self.post_name_space {
            line.push(' ');
        }
        line.push_str(&specifiers.to_string());

        if let Some(url) = &self.url {
            line.push_str(&format!("@ {}", url));
            if self.marker.is_some() {
                line.push(' ');
            }
        }
        if let Some(marker) = &self.marker {
            line.push_str(&format!("; {}", marker));
        }
        line
    }
}

/// The name and extras as spelled in the line; `Requirement` normalizes both
struct WrittenHead<'a> {
    name: &'a str,
    extras: Vec<String>,
    post_name_space: bool,
}

impl<'a> WrittenHead<'a> {
    fn of(raw: &'a str) -> Self {
        let line = raw.trim_start();
        let name_end = line
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
            .unwrap_or(line.len());
        let (name, mut rest) = line.split_at(name_end);

        let mut extras = Vec::new();
        if let Some((written, after)) = rest
            .trim_start()
            .strip_prefix('[')
            .and_then(|inner| inner.split_once(']'))
        {
            extras = written
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(String::from)
                .collect();
            rest = after;
        }

        Self {
            name,
            extras,
            post_name_space: rest.starts_with(char::is_whitespace),
        }
    }
}

/// The marker text after `;`, searched past the URL of a direct reference
fn written_marker(raw: &str, url: Option<&str>) -> Option<String> {
    let start = url
        .and_then(|url| raw.find(url).map(|index| index + url.len()))
        .unwrap_or(0);
    raw[start..]
        .split_once(';')
        .map(|(_, marker)| marker.trim().to_string())
        .filter(|marker| !marker.is_empty())
}

fn specifier_from_pep440(specifier: &VersionSpecifier) -> Specifier {
    let version = specifier.version().to_string();
    match specifier.operator() {
        Pep440Operator::Equal => Specifier::new(Operator::Equal, version),
        Pep440Operator::EqualStar => Specifier::new(Operator::Equal, format!("{}.*", version)),
        Pep440Operator::ExactEqual => Specifier::new(Operator::ArbitraryEqual, version),
        Pep440Operator::NotEqual => Specifier::new(Operator::NotEqual, version),
        Pep440Operator::NotEqualStar => {
            Specifier::new(Operator::NotEqual, format!("{}.*", version))
        }
        Pep440Operator::TildeEqual => Specifier::new(Operator::Compatible, version),
        Pep440Operator::LessThan => Specifier::new(Operator::LessThan, version),
        Pep440Operator::LessThanEqual => Specifier::new(Operator::LessThanEqual, version),
        Pep440Operator::GreaterThan => Specifier::new(Operator::GreaterThan, version),
        Pep440Operator::GreaterThanEqual => Specifier::new(Operator::GreaterThanEqual, version),
    }
}

impl fmt::Display for DependencyLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}
