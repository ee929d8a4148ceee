//! `--ignore` option parsing
//!
//! Each `--ignore` value is a separator-joined list of `key=value` pairs, where
//! `key` is one of `dependency-name`, `versions` or `update-types`:
//!
//! ```text
//! dependency-name=numpy...versions=>=2...update-types=version-update:semver-major
//! ```
//!
//! Options for the same dependency accumulate. The wildcard name `*` applies to
//! every dependency.

use crate::domain::{normalize_name, Operator, Specifier, SpecifierSet, VersionPart};
use crate::error::IgnoreRuleError;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::LazyLock;

/// Dependency name matching every dependency
pub const WILDCARD: &str = "*";

/// Default value of `--ignore-separator`
pub const DEFAULT_IGNORE_SEPARATOR: &str = "...";

static PAIR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<key>dependency-name|versions|update-types)=(?P<value>.*)$").unwrap()
});

static VERSIONS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<operator><=|>=|==|!=|~=|>|<)\s*(?P<version>[^=\s]\S*)$").unwrap()
});

static UPDATE_TYPES_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^version-update:semver-(?P<part>major|minor|patch)$").unwrap()
});

/// Raw, unvalidated rules collected for one dependency
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreEntry {
    /// `versions` values, e.g. `>=2`
    pub versions: Vec<String>,
    /// `update-types` values, e.g. `version-update:semver-major`
    pub update_types: Vec<String>,
}

impl IgnoreEntry {
    /// An entry without rules ignores the dependency altogether
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty() && self.update_types.is_empty()
    }

    fn merge(&mut self, other: IgnoreEntry) {
        self.versions.extend(other.versions);
        self.update_types.extend(other.update_types);
    }
}

/// Parsed rules deciding whether a latest version is ignored
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRules {
    /// Version constraints; a version matching all of them is ignored
    pub versions: Vec<Specifier>,
    /// Update types to ignore
    pub update_types: BTreeSet<VersionPart>,
}

impl ParsedRules {
    /// Rules ignoring every version (`>=0`)
    pub fn ignore_all() -> Self {
        Self {
            versions: vec![Specifier::new(Operator::GreaterThanEqual, "0")],
            update_types: BTreeSet::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty() && self.update_types.is_empty()
    }

    /// Appends `other`'s versions and unions its update types
    pub fn merge(mut self, other: ParsedRules) -> Self {
        self.versions.extend(other.versions);
        self.update_types.extend(other.update_types);
        self
    }
}

impl fmt::Display for ParsedRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let versions: Vec<String> = self.versions.iter().map(|v| v.to_string()).collect();
        let update_types: Vec<&str> = self.update_types.iter().map(|p| p.as_str()).collect();
        write!(
            f,
            "versions: [{}], update-types: [{}]",
            versions.join(", "),
            update_types.join(", ")
        )
    }
}

/// Immutable mapping of dependency name to ignore rules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreRules {
    entries: BTreeMap<String, IgnoreEntry>,
}

impl IgnoreRules {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Raw entry for a dependency name (or `*`)
    pub fn get(&self, name: &str) -> Option<&IgnoreEntry> {
        self.entries.get(&lookup_key(name))
    }

    /// Iterates over (normalized name, entry) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&String, &IgnoreEntry)> {
        self.entries.iter()
    }

    /// Parsed rules applying to a dependency: the wildcard rules first, then
    /// the dependency's own. `None` if neither exists.
    pub fn rules_for(&self, name: &str) -> Result<Option<ParsedRules>, IgnoreRuleError> {
        let wildcard = self.entries.get(WILDCARD);
        let specific = self.entries.get(&lookup_key(name));

        [wildcard, specific]
            .into_iter()
            .flatten()
            .try_fold(None, |acc: Option<ParsedRules>, entry| -> Result<_, IgnoreRuleError> {
                let parsed = parse_rule_set(entry)?;
                Ok(Some(match acc {
                    Some(rules) => rules.merge(parsed),
                    None => parsed,
                }))
            })
    }
}

/// Builder accumulating `--ignore` options into `IgnoreRules`
#[derive(Debug, Default)]
pub struct IgnoreRulesBuilder {
    entries: BTreeMap<String, IgnoreEntry>,
}

impl IgnoreRulesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses one `--ignore` option and accumulates it
    pub fn add_option(mut self, option: &str, separator: &str) -> Result<Self, IgnoreRuleError> {
        if separator.is_empty() {
            return Err(IgnoreRuleError::input_parser(
                "The ignore separator must not be empty",
            ));
        }

        let pairs: Vec<&str> = option.splitn(3, separator).collect();
        if pairs.iter().any(|pair| pair.contains(separator)) {
            return Err(IgnoreRuleError::input_parser(format!(
                "More than three key/value-pairs were given for an `--ignore` option, while \
                 there are only three allowed key names. Input value: --ignore='{}'",
                option
            )));
        }

        let mut dependency_name: Option<String> = None;
        let mut versions: Option<String> = None;
        let mut update_types: Option<String> = None;

        for pair in pairs {
            let caps = PAIR_REGEX.captures(pair).ok_or_else(|| {
                IgnoreRuleError::input_parser(format!(
                    "Could not parse ignore configuration: '{}' (part of the ignore option: '{}')",
                    pair, option
                ))
            })?;
            let key = &caps["key"];
            let slot = match key {
                "dependency-name" => &mut dependency_name,
                "versions" => &mut versions,
                _ => &mut update_types,
            };
            if slot.is_some() {
                return Err(IgnoreRuleError::input_parser(format!(
                    "An ignore configuration can only be given once per option. The \
                     configuration key '{}' was found multiple times in the option '{}'",
                    key, option
                )));
            }
            *slot = Some(caps["value"].trim().to_string());
        }

        let Some(dependency_name) = dependency_name else {
            return Err(IgnoreRuleError::input(format!(
                "Ignore option entry missing required 'dependency-name' configuration. \
                 Ignore option entry: {}",
                option
            )));
        };

        let entry = IgnoreEntry {
            versions: versions.map(|v| split_versions(&v)).unwrap_or_default(),
            update_types: update_types.into_iter().collect(),
        };
        self.entries
            .entry(lookup_key(&dependency_name))
            .or_default()
            .merge(entry);
        Ok(self)
    }

    pub fn build(self) -> IgnoreRules {
        IgnoreRules {
            entries: self.entries,
        }
    }
}

fn lookup_key(name: &str) -> String {
    if name == WILDCARD {
        WILDCARD.to_string()
    } else {
        normalize_name(name)
    }
}

/// `versions=>=1.0,<2` holds two constraints
fn split_versions(value: &str) -> Vec<String> {
    value.split(',').map(|v| v.trim().to_string()).collect()
}

/// Parses all `--ignore` options given on the command line
pub fn parse_ignore_entries<S: AsRef<str>>(
    entries: &[S],
    separator: &str,
) -> Result<IgnoreRules, IgnoreRuleError> {
    entries
        .iter()
        .try_fold(IgnoreRulesBuilder::new(), |builder, entry| {
            builder.add_option(entry.as_ref(), separator)
        })
        .map(IgnoreRulesBuilder::build)
}

/// Validates the raw rules of one dependency.
///
/// An entry without rules yields `>=0`, ignoring the dependency altogether.
pub fn parse_rule_set(entry: &IgnoreEntry) -> Result<ParsedRules, IgnoreRuleError> {
    if entry.is_empty() {
        return Ok(ParsedRules::ignore_all());
    }

    let versions = entry
        .versions
        .iter()
        .map(|value| {
            VERSIONS_REGEX
                .captures(value)
                .and_then(|caps| {
                    Operator::from_symbol(&caps["operator"])
                        .map(|operator| Specifier::new(operator, &caps["version"]))
                })
                .ok_or_else(|| {
                    IgnoreRuleError::input_parser(format!(
                        "Ignore option's 'versions' value cannot be parsed. It must be a \
                         single operator followed by a version number.\nUnparseable \
                         'versions' value: '{}'",
                        value
                    ))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let update_types = entry
        .update_types
        .iter()
        .map(|value| {
            UPDATE_TYPES_REGEX
                .captures(value)
                .and_then(|caps| caps["part"].parse::<VersionPart>().ok())
                .ok_or_else(|| {
                    IgnoreRuleError::input_parser(format!(
                        "Ignore option's 'update-types' value cannot be parsed. It must be \
                         either: 'version-update:semver-major', 'version-update:semver-minor' \
                         or 'version-update:semver-patch'.\nUnparseable 'update-types' value: \
                         '{}'",
                        value
                    ))
                })
        })
        .collect::<Result<BTreeSet<_>, _>>()?;

    Ok(ParsedRules {
        versions,
        update_types,
    })
}

/// Implicit rules from a dependency's own `!=` exclusions: `!=X` becomes `==X`
pub fn create_ignore_rules(specifiers: &SpecifierSet) -> Vec<Specifier> {
    specifiers
        .iter()
        .filter(|s| s.operator() == Operator::NotEqual)
        .map(|s| Specifier::new(Operator::Equal, s.version()))
        .collect()
}
