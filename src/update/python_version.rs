//! Python version selection for index queries
//!
//! A project's `requires-python` (or a `python_version` environment marker) is
//! reduced to one concrete Python version, preferring the lowest version the
//! project supports. That version is used to filter releases on the index by
//! their own `requires_python`. A dependency gated by its own marker may raise
//! it further with `python_version_for_marker`.

use crate::domain::{Operator, SemanticVersion, Specifier, SpecifierSet, VersionPart};
use crate::error::SpecifierError;
use pep508_rs::pep440_rs::Version;
use pep508_rs::{MarkerTree, MarkerTreeKind, MarkerValueVersion};
use regex::Regex;
use std::str::FromStr;
use tracing::debug;

/// Highest minor version considered a plausible Python release
const MAX_MINOR: u64 = 20;
/// Highest patch version considered a plausible Python release
const MAX_PATCH: u64 = 20;
/// Filler for emptied parts when stepping down
const DESCENDING_FILLER: u64 = 20;

const MARKER_PATTERN: &str =
    r#"python_version\s*(?P<operator>~=|===|==|!=|<=|>=|<|>)\s*['"](?P<version>[^'"]+)['"]"#;

/// Computes a Python version satisfying `requires`.
///
/// `requires` is either a specifier set (`>=3.8,<4`) or an environment marker
/// (`python_version >= '3.8'`). Lower bounds win over upper bounds.
pub fn min_max_python_version(requires: &str) -> Result<String, SpecifierError> {
    let specifiers = if requires.contains("python_version") {
        let pattern = Regex::new(MARKER_PATTERN)
            .map_err(|e| SpecifierError::parse(MARKER_PATTERN, e.to_string()))?;
        let converted = pattern
            .captures_iter(requires)
            .map(|caps| format!("{}{}", &caps["operator"], &caps["version"]))
            .collect::<Vec<_>>()
            .join(",");
        debug!("Converted marker '{}' to '{}'", requires, converted);
        SpecifierSet::parse(&converted)?
    } else {
        SpecifierSet::parse(requires)?
    };

    if let Some(minimum) = minimum_candidate(&specifiers)? {
        return settle(minimum, &specifiers, step_up);
    }
    if let Some(maximum) = maximum_candidate(&specifiers)? {
        return settle(maximum, &specifiers, step_down);
    }

    Err(SpecifierError::unresolvable(format!(
        "Cannot determine a Python version from '{}'",
        requires
    )))
}

/// Lowest Python version, starting at `project_version`, for which `marker` can apply.
///
/// Only the Python version keys of the marker are evaluated; every other
/// condition is taken as satisfiable. When no plausible Python version admits
/// the marker, `project_version` is kept.
pub fn python_version_for_marker(
    marker: &str,
    project_version: &str,
) -> Result<String, SpecifierError> {
    let tree = MarkerTree::from_str(marker)
        .map_err(|e| SpecifierError::parse(marker, e.message.to_string()))?;

    let mut candidate = SemanticVersion::parse(project_version)?;
    while (1..=3).contains(&candidate.major()) {
        if is_semi_valid(&candidate)? && admits_python(&tree, &candidate.to_pep440()?) {
            debug!("Python {} admits marker '{}'", candidate, marker);
            return Ok(candidate.shortened());
        }
        candidate = step_up(&candidate, "")?;
    }

    debug!(
        "No Python version admits marker '{}', keeping {}",
        marker, project_version
    );
    Ok(project_version.to_string())
}

/// True if some environment running Python `version` satisfies `tree`
fn admits_python(tree: &MarkerTree, version: &Version) -> bool {
    match tree.kind() {
        MarkerTreeKind::True => true,
        MarkerTreeKind::False => false,
        MarkerTreeKind::Version(marker) => {
            let is_python = matches!(
                marker.key(),
                MarkerValueVersion::PythonFullVersion | MarkerValueVersion::PythonVersion
            );
            marker.edges().any(|(range, child)| {
                (!is_python || range.contains(version)) && admits_python(&child, version)
            })
        }
        MarkerTreeKind::String(marker) => marker
            .children()
            .any(|(_, child)| admits_python(&child, version)),
        MarkerTreeKind::In(marker) => marker
            .children()
            .any(|(_, child)| admits_python(&child, version)),
        MarkerTreeKind::Contains(marker) => marker
            .children()
            .any(|(_, child)| admits_python(&child, version)),
        MarkerTreeKind::Extra(marker) => marker
            .children()
            .any(|(_, child)| admits_python(&child, version)),
    }
}

fn minimum_candidate(specifiers: &SpecifierSet) -> Result<Option<String>, SpecifierError> {
    for specifier in specifiers {
        match specifier.operator() {
            Operator::GreaterThanEqual | Operator::Equal | Operator::Compatible => {
                return Ok(Some(specifier.release_version().to_string()));
            }
            Operator::GreaterThan => {
                let part = part_for(specifier)?;
                let next = specifier.semantic_version()?.next_version(part)?;
                return Ok(Some(next.shortened()));
            }
            _ => {}
        }
    }
    Ok(None)
}

fn maximum_candidate(specifiers: &SpecifierSet) -> Result<Option<String>, SpecifierError> {
    for specifier in specifiers {
        match specifier.operator() {
            Operator::LessThanEqual => return Ok(Some(specifier.release_version().to_string())),
            Operator::LessThan => {
                let version = specifier.semantic_version()?;
                if version.major() == 0 && version.minor() == 0 && version.patch() == 0 {
                    return Err(SpecifierError::unresolvable(format!(
                        "No Python version is lower than '{}'",
                        specifier
                    )));
                }
                let previous = version.previous_version(part_for(specifier)?, 0)?;
                return Ok(Some(previous.shortened()));
            }
            _ => {}
        }
    }
    Ok(None)
}

/// Moves `candidate` with `step` until it is a plausible Python version in `specifiers`
fn settle(
    mut candidate: String,
    specifiers: &SpecifierSet,
    step: fn(&SemanticVersion, &str) -> Result<SemanticVersion, SpecifierError>,
) -> Result<String, SpecifierError> {
    loop {
        let version = SemanticVersion::parse(&candidate)?;
        if is_semi_valid(&version)? && specifiers.contains(&version)? {
            debug!("Python version {} satisfies {}", candidate, specifiers);
            return Ok(candidate);
        }
        candidate = step(&version, &candidate)?.shortened();
    }
}

fn step_up(version: &SemanticVersion, _: &str) -> Result<SemanticVersion, SpecifierError> {
    let part = if version.minor() >= MAX_MINOR {
        VersionPart::Major
    } else if version.patch() >= MAX_PATCH {
        VersionPart::Minor
    } else {
        VersionPart::Patch
    };
    Ok(version.next_version(part)?)
}

fn step_down(version: &SemanticVersion, rendered: &str) -> Result<SemanticVersion, SpecifierError> {
    let part = VersionPart::from_segment_count(rendered.split('.').count())
        .unwrap_or(VersionPart::Patch);
    Ok(version.previous_version(part, DESCENDING_FILLER)?)
}

/// Major must be 1 to 3; minor and patch within the plausible bounds
fn is_semi_valid(version: &SemanticVersion) -> Result<bool, SpecifierError> {
    if !(1..=3).contains(&version.major()) {
        return Err(SpecifierError::unresolvable(format!(
            "Invalid Python major version: {}",
            version.major()
        )));
    }
    Ok(version.minor() <= MAX_MINOR && version.patch() <= MAX_PATCH)
}

fn part_for(specifier: &Specifier) -> Result<VersionPart, SpecifierError> {
    VersionPart::from_segment_count(specifier.segment_count()).ok_or_else(|| {
        SpecifierError::unresolvable(format!(
            "Invalid/unable to handle number of version parts: {}",
            specifier.segment_count()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(">=3.6,<3.10,!=3.6.0", "3.6.1")]
    #[case(">3.6", "3.7")]
    #[case(">3.6.0", "3.6.1")]
    #[case("<3.6", "3.5")]
    #[case("<3.6.5", "3.6.4")]
    #[case("<3.6.5,!=3.6.4", "3.6.3")]
    #[case("<=3.6.5,!=3.6.4", "3.6.5")]
    #[case(">=3.7", "3.7")]
    #[case("~=3.9", "3.9")]
    #[case("==3.11.*", "3.11")]
    #[case("<4", "3")]
    fn test_min_max_python_version(#[case] requires: &str, #[case] expected: &str) {
        assert_eq!(min_max_python_version(requires).unwrap(), expected);
    }

    #[rstest]
    #[case("python_version >= '3.8'", "3.8")]
    #[case("python_version > \"3.8\" and python_version < '4'", "3.9")]
    fn test_marker_form(#[case] requires: &str, #[case] expected: &str) {
        assert_eq!(min_max_python_version(requires).unwrap(), expected);
    }

    #[test]
    fn test_lower_bound_preferred_over_upper_bound() {
        assert_eq!(min_max_python_version(">=3.8,<3.12").unwrap(), "3.8");
    }

    #[rstest]
    #[case(">=4.0")]
    #[case("<1")]
    #[case("<0")]
    #[case("!=3.6")]
    #[case(">3.6.1.2")]
    fn test_unresolvable(#[case] requires: &str) {
        let err = min_max_python_version(requires).unwrap_err();
        assert!(matches!(err, SpecifierError::Unresolvable { .. }), "{}", err);
    }

    #[test]
    fn test_step_up_carries_over() {
        let version = SemanticVersion::parse("3.6.20").unwrap();
        assert_eq!(step_up(&version, "3.6.20").unwrap().to_string(), "3.7.0");
        let version = SemanticVersion::parse("3.20.0").unwrap();
        assert_eq!(step_up(&version, "3.20").unwrap().to_string(), "4.0.0");
    }

    #[rstest]
    #[case("python_version >= '3.11'", "3.8", "3.11")]
    #[case("python_version > '3.8'", "3.8", "3.9")]
    #[case("python_full_version >= '3.8.5'", "3.8", "3.8.5")]
    #[case("python_version < '3.12'", "3.9", "3.9")]
    #[case("python_version >= '3.10' and sys_platform == 'win32'", "3.8", "3.10")]
    #[case("sys_platform == 'linux'", "3.8", "3.8")]
    #[case("extra == 'docs'", "3.9", "3.9")]
    #[case("python_version < '3.7'", "3.8", "3.8")]
    fn test_python_version_for_marker(
        #[case] marker: &str,
        #[case] project: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(python_version_for_marker(marker, project).unwrap(), expected);
    }

    #[test]
    fn test_python_version_for_invalid_marker() {
        let err = python_version_for_marker("unknown_key == '1'", "3.8").unwrap_err();
        assert!(matches!(err, SpecifierError::Parse { .. }));
    }
}
