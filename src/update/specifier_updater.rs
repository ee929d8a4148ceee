//! Extends a specifier set so that it admits a newer version
//!
//! The rewritten set keeps the shape of the original: an advanced bound keeps its
//! operator and, where that still admits the new version, its number of version
//! segments. Every other specifier is carried over untouched.

use crate::domain::{Operator, SemanticVersion, Specifier, SpecifierSet, VersionPart};
use crate::error::SpecifierError;
use pep508_rs::pep440_rs::Version;
use tracing::debug;

/// Outcome of updating a specifier set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecifierUpdate {
    /// The set already admits the latest version as tightly as it can
    Unchanged,
    /// The rewritten set
    Updated(SpecifierSet),
}

/// Operators that may be advanced, in priority order
const ADVANCEABLE: [Operator; 3] = [
    Operator::LessThanEqual,
    Operator::LessThan,
    Operator::Compatible,
];

/// Computes the specifier set admitting `latest`.
///
/// - `latest` already admitted: the first `~=`/`==` is tightened to `latest` at the
///   same precision, otherwise nothing changes.
/// - `latest` in an epoch not used by the set: the set becomes `==latest`; an
///   epoch lower than the set's highest is unresolvable.
/// - `latest` below a lower bound of the set: nothing changes.
/// - otherwise every `<=`, `<` and `~=` excluding `latest` is advanced. A `~=X`
///   crossing a major version (for `X` of major 1 or higher) becomes
///   `>=X,<next major`.
///
/// The rewritten set always admits `latest`; when it cannot, the set is
/// unresolvable.
pub fn update_specifier_set(
    latest: &SemanticVersion,
    current: &SpecifierSet,
) -> Result<SpecifierUpdate, SpecifierError> {
    debug!(
        "Received latest version: {} and current specifier set: {}",
        latest, current
    );

    let segments = latest.release_segments();

    if current.contains(latest)? {
        let tightenable = current
            .iter()
            .find(|s| matches!(s.operator(), Operator::Compatible | Operator::Equal));
        return Ok(match tightenable {
            Some(specifier) => {
                let tightened = Specifier::new(
                    specifier.operator(),
                    truncate_like(&segments, specifier),
                );
                replace(current, specifier, vec![tightened])
            }
            None => SpecifierUpdate::Unchanged,
        });
    }

    let epochs = current.epochs()?;
    let latest_epoch = latest.epoch();
    if !epochs.contains(&latest_epoch) {
        if let Some(max_epoch) = epochs.last() {
            if latest_epoch < *max_epoch {
                return Err(SpecifierError::unresolvable(format!(
                    "The latest version's epoch ({}) is smaller than the largest epoch in \
                     the specifier set ({})",
                    latest_epoch, max_epoch
                )));
            }
        }
        debug!("Latest version {} starts a new epoch", latest);
        return Ok(SpecifierUpdate::Updated(SpecifierSet::new([
            Specifier::new(Operator::Equal, latest.to_string()),
        ])));
    }

    if is_below_lower_bound(latest, current)? {
        debug!("Latest version {} is below the range {}", latest, current);
        return Ok(SpecifierUpdate::Unchanged);
    }

    let mut updated = current.clone();
    let mut advanced = false;
    for operator in ADVANCEABLE {
        let excluding: Vec<Specifier> = current
            .iter()
            .filter(|s| s.operator() == operator)
            .filter_map(|s| match admits(s, latest) {
                Ok(true) => None,
                Ok(false) => Some(Ok(s.clone())),
                Err(e) => Some(Err(e)),
            })
            .collect::<Result<_, _>>()?;

        for specifier in excluding {
            let replacements = advance(latest, &segments, &specifier)?;
            debug!(
                "Advancing {} to {}",
                specifier,
                SpecifierSet::new(replacements.clone())
            );
            updated = updated.replace(&specifier, replacements);
            advanced = true;
        }
    }

    if !advanced || !updated.contains(latest)? {
        return Err(SpecifierError::unresolvable(
            "Cannot resolve how to update specifier set to include latest version.",
        ));
    }
    Ok(SpecifierUpdate::Updated(updated))
}

/// True if `specifier` on its own admits `version`
fn admits(specifier: &Specifier, version: &SemanticVersion) -> Result<bool, SpecifierError> {
    SpecifierSet::new([specifier.clone()]).contains(version)
}

fn advance(
    latest: &SemanticVersion,
    segments: &[String],
    specifier: &Specifier,
) -> Result<Vec<Specifier>, SpecifierError> {
    let epoch = match latest.epoch() {
        0 => String::new(),
        n => format!("{}!", n),
    };

    match specifier.operator() {
        Operator::LessThan => {
            let count = specifier.segment_count();
            let version = match VersionPart::from_segment_count(count) {
                Some(VersionPart::Major) => {
                    let next = latest.next_version(VersionPart::Major)?;
                    format!("{}{}", epoch, next.major())
                }
                Some(VersionPart::Minor) => {
                    let next = latest.next_version(VersionPart::Minor)?;
                    format!("{}{}.{}", epoch, next.major(), next.minor())
                }
                Some(VersionPart::Patch) => {
                    format!("{}{}", epoch, latest.next_version(VersionPart::Patch)?)
                }
                None => {
                    return Err(SpecifierError::unresolvable(format!(
                        "Invalid/unable to handle number of version parts: {}",
                        count
                    )))
                }
            };
            Ok(vec![Specifier::new(Operator::LessThan, version)])
        }
        Operator::LessThanEqual => {
            let truncated = Specifier::new(
                Operator::LessThanEqual,
                truncate_like(segments, specifier),
            );
            if admits(&truncated, latest)? {
                Ok(vec![truncated])
            } else {
                Ok(vec![Specifier::new(
                    Operator::LessThanEqual,
                    segments.join("."),
                )])
            }
        }
        Operator::Compatible => {
            let floor = specifier.semantic_version()?;
            if floor.major() > 0 && latest.major() > floor.major() {
                let next = latest.next_version(VersionPart::Major)?;
                Ok(vec![
                    Specifier::new(Operator::GreaterThanEqual, floor.to_string()),
                    Specifier::new(Operator::LessThan, format!("{}{}", epoch, next.major())),
                ])
            } else {
                Ok(vec![Specifier::new(
                    Operator::Compatible,
                    truncate_like(segments, specifier),
                )])
            }
        }
        operator => Ok(vec![Specifier::new(
            operator,
            truncate_like(segments, specifier),
        )]),
    }
}

/// `latest`'s segments cut to the precision of `specifier`, keeping a `.*` suffix
fn truncate_like(segments: &[String], specifier: &Specifier) -> String {
    let count = specifier.segment_count().min(segments.len());
    let truncated = segments[..count].join(".");
    if specifier.is_wildcard() {
        format!("{}.*", truncated)
    } else {
        truncated
    }
}

fn replace(
    current: &SpecifierSet,
    specifier: &Specifier,
    replacements: Vec<Specifier>,
) -> SpecifierUpdate {
    let updated = current.replace(specifier, replacements);
    if updated == *current {
        SpecifierUpdate::Unchanged
    } else {
        SpecifierUpdate::Updated(updated)
    }
}

/// True if `latest` lies under a `>=`, `>`, `~=` or `==` bound of the set
fn is_below_lower_bound(
    latest: &SemanticVersion,
    current: &SpecifierSet,
) -> Result<bool, SpecifierError> {
    let latest: Version = latest.to_pep440()?;
    for specifier in current {
        let below = match specifier.operator() {
            Operator::GreaterThanEqual | Operator::Compatible | Operator::Equal => {
                latest < specifier.pep440_version()?
            }
            Operator::GreaterThan => latest <= specifier.pep440_version()?,
            _ => false,
        };
        if below {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn update(latest: &str, current: &str) -> Result<SpecifierUpdate, SpecifierError> {
        update_specifier_set(
            &SemanticVersion::parse(latest).unwrap(),
            &SpecifierSet::parse(current).unwrap(),
        )
    }

    #[rstest]
    #[case("~=1.7", "1.7.1")]
    #[case(">=1.1,<3", "1.0.1")]
    #[case(">=1.1,<3", "2.5")]
    #[case("~=1.2", "1.2.7")]
    #[case("==1.2.*", "1.2.7")]
    #[case(">2.0", "2.0")]
    #[case("==1.2.3", "1.2.3")]
    fn test_unchanged(#[case] current: &str, #[case] latest: &str) {
        assert_eq!(update(latest, current).unwrap(), SpecifierUpdate::Unchanged);
    }

    #[rstest]
    #[case("~=0.11.4", "1.0.0", "~=1.0.0")]
    #[case("<3", "3.2.1", "<4")]
    #[case(">=1.1,<3", "3.2.1", ">=1.1,<4")]
    #[case(">=1.0,<2.5", "2.5.0", ">=1.0,<2.6")]
    #[case(">=1.0,<2.5.1", "2.5.1", ">=1.0,<2.5.2")]
    #[case("<=1.4", "1.9.0", "<=1.9")]
    #[case("<=1.4", "1.9.3", "<=1.9.3")]
    #[case("<=1.4", "3.1.0", "<=3.1")]
    #[case(">=1,<=1.4.2", "1.9.3", ">=1,<=1.9.3")]
    #[case("~=1.7", "1.9.0", "~=1.9")]
    #[case("~=1.7", "2.1.0", ">=1.7.0,<3")]
    #[case("~=1.7.2", "1.8.0", "~=1.8.0")]
    #[case(">=2,!=2.1.0,<3", "3.0.1", ">=2,<4,!=2.1.0")]
    #[case("<=2,<3", "3.1.0", "<=3.1.0,<4")]
    #[case(">=1,<=2,<3", "3.1.0", ">=1,<=3.1.0,<4")]
    #[case("~=1.7,<1.8", "1.9.1", "~=1.7,<1.10")]
    fn test_updated(#[case] current: &str, #[case] latest: &str, #[case] expected: &str) {
        match update(latest, current).unwrap() {
            SpecifierUpdate::Updated(set) => assert_eq!(set.to_string(), expected),
            SpecifierUpdate::Unchanged => panic!("Expected {} to be updated", current),
        }
    }

    #[test]
    fn test_updated_set_contains_latest() {
        let latest = SemanticVersion::parse("3.2.1").unwrap();
        for current in ["<3", ">=1.1,<3", "~=2.1", "<=2.9", "~=0.4.1", "<=2,<3", "~=2.1,<=2.5"] {
            let set = SpecifierSet::parse(current).unwrap();
            match update_specifier_set(&latest, &set).unwrap() {
                SpecifierUpdate::Updated(updated) => {
                    assert!(updated.contains(&latest).unwrap(), "{} -> {}", current, updated)
                }
                SpecifierUpdate::Unchanged => panic!("Expected {} to be updated", current),
            }
        }
    }

    #[test]
    fn test_tightens_compatible_release_in_range() {
        match update("1.9.2", "~=1.7,!=1.8.0").unwrap() {
            SpecifierUpdate::Updated(set) => assert_eq!(set.to_string(), "~=1.9,!=1.8.0"),
            SpecifierUpdate::Unchanged => panic!("Expected update"),
        }
    }

    #[test]
    fn test_new_epoch_replaces_set() {
        match update("1!1.0.0", ">=2.0,<3").unwrap() {
            SpecifierUpdate::Updated(set) => assert_eq!(set.to_string(), "==1!1.0.0"),
            SpecifierUpdate::Unchanged => panic!("Expected update"),
        }
    }

    #[test]
    fn test_lower_epoch_is_unresolvable() {
        let err = update("1.0.0", ">=2!1.0").unwrap_err();
        assert!(matches!(err, SpecifierError::Unresolvable { .. }));
        assert!(format!("{}", err).contains("epoch"));
    }

    #[test]
    fn test_epoch_prefix_is_kept_when_advancing() {
        match update("1!3.1.0", ">=1!1.0,<1!3").unwrap() {
            SpecifierUpdate::Updated(set) => assert_eq!(set.to_string(), ">=1!1.0,<1!4"),
            SpecifierUpdate::Unchanged => panic!("Expected update"),
        }
    }

    #[rstest]
    #[case("===7.0", "7.0.0")]
    #[case("==1.2.3", "1.3.0")]
    #[case(">=1.0,!=2.0.0", "2.0.0")]
    #[case("<1.2.3.4", "1.2.4")]
    fn test_unresolvable(#[case] current: &str, #[case] latest: &str) {
        let err = update(latest, current).unwrap_err();
        assert!(matches!(err, SpecifierError::Unresolvable { .. }), "{}", err);
    }
}
