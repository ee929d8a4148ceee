//! Decides whether a latest version is suppressed by ignore rules

use super::ParsedRules;
use crate::domain::{Operator, VersionPart};
use crate::error::IgnoreRuleError;
use pep508_rs::pep440_rs::{Version, VersionSpecifiers};
use std::str::FromStr;

/// Returns true if `latest` must not be suggested as an update from `current`.
///
/// In order, short-circuiting:
/// 1. empty rules ignore everything
/// 2. `latest` satisfying all version rules (as one PEP 440 specifier set) is ignored
/// 3. an update of an ignored semver type is ignored
pub fn should_ignore(
    current: &str,
    latest: &str,
    rules: &ParsedRules,
) -> Result<bool, IgnoreRuleError> {
    if rules.is_empty() {
        return Ok(true);
    }

    if matches_version_rules(latest, rules)? {
        return Ok(true);
    }

    Ok(matches_update_types(current, latest, rules))
}

fn matches_version_rules(latest: &str, rules: &ParsedRules) -> Result<bool, IgnoreRuleError> {
    if rules.versions.is_empty() {
        return Ok(false);
    }

    if rules
        .versions
        .iter()
        .any(|rule| rule.operator() == Operator::Compatible && !rule.version().contains('.'))
    {
        return Err(IgnoreRuleError::input(
            "Ignore option value error. For the 'versions' config key, when using the '~=' \
             operator more than a single version part MUST be specified. E.g., '~=2' is \
             disallowed, instead use '~=2.0' or similar.",
        ));
    }

    let text = rules
        .versions
        .iter()
        .map(|rule| rule.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let specifiers = VersionSpecifiers::from_str(&text)
        .map_err(|e| IgnoreRuleError::input(format!("Invalid version specifier '{}': {}", text, e)))?;
    let latest = Version::from_str(latest).map_err(|e| {
        IgnoreRuleError::input(format!("Invalid latest version '{}': {}", latest, e))
    })?;

    Ok(specifiers.contains(&latest))
}

fn matches_update_types(current: &str, latest: &str, rules: &ParsedRules) -> bool {
    let current = numeric_parts(current);
    let latest = numeric_parts(latest);
    let both_have = |count: usize| current.len() >= count && latest.len() >= count;

    if rules.update_types.contains(&VersionPart::Major) && latest.first() != current.first() {
        return true;
    }

    if rules.update_types.contains(&VersionPart::Minor)
        && both_have(2)
        && latest[1] > current[1]
        && latest[0] == current[0]
    {
        return true;
    }

    rules.update_types.contains(&VersionPart::Patch)
        && both_have(3)
        && latest[2] > current[2]
        && latest[..2] == current[..2]
}

/// Leading numeric release segments: `1!2.10rc1+local` -> `[2, 10]`
fn numeric_parts(version: &str) -> Vec<u64> {
    let version = version.split_once('!').map_or(version, |(_, rest)| rest);
    let public = version.split('+').next().unwrap_or_default();

    public
        .split('.')
        .map_while(|segment| {
            let digits: String = segment.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Specifier;
    use rstest::rstest;
    use std::collections::BTreeSet;

    fn rules(versions: &[&str], update_types: &[VersionPart]) -> ParsedRules {
        ParsedRules {
            versions: versions
                .iter()
                .map(|v| Specifier::parse(v).unwrap())
                .collect(),
            update_types: update_types.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    #[test]
    fn test_empty_rules_ignore_everything() {
        assert!(should_ignore("1.0", "9.9.9", &ParsedRules::default()).unwrap());
    }

    #[test]
    fn test_ignore_all_sentinel() {
        assert!(should_ignore("1.0", "0.0.1", &ParsedRules::ignore_all()).unwrap());
    }

    #[rstest]
    #[case(&[">2.2"], true)]
    #[case(&[">2.2.2"], false)]
    #[case(&[">=2.2.2"], true)]
    #[case(&["<2"], false)]
    #[case(&["==2.2.2"], true)]
    #[case(&["!=2.2.2"], false)]
    #[case(&["~=2.2"], true)]
    #[case(&["~=2.1.0"], false)]
    #[case(&[">=2", "<3"], true)]
    #[case(&[">=2", "<2.2"], false)]
    fn test_version_rules(#[case] versions: &[&str], #[case] expected: bool) {
        assert_eq!(
            should_ignore("1.1.1", "2.2.2", &rules(versions, &[])).unwrap(),
            expected
        );
    }

    #[test]
    fn test_compatible_rule_needs_two_parts() {
        let err = should_ignore("1.1.1", "2.2.2", &rules(&["~=2"], &[])).unwrap_err();
        assert!(matches!(err, IgnoreRuleError::Input { .. }));
        assert!(format!("{}", err).contains("more than a single version part"));
    }

    #[test]
    fn test_invalid_version_rule() {
        let err = should_ignore("1.1.1", "2.2.2", &rules(&[">=abc"], &[])).unwrap_err();
        assert!(matches!(err, IgnoreRuleError::Input { .. }));
        assert!(format!("{}", err).contains("Invalid version specifier"));
    }

    #[rstest]
    #[case("1.1.1", "2.0.0", VersionPart::Major, true)]
    #[case("1.1.1", "1.2.0", VersionPart::Major, false)]
    #[case("2.13", "2.14.0", VersionPart::Minor, true)]
    #[case("2.13", "3.0.0", VersionPart::Minor, false)]
    #[case("2.9", "2.10.0", VersionPart::Minor, true)]
    #[case("2", "2.1.0", VersionPart::Minor, false)]
    #[case("1.2.3", "1.2.4", VersionPart::Patch, true)]
    #[case("1.2.3", "1.3.0", VersionPart::Patch, false)]
    #[case("1.2", "1.2.4", VersionPart::Patch, false)]
    #[case("1!1.2.3", "1!1.2.4", VersionPart::Patch, true)]
    fn test_update_type_rules(
        #[case] current: &str,
        #[case] latest: &str,
        #[case] part: VersionPart,
        #[case] expected: bool,
    ) {
        assert_eq!(
            should_ignore(current, latest, &rules(&[], &[part])).unwrap(),
            expected
        );
    }

    #[test]
    fn test_version_rules_checked_before_update_types() {
        let combined = rules(&["<2"], &[VersionPart::Minor]);
        assert!(should_ignore("1.1", "1.5.0", &combined).unwrap());
        assert!(!should_ignore("1.1", "2.5.0", &combined).unwrap());
    }

    #[test]
    fn test_numeric_parts() {
        assert_eq!(numeric_parts("1!2.10rc1+local.5"), vec![2, 10]);
        assert_eq!(numeric_parts("3.6.1"), vec![3, 6, 1]);
        assert_eq!(numeric_parts("1.0.post1"), vec![1, 0]);
    }
}
