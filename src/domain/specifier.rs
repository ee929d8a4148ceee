//! Version specifiers and specifier sets
//!
//! A `SpecifierSet` is a conjunction of `Specifier`s such as `>=1.2,<3`.
//! Sets are kept in a canonical order (operator descending, then version) so
//! that rendering them back into a manifest produces stable diffs.

use super::SemanticVersion;
use crate::error::SpecifierError;
use pep508_rs::pep440_rs::{Version, VersionSpecifiers};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static SPECIFIER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<operator>~=|===|==|!=|<=|>=|<|>)\s*(?P<version>[0-9A-Za-z][^\s,;]*)\s*$").unwrap()
});

/// Comparison operator of a specifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// `~=`
    Compatible,
    /// `===`
    ArbitraryEqual,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<=`
    LessThanEqual,
    /// `>=`
    GreaterThanEqual,
    /// `<`
    LessThan,
    /// `>`
    GreaterThan,
}

impl Operator {
    /// Returns the operator symbol
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Compatible => "~=",
            Operator::ArbitraryEqual => "===",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::LessThanEqual => "<=",
            Operator::GreaterThanEqual => ">=",
            Operator::LessThan => "<",
            Operator::GreaterThan => ">",
        }
    }

    /// Returns the operator for a symbol
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "~=" => Some(Operator::Compatible),
            "===" => Some(Operator::ArbitraryEqual),
            "==" => Some(Operator::Equal),
            "!=" => Some(Operator::NotEqual),
            "<=" => Some(Operator::LessThanEqual),
            ">=" => Some(Operator::GreaterThanEqual),
            "<" => Some(Operator::LessThan),
            ">" => Some(Operator::GreaterThan),
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single operator + version constraint, e.g. `~=1.7`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Specifier {
    operator: Operator,
    version: String,
}

impl Specifier {
    /// Creates a new specifier
    pub fn new(operator: Operator, version: impl Into<String>) -> Self {
        Self {
            operator,
            version: version.into(),
        }
    }

    /// Parses a specifier such as `>= 1.2`
    pub fn parse(input: &str) -> Result<Self, SpecifierError> {
        let caps = SPECIFIER_REGEX
            .captures(input)
            .ok_or_else(|| SpecifierError::parse(input, "expected '<operator><version>'"))?;
        let operator = Operator::from_symbol(&caps["operator"])
            .ok_or_else(|| SpecifierError::parse(input, "unknown operator"))?;
        Ok(Self::new(operator, &caps["version"]))
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// The version exactly as written
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns true for prefix matches such as `==1.2.*`
    pub fn is_wildcard(&self) -> bool {
        self.version.ends_with(".*")
    }

    /// The version with a trailing `.*` removed
    pub fn release_version(&self) -> &str {
        self.version.strip_suffix(".*").unwrap_or(&self.version)
    }

    /// Number of dotted segments in the version, not counting a trailing `.*`
    pub fn segment_count(&self) -> usize {
        self.release_version().split('.').count()
    }

    /// Parses the version (without wildcard) as a PEP 440 version
    pub fn pep440_version(&self) -> Result<Version, SpecifierError> {
        Version::from_str(self.release_version())
            .map_err(|e| SpecifierError::parse(self.to_string(), e.to_string()))
    }

    /// Parses the version (without wildcard) as a semantic version
    pub fn semantic_version(&self) -> Result<SemanticVersion, SpecifierError> {
        Ok(SemanticVersion::parse(self.release_version())?)
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator, self.version)
    }
}

impl FromStr for Specifier {
    type Err = SpecifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A conjunction of specifiers, serialized as its rendered string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct SpecifierSet {
    specifiers: Vec<Specifier>,
}

impl SpecifierSet {
    /// Creates a set in canonical order, dropping duplicates
    pub fn new(specifiers: impl IntoIterator<Item = Specifier>) -> Self {
        let mut specifiers: Vec<Specifier> = specifiers.into_iter().collect();
        specifiers.sort_by(|a, b| {
            b.operator
                .as_str()
                .cmp(a.operator.as_str())
                .then_with(|| a.version.cmp(&b.version))
        });
        specifiers.dedup();
        Self { specifiers }
    }

    /// Parses a comma separated specifier set; an empty string is an empty set
    pub fn parse(input: &str) -> Result<Self, SpecifierError> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        let specifiers = input
            .split(',')
            .map(Specifier::parse)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| match e {
                SpecifierError::Parse { message, .. } => SpecifierError::parse(input, message),
                other => other,
            })?;
        Ok(Self::new(specifiers))
    }

    pub fn is_empty(&self) -> bool {
        self.specifiers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.specifiers.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Specifier> {
        self.specifiers.iter()
    }

    /// First specifier (in canonical order) using the given operator
    pub fn find(&self, operator: Operator) -> Option<&Specifier> {
        self.specifiers.iter().find(|s| s.operator == operator)
    }

    /// Returns a copy without `specifier`, with `replacements` added
    pub fn replace(&self, specifier: &Specifier, replacements: Vec<Specifier>) -> Self {
        Self::new(
            self.specifiers
                .iter()
                .filter(|s| *s != specifier)
                .cloned()
                .chain(replacements),
        )
    }

    /// Returns true if `version` satisfies every specifier.
    ///
    /// `===` compares the rendered version string; every other operator is
    /// evaluated with PEP 440 semantics.
    pub fn contains(&self, version: &SemanticVersion) -> Result<bool, SpecifierError> {
        let rendered = version.to_string();
        let (arbitrary, standard): (Vec<&Specifier>, Vec<&Specifier>) = self
            .specifiers
            .iter()
            .partition(|s| s.operator == Operator::ArbitraryEqual);

        if arbitrary.iter().any(|s| !s.version.eq_ignore_ascii_case(&rendered)) {
            return Ok(false);
        }
        if standard.is_empty() {
            return Ok(true);
        }

        let text = standard
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let specifiers = VersionSpecifiers::from_str(&text)
            .map_err(|e| SpecifierError::parse(text.as_str(), e.to_string()))?;
        Ok(specifiers.contains(&version.to_pep440()?))
    }

    /// The PEP 440 epochs of all specifier versions
    pub fn epochs(&self) -> Result<BTreeSet<u64>, SpecifierError> {
        self.specifiers
            .iter()
            .map(|s| s.pep440_version().map(|v| v.epoch()))
            .collect()
    }
}

impl fmt::Display for SpecifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.specifiers.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", rendered.join(","))
    }
}

impl FromStr for SpecifierSet {
    type Err = SpecifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<SpecifierSet> for String {
    fn from(set: SpecifierSet) -> Self {
        set.to_string()
    }
}

impl TryFrom<String> for SpecifierSet {
    type Error = SpecifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl<'a> IntoIterator for &'a SpecifierSet {
    type Item = &'a Specifier;
    type IntoIter = std::slice::Iter<'a, Specifier>;

    fn into_iter(self) -> Self::IntoIter {
        self.specifiers.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn set(s: &str) -> SpecifierSet {
        SpecifierSet::parse(s).unwrap()
    }

    fn version(s: &str) -> SemanticVersion {
        SemanticVersion::parse(s).unwrap()
    }

    #[test]
    fn test_specifier_parse() {
        let spec = Specifier::parse(">= 1.2").unwrap();
        assert_eq!(spec.operator(), Operator::GreaterThanEqual);
        assert_eq!(spec.version(), "1.2");
        assert_eq!(spec.to_string(), ">=1.2");
    }

    #[rstest]
    #[case("1.2")]
    #[case("=>1.2")]
    #[case("=1.0")]
    #[case(" = 1.0")]
    #[case(">=")]
    #[case("<=")]
    #[case(">==1.0")]
    #[case("== .1")]
    #[case("^1.2")]
    fn test_specifier_parse_invalid(#[case] input: &str) {
        assert!(Specifier::parse(input).is_err());
    }

    #[test]
    fn test_specifier_wildcard() {
        let spec = Specifier::parse("==1.2.*").unwrap();
        assert!(spec.is_wildcard());
        assert_eq!(spec.release_version(), "1.2");
        assert_eq!(spec.segment_count(), 2);
    }

    #[test]
    fn test_operator_round_trip() {
        for symbol in ["~=", "===", "==", "!=", "<=", ">=", "<", ">"] {
            let operator = Operator::from_symbol(symbol).unwrap();
            assert_eq!(operator.as_str(), symbol);
        }
        assert_eq!(Operator::from_symbol("^"), None);
    }

    #[test]
    fn test_set_is_sorted_by_operator_descending() {
        assert_eq!(set("<3,>=1.1").to_string(), ">=1.1,<3");
        assert_eq!(set("!=1.5, <2 ,~=1.2").to_string(), "~=1.2,<2,!=1.5");
        assert_eq!(set(">1,>=2").to_string(), ">=2,>1");
    }

    #[test]
    fn test_set_equality_is_order_independent() {
        assert_eq!(set(">=1.1,<3"), set("<3, >=1.1"));
    }

    #[test]
    fn test_set_parse_empty() {
        assert!(set("").is_empty());
        assert!(set("  ").is_empty());
    }

    #[test]
    fn test_set_parse_invalid_item() {
        let err = SpecifierSet::parse(">=1.0,,<2").unwrap_err();
        assert!(matches!(err, SpecifierError::Parse { .. }));
    }

    #[rstest]
    #[case(">=")]
    #[case("<=")]
    #[case(">==1.0")]
    #[case(">=1.0,<")]
    fn test_set_parse_rejects_missing_version(#[case] input: &str) {
        let err = SpecifierSet::parse(input).unwrap_err();
        assert!(matches!(err, SpecifierError::Parse { .. }), "{}", err);
    }

    #[rstest]
    #[case("~=1.7", "1.7.1", true)]
    #[case("~=1.7", "2.0.0", false)]
    #[case(">=1.1,<3", "1.0.1", false)]
    #[case(">=1.1,<3", "2.9", true)]
    #[case("<3", "3.2.1", false)]
    #[case("==1.2.*", "1.2.7", true)]
    #[case("!=1.5.0", "1.5", false)]
    #[case("", "9.9.9", true)]
    fn test_set_contains(#[case] specifiers: &str, #[case] candidate: &str, #[case] expected: bool) {
        assert_eq!(set(specifiers).contains(&version(candidate)).unwrap(), expected);
    }

    #[test]
    fn test_set_contains_arbitrary_equality_is_textual() {
        assert!(!set("===7.0").contains(&version("7.0.0")).unwrap());
        assert!(set("===7.0.0").contains(&version("7.0.0")).unwrap());
    }

    #[test]
    fn test_set_contains_invalid_version() {
        let err = set(">=abc").contains(&version("1.0")).unwrap_err();
        assert!(matches!(err, SpecifierError::Parse { .. }));
    }

    #[test]
    fn test_set_epochs() {
        let epochs = set(">=1!1.0,<2!0,==1.*").epochs().unwrap();
        assert_eq!(epochs.into_iter().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_set_replace() {
        let current = set(">=1.1,<3");
        let upper = current.find(Operator::LessThan).unwrap().clone();
        let replaced = current.replace(&upper, vec![Specifier::new(Operator::LessThan, "4")]);
        assert_eq!(replaced.to_string(), ">=1.1,<4");
        assert_eq!(current.to_string(), ">=1.1,<3");
    }

    #[test]
    fn test_set_serializes_as_string() {
        let json = serde_json::to_string(&set("<3,>=1.1")).unwrap();
        assert_eq!(json, "\">=1.1,<3\"");
        let parsed: SpecifierSet = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, set(">=1.1,<3"));
    }
}
