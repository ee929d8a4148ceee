//! Ignore rules for dependency updates
//!
//! This module provides:
//! - Parsing of `--ignore` options into per-dependency rules
//! - Evaluation of a latest version against those rules

mod evaluator;
mod rules;

pub use evaluator::should_ignore;
pub use rules::{
    create_ignore_rules, parse_ignore_entries, parse_rule_set, IgnoreEntry, IgnoreRules,
    IgnoreRulesBuilder, ParsedRules, DEFAULT_IGNORE_SEPARATOR, WILDCARD,
};
