//! Core domain models for citasks
//!
//! This module contains the fundamental types used throughout the application:
//! - Semantic versions with PEP 440 fallback
//! - Version specifiers and specifier sets
//! - PEP 508 dependency lines
//! - Update decision results
//! - The per-run update report

mod dependency;
mod report;
mod specifier;
mod update_result;
mod version;

pub use dependency::{normalize_name, DependencyLine};
pub use specifier::{Operator, Specifier, SpecifierSet};
pub use report::UpdateReport;
pub use update_result::{SkipReason, UpdateResult};
pub use version::{SemanticVersion, VersionFields, VersionPart, DEFAULT_MAX_FILLER};
