//! Per-run report of the `update-deps` task

use super::{SkipReason, UpdateResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Every decision taken for the dependency lines of one `pyproject.toml`, in file order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateReport {
    /// The manifest that was read
    pub path: PathBuf,
    /// Python version the package index was queried for by default
    pub python_version: String,
    /// Whether updates are only reported, not written
    pub dry_run: bool,
    pub results: Vec<UpdateResult>,
}

impl UpdateReport {
    pub fn new(path: impl Into<PathBuf>, python_version: impl Into<String>, dry_run: bool) -> Self {
        Self {
            path: path.into(),
            python_version: python_version.into(),
            dry_run,
            results: Vec::new(),
        }
    }

    pub fn push(&mut self, result: UpdateResult) {
        self.results.push(result);
    }

    pub fn updates(&self) -> impl Iterator<Item = &UpdateResult> {
        self.results.iter().filter(|r| r.is_update())
    }

    pub fn skips(&self) -> impl Iterator<Item = &UpdateResult> {
        self.results.iter().filter(|r| r.is_skip())
    }

    pub fn update_count(&self) -> usize {
        self.updates().count()
    }

    pub fn skip_count(&self) -> usize {
        self.skips().count()
    }

    pub fn has_updates(&self) -> bool {
        self.updates().next().is_some()
    }

    /// Updated packages with the release they now admit, e.g. `("numpy", "2.1.0")`
    pub fn updated_packages(&self) -> impl Iterator<Item = (&str, &str)> {
        self.results.iter().filter_map(|result| match result {
            UpdateResult::Update {
                dependency,
                latest_version,
                ..
            } => Some((dependency.name.as_str(), latest_version.as_str())),
            UpdateResult::Skip { .. } => None,
        })
    }

    /// Number of skips per reason, in order of first occurrence
    pub fn skips_by_reason(&self) -> Vec<(&SkipReason, usize)> {
        let mut counts: Vec<(&SkipReason, usize)> = Vec::new();
        for reason in self.skips().filter_map(|r| r.skip_reason()) {
            match counts.iter_mut().find(|(seen, _)| *seen == reason) {
                Some((_, count)) => *count += 1,
                None => counts.push((reason, 1)),
            }
        }
        counts
    }
}
