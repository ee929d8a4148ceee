//! Writing updated dependency lines back to pyproject.toml
//!
//! All rewrites happen on one in-memory copy of the file, which is written
//! once at the end. A line that cannot be located is reported and the rest of
//! the updates still go through.

use crate::domain::{UpdateReport, UpdateResult};
use crate::error::ManifestError;
use crate::manifest::PyprojectTomlParser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Applies the updates of an [`UpdateReport`] to its manifest
pub struct ManifestWriter {
    dry_run: bool,
}

/// Outcome of writing one manifest
#[derive(Debug)]
pub struct WriteResult {
    pub path: PathBuf,
    /// Dependency lines rewritten in memory
    pub rewritten: usize,
    /// Whether the file on disk changed; never true in dry-run mode
    pub file_modified: bool,
    /// One message per dependency line that could not be rewritten
    pub errors: Vec<String>,
}

impl ManifestWriter {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Rewrite every updated dependency line of `report`
    pub fn apply_updates(&self, report: &UpdateReport) -> Result<WriteResult, ManifestError> {
        let path = &report.path;
        let mut content = read_manifest(path)?;
        let mut rewritten = 0;
        let mut errors = Vec::new();

        for result in report.updates() {
            let UpdateResult::Update {
                dependency,
                new_line,
                ..
            } = result
            else {
                continue;
            };

            match PyprojectTomlParser.update_dependency(path, &content, &dependency.raw, new_line)
            {
                Ok(updated) => {
                    debug!("'{}' -> '{}'", dependency.raw, new_line);
                    content = updated;
                    rewritten += 1;
                }
                Err(e) => {
                    warn!("Could not rewrite '{}': {}", dependency.raw, e);
                    errors.push(format!("Failed to update {}: {}", dependency.name, e));
                }
            }
        }

        let file_modified = rewritten > 0 && !self.dry_run;
        if file_modified {
            write_manifest(path, &content)?;
        }

        Ok(WriteResult {
            path: path.clone(),
            rewritten,
            file_modified,
            errors,
        })
    }
}

pub fn read_manifest(path: &Path) -> Result<String, ManifestError> {
    fs::read_to_string(path).map_err(|e| ManifestError::read_error(path, e))
}

pub fn write_manifest(path: &Path, content: &str) -> Result<(), ManifestError> {
    fs::write(path, content).map_err(|e| ManifestError::write_error(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DependencyLine, SkipReason, SpecifierSet};
    use tempfile::TempDir;

    const PYPROJECT: &str = r#"[project]
name = "sample"
requires-python = ">=3.8"
dependencies = [
    "requests>=2.28,<3",
    "click~=8.1",
]
"#;

    fn report_for(dir: &TempDir, dry_run: bool) -> UpdateReport {
        let path = dir.path().join("pyproject.toml");
        fs::write(&path, PYPROJECT).unwrap();
        UpdateReport::new(path, "3.8", dry_run)
    }

    fn update(raw: &str, latest: &str, new_specifiers: &str) -> UpdateResult {
        UpdateResult::update(
            DependencyLine::parse(raw).unwrap(),
            latest,
            SpecifierSet::parse(new_specifiers).unwrap(),
        )
    }

    #[test]
    fn test_apply_updates_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut report = report_for(&temp_dir, false);
        report.push(update("requests>=2.28,<3", "3.1.0", ">=2.28,<4"));
        report.push(UpdateResult::skip(
            DependencyLine::parse("click~=8.1").unwrap(),
            SkipReason::AlreadySatisfied,
        ));

        let result = ManifestWriter::new(false).apply_updates(&report).unwrap();

        assert_eq!(result.rewritten, 1);
        assert!(result.file_modified);
        assert_eq!(
            fs::read_to_string(&report.path).unwrap(),
            PYPROJECT.replace("<3\"", "<4\"")
        );
    }

    #[test]
    fn test_apply_updates_dry_run() {
        let temp_dir = TempDir::new().unwrap();
        let mut report = report_for(&temp_dir, true);
        report.push(update("requests>=2.28,<3", "3.1.0", ">=2.28,<4"));

        let result = ManifestWriter::new(true).apply_updates(&report).unwrap();

        assert_eq!(result.rewritten, 1);
        assert!(!result.file_modified);
        assert_eq!(fs::read_to_string(&report.path).unwrap(), PYPROJECT);
    }

    #[test]
    fn test_apply_updates_collects_missing_dependency() {
        let temp_dir = TempDir::new().unwrap();
        let mut report = report_for(&temp_dir, false);
        report.push(update("flask<2", "3.0.0", "<4"));
        report.push(update("click~=8.1", "9.0.0", ">=8.1.0,<10"));

        let result = ManifestWriter::new(false).apply_updates(&report).unwrap();

        assert_eq!(result.rewritten, 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("flask"));
        assert!(fs::read_to_string(&report.path)
            .unwrap()
            .contains("\"click>=8.1.0,<10\""));
    }

    #[test]
    fn test_read_manifest_missing_file() {
        let err = read_manifest(Path::new("/nonexistent/pyproject.toml")).unwrap_err();
        assert!(matches!(err, ManifestError::ReadError { .. }));
    }
}
