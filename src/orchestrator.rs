//! Update orchestrator for coordinating the `update-deps` workflow
//!
//! This module provides:
//! - Workflow coordination: locate → parse → fetch → judge → write
//! - Sequential index queries in manifest order
//! - Dry-run mode support
//! - Error handling with partial continuation or fail-fast abort

use crate::cli::UpdateDepsArgs;
use crate::domain::{normalize_name, DependencyLine, SkipReason, UpdateReport, UpdateResult};
use crate::git::resolve_root;
use crate::ignore::{parse_ignore_entries, IgnoreRules};
use crate::manifest::{find_manifest, parse_manifest, ManifestWriter, WriteResult};
use crate::progress::Progress;
use crate::registry::{HttpClient, PackageIndex, PyPIIndex};
use crate::update::{min_max_python_version, python_version_for_marker, UpdateJudge};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Orchestrator for coordinating the update workflow
pub struct Orchestrator {
    /// CLI arguments for configuration
    args: UpdateDepsArgs,
    /// Package index to query
    index: Box<dyn PackageIndex>,
    /// Whether to show progress spinners
    show_progress: bool,
}

/// Result of running the orchestrator
#[derive(Debug)]
pub struct OrchestratorResult {
    /// Decision for every dependency line, in file order
    pub report: UpdateReport,
    /// Outcome of rewriting the manifest, when anything was updated
    pub written: Option<WriteResult>,
    /// Errors encountered during processing
    pub errors: Vec<OrchestratorError>,
}

/// Errors that can occur during orchestration
#[derive(Debug)]
pub enum OrchestratorError {
    /// Failed to create HTTP client
    HttpClientError(String),
    /// The repository root could not be determined
    RepositoryError(String),
    /// The `--ignore` options are invalid
    InvalidIgnoreRules(String),
    /// Failed to locate or parse the manifest
    ManifestError { path: String, message: String },
    /// No Python version can be derived from `requires-python`
    PythonVersionError { requires: String, message: String },
    /// A dependency could not be processed
    DependencyError { dependency: String, message: String },
    /// Failed to write manifest
    WriteError { path: String, message: String },
}

impl std::fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrchestratorError::HttpClientError(msg) => write!(f, "HTTP client error: {}", msg),
            OrchestratorError::RepositoryError(msg) => {
                write!(f, "Cannot locate the repository: {}", msg)
            }
            OrchestratorError::InvalidIgnoreRules(msg) => {
                write!(f, "Invalid --ignore option: {}", msg)
            }
            OrchestratorError::ManifestError { path, message } => {
                write!(f, "Failed to read {}: {}", path, message)
            }
            OrchestratorError::PythonVersionError { requires, message } => {
                write!(
                    f,
                    "Cannot derive a Python version from '{}': {}",
                    requires, message
                )
            }
            OrchestratorError::DependencyError {
                dependency,
                message,
            } => {
                write!(f, "Failed to update '{}': {}", dependency, message)
            }
            OrchestratorError::WriteError { path, message } => {
                write!(f, "Failed to write {}: {}", path, message)
            }
        }
    }
}

impl std::error::Error for OrchestratorError {}

impl Orchestrator {
    /// Create a new orchestrator querying PyPI (or `--index-url`)
    pub fn new(args: UpdateDepsArgs) -> Result<Self, OrchestratorError> {
        let client =
            HttpClient::new().map_err(|e| OrchestratorError::HttpClientError(e.to_string()))?;
        let mut index = PyPIIndex::new(client);
        if let Some(url) = &args.index_url {
            index = index.with_base_url(url);
        }

        Ok(Self::with_index(args, Box::new(index)))
    }

    /// Create an orchestrator with a custom package index (for testing)
    pub fn with_index(args: UpdateDepsArgs, index: Box<dyn PackageIndex>) -> Self {
        Self {
            args,
            index,
            show_progress: false,
        }
    }

    /// Enable or disable progress display (builder pattern)
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Run the update workflow.
    ///
    /// Invalid ignore rules, a missing or unreadable manifest and an unusable
    /// `requires-python` abort the run, as does any dependency error with
    /// `--fail-fast`. Otherwise dependency errors are collected in the result.
    pub async fn run(&self) -> Result<OrchestratorResult, OrchestratorError> {
        let mut progress = Progress::new(self.show_progress);
        let mut errors = Vec::new();

        let ignore_rules = self.ignore_rules()?;
        let judge = UpdateJudge::new(ignore_rules);

        let root = resolve_root(&self.args.root_repo_path, self.args.pre_commit)
            .map_err(|e| OrchestratorError::RepositoryError(e.to_string()))?;

        progress.spinner("Reading pyproject.toml...");
        let manifest = find_manifest(&root)
            .and_then(|path| parse_manifest(&path))
            .map_err(|e| OrchestratorError::ManifestError {
                path: root.display().to_string(),
                message: e.to_string(),
            })?;
        progress.finish_and_clear();

        let python_version = min_max_python_version(&manifest.requires_python).map_err(|e| {
            OrchestratorError::PythonVersionError {
                requires: manifest.requires_python.clone(),
                message: e.to_string(),
            }
        })?;
        info!(
            "Querying {} for Python {} (requires-python: {})",
            self.index.index_name(),
            python_version,
            manifest.requires_python
        );

        let mut report = UpdateReport::new(&manifest.path, &python_version, self.args.dry_run);
        let mut handled: HashSet<String> = HashSet::new();

        progress.start(manifest.dependencies.len() as u64, "Checking dependencies");

        for declared in &manifest.dependencies {
            progress.set_message(&format!("Checking {}", declared.raw));

            match self
                .process_dependency(&judge, &declared.raw, &python_version, &mut handled)
                .await
            {
                Ok(result) => {
                    if let Some(reason) = result.skip_reason() {
                        info!("Skipping '{}': {}", declared.raw, reason);
                    }
                    report.push(result);
                }
                Err(error) => {
                    if self.args.fail_fast {
                        progress.finish_and_clear();
                        return Err(error);
                    }
                    warn!("{}", error);
                    errors.push(error);
                }
            }
            progress.inc();
        }
        progress.finish_and_clear();

        let written = if report.has_updates() {
            if !self.args.dry_run {
                progress.spinner("Writing updates...");
            }
            let written = ManifestWriter::new(self.args.dry_run).apply_updates(&report);
            progress.finish_and_clear();
            match written {
                Ok(result) => {
                    errors.extend(result.errors.iter().map(|message| {
                        OrchestratorError::WriteError {
                            path: result.path.display().to_string(),
                            message: message.clone(),
                        }
                    }));
                    Some(result)
                }
                Err(e) => {
                    errors.push(OrchestratorError::WriteError {
                        path: report.path.display().to_string(),
                        message: e.to_string(),
                    });
                    None
                }
            }
        } else {
            None
        };

        Ok(OrchestratorResult {
            report,
            written,
            errors,
        })
    }

    fn ignore_rules(&self) -> Result<IgnoreRules, OrchestratorError> {
        let rules = parse_ignore_entries(self.args.ignore.as_slice(), &self.args.ignore_separator)
            .map_err(|e| OrchestratorError::InvalidIgnoreRules(e.to_string()))?;
        for (name, entry) in rules.iter() {
            debug!(
                "Parsed ignore rule for {}: versions={:?}, update-types={:?}",
                name, entry.versions, entry.update_types
            );
        }
        Ok(rules)
    }

    async fn process_dependency(
        &self,
        judge: &UpdateJudge,
        raw: &str,
        python_version: &str,
        handled: &mut HashSet<String>,
    ) -> Result<UpdateResult, OrchestratorError> {
        let dependency_error = |message: String| OrchestratorError::DependencyError {
            dependency: raw.to_string(),
            message,
        };

        let dependency = DependencyLine::parse(raw).map_err(|e| dependency_error(e.to_string()))?;
        let name = normalize_name(&dependency.name);

        if handled.contains(&name) {
            return Ok(UpdateResult::skip(dependency, SkipReason::Duplicate));
        }

        // A line skipped here leaves the package open for a later declaration
        if let Some(reason) = judge.should_skip(&dependency) {
            return Ok(UpdateResult::skip(dependency, reason));
        }
        handled.insert(name);

        let python_version = match &dependency.marker {
            Some(marker) => python_version_for_marker(marker, python_version)
                .map_err(|e| dependency_error(e.to_string()))?,
            None => python_version.to_string(),
        };
        debug!("Querying {} for Python {}", dependency.name, python_version);

        let releases = self
            .index
            .fetch_releases(&dependency.name, Some(&python_version))
            .await
            .map_err(|e| dependency_error(e.to_string()))?;

        judge
            .judge(&dependency, &releases)
            .map_err(|e| dependency_error(e.to_string()))
    }
}
