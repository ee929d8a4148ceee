//! JSON output for scripts
//!
//! `update-deps` emits one object describing the manifest, its updates and,
//! with `--verbose`, its skips. The other tasks serialize their reports as is.

use crate::docs::{ApiReferenceReport, DocsIndexReport};
use crate::domain::{SkipReason, UpdateResult};
use crate::orchestrator::OrchestratorResult;
use crate::output::{OutputFormatter, Verbosity};
use crate::setver::SetverReport;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::{self, Write};

pub struct JsonFormatter {
    verbosity: Verbosity,
}

impl JsonFormatter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

#[derive(Serialize)]
struct UpdateDepsOutput<'a> {
    path: String,
    python_version: &'a str,
    dry_run: bool,
    /// Whether pyproject.toml was rewritten
    file_modified: bool,
    updates: Vec<UpdateEntry<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    skips: Vec<SkipEntry<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

#[derive(Serialize)]
struct UpdateEntry<'a> {
    name: &'a str,
    from: String,
    to: String,
    latest: &'a str,
    line: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    released_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct SkipEntry<'a> {
    name: &'a str,
    specifiers: String,
    reason: &'a SkipReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    latest: Option<&'a str>,
}

impl<'a> UpdateEntry<'a> {
    fn from_result(result: &'a UpdateResult) -> Option<Self> {
        match result {
            UpdateResult::Update {
                dependency,
                latest_version,
                new_specifiers,
                new_line,
                released_at,
            } => Some(Self {
                name: &dependency.name,
                from: dependency.specifiers.to_string(),
                to: new_specifiers.to_string(),
                latest: latest_version,
                line: new_line,
                released_at: *released_at,
            }),
            UpdateResult::Skip { .. } => None,
        }
    }
}

impl<'a> SkipEntry<'a> {
    fn from_result(result: &'a UpdateResult) -> Option<Self> {
        match result {
            UpdateResult::Skip {
                dependency,
                reason,
                latest_version,
            } => Some(Self {
                name: &dependency.name,
                specifiers: dependency.specifiers.to_string(),
                reason,
                latest: latest_version.as_deref(),
            }),
            UpdateResult::Update { .. } => None,
        }
    }
}

fn write_json<T: Serialize + ?Sized>(value: &T, out: &mut dyn Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    writeln!(out, "{}", json)
}

impl OutputFormatter for JsonFormatter {
    fn update_deps(&self, result: &OrchestratorResult, out: &mut dyn Write) -> io::Result<()> {
        let report = &result.report;
        let skips = if self.verbosity == Verbosity::Verbose {
            report.skips().filter_map(SkipEntry::from_result).collect()
        } else {
            Vec::new()
        };

        let output = UpdateDepsOutput {
            path: report.path.display().to_string(),
            python_version: &report.python_version,
            dry_run: report.dry_run,
            file_modified: result.written.as_ref().is_some_and(|w| w.file_modified),
            updates: report.updates().filter_map(UpdateEntry::from_result).collect(),
            skips,
            errors: result.errors.iter().map(|e| e.to_string()).collect(),
        };
        write_json(&output, out)
    }

    fn setver(&self, report: &SetverReport, out: &mut dyn Write) -> io::Result<()> {
        write_json(report, out)
    }

    fn docs_index(&self, report: &DocsIndexReport, out: &mut dyn Write) -> io::Result<()> {
        write_json(report, out)
    }

    fn api_reference(&self, report: &ApiReferenceReport, out: &mut dyn Write) -> io::Result<()> {
        write_json(report, out)
    }
}
