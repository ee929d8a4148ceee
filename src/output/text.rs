//! Terminal output
//!
//! `update-deps` prints the manifest, one line per rewritten dependency and a
//! closing verdict; skipped lines and the reasons for them only show with
//! `--verbose`. Colors are dropped when the terminal or `NO_COLOR` asks for it.

use crate::docs::{ApiReferenceReport, DocsIndexReport};
use crate::domain::{UpdateReport, UpdateResult};
use crate::orchestrator::OrchestratorResult;
use crate::output::{OutputFormatter, Verbosity};
use crate::setver::SetverReport;
use colored::{ColoredString, Colorize};
use std::io::{self, Write};

const PARTY_POPPER: &str = "\u{1f389}";
const CHECK_MARK: &str = "\u{2714}";
const CROSS_MARK: &str = "\u{274c}";

/// Human-readable formatter
pub struct TextFormatter {
    verbosity: Verbosity,
    color: bool,
}

impl TextFormatter {
    pub fn new(verbosity: Verbosity, color: bool) -> Self {
        Self { verbosity, color }
    }

    fn paint(&self, text: &str, style: fn(&str) -> ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn arrow(&self) -> String {
        if self.color {
            self.paint("→", |s| s.dimmed())
        } else {
            "->".to_string()
        }
    }

    fn header(&self, report: &UpdateReport, out: &mut dyn Write) -> io::Result<()> {
        let prefix = if report.dry_run { "(dry-run) " } else { "" };
        writeln!(
            out,
            "{}{} {}",
            self.paint(prefix, |s| s.cyan()),
            self.paint(&report.path.display().to_string(), |s| s.bold()),
            self.paint(&format!("(Python {})", report.python_version), |s| s.dimmed())
        )
    }

    fn updates(&self, report: &UpdateReport, out: &mut dyn Write) -> io::Result<()> {
        let width = name_width(report.updates());
        for result in report.updates() {
            let UpdateResult::Update {
                dependency,
                latest_version,
                new_specifiers,
                released_at,
                ..
            } = result
            else {
                continue;
            };
            let latest = match (self.verbosity, released_at) {
                (Verbosity::Verbose, Some(at)) => {
                    format!("({}, {})", latest_version, at.format("%Y-%m-%d"))
                }
                _ => format!("({})", latest_version),
            };
            writeln!(
                out,
                "  {:width$}  {} {} {}  {}",
                dependency.display_name(),
                self.paint(&dependency.specifiers.to_string(), |s| s.dimmed()),
                self.arrow(),
                self.paint(&new_specifiers.to_string(), |s| s.green().bold()),
                self.paint(&latest, |s| s.dimmed()),
            )?;
        }
        Ok(())
    }

    fn skips(&self, report: &UpdateReport, out: &mut dyn Write) -> io::Result<()> {
        if report.skip_count() == 0 {
            return Ok(());
        }
        writeln!(out)?;
        writeln!(out, "{}", self.paint("Skipped:", |s| s.dimmed()))?;
        let width = name_width(report.skips());
        for result in report.skips() {
            let UpdateResult::Skip {
                dependency,
                reason,
                latest_version,
            } = result
            else {
                continue;
            };
            let reason = match latest_version {
                Some(latest) => format!("{}, latest {}", reason, latest),
                None => reason.to_string(),
            };
            writeln!(
                out,
                "  {:width$}  {}",
                dependency.display_name(),
                self.paint(&reason, |s| s.dimmed())
            )?;
        }
        Ok(())
    }

    fn verdict(&self, result: &OrchestratorResult, out: &mut dyn Write) -> io::Result<()> {
        let report = &result.report;
        let count = report.update_count();

        if !result.errors.is_empty() {
            writeln!(
                out,
                "{} {}",
                CROSS_MARK,
                self.paint("Errors occurred:", |s| s.red().bold())
            )?;
            for error in &result.errors {
                writeln!(out, "  - {}", error)?;
            }
        }

        if count == 0 {
            writeln!(out, "{} No dependency updates available.", CHECK_MARK)?;
        } else if report.dry_run {
            writeln!(
                out,
                "{}",
                self.paint(
                    &format!("(dry-run) {} dependency(ies) would be updated.", count),
                    |s| s.cyan()
                )
            )?;
        } else {
            writeln!(
                out,
                "{} {}",
                PARTY_POPPER,
                self.paint(
                    &format!("Successfully updated {} dependency(ies).", count),
                    |s| s.green()
                )
            )?;
        }

        if self.verbosity == Verbosity::Verbose && report.skip_count() > 0 {
            let reasons: Vec<String> = report
                .skips_by_reason()
                .into_iter()
                .map(|(reason, n)| format!("{} {}", n, reason))
                .collect();
            writeln!(
                out,
                "   {} skipped ({})",
                report.skip_count(),
                reasons.join(", ")
            )?;
        }
        Ok(())
    }
}

fn name_width<'a>(results: impl Iterator<Item = &'a UpdateResult>) -> usize {
    results
        .map(|r| r.dependency().display_name().len())
        .max()
        .unwrap_or(0)
}

impl OutputFormatter for TextFormatter {
    fn update_deps(&self, result: &OrchestratorResult, out: &mut dyn Write) -> io::Result<()> {
        let report = &result.report;
        if self.verbosity == Verbosity::Quiet {
            return match report.update_count() {
                0 => writeln!(out, "No updates"),
                n => writeln!(out, "{} updated", n),
            };
        }

        let verbose = self.verbosity == Verbosity::Verbose;
        if report.has_updates() || (verbose && report.skip_count() > 0) {
            self.header(report, out)?;
            self.updates(report, out)?;
            if verbose {
                self.skips(report, out)?;
            }
            writeln!(out)?;
        }
        self.verdict(result, out)
    }

    fn setver(&self, report: &SetverReport, out: &mut dyn Write) -> io::Result<()> {
        if report.test {
            for update in &report.updates {
                writeln!(out, "filepath: {}", update.path.display())?;
                writeln!(out, "pattern: {:?}", update.pattern)?;
                writeln!(out, "replacement (input): {}", update.input_replacement)?;
                writeln!(out, "replacement (handled): {}", update.replacement)?;
            }
        }
        if self.verbosity == Verbosity::Quiet {
            return Ok(());
        }

        let message = format!(
            "Bumped version for {} to {}.",
            report.package_dir, report.version
        );
        let prefix = if report.test { "(dry-run) " } else { "" };
        writeln!(out, "{}{}", prefix, self.paint(&message, |s| s.green()))
    }

    fn docs_index(&self, report: &DocsIndexReport, out: &mut dyn Write) -> io::Result<()> {
        if self.verbosity == Verbosity::Quiet {
            return Ok(());
        }
        if report.pre_commit {
            return writeln!(
                out,
                "{} No changes - your landing page is up-to-date !",
                CHECK_MARK
            );
        }
        let state = if report.written {
            "written"
        } else {
            "already up-to-date"
        };
        writeln!(
            out,
            "{} {} from {}",
            self.paint(&report.index.display().to_string(), |s| s.bold()),
            state,
            report.readme.display()
        )
    }

    fn api_reference(&self, report: &ApiReferenceReport, out: &mut dyn Write) -> io::Result<()> {
        if self.verbosity == Verbosity::Quiet {
            return Ok(());
        }
        if report.pre_commit {
            return writeln!(
                out,
                "{} No changes - your API reference documentation is up-to-date !",
                CHECK_MARK
            );
        }
        if self.verbosity == Verbosity::Verbose {
            for path in &report.written {
                writeln!(out, "  {}", self.paint(&path.display().to_string(), |s| s.dimmed()))?;
            }
        }
        writeln!(
            out,
            "{} file(s) written in {}",
            report.written.len(),
            self.paint(&report.api_reference_dir.display().to_string(), |s| s.bold())
        )
    }
}
