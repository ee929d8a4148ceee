//! Rendering of task reports on stdout
//!
//! Each task hands its report to an [`OutputFormatter`]: [`TextFormatter`]
//! for people, [`JsonFormatter`] (`--json`) for scripts.

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

use crate::cli::CliArgs;
use crate::docs::{ApiReferenceReport, DocsIndexReport};
use crate::orchestrator::OrchestratorResult;
use crate::setver::SetverReport;
use std::io::{self, Write};

/// How much the text output says
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// One line per task
    Quiet,
    #[default]
    Normal,
    /// Also lists skipped dependencies and per-reason counts
    Verbose,
}

impl Verbosity {
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        match (verbose, quiet) {
            (_, true) => Verbosity::Quiet,
            (true, false) => Verbosity::Verbose,
            (false, false) => Verbosity::Normal,
        }
    }
}

/// Output settings taken from the global flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    pub json: bool,
    pub verbosity: Verbosity,
    pub color: bool,
}

impl OutputConfig {
    pub fn from_cli(args: &CliArgs) -> Self {
        Self {
            json: args.json,
            verbosity: Verbosity::from_flags(args.verbose, args.quiet),
            color: colored::control::SHOULD_COLORIZE.should_colorize(),
        }
    }
}

/// Writes one report per task run
pub trait OutputFormatter {
    fn update_deps(&self, result: &OrchestratorResult, out: &mut dyn Write) -> io::Result<()>;

    fn setver(&self, report: &SetverReport, out: &mut dyn Write) -> io::Result<()>;

    fn docs_index(&self, report: &DocsIndexReport, out: &mut dyn Write) -> io::Result<()>;

    fn api_reference(&self, report: &ApiReferenceReport, out: &mut dyn Write) -> io::Result<()>;
}

pub fn create_formatter(config: OutputConfig) -> Box<dyn OutputFormatter> {
    if config.json {
        Box::new(JsonFormatter::new(config.verbosity))
    } else {
        Box::new(TextFormatter::new(config.verbosity, config.color))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(true, false), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Quiet);
    }

    #[test]
    fn test_output_config_from_cli() {
        let args = CliArgs::parse_from(["citasks", "update-deps", "--json", "-q"]);
        let config = OutputConfig::from_cli(&args);
        assert!(config.json);
        assert_eq!(config.verbosity, Verbosity::Quiet);

        let args = CliArgs::parse_from(["citasks", "--verbose", "setver", "-p", "pkg", "--version", "1"]);
        let config = OutputConfig::from_cli(&args);
        assert!(!config.json);
        assert_eq!(config.verbosity, Verbosity::Verbose);
    }
}
