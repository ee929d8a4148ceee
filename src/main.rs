//! citasks - Repository maintenance tasks for Python packages
//!
//! Subcommands:
//! - `update-deps`: loosen pyproject.toml specifiers to admit the latest releases
//! - `setver`: set the package version in the code base
//! - `create-docs-index`: mirror README.md as the MkDocs landing page
//! - `create-api-reference-docs`: generate mkdocstrings API reference pages

use clap::Parser;
use citasks::cli::{CliArgs, Command, UpdateDepsArgs};
use citasks::docs::{run_api_reference_docs, run_docs_index};
use citasks::logging::{setup_logging, Level};
use citasks::orchestrator::Orchestrator;
use citasks::output::{create_formatter, OutputConfig, OutputFormatter};
use citasks::setver::run_setver;
use std::io::{self, Write};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    setup_logging(Level::from_verbose(args.verbose));

    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    let formatter = create_formatter(OutputConfig::from_cli(&args));
    let show_progress = !args.quiet && !args.json;

    if args.verbose {
        eprintln!("citasks v{}", env!("CARGO_PKG_VERSION"));
        if args.is_dry_run() {
            eprintln!("Mode: dry-run");
        }
    }

    let mut stdout = io::stdout().lock();
    let exit_code = match &args.command {
        Command::UpdateDeps(command) => {
            update_deps(command, formatter.as_ref(), show_progress, &mut stdout).await?
        }
        Command::Setver(command) => {
            formatter.setver(&run_setver(command)?, &mut stdout)?;
            ExitCode::SUCCESS
        }
        Command::CreateDocsIndex(command) => {
            formatter.docs_index(&run_docs_index(command)?, &mut stdout)?;
            ExitCode::SUCCESS
        }
        Command::CreateApiReferenceDocs(command) => {
            formatter.api_reference(&run_api_reference_docs(command)?, &mut stdout)?;
            ExitCode::SUCCESS
        }
    };
    stdout.flush()?;

    Ok(exit_code)
}

async fn update_deps(
    args: &UpdateDepsArgs,
    formatter: &dyn OutputFormatter,
    show_progress: bool,
    out: &mut dyn Write,
) -> anyhow::Result<ExitCode> {
    let orchestrator = Orchestrator::new(args.clone())?.with_progress(show_progress);
    let result = orchestrator.run().await?;

    formatter.update_deps(&result, out)?;

    if result.errors.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        // Partial success - some dependencies could not be handled
        Ok(ExitCode::from(2))
    }
}
