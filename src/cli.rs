//! CLI argument parsing module for citasks

use crate::ignore::DEFAULT_IGNORE_SEPARATOR;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Repository maintenance tasks for Python packages
#[derive(Parser, Debug, Clone)]
#[command(
    name = "citasks",
    version,
    about = "Repository maintenance tasks for Python packages"
)]
pub struct CliArgs {
    /// Enable verbose output and debug logging
    #[arg(long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Enable quiet mode - minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Update dependency specifiers in pyproject.toml to admit the latest releases
    UpdateDeps(UpdateDepsArgs),
    /// Set the package version in __init__.py or user-provided files
    Setver(SetverArgs),
    /// Create the documentation landing page (index.md) from README.md
    CreateDocsIndex(DocsIndexArgs),
    /// Create the mkdocstrings API reference pages for Python packages
    CreateApiReferenceDocs(ApiReferenceArgs),
}

#[derive(Args, Debug, Clone)]
pub struct UpdateDepsArgs {
    /// Repository root containing pyproject.toml
    #[arg(default_value = ".")]
    pub root_repo_path: PathBuf,

    /// Ignore rule, e.g. 'dependency-name=numpy...versions=>=2'
    /// (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub ignore: Vec<String>,

    /// Separator between the key/value pairs of an ignore rule
    #[arg(long, default_value = DEFAULT_IGNORE_SEPARATOR)]
    pub ignore_separator: String,

    /// Stop at the first dependency that cannot be updated
    #[arg(long)]
    pub fail_fast: bool,

    /// Dry run mode - show what would be updated without making changes
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Base URL of a PyPI-compatible JSON API
    #[arg(long, value_name = "URL")]
    pub index_url: Option<String>,

    /// Run as a pre-commit hook: a root of '.' means the git top level
    #[arg(long)]
    pub pre_commit: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SetverArgs {
    /// Package directory, relative to the repository root
    #[arg(short, long)]
    pub package_dir: PathBuf,

    /// New version, SemVer or PEP 440, optionally prefixed by 'v'
    #[arg(long)]
    pub version: String,

    /// Repository root
    #[arg(short, long, default_value = ".")]
    pub root_repo_path: PathBuf,

    /// Update a file instead of __init__.py: 'file<sep>pattern<sep>replacement'
    /// (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub code_base_update: Vec<String>,

    /// Separator used in --code-base-update
    #[arg(long, default_value = ",")]
    pub code_base_update_separator: String,

    /// Show the substitutions without writing files
    #[arg(long)]
    pub test: bool,

    /// Stop at the first invalid --code-base-update
    #[arg(long)]
    pub fail_fast: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DocsIndexArgs {
    /// Repository root containing README.md
    #[arg(short, long, default_value = ".")]
    pub root_repo_path: PathBuf,

    /// Documentation root folder, relative to the repository root
    #[arg(long, default_value = "docs")]
    pub docs_folder: PathBuf,

    /// Replacement applied to README.md: 'old<sep>new'
    /// (can be specified multiple times; '<docs-folder>/' is always removed)
    #[arg(long, action = ArgAction::Append)]
    pub replacement: Vec<String>,

    /// Separator between the 'old' and 'new' part of a replacement
    #[arg(long, default_value = ",")]
    pub replacement_separator: String,

    /// Run as a pre-commit hook: fail if the landing page is not staged
    #[arg(long)]
    pub pre_commit: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ApiReferenceArgs {
    /// Package directory, relative to the repository root
    /// (can be specified multiple times)
    #[arg(short, long, required = true, action = ArgAction::Append)]
    pub package_dir: Vec<PathBuf>,

    /// Repository root
    #[arg(short, long, default_value = ".")]
    pub root_repo_path: PathBuf,

    /// Documentation root folder, relative to the repository root
    #[arg(long, default_value = "docs")]
    pub docs_folder: PathBuf,

    /// Remove the 'api_reference' folder before (re)creating it
    #[arg(long)]
    pub pre_clean: bool,

    /// Run as a pre-commit hook: fail if generated files are not staged
    #[arg(long)]
    pub pre_commit: bool,

    /// Folder name to leave out, with everything below it
    /// (can be specified multiple times; defaults to '__pycache__')
    #[arg(long, action = ArgAction::Append)]
    pub unwanted_folder: Vec<String>,

    /// File name to leave out (can be specified multiple times; defaults to '__init__.py')
    #[arg(long, action = ArgAction::Append)]
    pub unwanted_file: Vec<String>,

    /// Folder, relative to the package, documented even without docstrings
    #[arg(long, action = ArgAction::Append)]
    pub full_docs_folder: Vec<String>,

    /// File, relative to the package, documented even without docstrings
    #[arg(long, action = ArgAction::Append)]
    pub full_docs_file: Vec<String>,

    /// Extra mkdocstrings option for a file: 'path/to/file.py,option: value'
    /// (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub special_option: Vec<String>,

    /// Use import paths relative to the repository root
    #[arg(long)]
    pub relative: bool,
}

impl CliArgs {
    /// Whether this run only computes changes
    pub fn is_dry_run(&self) -> bool {
        match &self.command {
            Command::UpdateDeps(args) => args.dry_run,
            Command::Setver(args) => args.test,
            Command::CreateDocsIndex(_) | Command::CreateApiReferenceDocs(_) => false,
        }
    }
}
