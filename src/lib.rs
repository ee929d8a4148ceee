//! citasks - Repository maintenance tasks for Python packages
//!
//! This library provides the core functionality of the `citasks` tool:
//! - Loosening `pyproject.toml` dependency specifiers to admit the latest releases
//! - Filtering those updates through Dependabot-style ignore rules
//! - Setting the package version across the code base
//! - Generating MkDocs landing and API reference pages

pub mod cli;
pub mod docs;
pub mod domain;
pub mod error;
pub mod git;
pub mod ignore;
pub mod logging;
pub mod manifest;
pub mod orchestrator;
pub mod output;
pub mod progress;
pub mod registry;
pub mod setver;
pub mod update;
