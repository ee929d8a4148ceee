//! Documentation tasks for MkDocs sites
//!
//! - `create-docs-index`: mirror README.md as the documentation landing page
//! - `create-api-reference-docs`: one mkdocstrings page per Python module
//!
//! Both only touch files whose content changes, so a second run on an
//! unchanged tree leaves `git status` clean.

mod api_reference;
mod index;

pub use api_reference::{run_api_reference_docs, ApiReferenceReport};
pub use index::{run_docs_index, DocsIndexReport};

use crate::error::DocsError;
use std::fs;
use std::path::{Path, PathBuf};

/// Write `content` to `path` unless it already holds exactly that; true if written
fn write_if_changed(path: &Path, content: &str) -> Result<bool, DocsError> {
    if fs::read_to_string(path).is_ok_and(|existing| existing == content) {
        return Ok(false);
    }
    fs::write(path, content).map_err(|e| DocsError::io("write", path, e))?;
    Ok(true)
}

/// Absolute repository root, with `.` swapped for the git top level in pre-commit mode
fn repository_root(root: &Path, pre_commit: bool) -> Result<PathBuf, DocsError> {
    let root = crate::git::resolve_root(root, pre_commit)?;
    std::path::absolute(&root).map_err(|e| DocsError::io("resolve", root, e))
}

/// `path` relative to `root` with forward slashes, as shown to the user and given to git
fn display_relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
