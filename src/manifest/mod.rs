//! Manifest file location, parsing and rewriting
//!
//! This module provides functionality to:
//! - Locate the repository's pyproject.toml
//! - Parse `requires-python` and dependency strings from it
//! - Rewrite dependency strings while keeping the file's formatting

mod pyproject_toml;
mod writer;

pub use pyproject_toml::{DeclaredDependency, PyprojectManifest, PyprojectTomlParser};
pub use writer::{read_manifest, write_manifest, ManifestWriter, WriteResult};

use crate::error::ManifestError;
use std::path::{Path, PathBuf};

/// Manifest filename at the repository root
pub const MANIFEST_FILENAME: &str = "pyproject.toml";

/// Locate the pyproject.toml of the repository at `root`
pub fn find_manifest(root: &Path) -> Result<PathBuf, ManifestError> {
    let path = root.join(MANIFEST_FILENAME);
    if path.is_file() {
        Ok(path)
    } else {
        Err(ManifestError::not_found(path))
    }
}

/// Read and parse the pyproject.toml at `path`
pub fn parse_manifest(path: &Path) -> Result<PyprojectManifest, ManifestError> {
    let content = read_manifest(path)?;
    PyprojectTomlParser.parse(path, &content)
}
