//! pyproject.toml parser for Python projects
//!
//! Handles:
//! - project.requires-python (PEP 621)
//! - project.dependencies (PEP 621)
//! - project.optional-dependencies (PEP 621), groups in file order
//!
//! Rewriting replaces the spans of the dependency strings in the raw text so
//! that formatting and comments survive.

use crate::error::ManifestError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::ops::Range;
use std::path::{Path, PathBuf};
use toml::{Spanned, Table, Value};

/// Parser for pyproject.toml files
pub struct PyprojectTomlParser;

/// A dependency string as declared in the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredDependency {
    /// Optional dependency group, `None` for `project.dependencies`
    pub group: Option<String>,
    /// The PEP 508 string exactly as written
    pub raw: String,
}

/// Contents of a pyproject.toml relevant to dependency updates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyprojectManifest {
    pub path: PathBuf,
    pub requires_python: String,
    pub dependencies: Vec<DeclaredDependency>,
}

impl PyprojectTomlParser {
    /// Parse the `[project]` table of a pyproject.toml
    pub fn parse(&self, path: &Path, content: &str) -> Result<PyprojectManifest, ManifestError> {
        let toml: Table = toml::from_str(content)
            .map_err(|e| ManifestError::toml_parse_error(path, e.to_string()))?;
        let project = toml.get("project");

        let requires_python = project
            .and_then(|p| p.get("requires-python"))
            .and_then(|r| r.as_str())
            .ok_or_else(|| ManifestError::MissingPythonRequirement {
                path: path.to_path_buf(),
            })?
            .to_string();

        let mut dependencies = Vec::new();

        if let Some(deps) = project
            .and_then(|p| p.get("dependencies"))
            .and_then(|d| d.as_array())
        {
            collect_strings(path, "project.dependencies", deps, None, &mut dependencies)?;
        }

        if let Some(optional) = project
            .and_then(|p| p.get("optional-dependencies"))
            .and_then(|d| d.as_table())
        {
            for (group, deps) in optional {
                let key = format!("project.optional-dependencies.{}", group);
                let deps = deps.as_array().ok_or_else(|| {
                    ManifestError::toml_parse_error(path, format!("'{}' must be an array", key))
                })?;
                collect_strings(path, &key, deps, Some(group), &mut dependencies)?;
            }
        }

        Ok(PyprojectManifest {
            path: path.to_path_buf(),
            requires_python,
            dependencies,
        })
    }

    /// Replace every dependency string whose value is `old` with `new`.
    ///
    /// Only `project.dependencies` and `project.optional-dependencies` are
    /// touched. A literal string stays literal when `new` allows it.
    pub fn update_dependency(
        &self,
        path: &Path,
        content: &str,
        old: &str,
        new: &str,
    ) -> Result<String, ManifestError> {
        let document: SpannedDocument = toml::from_str(content)
            .map_err(|e| ManifestError::toml_parse_error(path, e.to_string()))?;

        let mut spans: Vec<Range<usize>> = document
            .project
            .dependencies
            .iter()
            .chain(document.project.optional_dependencies.values().flatten())
            .filter(|value| value.get_ref() == old)
            .map(|value| value.span())
            .collect();
        if spans.is_empty() {
            return Err(ManifestError::dependency_not_found(path, old));
        }

        spans.sort_by_key(|span| span.start);
        let mut updated = content.to_string();
        for span in spans.into_iter().rev() {
            let rendered = render_like(&content[span.clone()], new);
            updated.replace_range(span, &rendered);
        }
        Ok(updated)
    }
}

/// The dependency arrays of a pyproject.toml with the location of every string
#[derive(Deserialize)]
struct SpannedDocument {
    #[serde(default)]
    project: SpannedProject,
}

#[derive(Default, Deserialize)]
struct SpannedProject {
    #[serde(default)]
    dependencies: Vec<Spanned<String>>,
    #[serde(default, rename = "optional-dependencies")]
    optional_dependencies: BTreeMap<String, Vec<Spanned<String>>>,
}

/// Renders `value` as a TOML string in the style of `token`
fn render_like(token: &str, value: &str) -> String {
    if token.starts_with('\'') && !token.starts_with("'''") && !value.contains('\'') {
        format!("'{}'", value)
    } else {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

fn collect_strings(
    path: &Path,
    key: &str,
    values: &[Value],
    group: Option<&String>,
    out: &mut Vec<DeclaredDependency>,
) -> Result<(), ManifestError> {
    for value in values {
        let raw = value.as_str().ok_or_else(|| {
            ManifestError::toml_parse_error(path, format!("'{}' must only contain strings", key))
        })?;
        out.push(DeclaredDependency {
            group: group.cloned(),
            raw: raw.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<PyprojectManifest, ManifestError> {
        PyprojectTomlParser.parse(Path::new("pyproject.toml"), content)
    }

    fn raws(manifest: &PyprojectManifest) -> Vec<&str> {
        manifest
            .dependencies
            .iter()
            .map(|d| d.raw.as_str())
            .collect()
    }

    #[test]
    fn test_parse_pep621_dependencies() {
        let manifest = parse(
            r#"
[project]
name = "sample"
requires-python = ">=3.8"
dependencies = [
    "requests>=2.28,<3",
    "click ~=8.1",
]
"#,
        )
        .unwrap();

        assert_eq!(manifest.requires_python, ">=3.8");
        assert_eq!(raws(&manifest), vec!["requests>=2.28,<3", "click ~=8.1"]);
        assert!(manifest.dependencies.iter().all(|d| d.group.is_none()));
    }

    #[test]
    fn test_parse_optional_dependencies_in_file_order() {
        let manifest = parse(
            r#"
[project]
requires-python = ">=3.9"
dependencies = ["numpy>=1.24"]

[project.optional-dependencies]
test = ["pytest~=7.4", "coverage[toml]>=7"]
docs = ["sphinx<7"]
"#,
        )
        .unwrap();

        assert_eq!(
            raws(&manifest),
            vec!["numpy>=1.24", "pytest~=7.4", "coverage[toml]>=7", "sphinx<7"]
        );
        assert_eq!(manifest.dependencies[1].group.as_deref(), Some("test"));
        assert_eq!(manifest.dependencies[3].group.as_deref(), Some("docs"));
    }

    #[test]
    fn test_parse_without_dependencies() {
        let manifest = parse("[project]\nrequires-python = \">=3.8\"\n").unwrap();
        assert!(manifest.dependencies.is_empty());
    }

    #[test]
    fn test_parse_missing_requires_python() {
        let err = parse("[project]\ndependencies = [\"requests\"]\n").unwrap_err();
        assert!(matches!(err, ManifestError::MissingPythonRequirement { .. }));
    }

    #[test]
    fn test_parse_invalid_toml() {
        let err = parse("[project\nname = ").unwrap_err();
        assert!(matches!(err, ManifestError::TomlParseError { .. }));
    }

    #[test]
    fn test_parse_non_string_dependency() {
        let err = parse("[project]\nrequires-python = \">=3.8\"\ndependencies = [1]\n").unwrap_err();
        assert!(format!("{}", err).contains("must only contain strings"));
    }

    #[test]
    fn test_update_dependency_preserves_formatting() {
        let content = r#"[project]
dependencies = [
    "requests>=2.28,<3",  # http
    'click ~=8.1',
]
"#;
        let parser = PyprojectTomlParser;
        let path = Path::new("pyproject.toml");

        let updated = parser
            .update_dependency(path, content, "requests>=2.28,<3", "requests>=2.28,<4")
            .unwrap();
        let updated = parser
            .update_dependency(path, &updated, "click ~=8.1", "click ~=9.0")
            .unwrap();

        assert_eq!(
            updated,
            r#"[project]
dependencies = [
    "requests>=2.28,<4",  # http
    'click ~=9.0',
]
"#
        );
    }

    #[test]
    fn test_update_dependency_replaces_every_declaration() {
        let content = r#"[project]
dependencies = ["pkg<2"]

[project.optional-dependencies]
test = ["pkg<2", "other"]
"#;
        let updated = PyprojectTomlParser
            .update_dependency(Path::new("pyproject.toml"), content, "pkg<2", "pkg<3")
            .unwrap();
        assert_eq!(updated, content.replace("pkg<2", "pkg<3"));
    }

    #[test]
    fn test_update_dependency_leaves_other_tables_and_comments() {
        let content = r#"[project]
dependencies = [
    "pkg<2",  # was "pkg<2" before
]

[tool.other]
pins = ["pkg<2"]
"#;
        let updated = PyprojectTomlParser
            .update_dependency(Path::new("pyproject.toml"), content, "pkg<2", "pkg<3")
            .unwrap();
        assert_eq!(
            updated,
            r#"[project]
dependencies = [
    "pkg<3",  # was "pkg<2" before
]

[tool.other]
pins = ["pkg<2"]
"#
        );
    }

    #[test]
    fn test_update_dependency_with_escaped_quotes() {
        let content = r#"[project]
dependencies = ["pkg<2; python_version > \"3.8\""]
"#;
        let updated = PyprojectTomlParser
            .update_dependency(
                Path::new("pyproject.toml"),
                content,
                r#"pkg<2; python_version > "3.8""#,
                r#"pkg<3; python_version > "3.8""#,
            )
            .unwrap();
        assert_eq!(
            updated,
            r#"[project]
dependencies = ["pkg<3; python_version > \"3.8\""]
"#
        );
    }

    #[test]
    fn test_update_dependency_keeps_literal_string() {
        let content = r#"[project]
dependencies = ['pkg<2; python_version > "3.8"']
"#;
        let updated = PyprojectTomlParser
            .update_dependency(
                Path::new("pyproject.toml"),
                content,
                r#"pkg<2; python_version > "3.8""#,
                r#"pkg<3; python_version > "3.8""#,
            )
            .unwrap();
        assert_eq!(
            updated,
            r#"[project]
dependencies = ['pkg<3; python_version > "3.8"']
"#
        );
    }

    #[test]
    fn test_update_dependency_not_declared() {
        let err = PyprojectTomlParser
            .update_dependency(
                Path::new("pyproject.toml"),
                "[project]\ndependencies = [\"other<2\"]\n",
                "pkg<2",
                "pkg<3",
            )
            .unwrap_err();
        assert!(matches!(err, ManifestError::DependencyNotFound { .. }));
    }
}
