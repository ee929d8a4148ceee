//! The `create-api-reference-docs` task
//!
//! Walks each package directory and writes, below `<docs>/api_reference`, a
//! Markdown page per Python module holding a mkdocstrings `:::` directive,
//! plus a `.pages` title file per package folder. Folders without an
//! `__init__.py` are not part of the public API and get no pages.

use super::{display_relative, repository_root, write_if_changed};
use crate::cli::ApiReferenceArgs;
use crate::error::DocsError;
use crate::git;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

const API_REFERENCE_FOLDER: &str = "api_reference";
const SHOW_UNDOCUMENTED: &str = "    options:\n      show_if_no_docstring: true\n";

/// Outcome of a `create-api-reference-docs` run
#[derive(Debug, Clone, Serialize)]
pub struct ApiReferenceReport {
    pub api_reference_dir: PathBuf,
    /// Pages and `.pages` files whose content changed
    pub written: Vec<PathBuf>,
    pub pre_commit: bool,
}

/// Validated walk settings
struct Layout<'a> {
    args: &'a ApiReferenceArgs,
    root: PathBuf,
    unwanted_folders: Vec<String>,
    unwanted_files: Vec<String>,
    /// mkdocstrings options per file path relative to the package
    special_options: HashMap<String, Vec<String>>,
    single_package: bool,
}

/// Run the `create-api-reference-docs` task
pub fn run_api_reference_docs(args: &ApiReferenceArgs) -> Result<ApiReferenceReport, DocsError> {
    let special_options = parse_special_options(&args.special_option)?;
    let unwanted_folders = or_default(&args.unwanted_folder, "__pycache__");
    let unwanted_files = or_default(&args.unwanted_file, "__init__.py");
    if let Some(value) = unwanted_folders
        .iter()
        .chain(&unwanted_files)
        .find(|value| value.contains('/'))
    {
        return Err(DocsError::UnwantedIsPath {
            value: value.clone(),
        });
    }

    let root = repository_root(&args.root_repo_path, args.pre_commit)?;
    let layout = Layout {
        args,
        root,
        unwanted_folders,
        unwanted_files,
        special_options,
        single_package: args.package_dir.len() == 1,
    };

    let api_dir = layout.root.join(&args.docs_folder).join(API_REFERENCE_FOLDER);
    if args.pre_clean && api_dir.exists() {
        debug!(dir = %api_dir.display(), "removing before recreation");
        fs::remove_dir_all(&api_dir).map_err(|e| DocsError::io("remove", &api_dir, e))?;
    }
    create_dir(&api_dir)?;

    let mut written = Vec::new();
    write_tracked(&api_dir.join(".pages"), &pages("API Reference"), &mut written)?;

    for package_dir in &args.package_dir {
        let package = layout.root.join(package_dir);
        if !package.is_dir() {
            return Err(DocsError::PackageDirNotFound { path: package });
        }
        layout.document_package(&package, &api_dir, &mut written)?;
    }
    info!(
        "{} API reference file(s) changed in {}",
        written.len(),
        api_dir.display()
    );

    if args.pre_commit {
        let relative = display_relative(&api_dir, &layout.root);
        let changes = git::unstaged_changes(&layout.root, Path::new(&relative))?;
        if !changes.is_empty() {
            return Err(DocsError::ApiReferenceChanged {
                status: changes.join("\n"),
                path: relative,
            });
        }
    }

    Ok(ApiReferenceReport {
        api_reference_dir: api_dir,
        written,
        pre_commit: args.pre_commit,
    })
}

impl Layout<'_> {
    fn document_package(
        &self,
        package: &Path,
        api_dir: &Path,
        written: &mut Vec<PathBuf>,
    ) -> Result<(), DocsError> {
        // With several packages, pages are nested under each package's own name
        let base = if self.single_package {
            package
        } else {
            package.parent().unwrap_or(package)
        };

        let walker = WalkDir::new(package)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !self
                        .unwanted_folders
                        .iter()
                        .any(|unwanted| entry.file_name().to_string_lossy() == *unwanted)
            });

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(package).to_path_buf();
                DocsError::io("walk", path, e.into())
            })?;
            let path = entry.path();

            if entry.file_type().is_dir() {
                if !path.join("__init__.py").is_file() {
                    debug!(dir = %path.display(), "no __init__.py, skipping");
                    continue;
                }
                let relpath = path.strip_prefix(base).unwrap_or(Path::new(""));
                let docs_dir = api_dir.join(relpath);
                create_dir(&docs_dir)?;
                if let Some(name) = relpath.file_name() {
                    let title = pages(&name.to_string_lossy());
                    write_tracked(&docs_dir.join(".pages"), &title, written)?;
                }
                continue;
            }

            let Some(parent) = path.parent() else {
                continue;
            };
            if !self.is_module(&entry) || !parent.join("__init__.py").is_file() {
                continue;
            }
            let relpath = parent.strip_prefix(base).unwrap_or(Path::new(""));
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            let page = self.page(package, relpath, &entry.file_name().to_string_lossy(), &stem);
            let target = api_dir.join(relpath).join(format!("{stem}.md"));
            write_tracked(&target, &page, written)?;
        }
        Ok(())
    }

    fn is_module(&self, entry: &walkdir::DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        name.ends_with(".py") && !self.unwanted_files.iter().any(|f| *f == name)
    }

    /// Markdown page for module `stem` in folder `relpath` (relative to the walk base)
    fn page(&self, package: &Path, relpath: &Path, filename: &str, stem: &str) -> String {
        let py_path = self.python_path(package, relpath, stem);
        let relpath_display = slash_path(relpath);
        let relative_file = if relpath_display == "." {
            filename.to_string()
        } else {
            format!("{relpath_display}/{filename}")
        };

        let mut page = format!("# {stem}\n\n::: {py_path}\n");
        if self.args.full_docs_file.contains(&relative_file)
            || self.args.full_docs_folder.contains(&relpath_display)
        {
            page.push_str(SHOW_UNDOCUMENTED);
        }
        if let Some(options) = self.special_options.get(&relative_file) {
            if !page.contains("options:\n") {
                page.push_str("    options:\n");
            }
            for option in options {
                page.push_str(&format!("      {option}\n"));
            }
        }
        page
    }

    /// Dotted import path of a module, e.g. `my_package.sub.module`
    fn python_path(&self, package: &Path, relpath: &Path, stem: &str) -> String {
        let package_name = package
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let import_root = if self.args.relative {
            display_relative(package, &self.root)
        } else {
            package_name.clone()
        };

        let inner = if self.single_package {
            relpath
        } else {
            relpath.strip_prefix(&package_name).unwrap_or(relpath)
        };
        let inner = slash_path(inner);
        let dotted = if inner == "." {
            format!("{import_root}/{stem}")
        } else {
            format!("{import_root}/{inner}/{stem}")
        };
        dotted.replace('/', ".")
    }
}

fn parse_special_options(values: &[String]) -> Result<HashMap<String, Vec<String>>, DocsError> {
    let mut options: HashMap<String, Vec<String>> = HashMap::new();
    for value in values {
        let Some((file, option)) = value.split_once(',') else {
            return Err(DocsError::InvalidSpecialOption {
                value: value.clone(),
            });
        };
        if option.contains(',') {
            return Err(DocsError::InvalidSpecialOption {
                value: value.clone(),
            });
        }
        options
            .entry(file.to_string())
            .or_default()
            .push(option.to_string());
    }
    Ok(options)
}

fn or_default(values: &[String], default: &str) -> Vec<String> {
    if values.is_empty() {
        vec![default.to_string()]
    } else {
        values.to_vec()
    }
}

fn pages(title: &str) -> String {
    format!("title: \"{title}\"\n")
}

/// Forward-slash rendering of a relative path; the empty path is `.`
fn slash_path(path: &Path) -> String {
    if path.as_os_str().is_empty() {
        ".".to_string()
    } else {
        path.to_string_lossy().replace('\\', "/")
    }
}

fn create_dir(path: &Path) -> Result<(), DocsError> {
    fs::create_dir_all(path).map_err(|e| DocsError::io("create", path, e))
}

fn write_tracked(path: &Path, content: &str, written: &mut Vec<PathBuf>) -> Result<(), DocsError> {
    if write_if_changed(path, content)? {
        debug!(file = %path.display(), "written");
        written.push(path.to_path_buf());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn api_reference_args(root: &Path, package_dirs: &[&str]) -> ApiReferenceArgs {
        ApiReferenceArgs {
            package_dir: package_dirs.iter().map(PathBuf::from).collect(),
            root_repo_path: root.to_path_buf(),
            docs_folder: PathBuf::from("docs"),
            pre_clean: false,
            pre_commit: false,
            unwanted_folder: Vec::new(),
            unwanted_file: Vec::new(),
            full_docs_folder: Vec::new(),
            full_docs_file: Vec::new(),
            special_option: Vec::new(),
            relative: false,
        }
    }

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    /// my_package/{__init__,core}.py, my_package/models/{__init__,item}.py,
    /// a __pycache__ folder and a data folder without __init__.py
    fn create_package(root: &Path, name: &str) {
        touch(root, &format!("{name}/__init__.py"));
        touch(root, &format!("{name}/core.py"));
        touch(root, &format!("{name}/models/__init__.py"));
        touch(root, &format!("{name}/models/item.py"));
        touch(root, &format!("{name}/__pycache__/__init__.py"));
        touch(root, &format!("{name}/__pycache__/core.py"));
        touch(root, &format!("{name}/data/loader.py"));
        touch(root, &format!("{name}/README.txt"));
    }

    fn read(root: &Path, relative: &str) -> String {
        fs::read_to_string(root.join(relative)).unwrap()
    }

    #[test]
    fn test_single_package_layout() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_package(root, "my_package");

        let report = run_api_reference_docs(&api_reference_args(root, &["my_package"])).unwrap();

        assert_eq!(report.written.len(), 4);
        assert_eq!(
            read(root, "docs/api_reference/.pages"),
            "title: \"API Reference\"\n"
        );
        assert_eq!(
            read(root, "docs/api_reference/core.md"),
            "# core\n\n::: my_package.core\n"
        );
        assert_eq!(
            read(root, "docs/api_reference/models/.pages"),
            "title: \"models\"\n"
        );
        assert_eq!(
            read(root, "docs/api_reference/models/item.md"),
            "# item\n\n::: my_package.models.item\n"
        );
        assert!(!root.join("docs/api_reference/__init__.md").exists());
        assert!(!root.join("docs/api_reference/__pycache__").exists());
        assert!(!root.join("docs/api_reference/data").exists());
    }

    #[test]
    fn test_multiple_packages_nest_by_name() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_package(&root.join("src"), "pkg_a");
        create_package(&root.join("src"), "pkg_b");

        run_api_reference_docs(&api_reference_args(root, &["src/pkg_a", "src/pkg_b"])).unwrap();

        assert_eq!(
            read(root, "docs/api_reference/pkg_a/.pages"),
            "title: \"pkg_a\"\n"
        );
        assert_eq!(
            read(root, "docs/api_reference/pkg_a/core.md"),
            "# core\n\n::: pkg_a.core\n"
        );
        assert_eq!(
            read(root, "docs/api_reference/pkg_b/models/item.md"),
            "# item\n\n::: pkg_b.models.item\n"
        );
    }

    #[test]
    fn test_relative_import_paths() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_package(&root.join("src"), "my_package");
        let mut args = api_reference_args(root, &["src/my_package"]);
        args.relative = true;

        run_api_reference_docs(&args).unwrap();

        assert_eq!(
            read(root, "docs/api_reference/models/item.md"),
            "# item\n\n::: src.my_package.models.item\n"
        );
    }

    #[test]
    fn test_full_docs_and_special_options() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_package(root, "my_package");
        let mut args = api_reference_args(root, &["my_package"]);
        args.full_docs_folder = vec!["models".to_string()];
        args.special_option = vec![
            "core.py,show_bases: false".to_string(),
            "models/item.py,heading_level: 3".to_string(),
        ];

        run_api_reference_docs(&args).unwrap();

        assert_eq!(
            read(root, "docs/api_reference/core.md"),
            "# core\n\n::: my_package.core\n    options:\n      show_bases: false\n"
        );
        assert_eq!(
            read(root, "docs/api_reference/models/item.md"),
            "# item\n\n::: my_package.models.item\n    options:\n      show_if_no_docstring: true\n      heading_level: 3\n"
        );
    }

    #[test]
    fn test_unwanted_file_and_pre_clean() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_package(root, "my_package");
        touch(root, "docs/api_reference/stale.md");
        let mut args = api_reference_args(root, &["my_package"]);
        args.unwanted_file = vec!["__init__.py".to_string(), "core.py".to_string()];
        args.pre_clean = true;

        run_api_reference_docs(&args).unwrap();

        assert!(!root.join("docs/api_reference/stale.md").exists());
        assert!(!root.join("docs/api_reference/core.md").exists());
        assert!(root.join("docs/api_reference/models/item.md").exists());
    }

    #[test]
    fn test_second_run_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_package(root, "my_package");
        let args = api_reference_args(root, &["my_package"]);

        run_api_reference_docs(&args).unwrap();
        assert!(run_api_reference_docs(&args).unwrap().written.is_empty());
    }

    #[test]
    fn test_invalid_inputs() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let mut args = api_reference_args(root, &["my_package"]);
        args.unwanted_folder = vec!["my_package/tests".to_string()];
        assert!(matches!(
            run_api_reference_docs(&args).unwrap_err(),
            DocsError::UnwantedIsPath { .. }
        ));

        let mut args = api_reference_args(root, &["my_package"]);
        args.special_option = vec!["core.py,a,b".to_string()];
        assert!(matches!(
            run_api_reference_docs(&args).unwrap_err(),
            DocsError::InvalidSpecialOption { .. }
        ));

        let args = api_reference_args(root, &["missing"]);
        assert!(matches!(
            run_api_reference_docs(&args).unwrap_err(),
            DocsError::PackageDirNotFound { .. }
        ));
    }
}
