//! The `create-docs-index` task

use super::{display_relative, repository_root, write_if_changed};
use crate::cli::DocsIndexArgs;
use crate::error::DocsError;
use crate::git;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Outcome of a `create-docs-index` run
#[derive(Debug, Clone, Serialize)]
pub struct DocsIndexReport {
    pub readme: PathBuf,
    pub index: PathBuf,
    /// Whether the landing page content changed
    pub written: bool,
    pub pre_commit: bool,
}

/// Run the `create-docs-index` task
pub fn run_docs_index(args: &DocsIndexArgs) -> Result<DocsIndexReport, DocsError> {
    let replacements = parse_replacements(args)?;
    let root = repository_root(&args.root_repo_path, args.pre_commit)?;

    let readme = root.join("README.md");
    if !readme.is_file() {
        return Err(DocsError::ReadmeNotFound { path: readme });
    }
    let index = root.join(&args.docs_folder).join("index.md");

    let mut content = fs::read_to_string(&readme).map_err(|e| DocsError::io("read", &readme, e))?;
    for (old, new) in &replacements {
        content = content.replace(old.as_str(), new);
    }
    let written = write_if_changed(&index, &content)?;
    debug!(index = %index.display(), written, "landing page");

    if args.pre_commit {
        ensure_staged(&root, &index)?;
    }

    Ok(DocsIndexReport {
        readme,
        index,
        written,
        pre_commit: args.pre_commit,
    })
}

/// User replacements in order, then `<docs folder name>/` removed to fix relative links
fn parse_replacements(args: &DocsIndexArgs) -> Result<Vec<(String, String)>, DocsError> {
    let separator = &args.replacement_separator;
    let mut replacements = args
        .replacement
        .iter()
        .map(|value| {
            let parts: Vec<&str> = value.split(separator.as_str()).collect();
            match parts.as_slice() {
                [old, new] => Ok((old.to_string(), new.to_string())),
                _ => Err(DocsError::InvalidReplacement {
                    value: value.clone(),
                    separator: separator.clone(),
                }),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(name) = args.docs_folder.file_name() {
        replacements.push((format!("{}/", name.to_string_lossy()), String::new()));
    }
    Ok(replacements)
}

fn ensure_staged(root: &Path, index: &Path) -> Result<(), DocsError> {
    let relative = display_relative(index, root);
    if git::unstaged_changes(root, Path::new(&relative))?.is_empty() {
        Ok(())
    } else {
        Err(DocsError::LandingPageChanged { path: relative })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const README: &str = "# Project\n\nSee [the guide](docs/guide.md) and [license](LICENSE).\n";

    fn docs_index_args(root: &Path, replacements: &[&str]) -> DocsIndexArgs {
        DocsIndexArgs {
            root_repo_path: root.to_path_buf(),
            docs_folder: PathBuf::from("docs"),
            replacement: replacements.iter().map(|r| r.to_string()).collect(),
            replacement_separator: ",".to_string(),
            pre_commit: false,
        }
    }

    fn create_repository() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("README.md"), README).unwrap();
        fs::create_dir_all(temp_dir.path().join("docs")).unwrap();
        temp_dir
    }

    #[test]
    fn test_mirrors_readme_without_docs_prefix() {
        let temp_dir = create_repository();

        let report = run_docs_index(&docs_index_args(temp_dir.path(), &[])).unwrap();

        assert!(report.written);
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("docs/index.md")).unwrap(),
            "# Project\n\nSee [the guide](guide.md) and [license](LICENSE).\n"
        );
    }

    #[test]
    fn test_user_replacements_apply_first() {
        let temp_dir = create_repository();
        let args = docs_index_args(temp_dir.path(), &["(LICENSE),(LICENSE.md)", "Project,Home"]);

        run_docs_index(&args).unwrap();

        assert_eq!(
            fs::read_to_string(temp_dir.path().join("docs/index.md")).unwrap(),
            "# Home\n\nSee [the guide](guide.md) and [license](LICENSE.md).\n"
        );
    }

    #[test]
    fn test_second_run_does_not_rewrite() {
        let temp_dir = create_repository();
        let args = docs_index_args(temp_dir.path(), &[]);

        assert!(run_docs_index(&args).unwrap().written);
        assert!(!run_docs_index(&args).unwrap().written);
    }

    #[test]
    fn test_custom_separator_and_docs_folder() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("README.md"), "[a](site/a.md) x,y\n").unwrap();
        fs::create_dir_all(temp_dir.path().join("site")).unwrap();
        let mut args = docs_index_args(temp_dir.path(), &["x,y|z"]);
        args.docs_folder = PathBuf::from("site");
        args.replacement_separator = "|".to_string();

        run_docs_index(&args).unwrap();

        assert_eq!(
            fs::read_to_string(temp_dir.path().join("site/index.md")).unwrap(),
            "[a](a.md) z\n"
        );
    }

    #[test]
    fn test_invalid_replacement_writes_nothing() {
        let temp_dir = create_repository();
        let args = docs_index_args(temp_dir.path(), &["a,b,c"]);

        let err = run_docs_index(&args).unwrap_err();

        assert!(matches!(err, DocsError::InvalidReplacement { .. }));
        assert!(!temp_dir.path().join("docs/index.md").exists());
    }

    #[test]
    fn test_missing_readme() {
        let temp_dir = TempDir::new().unwrap();
        let err = run_docs_index(&docs_index_args(temp_dir.path(), &[])).unwrap_err();
        assert!(matches!(err, DocsError::ReadmeNotFound { .. }));
    }
}
