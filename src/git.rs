//! Calls to the `git` executable
//!
//! Only the `--pre-commit` mode of the tasks talks to git: to find the
//! repository root and to tell whether generated files still need staging.

use crate::error::GitError;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;
use tracing::debug;

/// `git status --porcelain` entry with an untracked or unstaged change
static UNSTAGED_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[? MARC][?MD]").unwrap());

/// Repository root a task works on.
///
/// In pre-commit mode the default root `.` is swapped for the top level of
/// the enclosing work tree, since hooks may run from any subdirectory.
pub fn resolve_root(root: &Path, pre_commit: bool) -> Result<PathBuf, GitError> {
    if pre_commit && root == Path::new(".") {
        let toplevel = toplevel(root)?;
        debug!(toplevel = %toplevel.display(), "resolved repository root");
        return Ok(toplevel);
    }
    Ok(root.to_path_buf())
}

/// Top level directory of the work tree containing `dir`
pub fn toplevel(dir: &Path) -> Result<PathBuf, GitError> {
    let output = git(dir, &["rev-parse", "--show-toplevel"])?;
    Ok(PathBuf::from(output.trim_end_matches(['\r', '\n'])))
}

/// Porcelain status lines under `pathspec` that are not fully staged
pub fn unstaged_changes(repo: &Path, pathspec: &Path) -> Result<Vec<String>, GitError> {
    let pathspec = pathspec.to_string_lossy();
    let output = git(repo, &["status", "--porcelain", "--", &pathspec])?;
    Ok(output
        .lines()
        .filter(|line| is_unstaged(line))
        .map(String::from)
        .collect())
}

fn is_unstaged(line: &str) -> bool {
    UNSTAGED_REGEX.is_match(line)
}

fn git(dir: &Path, args: &[&str]) -> Result<String, GitError> {
    let output = Command::new("git").arg("-C").arg(dir).args(args).output()?;

    if output.status.success() {
        return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.contains("not a git repository") {
        return Err(GitError::NotARepo {
            path: dir.to_path_buf(),
        });
    }
    Err(GitError::Command {
        command: args.first().copied().unwrap_or_default().to_string(),
        stderr,
    })
}
