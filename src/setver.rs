//! The `setver` task
//!
//! Sets the version of a Python package, either in the package's root
//! `__init__.py` or in user-provided files through `--code-base-update`
//! substitutions of the form `file<sep>pattern<sep>replacement`.
//!
//! All `--code-base-update` values are validated before any file is written.

use crate::cli::SetverArgs;
use crate::domain::SemanticVersion;
use crate::error::SetVersionError;
use crate::manifest::{read_manifest, write_manifest};
use regex::{NoExpand, Regex};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, error};

static INIT_VERSION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"__version__ *= *(?:'|").*(?:'|")"#).unwrap());

/// A validated substitution for a single file
#[derive(Debug, Clone, Serialize)]
pub struct FileUpdate {
    pub path: PathBuf,
    pub pattern: String,
    /// Replacement as given on the command line
    pub input_replacement: String,
    /// Replacement with `{package_dir}` and `{version}` substituted
    pub replacement: String,
    #[serde(skip)]
    regex: Regex,
}

/// Outcome of a `setver` run
#[derive(Debug, Clone, Serialize)]
pub struct SetverReport {
    pub package_dir: String,
    pub version: String,
    pub updates: Vec<FileUpdate>,
    /// Whether files were left untouched
    pub test: bool,
}

/// Run the `setver` task
pub fn run_setver(args: &SetverArgs) -> Result<SetverReport, SetVersionError> {
    let version = parse_version(&args.version)?;
    let package_dir = args.package_dir.to_string_lossy().to_string();

    let root = std::path::absolute(&args.root_repo_path).map_err(|_| {
        SetVersionError::RepositoryNotFound {
            path: args.root_repo_path.clone(),
        }
    })?;
    if !root.exists() {
        return Err(SetVersionError::RepositoryNotFound { path: root });
    }

    let updates = if args.code_base_update.is_empty() {
        vec![init_file_update(&root, &args.package_dir, &version)?]
    } else {
        validate_updates(args, &root, &package_dir, &version)?
    };

    if !args.test {
        apply(&updates)?;
    }

    Ok(SetverReport {
        package_dir,
        version: version.to_string(),
        updates,
        test: args.test,
    })
}

/// Parse a SemVer or PEP 440 version, optionally prefixed by `v`
pub fn parse_version(input: &str) -> Result<SemanticVersion, SetVersionError> {
    let trimmed = input.trim();
    let unprefixed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    SemanticVersion::parse(unprefixed).map_err(|_| SetVersionError::InvalidVersion {
        version: input.to_string(),
    })
}

fn init_file_update(
    root: &Path,
    package_dir: &Path,
    version: &SemanticVersion,
) -> Result<FileUpdate, SetVersionError> {
    let path = root.join(package_dir).join("__init__.py");
    if !path.exists() {
        return Err(SetVersionError::InitFileNotFound { path });
    }

    let replacement = format!("__version__ = \"{}\"", version);
    Ok(FileUpdate {
        path,
        pattern: INIT_VERSION_REGEX.as_str().to_string(),
        input_replacement: replacement.clone(),
        replacement,
        regex: INIT_VERSION_REGEX.clone(),
    })
}

fn validate_updates(
    args: &SetverArgs,
    root: &Path,
    package_dir: &str,
    version: &SemanticVersion,
) -> Result<Vec<FileUpdate>, SetVersionError> {
    let mut updates = Vec::new();
    let mut errors = Vec::new();

    for value in &args.code_base_update {
        match validate_update(
            value,
            &args.code_base_update_separator,
            root,
            package_dir,
            version,
        ) {
            Ok(update) => {
                debug!(
                    "filepath: {}, pattern: {:?}, replacement (input): {}, replacement (handled): {}",
                    update.path.display(),
                    update.pattern,
                    update.input_replacement,
                    update.replacement
                );
                updates.push(update);
            }
            Err(e) if args.fail_fast => return Err(e),
            Err(e) => {
                error!("{}", e);
                errors.push(e.to_string());
            }
        }
    }

    if errors.is_empty() {
        Ok(updates)
    } else {
        Err(SetVersionError::ValidationFailed { errors })
    }
}

fn validate_update(
    value: &str,
    separator: &str,
    root: &Path,
    package_dir: &str,
    version: &SemanticVersion,
) -> Result<FileUpdate, SetVersionError> {
    let parts: Vec<&str> = value.split(separator).collect();
    let [file, pattern, input_replacement] = parts.as_slice() else {
        return Err(SetVersionError::InvalidCodeBaseUpdate {
            value: value.to_string(),
        });
    };

    let file = PathBuf::from(substitute(file, package_dir, version));
    let path = if file.is_absolute() {
        file
    } else {
        root.join(file)
    };
    if !path.exists() {
        return Err(SetVersionError::FileNotFound { path });
    }

    let regex = Regex::new(pattern).map_err(|e| SetVersionError::InvalidPattern {
        path: path.clone(),
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;

    Ok(FileUpdate {
        path,
        pattern: pattern.to_string(),
        input_replacement: input_replacement.to_string(),
        replacement: substitute(input_replacement, package_dir, version),
        regex,
    })
}

fn substitute(template: &str, package_dir: &str, version: &SemanticVersion) -> String {
    template
        .replace("{package_dir}", package_dir)
        .replace("{version}", &version.to_string())
}

fn apply(updates: &[FileUpdate]) -> Result<(), SetVersionError> {
    for update in updates {
        let content = read_manifest(&update.path)?;
        let is_markdown = update
            .path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("md"));
        let updated = replace_lines(&content, &update.regex, &update.replacement, is_markdown);
        write_manifest(&update.path, &updated)?;
        debug!("Updated {}", update.path.display());
    }
    Ok(())
}

/// Apply `regex` to every line; trailing whitespace is kept only for Markdown
fn replace_lines(content: &str, regex: &Regex, replacement: &str, is_markdown: bool) -> String {
    let mut result = String::with_capacity(content.len());
    for line in content.lines() {
        let line = if is_markdown { line } else { line.trim_end() };
        if replacement.contains('$') {
            result.push_str(&regex.replace_all(line, replacement));
        } else {
            result.push_str(&regex.replace_all(line, NoExpand(replacement)));
        }
        result.push('\n');
    }
    result
}
