//! Application error types using thiserror
//!
//! Error hierarchy:
//! - VersionError: Version strings that cannot be parsed or manipulated
//! - SpecifierError: Specifier sets that cannot be parsed or extended
//! - IgnoreRuleError: Malformed `--ignore` input
//! - ManifestError: Issues with pyproject.toml reading and rewriting
//! - RegistryError: Issues with package index communication
//! - SetVersionError: Issues with the `setver` task input
//! - GitError: Failures of the `git` executable in pre-commit mode
//! - DocsError: Issues with the documentation tasks

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Version related errors
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Specifier set related errors
    #[error(transparent)]
    Specifier(#[from] SpecifierError),

    /// Ignore rule related errors
    #[error(transparent)]
    IgnoreRule(#[from] IgnoreRuleError),

    /// Manifest file related errors
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Package index related errors
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// `setver` related errors
    #[error(transparent)]
    SetVersion(#[from] SetVersionError),

    /// `git` related errors
    #[error(transparent)]
    Git(#[from] GitError),

    /// Documentation task errors
    #[error(transparent)]
    Docs(#[from] DocsError),
}

/// Errors related to version values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// The string is neither a semantic version nor a PEP 440 version
    #[error("version ({input}) cannot be parsed as a semantic version: {message}")]
    Parse { input: String, message: String },

    /// An argument given to a version operation is not allowed
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
}

/// Errors related to specifiers and specifier sets
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecifierError {
    /// The specifier (set) string could not be parsed
    #[error("invalid specifier '{input}': {message}")]
    Parse { input: String, message: String },

    /// The specifier set cannot be extended to include the latest version
    #[error("unable to resolve: {message}")]
    Unresolvable { message: String },
}

/// Errors related to `--ignore` rules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IgnoreRuleError {
    /// The input is semantically wrong (e.g. a required key is missing)
    #[error("input error: {message}")]
    Input { message: String },

    /// The input could not be parsed, it may be wrongly formatted
    #[error("input parser error: {message}")]
    InputParser { message: String },
}

/// Errors related to manifest file operations
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest file not found
    #[error("could not find the Python package repository's 'pyproject.toml' file at: {path}")]
    NotFound { path: PathBuf },

    /// Failed to read manifest file
    #[error("failed to read manifest file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write manifest file
    #[error("failed to write manifest file {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error
    #[error("failed to parse TOML in {path}: {message}")]
    TomlParseError { path: PathBuf, message: String },

    /// No `requires-python` in the `[project]` table
    #[error("no minimum Python version requirement given in {path}")]
    MissingPythonRequirement { path: PathBuf },

    /// The dependency string to rewrite is not present in the file
    #[error("dependency '{dependency}' not found in {path}")]
    DependencyNotFound { path: PathBuf, dependency: String },
}

/// Errors related to package index communication
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Package not found in the index
    #[error("package '{package}' not found in {registry}")]
    PackageNotFound { package: String, registry: String },

    /// Network request failed
    #[error("failed to fetch package '{package}' from {registry}: {message}")]
    NetworkError {
        package: String,
        registry: String,
        message: String,
    },

    /// Rate limit exceeded
    #[error("rate limit exceeded for {registry}")]
    RateLimitExceeded { registry: String },

    /// Invalid response from the index
    #[error("invalid response from {registry} for '{package}': {message}")]
    InvalidResponse {
        package: String,
        registry: String,
        message: String,
    },

    /// Timeout
    #[error("timeout while fetching '{package}' from {registry}")]
    Timeout { package: String, registry: String },

    /// No release is usable for the requested Python version
    #[error("no suitable release of '{package}' found in {registry}")]
    NoSuitableVersion { package: String, registry: String },
}

/// Errors related to the `setver` task
#[derive(Error, Debug)]
pub enum SetVersionError {
    /// The given version is neither SemVer nor PEP 440
    #[error(
        "please specify version as a semantic version (SemVer) or PEP 440 version, \
         optionally prepended by a 'v' (got '{version}')"
    )]
    InvalidVersion { version: String },

    /// The repository root does not exist
    #[error("could not find the repository root at: {path}")]
    RepositoryNotFound { path: PathBuf },

    /// The package `__init__.py` does not exist
    #[error("could not find the Python package's root '__init__.py' file at: {path}")]
    InitFileNotFound { path: PathBuf },

    /// A `--code-base-update` value is not `file<sep>pattern<sep>replacement`
    #[error("could not extract 'file path', 'pattern', 'replacement string' from '{value}'")]
    InvalidCodeBaseUpdate { value: String },

    /// A `--code-base-update` file does not exist
    #[error("could not find the user-provided file at: {path}")]
    FileNotFound { path: PathBuf },

    /// A `--code-base-update` pattern is not a valid regular expression
    #[error("invalid pattern '{pattern}' for {path}: {message}")]
    InvalidPattern {
        path: PathBuf,
        pattern: String,
        message: String,
    },

    /// One or more `--code-base-update` values were invalid; nothing was written
    #[error("errors occurred, no files were changed:\n  - {}", errors.join("\n  - "))]
    ValidationFailed { errors: Vec<String> },

    /// Reading or writing a file failed
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Errors from running `git`
#[derive(Error, Debug)]
pub enum GitError {
    /// The `git` executable could not be started
    #[error("failed to run git: {0}")]
    Exec(#[from] std::io::Error),

    /// `git` exited with a non-zero status
    #[error("git {command} failed: {stderr}")]
    Command { command: String, stderr: String },

    /// The directory is not inside a git work tree
    #[error("not a git repository: {path}")]
    NotARepo { path: PathBuf },
}

/// Errors related to the documentation tasks
#[derive(Error, Debug)]
pub enum DocsError {
    /// The repository has no README.md to mirror
    #[error("could not find README.md at: {path}")]
    ReadmeNotFound { path: PathBuf },

    /// A `--replacement` value does not split into exactly 'old' and 'new'
    #[error(
        "a replacement must only include an 'old' and 'new' part, i.e., be of exactly \
         length 2 when split by the '--replacement-separator' ({separator:?}); got {value:?}"
    )]
    InvalidReplacement { value: String, separator: String },

    /// A `--package-dir` does not exist
    #[error("could not find the package directory at: {path}")]
    PackageDirNotFound { path: PathBuf },

    /// An unwanted folder or file was given as a path
    #[error("unwanted folders and files may NOT be paths, a forward slash (/) was found in '{value}'")]
    UnwantedIsPath { value: String },

    /// A `--special-option` is not `file,option` with a single comma
    #[error(
        "special-option values may only include a single comma (,) to separate the \
         relative file path and the mkdocstrings option (got '{value}')"
    )]
    InvalidSpecialOption { value: String },

    /// Pre-commit mode: the landing page differs from what is staged
    #[error("the landing page has been updated.\n\nPlease stage it:\n\n  git add {path}")]
    LandingPageChanged { path: String },

    /// Pre-commit mode: generated reference files differ from what is staged
    #[error(
        "the following files have been changed/added/removed:\n\n{status}\n\nPlease stage them:\n\n  git add {path}"
    )]
    ApiReferenceChanged { status: String, path: String },

    /// Reading, writing or removing a file failed
    #[error("failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Git(#[from] GitError),
}

impl DocsError {
    /// Creates a new Io error
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DocsError::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

impl VersionError {
    /// Creates a new Parse error
    pub fn parse(input: impl Into<String>, message: impl Into<String>) -> Self {
        VersionError::Parse {
            input: input.into(),
            message: message.into(),
        }
    }

    /// Creates a new InvalidArgument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        VersionError::InvalidArgument {
            message: message.into(),
        }
    }
}

impl SpecifierError {
    /// Creates a new Parse error
    pub fn parse(input: impl Into<String>, message: impl Into<String>) -> Self {
        SpecifierError::Parse {
            input: input.into(),
            message: message.into(),
        }
    }

    /// Creates a new Unresolvable error
    pub fn unresolvable(message: impl Into<String>) -> Self {
        SpecifierError::Unresolvable {
            message: message.into(),
        }
    }
}

impl From<VersionError> for SpecifierError {
    fn from(err: VersionError) -> Self {
        match err {
            VersionError::Parse { input, message } => SpecifierError::Parse { input, message },
            VersionError::InvalidArgument { message } => SpecifierError::Unresolvable { message },
        }
    }
}

impl IgnoreRuleError {
    /// Creates a new Input error
    pub fn input(message: impl Into<String>) -> Self {
        IgnoreRuleError::Input {
            message: message.into(),
        }
    }

    /// Creates a new InputParser error
    pub fn input_parser(message: impl Into<String>) -> Self {
        IgnoreRuleError::InputParser {
            message: message.into(),
        }
    }

    /// Every ignore rule error is an input error; parser errors are the more specific kind
    pub fn is_input_error(&self) -> bool {
        true
    }

    /// Returns true if the input could not be parsed
    pub fn is_parser_error(&self) -> bool {
        matches!(self, IgnoreRuleError::InputParser { .. })
    }
}

impl ManifestError {
    /// Creates a new NotFound error
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        ManifestError::NotFound { path: path.into() }
    }

    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new WriteError
    pub fn write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::WriteError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new TomlParseError
    pub fn toml_parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ManifestError::TomlParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new DependencyNotFound error
    pub fn dependency_not_found(path: impl Into<PathBuf>, dependency: impl Into<String>) -> Self {
        ManifestError::DependencyNotFound {
            path: path.into(),
            dependency: dependency.into(),
        }
    }
}

impl RegistryError {
    /// Creates a new PackageNotFound error
    pub fn package_not_found(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::PackageNotFound {
            package: package.into(),
            registry: registry.into(),
        }
    }

    /// Creates a new NetworkError
    pub fn network_error(
        package: impl Into<String>,
        registry: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::NetworkError {
            package: package.into(),
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Creates a new InvalidResponse error
    pub fn invalid_response(
        package: impl Into<String>,
        registry: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::InvalidResponse {
            package: package.into(),
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Creates a new RateLimitExceeded error
    pub fn rate_limit_exceeded(registry: impl Into<String>) -> Self {
        RegistryError::RateLimitExceeded {
            registry: registry.into(),
        }
    }

    /// Creates a new Timeout error
    pub fn timeout(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::Timeout {
            package: package.into(),
            registry: registry.into(),
        }
    }

    /// Creates a new NoSuitableVersion error
    pub fn no_suitable_version(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::NoSuitableVersion {
            package: package.into(),
            registry: registry.into(),
        }
    }
}
