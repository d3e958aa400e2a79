//! Error types for depreport
//!
//! All modules use `ReportResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for depreport operations
pub type ReportResult<T> = Result<T, ReportError>;

/// All errors that can occur while producing a report
#[derive(Error, Debug)]
pub enum ReportError {
    // Configuration errors
    #[error("Failed to find {file} file in directory tree above {start}")]
    ManifestNotFound { file: String, start: PathBuf },

    #[error("Failed to load {path}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {reason}")]
    ManifestParse { path: PathBuf, reason: String },

    #[error("{0} file missing. Please generate first")]
    LockNotFound(PathBuf),

    #[error("Could not read lockfile {path}: {source}")]
    LockRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not load lockfile {path}: {reason}")]
    LockParse { path: PathBuf, reason: String },

    #[error("Unable to find expected lock for {0}")]
    LockEntryMissing(String),

    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // Cache initialization errors
    #[error("Unable to initialize cache at {path}: {source}")]
    CacheInit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache lock {0} is held by another process")]
    LockUnavailable(PathBuf),

    #[error("Error reading cache repo details for {key}: {reason}")]
    CacheData { key: String, reason: String },

    // Fetch errors
    #[error("Unable to fetch {name}: {reason}")]
    Fetch { name: String, reason: String },

    #[error("Unsupported version control system {vcs} for {name}")]
    UnsupportedVcs { name: String, vcs: String },

    #[error("Fetch worker failed: {0}")]
    Worker(String),

    // Classification errors
    #[error("Unable to classify {name}: {reason}")]
    Classify { name: String, reason: String },

    #[error("Command failed: {command}, stderr: {stderr}")]
    Vcs { command: String, stderr: String },

    #[error("Unable to generate SemVer constraint {constraint}: {reason}")]
    InvalidConstraint { constraint: String, reason: String },

    #[error("Unable to parse commit date {value}: {reason}")]
    CommitDate { value: String, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not run {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReportError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a VCS command error from captured stderr
    pub fn vcs(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::Vcs {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Wrap any error raised while syncing a dependency's working copy
    pub fn fetch(name: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::Fetch {
            name: name.into(),
            reason: cause.to_string(),
        }
    }

    /// Process exit code for this error
    ///
    /// 2: manifest missing or unreadable, 3: manifest unparsable, 1: everything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ManifestNotFound { .. } | Self::ManifestRead { .. } => 2,
            Self::ManifestParse { .. } => 3,
            _ => 1,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ManifestNotFound { .. } => Some("Run: glide init"),
            Self::LockNotFound(_) => Some("Run: glide update"),
            Self::LockUnavailable(_) => {
                Some("Wait for the other run to finish, or remove a stale lock file")
            }
            Self::UnsupportedVcs { .. } => Some("Only git and hg repositories are supported"),
            _ => None,
        }
    }
}
