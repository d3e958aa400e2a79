//! Version control abstraction
//!
//! Each dependency's working copy is driven through the [`Repo`] trait so the
//! fetch pipeline and the rules never care which backend they talk to.
//! Git and Mercurial are supported by shelling out to their CLIs.

mod git;
mod hg;

pub use git::GitRepo;
pub use hg::HgRepo;

use crate::error::{ReportError, ReportResult};
use crate::manifest::Dependency;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Supported version control systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VcsType {
    Git,
    Hg,
    Bzr,
    Svn,
}

impl VcsType {
    /// Parse an explicit `vcs` declaration
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "git" => Some(Self::Git),
            "hg" | "mercurial" => Some(Self::Hg),
            "bzr" | "bazaar" => Some(Self::Bzr),
            "svn" | "subversion" => Some(Self::Svn),
            _ => None,
        }
    }

    /// Whether the backend has a notion of named branches
    pub fn has_branches(&self) -> bool {
        matches!(self, Self::Git | Self::Hg)
    }
}

impl fmt::Display for VcsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Git => "git",
            Self::Hg => "hg",
            Self::Bzr => "bzr",
            Self::Svn => "svn",
        };
        write!(f, "{}", name)
    }
}

/// Metadata of a single commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub commit: String,
    pub author: String,
    pub date: DateTime<Utc>,
    pub message: String,
}

/// A dependency's working copy
#[async_trait]
pub trait Repo: Send + Sync {
    /// Backend of this repository
    fn vcs(&self) -> VcsType;

    /// Remote location the working copy was cloned from
    fn remote(&self) -> &str;

    /// On-disk location of the working copy
    fn local_path(&self) -> &Path;

    /// Whether the working copy exists on disk
    fn is_present(&self) -> bool {
        self.local_path().exists()
    }

    /// Clone the remote into the local path
    async fn get(&self) -> ReportResult<()>;

    /// Pull upstream changes into an existing working copy
    async fn update(&self) -> ReportResult<()>;

    /// All tags known to the working copy
    async fn tags(&self) -> ReportResult<Vec<String>>;

    /// Tags pointing at the given revision
    async fn tags_from_commit(&self, rev: &str) -> ReportResult<Vec<String>>;

    /// Checked-out branch name, or the revision id when no branch is checked out
    async fn current(&self) -> ReportResult<String>;

    /// Revision id of the checked-out commit
    async fn version(&self) -> ReportResult<String>;

    /// Move the working copy to a branch, tag or revision
    async fn update_version(&self, reference: &str) -> ReportResult<()>;

    /// Commit metadata for a revision
    async fn commit_info(&self, rev: &str) -> ReportResult<CommitInfo>;
}

/// Opens working copies for dependencies
pub trait RepoOpener: Send + Sync {
    fn open(&self, dep: &Dependency, path: PathBuf) -> ReportResult<Box<dyn Repo>>;
}

/// Opener backed by the system's git and hg binaries
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRepos;

impl RepoOpener for SystemRepos {
    fn open(&self, dep: &Dependency, path: PathBuf) -> ReportResult<Box<dyn Repo>> {
        open_repo(dep, path)
    }
}

/// Detect the backend for a dependency; an undeclared `vcs` means git
pub fn detect_vcs(dep: &Dependency) -> ReportResult<VcsType> {
    match dep.vcs.as_deref().map(str::trim) {
        None | Some("") => Ok(VcsType::Git),
        Some(declared) => VcsType::parse(declared).ok_or_else(|| ReportError::UnsupportedVcs {
            name: dep.name.clone(),
            vcs: declared.to_string(),
        }),
    }
}

/// Create a repository handle appropriate for the dependency's backend
pub fn open_repo(dep: &Dependency, path: PathBuf) -> ReportResult<Box<dyn Repo>> {
    let remote = dep.remote();
    match detect_vcs(dep)? {
        VcsType::Git => Ok(Box::new(GitRepo::new(remote, path))),
        VcsType::Hg => Ok(Box::new(HgRepo::new(remote, path))),
        other => Err(ReportError::UnsupportedVcs {
            name: dep.name.clone(),
            vcs: other.to_string(),
        }),
    }
}

/// Run a VCS command and return its stdout
pub(crate) async fn exec(program: &str, dir: Option<&Path>, args: &[&str]) -> ReportResult<String> {
    debug!("Executing: {} {:?}", program, args);

    let mut cmd = Command::new(program);
    cmd.args(args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .env("HGPLAIN", "1")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }

    let command = format!("{} {}", program, args.join(" "));
    let output = cmd
        .output()
        .await
        .map_err(|e| ReportError::command_failed(command.clone(), e))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        Err(ReportError::vcs(
            command,
            String::from_utf8_lossy(&output.stderr).trim(),
        ))
    }
}

/// Split command output into trimmed, non-empty lines
pub(crate) fn lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `revision\nauthor\ndate\nmessage` as printed by the backends' log templates
pub(crate) fn parse_commit_info(raw: &str) -> ReportResult<CommitInfo> {
    let mut parts = raw.splitn(4, '\n');
    let commit = parts.next().unwrap_or_default().trim().to_string();
    let author = parts.next().unwrap_or_default().trim().to_string();
    let date_raw = parts.next().unwrap_or_default().trim();
    let message = parts.next().unwrap_or_default().trim().to_string();

    let date = DateTime::parse_from_rfc3339(date_raw)
        .map_err(|e| ReportError::CommitDate {
            value: date_raw.to_string(),
            reason: e.to_string(),
        })?
        .with_timezone(&Utc);

    Ok(CommitInfo {
        commit,
        author,
        date,
        message,
    })
}
