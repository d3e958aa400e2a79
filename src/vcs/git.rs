//! Git backend driven through the `git` CLI

use super::{exec, lines, parse_commit_info, CommitInfo, Repo, VcsType};
use crate::error::{ReportError, ReportResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

const COMMIT_FORMAT: &str = "--format=%H%n%an <%ae>%n%aI%n%B";

/// A git working copy
pub struct GitRepo {
    remote: String,
    path: PathBuf,
}

impl GitRepo {
    pub fn new(remote: impl Into<String>, path: PathBuf) -> Self {
        Self {
            remote: remote.into(),
            path,
        }
    }

    async fn git(&self, args: &[&str]) -> ReportResult<String> {
        exec("git", Some(&self.path), args).await
    }

    /// Branch checked out at HEAD, or `None` when detached
    async fn branch(&self) -> ReportResult<Option<String>> {
        match self.git(&["symbolic-ref", "--short", "-q", "HEAD"]).await {
            Ok(out) => Ok(Some(out.trim().to_string())),
            Err(ReportError::Vcs { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl Repo for GitRepo {
    fn vcs(&self) -> VcsType {
        VcsType::Git
    }

    fn remote(&self) -> &str {
        &self.remote
    }

    fn local_path(&self) -> &Path {
        &self.path
    }

    async fn get(&self) -> ReportResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ReportError::io(format!("creating {}", parent.display()), e))?;
        }
        let dest = self.path.to_string_lossy();
        exec("git", None, &["clone", "--quiet", "--", &self.remote, &dest]).await?;
        Ok(())
    }

    async fn update(&self) -> ReportResult<()> {
        self.git(&["fetch", "--quiet", "--tags", "origin"]).await?;

        // A detached HEAD has nothing to fast-forward.
        if self.branch().await?.is_none() {
            debug!("{} is detached, skipping merge", self.path.display());
            return Ok(());
        }
        self.git(&["merge", "--quiet", "--ff-only", "@{upstream}"])
            .await?;
        Ok(())
    }

    async fn tags(&self) -> ReportResult<Vec<String>> {
        Ok(lines(&self.git(&["tag", "--list"]).await?))
    }

    async fn tags_from_commit(&self, rev: &str) -> ReportResult<Vec<String>> {
        Ok(lines(&self.git(&["tag", "--points-at", rev]).await?))
    }

    async fn current(&self) -> ReportResult<String> {
        match self.branch().await? {
            Some(branch) => Ok(branch),
            None => self.version().await,
        }
    }

    async fn version(&self) -> ReportResult<String> {
        Ok(self.git(&["rev-parse", "HEAD"]).await?.trim().to_string())
    }

    async fn update_version(&self, reference: &str) -> ReportResult<()> {
        self.git(&["checkout", "--quiet", reference, "--"]).await?;
        Ok(())
    }

    async fn commit_info(&self, rev: &str) -> ReportResult<CommitInfo> {
        let out = self.git(&["log", "-1", COMMIT_FORMAT, rev, "--"]).await?;
        parse_commit_info(&out)
    }
}
