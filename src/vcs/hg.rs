//! Mercurial backend driven through the `hg` CLI

use super::{exec, lines, parse_commit_info, CommitInfo, Repo, VcsType};
use crate::error::{ReportError, ReportResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

const COMMIT_TEMPLATE: &str = "{node}\\n{author}\\n{date|rfc3339date}\\n{desc}";

/// A Mercurial working copy
pub struct HgRepo {
    remote: String,
    path: PathBuf,
}

impl HgRepo {
    pub fn new(remote: impl Into<String>, path: PathBuf) -> Self {
        Self {
            remote: remote.into(),
            path,
        }
    }

    async fn hg(&self, args: &[&str]) -> ReportResult<String> {
        exec("hg", Some(&self.path), args).await
    }
}

/// `tip` is a moving pseudo-tag, never a release
fn without_tip(tags: Vec<String>) -> Vec<String> {
    tags.into_iter().filter(|t| t != "tip").collect()
}

#[async_trait]
impl Repo for HgRepo {
    fn vcs(&self) -> VcsType {
        VcsType::Hg
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
        exec("hg", None, &["clone", "--quiet", &self.remote, &dest]).await?;
        Ok(())
    }

    async fn update(&self) -> ReportResult<()> {
        self.hg(&["pull", "--quiet"]).await?;
        self.hg(&["update", "--quiet"]).await?;
        Ok(())
    }

    async fn tags(&self) -> ReportResult<Vec<String>> {
        Ok(without_tip(lines(&self.hg(&["tags", "--quiet"]).await?)))
    }

    async fn tags_from_commit(&self, rev: &str) -> ReportResult<Vec<String>> {
        let out = self.hg(&["log", "-r", rev, "--template", "{tags}"]).await?;
        Ok(without_tip(
            out.split_whitespace().map(str::to_string).collect(),
        ))
    }

    async fn current(&self) -> ReportResult<String> {
        Ok(self.hg(&["branch"]).await?.trim().to_string())
    }

    async fn version(&self) -> ReportResult<String> {
        Ok(self
            .hg(&["log", "-r", ".", "--template", "{node}"])
            .await?
            .trim()
            .to_string())
    }

    async fn update_version(&self, reference: &str) -> ReportResult<()> {
        self.hg(&["update", "--quiet", "-r", reference]).await?;
        Ok(())
    }

    async fn commit_info(&self, rev: &str) -> ReportResult<CommitInfo> {
        let out = self
            .hg(&["log", "-r", rev, "--template", COMMIT_TEMPLATE])
            .await?;
        parse_commit_info(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tip_is_not_a_tag() {
        let tags = vec!["tip".to_string(), "1.0.0".to_string()];
        assert_eq!(without_tip(tags), vec!["1.0.0"]);
    }
}
