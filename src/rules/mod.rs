//! Dependency classification rules
//!
//! A [`Classifier`] runs an ordered registry of [`Rule`]s against one
//! dependency's synced working copy and collects their [`Finding`]s.
//!
//! Tag data is read once into a [`TagSnapshot`] before any rule runs.
//! Rules that move the checkout (see [`Rule::mutates_checkout`]) are always
//! ordered after the read-only ones, so no rule observes another's checkout.

mod compliance;
mod freshness;

pub use compliance::{evaluate_semver, parse_tag, TagVersion, UsesSemver};
pub use freshness::{age_finding, HowOld};

use crate::cache::{CacheKey, CacheStore};
use crate::error::{ReportError, ReportResult};
use crate::manifest::{Dependency, LockEntry};
use crate::vcs::Repo;
use async_trait::async_trait;
use std::fmt;
use tracing::debug;

/// Severity of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mark {
    Pass,
    Warn,
    Fail,
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "pass"),
            Self::Warn => write!(f, "warn"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

/// One reported verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub mark: Mark,
    pub message: String,
}

impl Finding {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            mark: Mark::Pass,
            message: message.into(),
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            mark: Mark::Warn,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            mark: Mark::Fail,
            message: message.into(),
        }
    }
}

/// Tag data read from a working copy before any rule runs
#[derive(Debug, Clone, Default)]
pub struct TagSnapshot {
    /// Every tag in the repository
    pub tags: Vec<String>,
    /// Tags that parse as semantic versions, highest first
    pub releases: Vec<TagVersion>,
    /// Tags pointing at the pinned revision; only read when releases exist
    pub pinned_tags: Vec<String>,
}

impl TagSnapshot {
    /// Build a snapshot from raw tag lists
    pub fn from_tags(tags: Vec<String>, pinned_tags: Vec<String>) -> Self {
        let mut releases: Vec<TagVersion> = tags.iter().filter_map(|t| parse_tag(t)).collect();
        releases.sort_by(|a, b| b.precedence_cmp(a));
        Self {
            tags,
            releases,
            pinned_tags,
        }
    }

    /// Read tags (and, for semver projects, the pinned revision's tags) from a repo
    pub async fn read(repo: &dyn Repo, pinned: &str) -> ReportResult<Self> {
        let tags = repo.tags().await?;
        let has_releases = tags.iter().any(|t| parse_tag(t).is_some());
        let pinned_tags = if has_releases {
            repo.tags_from_commit(pinned).await?
        } else {
            Vec::new()
        };
        Ok(Self::from_tags(tags, pinned_tags))
    }

    pub fn uses_semver(&self) -> bool {
        !self.releases.is_empty()
    }
}

/// Everything a rule may look at for one dependency
pub struct Subject<'a> {
    pub name: &'a str,
    pub dependency: &'a Dependency,
    pub lock: &'a LockEntry,
    pub repo: &'a dyn Repo,
    pub store: &'a CacheStore,
    pub key: &'a CacheKey,
    pub snapshot: &'a TagSnapshot,
}

/// A single classification rule
#[async_trait]
pub trait Rule: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Whether evaluation changes the working copy's checkout
    fn mutates_checkout(&self) -> bool {
        false
    }

    /// Produce zero or more findings for the subject
    async fn evaluate(&self, subject: &Subject<'_>) -> ReportResult<Vec<Finding>>;
}

/// Ordered rule registry
pub struct Classifier {
    rules: Vec<Box<dyn Rule>>,
}

impl Classifier {
    /// Register rules; checkout-mutating rules are moved behind read-only ones
    pub fn new(mut rules: Vec<Box<dyn Rule>>) -> Self {
        rules.sort_by_key(|r| r.mutates_checkout());
        Self { rules }
    }

    /// The semver compliance and revision freshness rules, in that order
    pub fn standard() -> Self {
        Self::new(vec![Box::new(UsesSemver), Box::new(HowOld)])
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Run every rule against one dependency, holding its cache key lock
    pub async fn classify(
        &self,
        name: &str,
        dependency: &Dependency,
        lock: &LockEntry,
        repo: &dyn Repo,
        store: &CacheStore,
    ) -> ReportResult<Vec<Finding>> {
        let key = CacheKey::from_remote(&dependency.remote());
        let _guard = store.lock(&key).await?;

        let snapshot = TagSnapshot::read(repo, &lock.version)
            .await
            .map_err(|e| classify_error(name, e))?;
        let subject = Subject {
            name,
            dependency,
            lock,
            repo,
            store,
            key: &key,
            snapshot: &snapshot,
        };

        let mut findings = Vec::new();
        for rule in &self.rules {
            debug!("Evaluating {} on {}", rule.name(), name);
            let found = rule
                .evaluate(&subject)
                .await
                .map_err(|e| classify_error(name, e))?;
            findings.extend(found);
        }
        Ok(findings)
    }
}

fn classify_error(name: &str, e: ReportError) -> ReportError {
    ReportError::Classify {
        name: name.to_string(),
        reason: e.to_string(),
    }
}
