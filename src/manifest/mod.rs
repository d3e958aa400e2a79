//! glide.yaml and glide.lock models
//!
//! Only the fields the report needs are modelled. Writing either file is
//! out of scope; a missing lock file is surfaced as an error with a hint.

use crate::error::{ReportError, ReportResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Manifest file name
pub const MANIFEST_FILE: &str = "glide.yaml";

/// Lock file name
pub const LOCK_FILE: &str = "glide.lock";

/// A dependency declared in the manifest (or synthesized from a lock entry)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Import path name
    #[serde(rename = "package")]
    pub name: String,

    /// Declared version constraint, branch or revision
    #[serde(rename = "version", default)]
    pub reference: String,

    /// Explicit remote location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,

    /// Explicit version control system
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vcs: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subpackages: Vec<String>,
}

impl Dependency {
    /// Synthesize a dependency from its lock entry alone (transitive imports)
    pub fn from_lock(lock: &LockEntry) -> Self {
        Self {
            name: lock.name.clone(),
            reference: String::new(),
            repo: lock.repo.clone(),
            vcs: lock.vcs.clone(),
            subpackages: lock.subpackages.clone(),
        }
    }

    /// Canonical remote URL
    pub fn remote(&self) -> String {
        match self.repo.as_deref() {
            Some(repo) if !repo.is_empty() => repo.to_string(),
            _ => format!("https://{}", self.name),
        }
    }
}

/// The human-authored manifest
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(rename = "package", default)]
    pub name: String,

    #[serde(rename = "import", default)]
    pub imports: Vec<Dependency>,

    #[serde(rename = "testImport", default)]
    pub dev_imports: Vec<Dependency>,
}

impl Manifest {
    /// Parse a manifest from YAML text
    pub fn from_yaml(path: &Path, yaml: &str) -> ReportResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| ReportError::ManifestParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Look up a declared dependency, optionally including test imports
    pub fn dependency(&self, name: &str, include_test: bool) -> Option<&Dependency> {
        let found = self.imports.iter().find(|d| d.name == name);
        if found.is_some() || !include_test {
            return found;
        }
        self.dev_imports.iter().find(|d| d.name == name)
    }
}

/// The resolved, pinned state of one dependency
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEntry {
    pub name: String,

    /// Pinned revision (commit id or tag)
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vcs: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subpackages: Vec<String>,
}

/// The generated lock file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lockfile {
    /// Content hash of the manifest this lock was derived from
    #[serde(default)]
    pub hash: String,

    #[serde(default)]
    pub updated: String,

    #[serde(default)]
    pub imports: Vec<LockEntry>,

    #[serde(rename = "testImports", default)]
    pub dev_imports: Vec<LockEntry>,
}

impl Lockfile {
    /// Parse a lock file from YAML text
    pub fn from_yaml(path: &Path, yaml: &str) -> ReportResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| ReportError::LockParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Find the lock entry for a name, optionally falling back to test imports
    pub fn entry(&self, name: &str, include_test: bool) -> Option<&LockEntry> {
        let found = self.imports.iter().find(|l| l.name == name);
        if found.is_some() || !include_test {
            return found;
        }
        self.dev_imports.iter().find(|l| l.name == name)
    }

    /// Every entry, main imports first; duplicates across the two sets are kept
    pub fn all_entries(&self) -> impl Iterator<Item = &LockEntry> {
        self.imports.iter().chain(self.dev_imports.iter())
    }
}

/// A manifest and lock file loaded from a project
#[derive(Debug, Clone)]
pub struct Project {
    /// Directory holding the manifest
    pub root: PathBuf,
    pub manifest: Manifest,
    pub lock: Lockfile,
}

/// Walk up from `start` until a manifest is found
pub fn find_manifest(start: &Path) -> ReportResult<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(MANIFEST_FILE);
        if candidate.is_file() {
            debug!("Found manifest: {}", candidate.display());
            return Ok(candidate);
        }
        dir = current.parent();
    }

    Err(ReportError::ManifestNotFound {
        file: MANIFEST_FILE.to_string(),
        start: start.to_path_buf(),
    })
}

/// Read the manifest found above `start`
pub async fn read_manifest(start: &Path) -> ReportResult<(PathBuf, Manifest)> {
    let path = find_manifest(start)?;
    let yaml = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| ReportError::ManifestRead {
            path: path.clone(),
            source: e,
        })?;
    let manifest = Manifest::from_yaml(&path, &yaml)?;
    Ok((path, manifest))
}

/// Read the lock file that sits next to the manifest
pub async fn read_lock(project_root: &Path) -> ReportResult<Lockfile> {
    let path = project_root.join(LOCK_FILE);
    if !path.is_file() {
        return Err(ReportError::LockNotFound(path));
    }
    let yaml = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| ReportError::LockRead {
            path: path.clone(),
            source: e,
        })?;
    Lockfile::from_yaml(&path, &yaml)
}

/// Load manifest and lock for the project containing `start`
pub async fn load_project(start: &Path) -> ReportResult<Project> {
    let (manifest_path, manifest) = read_manifest(start).await?;
    let root = manifest_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let lock = read_lock(&root).await?;
    Ok(Project {
        root,
        manifest,
        lock,
    })
}
