//! On-disk cache of dependency working copies
//!
//! Layout under the cache root:
//!
//! | Path | Contents |
//! |------|----------|
//! | `cache.lock` | store-wide lock, held for a whole run |
//! | `src/<key>/` | working copy |
//! | `locks/<key>.lock` | per-key advisory lock |
//! | `info/<key>.json` | [`RepoInfo`] metadata |
//!
//! Locks are `flock`-style advisory locks so separate processes sharing a
//! cache root exclude each other, not just tasks inside one process.

use super::key::CacheKey;
use crate::error::{ReportError, ReportResult};
use fs4::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const SYSTEM_LOCK_FILE: &str = "cache.lock";
const SRC_DIR: &str = "src";
const LOCKS_DIR: &str = "locks";
const INFO_DIR: &str = "info";

/// Metadata recorded when a working copy is first cloned
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoInfo {
    /// Branch checked out right after clone; empty for branchless backends
    #[serde(default)]
    pub default_branch: String,
}

/// Handle to a cache root
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Open (and create if needed) the cache rooted at `root`
    pub fn open(root: impl Into<PathBuf>) -> ReportResult<Self> {
        let root = root.into();
        for dir in [
            root.clone(),
            root.join(SRC_DIR),
            root.join(LOCKS_DIR),
            root.join(INFO_DIR),
        ] {
            fs::create_dir_all(&dir).map_err(|e| ReportError::CacheInit {
                path: dir.clone(),
                source: e,
            })?;
        }
        debug!("Cache root: {}", root.display());
        Ok(Self { root })
    }

    /// Root directory of all cached working copies
    pub fn location(&self) -> &Path {
        &self.root
    }

    /// Where the working copy for a key lives
    pub fn working_copy(&self, key: &CacheKey) -> PathBuf {
        self.root.join(SRC_DIR).join(key.as_str())
    }

    /// Take the store-wide lock, failing if another process holds it
    pub fn system_lock(&self) -> ReportResult<SystemLock> {
        let path = self.root.join(SYSTEM_LOCK_FILE);
        let file = open_lock_file(&path).map_err(|e| ReportError::CacheInit {
            path: path.clone(),
            source: e,
        })?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!("Acquired cache lock {}", path.display());
                Ok(SystemLock { file, path })
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => Err(ReportError::LockUnavailable(path)),
            Err(e) => Err(ReportError::CacheInit { path, source: e }),
        }
    }

    /// Take the per-key lock, waiting for any other holder to release it
    pub async fn lock(&self, key: &CacheKey) -> ReportResult<KeyLock> {
        let path = self.root.join(LOCKS_DIR).join(format!("{}.lock", key));
        let key = key.clone();

        // flock blocks the calling thread; keep it off the async workers.
        tokio::task::spawn_blocking(move || {
            let file = open_lock_file(&path)
                .map_err(|e| ReportError::io(format!("opening lock {}", path.display()), e))?;
            file.lock_exclusive()
                .map_err(|e| ReportError::io(format!("locking {}", path.display()), e))?;
            debug!("Locked {}", key);
            Ok(KeyLock { file, key })
        })
        .await
        .map_err(|e| ReportError::Worker(e.to_string()))?
    }

    /// Read the metadata for a key; a key never saved yields the default
    pub fn repo_data(&self, key: &CacheKey) -> ReportResult<RepoInfo> {
        let path = self.info_path(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(RepoInfo::default()),
            Err(e) => {
                return Err(ReportError::CacheData {
                    key: key.to_string(),
                    reason: e.to_string(),
                })
            }
        };

        serde_json::from_str(&content).map_err(|e| ReportError::CacheData {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    /// Persist the metadata for a key
    pub fn save_repo_data(&self, key: &CacheKey, info: &RepoInfo) -> ReportResult<()> {
        let path = self.info_path(key);
        let tmp = path.with_extension("json.partial");
        let content = serde_json::to_string_pretty(info)?;

        fs::write(&tmp, content)
            .and_then(|()| fs::rename(&tmp, &path))
            .map_err(|e| ReportError::CacheData {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        debug!("Saved repo data for {}: {:?}", key, info);
        Ok(())
    }

    fn info_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(INFO_DIR).join(format!("{}.json", key))
    }
}

fn open_lock_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(path)
}

/// Store-wide lock; released on drop
#[derive(Debug)]
pub struct SystemLock {
    file: File,
    path: PathBuf,
}

impl Drop for SystemLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("Failed to release {}: {}", self.path.display(), e);
        }
    }
}

/// Per-key lock; released on drop
#[derive(Debug)]
pub struct KeyLock {
    file: File,
    key: CacheKey,
}

impl Drop for KeyLock {
    fn drop(&mut self) {
        match FileExt::unlock(&self.file) {
            Ok(()) => debug!("Unlocked {}", self.key),
            Err(e) => warn!("Failed to unlock {}: {}", self.key, e),
        }
    }
}
