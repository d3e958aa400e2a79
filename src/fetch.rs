//! Fetch pipeline: bring every locked dependency's working copy up to date
//!
//! A fixed pool of workers drains a bounded job queue. Each job clones or
//! updates one working copy while holding that cache key's lock, so two jobs
//! for the same remote never overlap. The first failure stops workers from
//! taking new jobs; jobs already running are allowed to finish before the
//! error is returned, so no working copy is abandoned mid-write.

use crate::cache::{CacheKey, CacheStore, RepoInfo};
use crate::error::{ReportError, ReportResult};
use crate::manifest::{Dependency, LockEntry};
use crate::ui::FetchProgress;
use crate::vcs::{Repo, RepoOpener};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// What a single fetch job did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Cloned,
    Updated,
}

/// Counts of completed fetch jobs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub cloned: usize,
    pub updated: usize,
}

impl FetchSummary {
    fn record(&mut self, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Cloned => self.cloned += 1,
            FetchOutcome::Updated => self.updated += 1,
        }
    }

    fn merge(&mut self, other: FetchSummary) {
        self.cloned += other.cloned;
        self.updated += other.updated;
    }

    pub fn total(&self) -> usize {
        self.cloned + self.updated
    }
}

/// Bounded worker pool syncing working copies into a cache store
pub struct FetchPipeline {
    store: CacheStore,
    opener: Arc<dyn RepoOpener>,
    workers: usize,
    progress: FetchProgress,
}

impl FetchPipeline {
    pub fn new(store: CacheStore, opener: Arc<dyn RepoOpener>, workers: usize) -> Self {
        Self {
            store,
            opener,
            workers: workers.max(1),
            progress: FetchProgress::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: FetchProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Fetch every entry and wait for all workers to finish
    ///
    /// Entries are not de-duplicated; repeated remotes serialize on their key lock.
    pub async fn run(&self, entries: Vec<LockEntry>) -> ReportResult<FetchSummary> {
        let (tx, rx) = mpsc::channel::<LockEntry>(self.workers);
        let rx = Arc::new(Mutex::new(rx));
        let cancelled = Arc::new(AtomicBool::new(false));

        self.progress.start(entries.len());

        let mut pool = JoinSet::new();
        for id in 0..self.workers {
            let worker = Worker {
                id,
                jobs: Arc::clone(&rx),
                cancelled: Arc::clone(&cancelled),
                store: self.store.clone(),
                opener: Arc::clone(&self.opener),
                progress: self.progress.clone(),
            };
            pool.spawn(worker.run());
        }
        drop(rx);

        for entry in entries {
            if cancelled.load(Ordering::SeqCst) {
                debug!("Fetch cancelled, not queueing remaining jobs");
                break;
            }
            // Fails only once every worker has exited.
            if tx.send(entry).await.is_err() {
                break;
            }
        }
        // Closing the queue is the stop signal: workers exit once it is drained.
        drop(tx);

        let mut summary = FetchSummary::default();
        let mut first_error = None;
        while let Some(joined) = pool.join_next().await {
            match joined {
                Ok(Ok(stats)) => summary.merge(stats),
                Ok(Err(e)) => {
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    first_error.get_or_insert(ReportError::Worker(e.to_string()));
                }
            }
        }

        self.progress.finish();

        match first_error {
            Some(e) => Err(e),
            None => {
                info!(
                    "Fetched {} dependencies ({} cloned, {} updated)",
                    summary.total(),
                    summary.cloned,
                    summary.updated
                );
                Ok(summary)
            }
        }
    }
}

struct Worker {
    id: usize,
    jobs: Arc<Mutex<mpsc::Receiver<LockEntry>>>,
    cancelled: Arc<AtomicBool>,
    store: CacheStore,
    opener: Arc<dyn RepoOpener>,
    progress: FetchProgress,
}

impl Worker {
    async fn run(self) -> ReportResult<FetchSummary> {
        let mut stats = FetchSummary::default();
        loop {
            if self.cancelled.load(Ordering::SeqCst) {
                break;
            }
            let next = self.jobs.lock().await.recv().await;
            let Some(entry) = next else {
                break;
            };

            match fetch_one(&self.store, self.opener.as_ref(), &entry).await {
                Ok(outcome) => {
                    stats.record(outcome);
                    self.progress.advance(&entry.name);
                }
                Err(e) => {
                    warn!("Worker {} failed on {}: {}", self.id, entry.name, e);
                    self.cancelled.store(true, Ordering::SeqCst);
                    return Err(e);
                }
            }
        }
        debug!("Worker {} stopped", self.id);
        Ok(stats)
    }
}

/// Clone or update the working copy for one lock entry
pub async fn fetch_one(
    store: &CacheStore,
    opener: &dyn RepoOpener,
    entry: &LockEntry,
) -> ReportResult<FetchOutcome> {
    let dep = Dependency::from_lock(entry);
    let key = CacheKey::from_remote(&dep.remote());
    let path = store.working_copy(&key);
    let repo = opener
        .open(&dep, path.clone())
        .map_err(|e| ReportError::fetch(&dep.name, e))?;

    let _lock = store
        .lock(&key)
        .await
        .map_err(|e| ReportError::fetch(&dep.name, e))?;

    if repo.is_present() {
        debug!("Updating {} in {}", dep.name, path.display());
        repo.update()
            .await
            .map_err(|e| ReportError::fetch(&dep.name, e))?;
        return Ok(FetchOutcome::Updated);
    }

    info!("Cloning {} from {}", dep.name, repo.remote());
    if let Err(e) = repo.get().await {
        // Leave nothing half-cloned for the next run to mistake for a working copy.
        if path.exists() {
            if let Err(cleanup) = tokio::fs::remove_dir_all(&path).await {
                warn!("Could not remove partial clone {}: {}", path.display(), cleanup);
            }
        }
        return Err(ReportError::fetch(&dep.name, e));
    }

    let info = RepoInfo {
        default_branch: find_current_branch(repo.as_ref()).await,
    };
    store
        .save_repo_data(&key, &info)
        .map_err(|e| ReportError::fetch(&dep.name, e))?;
    Ok(FetchOutcome::Cloned)
}

/// Branch checked out after a fresh clone; empty for branchless backends
pub async fn find_current_branch(repo: &dyn Repo) -> String {
    debug!("Attempting to find current branch for {}", repo.remote());
    if !repo.vcs().has_branches() {
        return String::new();
    }
    match repo.current().await {
        Ok(branch) => branch,
        Err(e) => {
            debug!("Unable to find current branch for {}: {}", repo.remote(), e);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::{CommitInfo, VcsType};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Shared bookkeeping for the instrumented backend
    #[derive(Default)]
    struct Ledger {
        active: HashMap<PathBuf, usize>,
        max_overlap: usize,
        clones: usize,
        updates: usize,
    }

    struct Opener {
        ledger: Arc<std::sync::Mutex<Ledger>>,
        fail_remote: Option<String>,
        vcs: VcsType,
    }

    impl Opener {
        fn new() -> Self {
            Self {
                ledger: Arc::default(),
                fail_remote: None,
                vcs: VcsType::Git,
            }
        }
    }

    impl RepoOpener for Opener {
        fn open(&self, dep: &Dependency, path: PathBuf) -> ReportResult<Box<dyn Repo>> {
            Ok(Box::new(InstrumentedRepo {
                remote: dep.remote(),
                path,
                ledger: Arc::clone(&self.ledger),
                fail: self.fail_remote.as_deref() == Some(dep.remote().as_str()),
                vcs: self.vcs,
            }))
        }
    }

    struct InstrumentedRepo {
        remote: String,
        path: PathBuf,
        ledger: Arc<std::sync::Mutex<Ledger>>,
        fail: bool,
        vcs: VcsType,
    }

    impl InstrumentedRepo {
        async fn touch(&self) {
            {
                let mut ledger = self.ledger.lock().unwrap();
                let active = ledger.active.entry(self.path.clone()).or_default();
                *active += 1;
                let now = *active;
                ledger.max_overlap = ledger.max_overlap.max(now);
            }
            tokio::time::sleep(Duration::from_millis(15)).await;
            let mut ledger = self.ledger.lock().unwrap();
            *ledger.active.get_mut(&self.path).unwrap() -= 1;
        }
    }

    #[async_trait]
    impl Repo for InstrumentedRepo {
        fn vcs(&self) -> VcsType {
            self.vcs
        }
        fn remote(&self) -> &str {
            &self.remote
        }
        fn local_path(&self) -> &Path {
            &self.path
        }
        async fn get(&self) -> ReportResult<()> {
            self.touch().await;
            if self.fail {
                std::fs::create_dir_all(&self.path).unwrap();
                return Err(ReportError::vcs("git clone", "repository not found"));
            }
            std::fs::create_dir_all(&self.path).unwrap();
            self.ledger.lock().unwrap().clones += 1;
            Ok(())
        }
        async fn update(&self) -> ReportResult<()> {
            self.touch().await;
            self.ledger.lock().unwrap().updates += 1;
            Ok(())
        }
        async fn tags(&self) -> ReportResult<Vec<String>> {
            Ok(vec![])
        }
        async fn tags_from_commit(&self, _rev: &str) -> ReportResult<Vec<String>> {
            Ok(vec![])
        }
        async fn current(&self) -> ReportResult<String> {
            Ok("main".to_string())
        }
        async fn version(&self) -> ReportResult<String> {
            Ok("deadbeef".to_string())
        }
        async fn update_version(&self, _reference: &str) -> ReportResult<()> {
            Ok(())
        }
        async fn commit_info(&self, rev: &str) -> ReportResult<CommitInfo> {
            Err(ReportError::vcs("log", format!("unknown revision {}", rev)))
        }
    }

    fn entry(name: &str) -> LockEntry {
        LockEntry {
            name: name.to_string(),
            version: "deadbeef".to_string(),
            ..Default::default()
        }
    }

    fn setup() -> (CacheStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::open(temp.path()).unwrap();
        (store, temp)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn same_key_never_overlaps() {
        let (store, _temp) = setup();
        let opener = Arc::new(Opener::new());
        let ledger = Arc::clone(&opener.ledger);

        // Duplicates across main and test sets are submitted as-is.
        let mut entries = Vec::new();
        for _ in 0..6 {
            entries.push(entry("github.com/foo/shared"));
        }
        entries.push(entry("github.com/foo/other"));

        let summary = FetchPipeline::new(store, opener, 8).run(entries).await.unwrap();

        let ledger = ledger.lock().unwrap();
        assert_eq!(ledger.max_overlap, 1);
        assert_eq!(summary.total(), 7);
        assert_eq!(summary.cloned, 2);
        assert_eq!(summary.updated, 5);
        assert_eq!(ledger.clones, 2);
        assert_eq!(ledger.updates, 5);
    }

    #[tokio::test]
    async fn clone_records_default_branch() {
        let (store, _temp) = setup();
        let opener = Opener::new();

        let outcome = fetch_one(&store, &opener, &entry("github.com/foo/bar"))
            .await
            .unwrap();
        assert_eq!(outcome, FetchOutcome::Cloned);

        let key = CacheKey::from_remote("https://github.com/foo/bar");
        assert_eq!(store.repo_data(&key).unwrap().default_branch, "main");
    }

    #[tokio::test]
    async fn metadata_failure_names_the_dependency() {
        let (store, temp) = setup();
        let opener = Opener::new();

        // A directory where the metadata file belongs makes the save fail.
        let key = CacheKey::from_remote("https://github.com/foo/bar");
        std::fs::create_dir_all(temp.path().join("info").join(format!("{}.json", key))).unwrap();

        let err = fetch_one(&store, &opener, &entry("github.com/foo/bar"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Fetch { ref name, .. } if name == "github.com/foo/bar"));
    }

    #[tokio::test]
    async fn second_run_updates_instead_of_cloning() {
        let (store, _temp) = setup();
        let opener = Arc::new(Opener::new());
        let pipeline = FetchPipeline::new(store, opener.clone(), 2);

        let first = pipeline.run(vec![entry("github.com/foo/bar")]).await.unwrap();
        let second = pipeline.run(vec![entry("github.com/foo/bar")]).await.unwrap();

        assert_eq!(first, FetchSummary { cloned: 1, updated: 0 });
        assert_eq!(second, FetchSummary { cloned: 0, updated: 1 });
    }

    #[tokio::test]
    async fn branchless_backend_records_empty_branch() {
        let (store, _temp) = setup();
        let mut opener = Opener::new();
        opener.vcs = VcsType::Svn;

        fetch_one(&store, &opener, &entry("example.org/svn/thing"))
            .await
            .unwrap();

        let key = CacheKey::from_remote("https://example.org/svn/thing");
        assert_eq!(store.repo_data(&key).unwrap().default_branch, "");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn clone_failure_is_fatal_and_cleans_up() {
        let (store, _temp) = setup();
        let mut opener = Opener::new();
        opener.fail_remote = Some("https://github.com/foo/broken".to_string());
        let broken = store.working_copy(&CacheKey::from_remote("https://github.com/foo/broken"));

        let entries = vec![
            entry("github.com/foo/a"),
            entry("github.com/foo/broken"),
            entry("github.com/foo/b"),
        ];
        let err = FetchPipeline::new(store, Arc::new(opener), 2)
            .run(entries)
            .await
            .unwrap_err();

        assert!(matches!(err, ReportError::Fetch { ref name, .. } if name == "github.com/foo/broken"));
        assert!(!broken.exists());
    }

    #[tokio::test]
    async fn empty_input_completes() {
        let (store, _temp) = setup();
        let summary = FetchPipeline::new(store, Arc::new(Opener::new()), 20)
            .run(Vec::new())
            .await
            .unwrap();
        assert_eq!(summary.total(), 0);
    }
}
