//! Report driver
//!
//! Holds the cache's system lock for the whole run, syncs every locked
//! dependency, then classifies the direct, test and transitive imports in
//! that order. Each dependency is reported at most once per membership set:
//! direct and transitive share one set, test imports have their own.

use crate::cache::{CacheKey, CacheStore};
use crate::cli::Cli;
use crate::config::Config;
use crate::error::{ReportError, ReportResult};
use crate::fetch::FetchPipeline;
use crate::imports::{ImportResolver, ManifestImports};
use crate::manifest::{self, Dependency, Project};
use crate::rules::Classifier;
use crate::ui::{self, FetchProgress, Marks, UiContext};
use crate::vcs::{RepoOpener, SystemRepos};
use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Settings for one report run, after CLI, environment and config file are merged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    /// Directory the manifest search starts from
    pub project_dir: PathBuf,
    pub cache_root: PathBuf,
    pub workers: usize,
    pub color: bool,
}

impl ReportOptions {
    /// Merge CLI flags over the config file
    ///
    /// `--cache-dir` already carries `DEPREPORT_CACHE_DIR` through clap.
    pub fn resolve(cli: &Cli, config: &Config) -> ReportResult<Self> {
        let project_dir = match &cli.project {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()
                .map_err(|e| ReportError::io("getting current directory", e))?,
        };

        let mut fetch = config.fetch.clone();
        if let Some(workers) = cli.workers {
            fetch.workers = workers;
        }

        Ok(Self {
            project_dir,
            cache_root: cli.cache_dir.clone().unwrap_or_else(|| config.cache.root()),
            workers: fetch.worker_count(),
            color: config.report.color && !cli.no_color,
        })
    }
}

/// Dependency names in the main lock list that are not direct roots, in lock order
pub fn transitive_imports(roots: &[String], project: &Project) -> Vec<String> {
    project
        .lock
        .imports
        .iter()
        .filter(|entry| !roots.contains(&entry.name))
        .map(|entry| entry.name.clone())
        .collect()
}

/// Produces the dependency report for one project
pub struct Reporter {
    options: ReportOptions,
    opener: Arc<dyn RepoOpener>,
    classifier: Classifier,
    ctx: UiContext,
}

impl Reporter {
    pub fn new(options: ReportOptions) -> Self {
        let ctx = UiContext::detect(options.color);
        Self {
            options,
            opener: Arc::new(SystemRepos),
            classifier: Classifier::standard(),
            ctx,
        }
    }

    /// Use a different repository backend
    pub fn with_opener(mut self, opener: Arc<dyn RepoOpener>) -> Self {
        self.opener = opener;
        self
    }

    pub fn with_context(mut self, ctx: UiContext) -> Self {
        self.ctx = ctx;
        self
    }

    /// Run the whole report, writing it to `out`
    pub async fn run(&self, out: &mut impl Write) -> ReportResult<()> {
        let store = CacheStore::open(&self.options.cache_root)?;
        let _system = store.system_lock()?;

        ui::step_warn("Disclaimer, this report is to help highlight things to consider. It is");
        ui::step_warn("alpha software and the rules are still under consideration.");

        ui::step_info("Reading glide.yaml file to understand configured versions and ranges");
        ui::step_info("Reading glide.lock file to understand pinned revisions");
        let project = manifest::load_project(&self.options.project_dir).await?;

        let (roots, test_roots) = ManifestImports::new(&project.manifest).resolve();
        debug!(
            "Resolved {} direct and {} test imports",
            roots.len(),
            test_roots.len()
        );

        let entries = project.lock.all_entries().cloned().collect();
        FetchPipeline::new(store.clone(), Arc::clone(&self.opener), self.options.workers)
            .with_progress(FetchProgress::new(&self.ctx))
            .run(entries)
            .await?;

        self.render(out, &project, &store, &roots, &test_roots).await
    }

    /// Write the report sections for an already-synced project
    pub async fn render(
        &self,
        out: &mut impl Write,
        project: &Project,
        store: &CacheStore,
        roots: &[String],
        test_roots: &[String],
    ) -> ReportResult<()> {
        let mut marked = HashSet::new();
        let mut test_marked = HashSet::new();

        ui::title(out, &project.manifest.name).map_err(write_error)?;

        ui::section(out, "Direct Imports").map_err(write_error)?;
        self.process(out, project, store, roots, &mut marked, false)
            .await?;

        if !project.manifest.dev_imports.is_empty() {
            ui::section(out, "Direct Test Imports").map_err(write_error)?;
            self.process(out, project, store, test_roots, &mut test_marked, true)
                .await?;
        }

        let transitive = transitive_imports(roots, project);
        if !transitive.is_empty() {
            ui::section(out, "Transitive Imports").map_err(write_error)?;
            self.process(out, project, store, &transitive, &mut marked, false)
                .await?;
        }

        out.flush().map_err(write_error)
    }

    async fn process(
        &self,
        out: &mut impl Write,
        project: &Project,
        store: &CacheStore,
        names: &[String],
        marked: &mut HashSet<String>,
        is_test: bool,
    ) -> ReportResult<()> {
        let marks = Marks::new(self.ctx.use_color());

        for name in names {
            if !marked.insert(name.clone()) {
                debug!("Already reported {}", name);
                continue;
            }

            let lock = project
                .lock
                .entry(name, is_test)
                .ok_or_else(|| ReportError::LockEntryMissing(name.clone()))?;
            let dependency = match project.manifest.dependency(name, is_test) {
                Some(dep) => dep.clone(),
                None => Dependency::from_lock(lock),
            };

            let key = CacheKey::from_remote(&dependency.remote());
            let repo = self
                .opener
                .open(&dependency, store.working_copy(&key))?;

            info!("Classifying {}", name);
            let findings = self
                .classifier
                .classify(name, &dependency, lock, repo.as_ref(), store)
                .await?;

            ui::analysis(out, &marks, name, &findings).map_err(write_error)?;
        }
        Ok(())
    }
}

fn write_error(e: std::io::Error) -> ReportError {
    ReportError::io("writing report", e)
}
