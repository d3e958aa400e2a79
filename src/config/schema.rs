//! Configuration schema for depreport
//!
//! Configuration is stored at `~/.config/depreport/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default size of the fetch worker pool
pub const DEFAULT_WORKERS: usize = 20;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cache settings
    pub cache: CacheConfig,

    /// Fetch pipeline settings
    pub fetch: FetchConfig,

    /// Report output settings
    pub report: ReportConfig,
}

/// Cache location settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root override; the platform cache dir is used when unset
    pub dir: Option<PathBuf>,
}

impl CacheConfig {
    /// Resolve the cache root directory
    pub fn root(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("depreport")
        })
    }
}

/// Fetch pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Number of concurrent fetch workers
    pub workers: usize,
}

impl FetchConfig {
    /// Worker count, never less than one
    pub fn worker_count(&self) -> usize {
        self.workers.max(1)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
        }
    }
}

/// Report rendering settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Colorize pass/warn/fail marks
    pub color: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { color: true }
    }
}
