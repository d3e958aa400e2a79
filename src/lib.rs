//! depreport - health report for the pinned dependencies of a glide project
//!
//! Syncs every locked dependency into a shared on-disk cache, then grades
//! each one on semantic version compliance and revision freshness.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod imports;
pub mod manifest;
pub mod report;
pub mod rules;
pub mod ui;
pub mod vcs;

pub use error::{ReportError, ReportResult};
