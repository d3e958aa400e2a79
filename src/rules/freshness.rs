//! Revision freshness for dependencies without semver releases

use super::{Finding, Rule, Subject};
use crate::error::ReportResult;
use async_trait::async_trait;
use chrono::SecondsFormat;
use tracing::debug;

const THREE_MONTHS_DAYS: f64 = 91.0;
const SIX_MONTHS_DAYS: f64 = 182.0;

/// Finding for a pinned revision `days` behind the tip of its branch
pub fn age_finding(days: f64) -> Finding {
    if days < THREE_MONTHS_DAYS {
        Finding::warn(format!(
            "Using revision within three month from the tip of the branch ({:.0} days)",
            days
        ))
    } else if days < SIX_MONTHS_DAYS {
        Finding::warn(format!(
            "Using revision between three and six months from the tip of the branch ({:.0} days)",
            days
        ))
    } else {
        Finding::fail(format!(
            "Using revision over six months behind the tip of the branch ({:.0} days)",
            days
        ))
    }
}

/// How far is the pinned revision behind the tip of its branch?
///
/// Only applies to dependencies with no semver releases at all. Checks out
/// the declared reference, or the default branch recorded at clone time.
pub struct HowOld;

#[async_trait]
impl Rule for HowOld {
    fn name(&self) -> &'static str {
        "how-old"
    }

    fn mutates_checkout(&self) -> bool {
        true
    }

    async fn evaluate(&self, subject: &Subject<'_>) -> ReportResult<Vec<Finding>> {
        if subject.snapshot.uses_semver() {
            return Ok(Vec::new());
        }

        let reference = if subject.dependency.reference.is_empty() {
            subject.store.repo_data(subject.key)?.default_branch
        } else {
            subject.dependency.reference.clone()
        };

        // Branchless backends record no default branch; stay where the update left us.
        if !reference.is_empty() {
            debug!("Checking out {} for {}", reference, subject.name);
            subject.repo.update_version(&reference).await?;
        }

        let curr = subject.repo.version().await?;
        let pinned = &subject.lock.version;

        if curr == *pinned {
            let message = match subject.repo.commit_info(pinned).await {
                Ok(info) => format!(
                    "Using the latest revision on the selected or default branch (from: {})",
                    info.date.to_rfc3339_opts(SecondsFormat::Secs, true)
                ),
                Err(e) => {
                    debug!("No commit date for {}: {}", pinned, e);
                    "Using the latest revision on the selected or default branch".to_string()
                }
            };
            return Ok(vec![Finding::warn(message)]);
        }

        let tip = subject.repo.commit_info(&curr).await?;
        let used = subject.repo.commit_info(pinned).await?;
        let hours = (tip.date - used.date).num_seconds() as f64 / 3600.0;
        Ok(vec![age_finding(hours / 24.0)])
    }
}
