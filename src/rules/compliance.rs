//! Semantic version compliance
//!
//! Tags are parsed leniently: a leading lowercase `v` is allowed and missing minor or
//! patch components default to zero, so `v1`, `1.2` and `v1.2.3-rc.1` are
//! all releases. The original tag text is kept for display and matching.

use super::{Finding, Rule, Subject};
use crate::error::{ReportError, ReportResult};
use async_trait::async_trait;
use semver::{BuildMetadata, Prerelease, Version, VersionReq};
use std::cmp::Ordering;

/// Releases this far behind latest or further are failures
const RECENT_WINDOW: usize = 5;

/// A tag that parses as a semantic version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagVersion {
    /// Tag text as it appears in the repository
    pub original: String,
    pub version: Version,
}

impl TagVersion {
    /// Semver precedence; build metadata is ignored
    pub fn precedence_cmp(&self, other: &Self) -> Ordering {
        let a = &self.version;
        let b = &other.version;
        a.major
            .cmp(&b.major)
            .then(a.minor.cmp(&b.minor))
            .then(a.patch.cmp(&b.patch))
            .then_with(|| a.pre.cmp(&b.pre))
    }

    pub fn is_prerelease(&self) -> bool {
        !self.version.pre.is_empty()
    }
}

/// Parse a tag as a semantic version, returning `None` for anything else
pub fn parse_tag(tag: &str) -> Option<TagVersion> {
    let body = tag.strip_prefix('v').unwrap_or(tag);

    let (rest, build) = match body.split_once('+') {
        Some((rest, build)) => (rest, Some(build)),
        None => (body, None),
    };
    let (core, pre) = match rest.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (rest, None),
    };

    let mut numbers = [0u64; 3];
    let mut count = 0;
    for part in core.split('.') {
        if count == 3 || part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        numbers[count] = part.parse().ok()?;
        count += 1;
    }

    let mut version = Version::new(numbers[0], numbers[1], numbers[2]);
    if let Some(pre) = pre {
        version.pre = Prerelease::new(pre).ok()?;
    }
    if let Some(build) = build {
        version.build = BuildMetadata::new(build).ok()?;
    }

    Some(TagVersion {
        original: tag.to_string(),
        version,
    })
}

/// Findings for a tag set (sorted highest first) and the tags on the pinned revision
pub fn evaluate_semver(releases: &[TagVersion], pinned_tags: &[String]) -> ReportResult<Vec<Finding>> {
    let Some(latest_v) = releases.first() else {
        return Ok(vec![Finding::warn(
            "Dependency does not provide Semantic Version releases",
        )]);
    };

    let mut findings = vec![Finding::pass(
        "Dependency provides Semantic Version releases",
    )];

    let Some(tg) = pinned_tags.first() else {
        findings.push(Finding::fail(
            "Using development revision between Semantic Version releases",
        ));
        return Ok(findings);
    };

    let Some(pinned) = parse_tag(tg) else {
        findings.push(Finding::warn(format!(
            "Using non-semantic version ({}) for project supporting Semantic Version",
            tg
        )));
        return Ok(findings);
    };

    let mut latest = false;
    let mut recent = false;
    for (i, v) in releases.iter().enumerate() {
        if v.original != *tg {
            continue;
        }
        if i == 0 {
            findings.push(Finding::pass(format!("Using latest release ({})", tg)));
            latest = true;
        } else if i < RECENT_WINDOW {
            findings.push(Finding::warn(format!(
                "Using recent release ({} behind latest, latest: {}, using: {})",
                i, latest_v.original, tg
            )));
            recent = true;
        } else {
            findings.push(Finding::fail(format!(
                "{} releases behind latest release (latest: {}, using: {})",
                i, latest_v.original, tg
            )));
        }

        if v.is_prerelease() {
            findings.push(Finding::fail("Using a pre-release version"));
        }
    }

    if !latest {
        // Caret on a 0.x release pins the minor version.
        let newest = &latest_v.version;
        let constraint = if newest.major == 0 {
            format!("^0.{}", newest.minor)
        } else {
            format!("^{}", newest.major)
        };
        let req = VersionReq::parse(&constraint).map_err(|e| ReportError::InvalidConstraint {
            constraint: constraint.clone(),
            reason: e.to_string(),
        })?;

        if req.matches(&pinned.version) {
            findings.push(Finding::pass("Using latest Major Semantic Version"));
        } else if recent {
            findings.push(Finding::warn("Not using latest Major Semantic Version"));
        } else {
            findings.push(Finding::fail("Not using latest Major Semantic Version"));
        }
    }

    Ok(findings)
}

/// Does the dependency publish semver releases, and how close is the pin to the latest?
pub struct UsesSemver;

#[async_trait]
impl Rule for UsesSemver {
    fn name(&self) -> &'static str {
        "uses-semver"
    }

    async fn evaluate(&self, subject: &Subject<'_>) -> ReportResult<Vec<Finding>> {
        evaluate_semver(&subject.snapshot.releases, &subject.snapshot.pinned_tags)
    }
}
