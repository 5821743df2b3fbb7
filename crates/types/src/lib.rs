//! Shared finding types emitted by the actionsmith rule engine.
//!
//! These types are serialized into JSON reports consumed by other tools, so
//! prefer adding optional fields over changing existing semantics.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Severity attached to a finding. Ordered `Info < Warn < Fail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Fail,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Fail => "fail",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warn" | "warning" => Ok(Severity::Warn),
            "fail" | "error" => Ok(Severity::Fail),
            other => Err(format!(
                "invalid severity '{}'; supported values are fail, warn, info",
                other
            )),
        }
    }
}

/// Where a finding applies inside a document.
///
/// `job_index` is the job's declaration position and drives ordering; it is not
/// part of the serialized form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FindingLocation {
    #[serde(skip)]
    pub job_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<usize>,
}

impl FindingLocation {
    /// Location covering the whole workflow document.
    pub fn workflow() -> Self {
        Self::default()
    }

    pub fn job(index: usize, id: impl Into<String>) -> Self {
        Self {
            job_index: Some(index),
            job: Some(id.into()),
            step: None,
        }
    }

    pub fn step(job_index: usize, job: impl Into<String>, step: usize) -> Self {
        Self {
            job_index: Some(job_index),
            job: Some(job.into()),
            step: Some(step),
        }
    }

    /// Step inside a composite action manifest (no enclosing job).
    pub fn action_step(step: usize) -> Self {
        Self {
            job_index: None,
            job: None,
            step: Some(step),
        }
    }

    pub fn is_workflow_scope(&self) -> bool {
        self.job.is_none() && self.step.is_none()
    }
}

impl Ord for FindingLocation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.job_index
            .is_some()
            .cmp(&other.job_index.is_some())
            .then(self.job_index.cmp(&other.job_index))
            .then(self.job.cmp(&other.job))
            .then(self.step.is_some().cmp(&other.step.is_some()))
            .then(self.step.cmp(&other.step))
    }
}

impl PartialOrd for FindingLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for FindingLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.job, self.step) {
            (None, None) => write!(f, "workflow"),
            (Some(job), None) => write!(f, "jobs.{}", job),
            (Some(job), Some(step)) => write!(f, "jobs.{}.steps[{}]", job, step),
            (None, Some(step)) => write!(f, "runs.steps[{}]", step),
        }
    }
}

/// Single rule result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub rule_id: String,
    pub severity: Severity,
    pub location: FindingLocation,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Finding {
    pub fn new(
        rule_id: impl Into<String>,
        severity: Severity,
        location: FindingLocation,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            severity,
            location,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Counts of findings per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub fail: usize,
    pub warn: usize,
    pub info: usize,
}

impl SeverityCounts {
    pub fn tally<'a>(findings: impl IntoIterator<Item = &'a Finding>) -> Self {
        let mut counts = Self::default();
        for finding in findings {
            counts.add(finding.severity);
        }
        counts
    }

    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Fail => self.fail += 1,
            Severity::Warn => self.warn += 1,
            Severity::Info => self.info += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.fail + self.warn + self.info
    }
}
