use crate::core::error::AppError;
use crate::core::workflow::compose::builtin::BUILTIN_PATTERNS;
use crate::core::workflow::error::WorkflowError;
use crate::core::workflow::model::{Jobs, Step};
use crate::core::workflow::parse::validate_job;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Reusable bundle of jobs, steps and dependency edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Pattern {
    #[serde(rename = "pattern")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Job ids this pattern may replace when they already exist.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<String>,
    #[serde(default, skip_serializing_if = "Jobs::is_empty")]
    pub jobs: Jobs,
    /// Steps appended to existing jobs.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub steps: IndexMap<String, Vec<Step>>,
    /// Extra `needs` edges, keyed by the dependent job.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub needs: IndexMap<String, Vec<String>>,
}

pub fn parse_pattern(text: &str) -> Result<Pattern, WorkflowError> {
    let pattern: Pattern = serde_yaml::from_str(text).map_err(WorkflowError::from_yaml)?;
    if pattern.name.trim().is_empty() {
        return Err(WorkflowError::malformed("pattern", "pattern name must not be empty"));
    }
    if pattern.jobs.is_empty() && pattern.steps.is_empty() && pattern.needs.is_empty() {
        return Err(WorkflowError::malformed(
            "pattern",
            format!("pattern '{}' contributes nothing", pattern.name),
        ));
    }
    for (id, job) in pattern.jobs.iter() {
        validate_job(id, job)?;
    }
    Ok(pattern)
}

/// Named patterns available to the composer. Later insertions replace earlier
/// ones with the same name, so user patterns shadow built-ins.
#[derive(Debug, Clone, Default)]
pub struct PatternCatalog {
    patterns: BTreeMap<String, Pattern>,
}

impl PatternCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Result<Self, WorkflowError> {
        let mut catalog = Self::empty();
        for (name, text) in BUILTIN_PATTERNS {
            let pattern = parse_pattern(text).map_err(|err| {
                WorkflowError::Serialization(format!("built-in pattern '{}' is invalid: {}", name, err))
            })?;
            catalog.insert(pattern);
        }
        Ok(catalog)
    }

    /// Register a pattern, returning the one it replaced.
    pub fn insert(&mut self, pattern: Pattern) -> Option<Pattern> {
        let replaced = self.patterns.insert(pattern.name.clone(), pattern);
        if let Some(previous) = &replaced {
            debug!(pattern = %previous.name, "pattern replaced");
        }
        replaced
    }

    pub fn get(&self, name: &str) -> Option<&Pattern> {
        self.patterns.get(name)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Patterns sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.values()
    }

    pub fn load_file(&mut self, path: &Path) -> Result<String, AppError> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            let mut error = AppError::from(err);
            error.add_context("path", &path.display().to_string());
            error
        })?;
        let pattern = parse_pattern(&text).map_err(|err| {
            let mut error = AppError::from(err);
            error.add_context("path", &path.display().to_string());
            error
        })?;
        let name = pattern.name.clone();
        self.insert(pattern);
        Ok(name)
    }

    /// Load every `*.yml` / `*.yaml` file directly inside `dir`, in file name order.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, AppError> {
        let mut paths = Vec::new();
        let entries = std::fs::read_dir(dir).map_err(|err| {
            let mut error = AppError::from(err);
            error.add_context("path", &dir.display().to_string());
            error
        })?;
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && is_yaml(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        for path in &paths {
            self.load_file(path)?;
        }
        info!(dir = %dir.display(), patterns = paths.len(), "loaded pattern directory");
        Ok(paths.len())
    }
}

pub(crate) fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yml") | Some("yaml")
    )
}
