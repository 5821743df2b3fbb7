//! Pattern composition.
//!
//! Patterns are applied strictly in the order given. Each one may add jobs,
//! replace jobs it lists under `overrides`, append steps to existing jobs and
//! union extra `needs` edges. The merged document is checked for dependency
//! cycles before it is returned.

use crate::core::workflow::builder::WorkflowBuilder;
use crate::core::workflow::error::WorkflowError;
use crate::core::workflow::graph::JobGraph;
use crate::core::workflow::model::Workflow;
use serde::Serialize;
use tracing::{debug, info, warn};

pub mod builtin;
pub mod pattern;

pub use pattern::{parse_pattern, Pattern, PatternCatalog};

/// What a single pattern changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppliedPattern {
    pub name: String,
    pub added_jobs: Vec<String>,
    pub overridden_jobs: Vec<String>,
    pub extended_jobs: Vec<String>,
}

/// Composed workflow plus a per-pattern summary.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub workflow: Workflow,
    pub applied: Vec<AppliedPattern>,
}

pub struct Composer {
    catalog: PatternCatalog,
}

impl Composer {
    pub fn new(catalog: PatternCatalog) -> Self {
        Self { catalog }
    }

    pub fn with_builtins() -> Result<Self, WorkflowError> {
        Ok(Self::new(PatternCatalog::builtin()?))
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    /// Resolve `names` against the catalog and apply them in order.
    pub fn compose<S: AsRef<str>>(
        &self,
        base: &Workflow,
        names: &[S],
    ) -> Result<Composition, WorkflowError> {
        let patterns = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.catalog
                    .get(name)
                    .ok_or_else(|| WorkflowError::UnknownPattern(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        compose_patterns(base, &patterns)
    }
}

/// Apply already-resolved patterns to `base`.
pub fn compose_patterns(base: &Workflow, patterns: &[&Pattern]) -> Result<Composition, WorkflowError> {
    if patterns.is_empty() {
        return Ok(Composition {
            workflow: base.clone(),
            applied: Vec::new(),
        });
    }

    let mut builder = WorkflowBuilder::new(base.clone());
    let mut applied = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        let summary = apply_pattern(&mut builder, pattern)?;
        debug!(
            pattern = %summary.name,
            added = summary.added_jobs.len(),
            overridden = summary.overridden_jobs.len(),
            extended = summary.extended_jobs.len(),
            "pattern applied"
        );
        applied.push(summary);
    }

    if let Err(cycle) = JobGraph::from_workflow(builder.workflow()).topological_order() {
        warn!(cycle = ?cycle, "composition produced a dependency cycle");
        return Err(WorkflowError::CyclicDependency { cycle });
    }

    let workflow = builder.build()?;
    info!(
        patterns = applied.len(),
        jobs = workflow.jobs.len(),
        "composition complete"
    );
    Ok(Composition { workflow, applied })
}

fn apply_pattern(
    builder: &mut WorkflowBuilder,
    pattern: &Pattern,
) -> Result<AppliedPattern, WorkflowError> {
    let mut summary = AppliedPattern {
        name: pattern.name.clone(),
        ..AppliedPattern::default()
    };

    for id in &pattern.overrides {
        if !pattern.jobs.contains(id) {
            return Err(WorkflowError::conflict(
                &pattern.name,
                id,
                "override names a job the pattern does not contribute",
            ));
        }
    }

    for (id, job) in pattern.jobs.iter() {
        if builder.contains_job(id) {
            if !pattern.overrides.iter().any(|o| o == id) {
                return Err(WorkflowError::conflict(
                    &pattern.name,
                    id,
                    "job already exists; list it under `overrides` to replace it",
                ));
            }
            builder.replace_job(id, job.clone());
            summary.overridden_jobs.push(id.to_string());
        } else {
            builder.insert_job(id, job.clone());
            summary.added_jobs.push(id.to_string());
        }
    }

    for (id, job) in pattern.jobs.iter() {
        if let Some(missing) = job.needs.iter().find(|dep| !builder.contains_job(dep)) {
            return Err(WorkflowError::conflict(
                &pattern.name,
                id,
                format!("needs unknown job '{}'", missing),
            ));
        }
    }

    for (id, steps) in &pattern.steps {
        if !builder.append_steps(id, steps.iter().cloned()) {
            return Err(WorkflowError::conflict(
                &pattern.name,
                id,
                "steps target a job that does not exist",
            ));
        }
        note_extended(&mut summary, id);
    }

    for (id, needs) in &pattern.needs {
        if let Some(missing) = needs.iter().find(|dep| !builder.contains_job(dep)) {
            return Err(WorkflowError::conflict(
                &pattern.name,
                id,
                format!("needs unknown job '{}'", missing),
            ));
        }
        if !builder.add_needs(id, needs.iter().cloned()) {
            return Err(WorkflowError::conflict(
                &pattern.name,
                id,
                "needs edges target a job that does not exist",
            ));
        }
        note_extended(&mut summary, id);
    }

    Ok(summary)
}

fn note_extended(summary: &mut AppliedPattern, id: &str) {
    let contributed = summary.added_jobs.iter().any(|j| j == id)
        || summary.overridden_jobs.iter().any(|j| j == id);
    if !contributed && !summary.extended_jobs.iter().any(|j| j == id) {
        summary.extended_jobs.push(id.to_string());
    }
}
