use super::refs::{
    classify_ref, context_references, expressions, is_secret, is_user_controlled,
    key_hashes_lockfile, RefPin,
};
use super::Rule;
use crate::core::workflow::action::ActionManifest;
use crate::core::workflow::graph::JobGraph;
use crate::core::workflow::model::{EventKind, Step, StepKind, Trigger, Workflow};
use actionsmith_types::{Finding, FindingLocation, Severity};
use std::collections::BTreeSet;

/// Expanded matrices above this size trigger `matrix-size`.
pub const MAX_MATRIX_COMBINATIONS: usize = 256;

const PRODUCTION_ENVIRONMENTS: &[&str] = &["production", "prod", "live"];

/// Run a step-level check over every job step of a workflow.
fn each_step<F>(workflow: &Workflow, mut check: F) -> Vec<Finding>
where
    F: FnMut(&Step, FindingLocation) -> Vec<Finding>,
{
    let mut findings = Vec::new();
    for (job_index, (job_id, job)) in workflow.jobs().enumerate() {
        for (step_index, step) in job.steps.iter().enumerate() {
            findings.extend(check(
                step,
                FindingLocation::step(job_index, job_id, step_index),
            ));
        }
    }
    findings
}

/// Run a step-level check over the steps of a composite action.
fn each_action_step<F>(action: &ActionManifest, mut check: F) -> Vec<Finding>
where
    F: FnMut(&Step, FindingLocation) -> Vec<Finding>,
{
    action
        .steps()
        .iter()
        .enumerate()
        .flat_map(|(index, step)| check(step, FindingLocation::action_step(index)))
        .collect()
}

pub struct ExplicitPermissionsRule;

impl Rule for ExplicitPermissionsRule {
    fn id(&self) -> &'static str {
        "explicit-permissions"
    }

    fn description(&self) -> &'static str {
        "workflow declares a permissions block at workflow or job scope"
    }

    fn check(&self, workflow: &Workflow) -> Vec<Finding> {
        if workflow.has_permissions() {
            return Vec::new();
        }
        vec![Finding::new(
            self.id(),
            Severity::Fail,
            FindingLocation::workflow(),
            "no permissions block is declared; the token falls back to repository defaults",
        )
        .with_suggestion("add a top-level `permissions:` block such as `contents: read`")]
    }
}

pub struct PinnedActionsRule;

impl PinnedActionsRule {
    fn check_step(&self, step: &Step, location: FindingLocation) -> Vec<Finding> {
        let Some(action) = step.as_action() else {
            return Vec::new();
        };
        let Some(slug) = action.reference.slug() else {
            return Vec::new();
        };
        let git_ref = action.reference.git_ref();
        let (severity, message) = match classify_ref(git_ref) {
            RefPin::Sha | RefPin::FullVersion => return Vec::new(),
            RefPin::MajorVersion => (
                Severity::Warn,
                format!(
                    "`{}` is pinned to the major tag `{}`, which moves with every release",
                    slug,
                    git_ref.unwrap_or_default()
                ),
            ),
            RefPin::Floating => (
                Severity::Fail,
                format!(
                    "`{}` is pinned to the moving ref `{}`",
                    slug,
                    git_ref.unwrap_or_default()
                ),
            ),
            RefPin::Missing => (
                Severity::Fail,
                format!("`{}` has no ref; it resolves to the default branch", slug),
            ),
        };
        vec![Finding::new(self.id(), severity, location, message)
            .with_suggestion("pin the action to a full 40-character commit SHA")]
    }
}

impl Rule for PinnedActionsRule {
    fn id(&self) -> &'static str {
        "pinned-actions"
    }

    fn description(&self) -> &'static str {
        "repository actions are pinned to a commit SHA or full version tag"
    }

    fn check(&self, workflow: &Workflow) -> Vec<Finding> {
        each_step(workflow, |step, location| self.check_step(step, location))
    }

    fn check_action(&self, action: &ActionManifest) -> Vec<Finding> {
        each_action_step(action, |step, location| self.check_step(step, location))
    }
}

pub struct ConcurrencyGuardRule;

impl Rule for ConcurrencyGuardRule {
    fn id(&self) -> &'static str {
        "concurrency-guard"
    }

    fn description(&self) -> &'static str {
        "push and pull_request workflows declare a concurrency group"
    }

    fn check(&self, workflow: &Workflow) -> Vec<Finding> {
        let triggered = workflow.is_triggered_by(EventKind::Push)
            || workflow.is_triggered_by(EventKind::PullRequest);
        if !triggered || workflow.concurrency.is_some() {
            return Vec::new();
        }
        if workflow.jobs().all(|(_, job)| job.concurrency.is_some()) {
            return Vec::new();
        }
        vec![Finding::new(
            self.id(),
            Severity::Warn,
            FindingLocation::workflow(),
            "workflow runs on push or pull_request without a concurrency group",
        )
        .with_suggestion(
            "add `concurrency: { group: ${{ github.workflow }}-${{ github.ref }}, cancel-in-progress: true }`",
        )]
    }
}

pub struct ShellInterpolationRule;

impl ShellInterpolationRule {
    fn check_step(&self, step: &Step, location: FindingLocation) -> Vec<Finding> {
        let StepKind::Run(run) = &step.kind else {
            return Vec::new();
        };
        let mut user_controlled = BTreeSet::new();
        let mut secrets = BTreeSet::new();
        for expression in expressions(&run.command) {
            for reference in context_references(expression) {
                if is_user_controlled(reference) {
                    user_controlled.insert(reference);
                } else if is_secret(reference) {
                    secrets.insert(reference);
                }
            }
        }

        let mut findings = Vec::new();
        for reference in user_controlled {
            findings.push(
                Finding::new(
                    self.id(),
                    Severity::Fail,
                    location.clone(),
                    format!(
                        "run command interpolates user-controlled `{}` into the shell",
                        reference
                    ),
                )
                .with_suggestion("pass the value through `env:` and reference it as a quoted shell variable"),
            );
        }
        for reference in secrets {
            findings.push(
                Finding::new(
                    self.id(),
                    Severity::Warn,
                    location.clone(),
                    format!("run command interpolates `{}` directly", reference),
                )
                .with_suggestion("expose the secret through `env:` instead of inline interpolation"),
            );
        }
        findings
    }
}

impl Rule for ShellInterpolationRule {
    fn id(&self) -> &'static str {
        "secret-in-shell-interpolation"
    }

    fn description(&self) -> &'static str {
        "run steps do not interpolate untrusted input or secrets into shell text"
    }

    fn check(&self, workflow: &Workflow) -> Vec<Finding> {
        each_step(workflow, |step, location| self.check_step(step, location))
    }

    fn check_action(&self, action: &ActionManifest) -> Vec<Finding> {
        each_action_step(action, |step, location| self.check_step(step, location))
    }
}

pub struct TimeoutPresentRule;

impl Rule for TimeoutPresentRule {
    fn id(&self) -> &'static str {
        "timeout-present"
    }

    fn description(&self) -> &'static str {
        "every job sets timeout-minutes"
    }

    fn check(&self, workflow: &Workflow) -> Vec<Finding> {
        workflow
            .jobs()
            .enumerate()
            .filter(|(_, (_, job))| job.timeout_minutes.is_none())
            .map(|(index, (id, _))| {
                Finding::new(
                    self.id(),
                    Severity::Warn,
                    FindingLocation::job(index, id),
                    format!("job '{}' has no timeout-minutes and may run for up to 6 hours", id),
                )
                .with_suggestion("set `timeout-minutes` to a bound that fits the job")
            })
            .collect()
    }
}

pub struct CacheKeyRule;

impl CacheKeyRule {
    fn check_step(&self, step: &Step, location: FindingLocation) -> Vec<Finding> {
        let Some(action) = step.as_action() else {
            return Vec::new();
        };
        let is_cache = matches!(
            action.reference.slug().as_deref(),
            Some("actions/cache") | Some("actions/cache/restore") | Some("actions/cache/save")
        );
        if !is_cache {
            return Vec::new();
        }
        let message = match action.with.get("key").and_then(|key| key.as_str()) {
            Some(key) if key_hashes_lockfile(key) => return Vec::new(),
            Some(key) => format!("cache key `{}` does not hash a dependency lockfile", key),
            None => "cache step has no `key` input".to_string(),
        };
        vec![Finding::new(self.id(), Severity::Warn, location, message)
            .with_suggestion("include `hashFiles('**/<lockfile>')` in the cache key")]
    }
}

impl Rule for CacheKeyRule {
    fn id(&self) -> &'static str {
        "cache-key-uses-lockfile"
    }

    fn description(&self) -> &'static str {
        "cache keys are derived from a dependency lockfile"
    }

    fn check(&self, workflow: &Workflow) -> Vec<Finding> {
        each_step(workflow, |step, location| self.check_step(step, location))
    }

    fn check_action(&self, action: &ActionManifest) -> Vec<Finding> {
        each_action_step(action, |step, location| self.check_step(step, location))
    }
}

pub struct DanglingNeedsRule;

impl Rule for DanglingNeedsRule {
    fn id(&self) -> &'static str {
        "dangling-needs"
    }

    fn description(&self) -> &'static str {
        "every `needs` entry names a job in the workflow"
    }

    fn check(&self, workflow: &Workflow) -> Vec<Finding> {
        let mut findings = Vec::new();
        for (index, (id, job)) in workflow.jobs().enumerate() {
            for dependency in &job.needs {
                if !workflow.jobs.contains(dependency) {
                    findings.push(Finding::new(
                        self.id(),
                        Severity::Fail,
                        FindingLocation::job(index, id),
                        format!("job '{}' needs unknown job '{}'", id, dependency),
                    ));
                }
            }
        }
        findings
    }
}

pub struct DependencyCycleRule;

impl Rule for DependencyCycleRule {
    fn id(&self) -> &'static str {
        "dependency-cycle"
    }

    fn description(&self) -> &'static str {
        "the job dependency graph is acyclic"
    }

    fn check(&self, workflow: &Workflow) -> Vec<Finding> {
        JobGraph::from_workflow(workflow)
            .cycles()
            .into_iter()
            .filter_map(|cycle| {
                let first = cycle.first()?;
                let index = workflow.jobs.index_of(first)?;
                Some(Finding::new(
                    self.id(),
                    Severity::Fail,
                    FindingLocation::job(index, first.clone()),
                    format!("jobs form a dependency cycle: {}", cycle.join(", ")),
                ))
            })
            .collect()
    }
}

pub struct BroadPermissionsRule;

impl Rule for BroadPermissionsRule {
    fn id(&self) -> &'static str {
        "broad-permissions"
    }

    fn description(&self) -> &'static str {
        "permissions avoid the write-all preset"
    }

    fn check(&self, workflow: &Workflow) -> Vec<Finding> {
        let mut findings = Vec::new();
        let suggestion = "grant only the scopes the job needs, e.g. `contents: read`";
        if workflow
            .permissions
            .as_ref()
            .is_some_and(|permissions| permissions.is_write_all())
        {
            findings.push(
                Finding::new(
                    self.id(),
                    Severity::Warn,
                    FindingLocation::workflow(),
                    "workflow grants write-all permissions",
                )
                .with_suggestion(suggestion),
            );
        }
        for (index, (id, job)) in workflow.jobs().enumerate() {
            if job
                .permissions
                .as_ref()
                .is_some_and(|permissions| permissions.is_write_all())
            {
                findings.push(
                    Finding::new(
                        self.id(),
                        Severity::Warn,
                        FindingLocation::job(index, id),
                        format!("job '{}' grants write-all permissions", id),
                    )
                    .with_suggestion(suggestion),
                );
            }
        }
        findings
    }
}

pub struct ScheduleCronRule;

impl Rule for ScheduleCronRule {
    fn id(&self) -> &'static str {
        "schedule-cron"
    }

    fn description(&self) -> &'static str {
        "schedule triggers use five-field cron expressions"
    }

    fn check(&self, workflow: &Workflow) -> Vec<Finding> {
        workflow
            .triggers
            .iter()
            .filter_map(|trigger| match trigger {
                Trigger::Schedule(entries) => Some(entries),
                _ => None,
            })
            .flatten()
            .filter(|entry| entry.cron.split_whitespace().count() != 5)
            .map(|entry| {
                Finding::new(
                    self.id(),
                    Severity::Fail,
                    FindingLocation::workflow(),
                    format!(
                        "cron expression '{}' has {} fields; expected 5",
                        entry.cron,
                        entry.cron.split_whitespace().count()
                    ),
                )
            })
            .collect()
    }
}

pub struct MatrixSizeRule;

impl Rule for MatrixSizeRule {
    fn id(&self) -> &'static str {
        "matrix-size"
    }

    fn description(&self) -> &'static str {
        "matrix strategies stay within the runner's combination limit"
    }

    fn check(&self, workflow: &Workflow) -> Vec<Finding> {
        let mut findings = Vec::new();
        for (index, (id, job)) in workflow.jobs().enumerate() {
            let Some(matrix) = job.matrix() else {
                continue;
            };
            // Large products are counted, not expanded.
            let product = matrix.product_size();
            let size = if product > MAX_MATRIX_COMBINATIONS * 16 {
                product
            } else {
                matrix.expand().len()
            };
            if size > MAX_MATRIX_COMBINATIONS {
                findings.push(
                    Finding::new(
                        self.id(),
                        Severity::Warn,
                        FindingLocation::job(index, id),
                        format!(
                            "matrix expands to {} combinations; the limit is {}",
                            size, MAX_MATRIX_COMBINATIONS
                        ),
                    )
                    .with_suggestion("split the job or use `exclude` to trim combinations"),
                );
            }
        }
        findings
    }
}

pub struct EnvironmentProtectionRule;

impl Rule for EnvironmentProtectionRule {
    fn id(&self) -> &'static str {
        "environment-protection"
    }

    fn description(&self) -> &'static str {
        "production deployments are gated by reviewers or a wait timer"
    }

    fn check(&self, workflow: &Workflow) -> Vec<Finding> {
        let mut findings = Vec::new();
        for (index, (id, job)) in workflow.jobs().enumerate() {
            let Some(environment) = &job.environment else {
                continue;
            };
            let name = environment.name().to_lowercase();
            if PRODUCTION_ENVIRONMENTS.contains(&name.as_str()) && !environment.is_protected() {
                findings.push(
                    Finding::new(
                        self.id(),
                        Severity::Warn,
                        FindingLocation::job(index, id),
                        format!(
                            "job '{}' deploys to '{}' without reviewers or a wait timer",
                            id,
                            environment.name()
                        ),
                    )
                    .with_suggestion("declare `reviewers` or `wait-timer` on the environment"),
                );
            }
        }
        findings
    }
}
