use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use crate::core::workflow::action::ActionManifest;
use crate::core::workflow::model::Workflow;
use actionsmith_types::{Finding, Severity};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, trace};

pub mod refs;
pub mod rules;
pub use rules::*;

/// A single independent check. Rules never mutate the document.
pub trait Rule: Send + Sync {
    fn id(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn check(&self, workflow: &Workflow) -> Vec<Finding>;

    /// Step-level rules also inspect composite action steps.
    fn check_action(&self, _action: &ActionManifest) -> Vec<Finding> {
        Vec::new()
    }
}

/// Every built-in rule, in registration order.
pub fn builtin_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(ExplicitPermissionsRule),
        Box::new(PinnedActionsRule),
        Box::new(ConcurrencyGuardRule),
        Box::new(ShellInterpolationRule),
        Box::new(TimeoutPresentRule),
        Box::new(CacheKeyRule),
        Box::new(DanglingNeedsRule),
        Box::new(DependencyCycleRule),
        Box::new(BroadPermissionsRule),
        Box::new(ScheduleCronRule),
        Box::new(MatrixSizeRule),
        Box::new(EnvironmentProtectionRule),
    ]
}

pub fn known_rule_ids() -> Vec<&'static str> {
    builtin_rules().iter().map(|rule| rule.id()).collect()
}

/// Runs the enabled rules and returns findings in report order.
pub struct RuleEngine {
    rules: Vec<Box<dyn Rule>>,
    severity_overrides: BTreeMap<String, Severity>,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self {
            rules: builtin_rules(),
            severity_overrides: BTreeMap::new(),
        }
    }

    /// Engine with some rules disabled and some severities replaced.
    /// Unknown rule ids are a configuration error.
    pub fn with_settings(
        disabled: &[String],
        severity_overrides: &BTreeMap<String, Severity>,
    ) -> Result<Self, AppError> {
        let known: HashSet<&str> = known_rule_ids().into_iter().collect();
        for id in disabled.iter().chain(severity_overrides.keys()) {
            if !known.contains(id.as_str()) {
                let mut error = AppError::new(
                    ErrorCategory::ConfigurationError,
                    format!("unknown rule id '{}'", id),
                )
                .with_code("WF-CONFIG-001")
                .with_suggestion("run `actionsmith lint --list-rules` to see the available rules");
                error.add_context("rule", id);
                return Err(error);
            }
        }

        let rules = builtin_rules()
            .into_iter()
            .filter(|rule| !disabled.iter().any(|id| id == rule.id()))
            .collect();
        Ok(Self {
            rules,
            severity_overrides: severity_overrides.clone(),
        })
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|rule| rule.as_ref())
    }

    pub fn evaluate(&self, workflow: &Workflow) -> Vec<Finding> {
        let mut findings = Vec::new();
        for rule in &self.rules {
            let produced = rule.check(workflow);
            trace!(rule = rule.id(), findings = produced.len(), "rule evaluated");
            findings.extend(produced);
        }
        self.finish(findings)
    }

    pub fn evaluate_action(&self, action: &ActionManifest) -> Vec<Finding> {
        let mut findings = Vec::new();
        for rule in &self.rules {
            findings.extend(rule.check_action(action));
        }
        self.finish(findings)
    }

    fn finish(&self, mut findings: Vec<Finding>) -> Vec<Finding> {
        for finding in &mut findings {
            if let Some(severity) = self.severity_overrides.get(&finding.rule_id) {
                finding.severity = *severity;
            }
        }
        sort_findings(&mut findings);
        debug!(findings = findings.len(), "evaluation complete");
        findings
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Location, then severity (most severe first), rule id and message.
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        a.location
            .cmp(&b.location)
            .then(b.severity.cmp(&a.severity))
            .then(a.rule_id.cmp(&b.rule_id))
            .then(a.message.cmp(&b.message))
    });
}
