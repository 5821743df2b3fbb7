//! Typed document model for workflow definitions.
//!
//! Field names follow the on-disk YAML keys (`runs-on`, `timeout-minutes`, ...)
//! so that a parsed workflow serializes back to the same structured form.

use crate::core::workflow::matrix::Matrix;
use indexmap::IndexMap;
use serde::de::{self, DeserializeOwned, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Environment variables keep the YAML scalar they were written with.
pub type EnvMap = IndexMap<String, Value>;

/// Root document for a workflow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Workflow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "run-name", default, skip_serializing_if = "Option::is_none")]
    pub run_name: Option<String>,
    #[serde(rename = "on")]
    pub triggers: Triggers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub env: EnvMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<Concurrency>,
    pub jobs: Jobs,
}

impl Workflow {
    /// Jobs in declaration order.
    pub fn jobs(&self) -> impl Iterator<Item = (&str, &Job)> {
        self.jobs.iter()
    }

    pub fn job(&self, id: &str) -> Option<&Job> {
        self.jobs.get(id)
    }

    pub fn event_kinds(&self) -> Vec<EventKind> {
        self.triggers.iter().map(Trigger::kind).collect()
    }

    pub fn is_triggered_by(&self, kind: EventKind) -> bool {
        self.triggers.iter().any(|trigger| trigger.kind() == kind)
    }

    /// True when a permissions block exists at workflow scope or on any job.
    pub fn has_permissions(&self) -> bool {
        self.permissions.is_some() || self.jobs().any(|(_, job)| job.permissions.is_some())
    }
}

/// Events that may trigger a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Push,
    PullRequest,
    Schedule,
    WorkflowDispatch,
    Release,
    WorkflowCall,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::Push,
        EventKind::PullRequest,
        EventKind::Schedule,
        EventKind::WorkflowDispatch,
        EventKind::Release,
        EventKind::WorkflowCall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Push => "push",
            EventKind::PullRequest => "pull_request",
            EventKind::Schedule => "schedule",
            EventKind::WorkflowDispatch => "workflow_dispatch",
            EventKind::Release => "release",
            EventKind::WorkflowCall => "workflow_call",
        }
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| {
                let supported: Vec<&str> = EventKind::ALL.iter().map(EventKind::as_str).collect();
                format!(
                    "unsupported trigger event '{}'; expected one of {}",
                    value,
                    supported.join(", ")
                )
            })
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single trigger with its event-specific configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    Push(PushFilter),
    PullRequest(PullRequestFilter),
    Schedule(Vec<CronSchedule>),
    WorkflowDispatch(DispatchTrigger),
    Release(ReleaseTrigger),
    WorkflowCall(CallTrigger),
}

impl Trigger {
    pub fn kind(&self) -> EventKind {
        match self {
            Trigger::Push(_) => EventKind::Push,
            Trigger::PullRequest(_) => EventKind::PullRequest,
            Trigger::Schedule(_) => EventKind::Schedule,
            Trigger::WorkflowDispatch(_) => EventKind::WorkflowDispatch,
            Trigger::Release(_) => EventKind::Release,
            Trigger::WorkflowCall(_) => EventKind::WorkflowCall,
        }
    }

    fn from_config(kind: EventKind, raw: Value) -> Result<Self, String> {
        let trigger = match kind {
            EventKind::Push => Trigger::Push(event_config(kind, raw)?),
            EventKind::PullRequest => Trigger::PullRequest(event_config(kind, raw)?),
            EventKind::Schedule => {
                let entries: Vec<CronSchedule> = event_config(kind, raw)?;
                if entries.is_empty() {
                    return Err("on.schedule must list at least one cron entry".to_string());
                }
                Trigger::Schedule(entries)
            }
            EventKind::WorkflowDispatch => Trigger::WorkflowDispatch(event_config(kind, raw)?),
            EventKind::Release => Trigger::Release(event_config(kind, raw)?),
            EventKind::WorkflowCall => Trigger::WorkflowCall(event_config(kind, raw)?),
        };
        Ok(trigger)
    }
}

fn event_config<T: DeserializeOwned + Default>(kind: EventKind, raw: Value) -> Result<T, String> {
    if raw.is_null() {
        return Ok(T::default());
    }
    serde_yaml::from_value(raw).map_err(|err| format!("on.{}: {}", kind, err))
}

/// Ordered trigger list, serialized as the `on:` mapping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Triggers(Vec<Trigger>);

impl Triggers {
    pub fn new(triggers: Vec<Trigger>) -> Self {
        Self(triggers)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Trigger> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn from_value(raw: Value) -> Result<Self, String> {
        let mut triggers: Vec<Trigger> = Vec::new();
        let mut push = |trigger: Trigger| -> Result<(), String> {
            if triggers.iter().any(|existing| existing.kind() == trigger.kind()) {
                return Err(format!("trigger '{}' is declared more than once", trigger.kind()));
            }
            triggers.push(trigger);
            Ok(())
        };
        match raw {
            Value::String(name) => {
                let kind: EventKind = name.parse()?;
                push(Trigger::from_config(kind, Value::Null)?)?;
            }
            Value::Sequence(items) => {
                for item in items {
                    let name = item
                        .as_str()
                        .ok_or_else(|| "`on` list entries must be event names".to_string())?;
                    let kind: EventKind = name.parse()?;
                    push(Trigger::from_config(kind, Value::Null)?)?;
                }
            }
            Value::Mapping(map) => {
                for (key, config) in map {
                    let name = key
                        .as_str()
                        .ok_or_else(|| "`on` mapping keys must be event names".to_string())?;
                    let kind: EventKind = name.parse()?;
                    push(Trigger::from_config(kind, config)?)?;
                }
            }
            _ => {
                return Err(
                    "`on` must be an event name, a list of event names or a mapping".to_string(),
                )
            }
        }
        if triggers.is_empty() {
            return Err("`on` must declare at least one trigger".to_string());
        }
        Ok(Triggers(triggers))
    }
}

impl<'de> Deserialize<'de> for Triggers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Triggers::from_value(raw).map_err(de::Error::custom)
    }
}

impl Serialize for Triggers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for trigger in &self.0 {
            let key = trigger.kind().as_str();
            match trigger {
                Trigger::Push(config) => map.serialize_entry(key, config)?,
                Trigger::PullRequest(config) => map.serialize_entry(key, config)?,
                Trigger::Schedule(entries) => map.serialize_entry(key, entries)?,
                Trigger::WorkflowDispatch(config) => map.serialize_entry(key, config)?,
                Trigger::Release(config) => map.serialize_entry(key, config)?,
                Trigger::WorkflowCall(config) => map.serialize_entry(key, config)?,
            }
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PushFilter {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches_ignore: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags_ignore: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths_ignore: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PullRequestFilter {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches_ignore: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths_ignore: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CronSchedule {
    pub cron: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchTrigger {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub inputs: IndexMap<String, InputDecl>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseTrigger {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CallTrigger {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub inputs: IndexMap<String, InputDecl>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub outputs: IndexMap<String, CallOutput>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub secrets: IndexMap<String, SecretDecl>,
}

/// Typed input declared by `workflow_dispatch` or `workflow_call`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputDecl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<InputType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    String,
    Boolean,
    Number,
    Choice,
    Environment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CallOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecretDecl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
}

/// Permission scopes accepted in a permissions block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionScope {
    Contents,
    Packages,
    PullRequests,
    Issues,
    IdToken,
    Pages,
    Deployments,
    Statuses,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Read,
    Write,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionPreset {
    ReadAll,
    WriteAll,
}

/// Workflow- or job-level permissions block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Permissions {
    Preset(PermissionPreset),
    Scoped(BTreeMap<PermissionScope, Access>),
}

impl Permissions {
    pub fn access(&self, scope: PermissionScope) -> Access {
        match self {
            Permissions::Preset(PermissionPreset::ReadAll) => Access::Read,
            Permissions::Preset(PermissionPreset::WriteAll) => Access::Write,
            Permissions::Scoped(scopes) => scopes.get(&scope).copied().unwrap_or(Access::None),
        }
    }

    pub fn is_write_all(&self) -> bool {
        matches!(self, Permissions::Preset(PermissionPreset::WriteAll))
    }
}

impl<'de> Deserialize<'de> for Permissions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        match raw {
            Value::String(_) => serde_yaml::from_value::<PermissionPreset>(raw)
                .map(Permissions::Preset)
                .map_err(|err| de::Error::custom(format!("permissions: {}", err))),
            Value::Mapping(_) => serde_yaml::from_value::<BTreeMap<PermissionScope, Access>>(raw)
                .map(Permissions::Scoped)
                .map_err(|err| de::Error::custom(format!("permissions: {}", err))),
            _ => Err(de::Error::custom(
                "permissions must be read-all, write-all or a mapping of scope to access",
            )),
        }
    }
}

/// Boolean flag that may also be written as an expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoolOrExpr {
    Bool(bool),
    Expr(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Concurrency {
    Group(String),
    Detailed(ConcurrencySpec),
}

impl Concurrency {
    pub fn group(&self) -> &str {
        match self {
            Concurrency::Group(group) => group,
            Concurrency::Detailed(spec) => &spec.group,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ConcurrencySpec {
    pub group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_in_progress: Option<BoolOrExpr>,
}

/// Jobs keyed by identifier, in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Jobs(IndexMap<String, Job>);

impl Jobs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Job)> {
        self.0.iter().map(|(id, job)| (id.as_str(), job))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn get(&self, id: &str) -> Option<&Job> {
        self.0.get(id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.0.get_index_of(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Job> {
        self.0.get_mut(id)
    }

    /// Insert a job; returns the previous definition when the id already existed.
    /// Replacement keeps the original declaration position.
    pub(crate) fn insert(&mut self, id: String, job: Job) -> Option<Job> {
        self.0.insert(id, job)
    }
}

impl FromIterator<(String, Job)> for Jobs {
    fn from_iter<I: IntoIterator<Item = (String, Job)>>(iter: I) -> Self {
        Jobs(iter.into_iter().collect())
    }
}

impl Serialize for Jobs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, job) in &self.0 {
            map.serialize_entry(id, job)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Jobs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct JobsVisitor;

        impl<'de> Visitor<'de> for JobsVisitor {
            type Value = Jobs;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of job id to job definition")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Jobs, A::Error> {
                let mut jobs = IndexMap::new();
                while let Some(id) = access.next_key::<String>()? {
                    if jobs.contains_key(&id) {
                        return Err(de::Error::custom(format!("duplicate job id '{}'", id)));
                    }
                    let job: Job = access.next_value()?;
                    jobs.insert(id, job);
                }
                Ok(Jobs(jobs))
            }
        }

        deserializer.deserialize_map(JobsVisitor)
    }
}

/// Unit of execution running on one runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct Job {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub runs_on: RunsOn,
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub needs: Vec<String>,
    #[serde(rename = "if", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<Concurrency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continue_on_error: Option<BoolOrExpr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub env: EnvMap,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub outputs: IndexMap<String, String>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Job {
    /// Minimal job running on `runner` with the provided steps.
    pub fn new(runner: impl Into<String>, steps: Vec<Step>) -> Self {
        Job {
            name: None,
            runs_on: RunsOn::Label(runner.into()),
            needs: Vec::new(),
            condition: None,
            permissions: None,
            environment: None,
            concurrency: None,
            timeout_minutes: None,
            continue_on_error: None,
            strategy: None,
            env: EnvMap::new(),
            outputs: IndexMap::new(),
            steps,
        }
    }

    pub fn matrix(&self) -> Option<&Matrix> {
        self.strategy.as_ref().and_then(|strategy| strategy.matrix.as_ref())
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunsOn {
    Label(String),
    Labels(Vec<String>),
}

impl RunsOn {
    pub fn labels(&self) -> Vec<&str> {
        match self {
            RunsOn::Label(label) => vec![label.as_str()],
            RunsOn::Labels(labels) => labels.iter().map(String::as_str).collect(),
        }
    }
}

/// Deployment environment a job targets, with its protection rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Environment {
    Name(String),
    Detailed(EnvironmentSpec),
}

impl Environment {
    pub fn name(&self) -> &str {
        match self {
            Environment::Name(name) => name,
            Environment::Detailed(spec) => &spec.name,
        }
    }

    /// True when reviewers or a wait timer gate deployments.
    pub fn is_protected(&self) -> bool {
        match self {
            Environment::Name(_) => false,
            Environment::Detailed(spec) => {
                !spec.reviewers.is_empty() || spec.wait_timer.unwrap_or(0) > 0
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct EnvironmentSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reviewers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_timer: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deployment_branches: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct Strategy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<Matrix>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_fast: Option<BoolOrExpr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_parallel: Option<u32>,
}

/// Single action invocation or shell command within a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawStep", into = "RawStep")]
pub struct Step {
    pub id: Option<String>,
    pub name: Option<String>,
    pub condition: Option<String>,
    pub env: EnvMap,
    pub continue_on_error: Option<BoolOrExpr>,
    pub timeout_minutes: Option<u32>,
    pub kind: StepKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepKind {
    Action(ActionStep),
    Run(RunStep),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionStep {
    pub reference: ActionRef,
    pub with: IndexMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStep {
    pub command: String,
    pub shell: Option<String>,
    pub working_directory: Option<String>,
}

impl Step {
    pub fn run(command: impl Into<String>) -> Self {
        Self::with_kind(StepKind::Run(RunStep {
            command: command.into(),
            shell: None,
            working_directory: None,
        }))
    }

    pub fn action(reference: ActionRef) -> Self {
        Self::with_kind(StepKind::Action(ActionStep {
            reference,
            with: IndexMap::new(),
        }))
    }

    fn with_kind(kind: StepKind) -> Self {
        Step {
            id: None,
            name: None,
            condition: None,
            env: EnvMap::new(),
            continue_on_error: None,
            timeout_minutes: None,
            kind,
        }
    }

    pub fn as_action(&self) -> Option<&ActionStep> {
        match &self.kind {
            StepKind::Action(action) => Some(action),
            StepKind::Run(_) => None,
        }
    }

    pub fn as_run(&self) -> Option<&RunStep> {
        match &self.kind {
            StepKind::Run(run) => Some(run),
            StepKind::Action(_) => None,
        }
    }

    /// Label used in reports: the step name, else its `uses` or first command line.
    pub fn label(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        match &self.kind {
            StepKind::Action(action) => action.reference.to_string(),
            StepKind::Run(run) => run.command.lines().next().unwrap_or("").trim().to_string(),
        }
    }
}

/// On-disk shape of a step; converted to [`Step`] after checking that exactly one
/// of `uses` / `run` is present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct RawStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(rename = "if", default, skip_serializing_if = "Option::is_none")]
    condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    uses: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    with: IndexMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    run: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    shell: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    working_directory: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    env: EnvMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    continue_on_error: Option<BoolOrExpr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeout_minutes: Option<u32>,
}

impl TryFrom<RawStep> for Step {
    type Error = String;

    fn try_from(raw: RawStep) -> Result<Self, Self::Error> {
        let kind = match (raw.uses, raw.run) {
            (Some(_), Some(_)) => {
                return Err("step must define exactly one of `uses` or `run`, not both".to_string())
            }
            (None, None) => return Err("step must define either `uses` or `run`".to_string()),
            (Some(uses), None) => {
                if raw.shell.is_some() || raw.working_directory.is_some() {
                    return Err(format!(
                        "action step '{}' cannot set `shell` or `working-directory`",
                        uses
                    ));
                }
                StepKind::Action(ActionStep {
                    reference: uses.parse()?,
                    with: raw.with,
                })
            }
            (None, Some(command)) => {
                if !raw.with.is_empty() {
                    return Err("run step cannot declare `with` inputs".to_string());
                }
                StepKind::Run(RunStep {
                    command,
                    shell: raw.shell,
                    working_directory: raw.working_directory,
                })
            }
        };
        Ok(Step {
            id: raw.id,
            name: raw.name,
            condition: raw.condition,
            env: raw.env,
            continue_on_error: raw.continue_on_error,
            timeout_minutes: raw.timeout_minutes,
            kind,
        })
    }
}

impl From<Step> for RawStep {
    fn from(step: Step) -> Self {
        let mut raw = RawStep {
            id: step.id,
            name: step.name,
            condition: step.condition,
            env: step.env,
            continue_on_error: step.continue_on_error,
            timeout_minutes: step.timeout_minutes,
            ..RawStep::default()
        };
        match step.kind {
            StepKind::Action(action) => {
                raw.uses = Some(action.reference.to_string());
                raw.with = action.with;
            }
            StepKind::Run(run) => {
                raw.run = Some(run.command);
                raw.shell = run.shell;
                raw.working_directory = run.working_directory;
            }
        }
        raw
    }
}

/// Target of a `uses:` step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRef {
    /// `owner/repo[/path]@ref`
    Repository {
        owner: String,
        repo: String,
        path: Option<String>,
        git_ref: Option<String>,
    },
    /// `./path` inside the same repository.
    Local(String),
    /// `docker://image`
    Docker(String),
}

impl ActionRef {
    /// `owner/repo[/path]` without the ref, lowercased for comparisons.
    pub fn slug(&self) -> Option<String> {
        match self {
            ActionRef::Repository {
                owner, repo, path, ..
            } => {
                let mut slug = format!("{}/{}", owner, repo);
                if let Some(path) = path {
                    slug.push('/');
                    slug.push_str(path);
                }
                Some(slug.to_lowercase())
            }
            ActionRef::Local(_) | ActionRef::Docker(_) => None,
        }
    }

    pub fn git_ref(&self) -> Option<&str> {
        match self {
            ActionRef::Repository { git_ref, .. } => git_ref.as_deref(),
            ActionRef::Local(_) | ActionRef::Docker(_) => None,
        }
    }
}

impl FromStr for ActionRef {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.starts_with("./") || value.starts_with("../") {
            return Ok(ActionRef::Local(value.to_string()));
        }
        if let Some(image) = value.strip_prefix("docker://") {
            if image.is_empty() {
                return Err("docker action reference is missing an image".to_string());
            }
            return Ok(ActionRef::Docker(image.to_string()));
        }

        let (target, git_ref) = match value.split_once('@') {
            Some((_, "")) => {
                return Err(format!("action reference '{}' has an empty ref", value))
            }
            Some((target, git_ref)) => (target, Some(git_ref.to_string())),
            None => (value, None),
        };
        let mut parts = target.splitn(3, '/');
        let owner = parts.next().unwrap_or_default();
        let repo = parts.next().unwrap_or_default();
        if owner.is_empty() || repo.is_empty() {
            return Err(format!(
                "action reference '{}' must look like owner/repo[/path]@ref",
                value
            ));
        }
        let path = parts
            .next()
            .filter(|path| !path.is_empty())
            .map(ToOwned::to_owned);
        Ok(ActionRef::Repository {
            owner: owner.to_string(),
            repo: repo.to_string(),
            path,
            git_ref,
        })
    }
}

impl fmt::Display for ActionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionRef::Repository {
                owner,
                repo,
                path,
                git_ref,
            } => {
                write!(f, "{}/{}", owner, repo)?;
                if let Some(path) = path {
                    write!(f, "/{}", path)?;
                }
                if let Some(git_ref) = git_ref {
                    write!(f, "@{}", git_ref)?;
                }
                Ok(())
            }
            ActionRef::Local(path) => f.write_str(path),
            ActionRef::Docker(image) => write!(f, "docker://{}", image),
        }
    }
}
