//! Action manifests (`action.yml`).
//!
//! Only composite actions carry steps; node and docker actions are parsed so that
//! a directory of mixed manifests can be linted without errors.

use crate::core::error::AppError;
use crate::core::workflow::error::WorkflowError;
use crate::core::workflow::model::Step;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionManifest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub inputs: IndexMap<String, ActionInput>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub outputs: IndexMap<String, ActionOutput>,
    pub runs: ActionRuns,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branding: Option<Branding>,
}

impl ActionManifest {
    /// Steps of a composite action; empty for other action kinds.
    pub fn steps(&self) -> &[Step] {
        match &self.runs {
            ActionRuns::Composite(composite) => &composite.steps,
            _ => &[],
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.runs, ActionRuns::Composite(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ActionInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Branding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// The `runs` block, tagged by its `using` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "using")]
pub enum ActionRuns {
    #[serde(rename = "composite")]
    Composite(CompositeRuns),
    #[serde(rename = "node20")]
    Node20(NodeRuns),
    #[serde(rename = "node16")]
    Node16(NodeRuns),
    #[serde(rename = "docker")]
    Docker(DockerRuns),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompositeRuns {
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeRuns {
    pub main: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DockerRuns {
    pub image: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<String>,
}

/// Parse an action manifest. Run steps of a composite action must name a shell.
pub fn parse_action(text: &str) -> Result<ActionManifest, WorkflowError> {
    let manifest: ActionManifest = serde_yaml::from_str(text).map_err(WorkflowError::from_yaml)?;

    if let ActionRuns::Composite(composite) = &manifest.runs {
        if composite.steps.is_empty() {
            return Err(WorkflowError::malformed(
                "runs.steps",
                "composite action must define at least one step",
            ));
        }
        for (index, step) in composite.steps.iter().enumerate() {
            if let Some(run) = step.as_run() {
                if run.shell.is_none() {
                    return Err(WorkflowError::malformed(
                        format!("runs.steps[{}]", index),
                        "run steps in a composite action must declare `shell`",
                    ));
                }
            }
        }
    }

    debug!(
        name = %manifest.name,
        steps = manifest.steps().len(),
        "parsed action manifest"
    );
    Ok(manifest)
}

pub fn load_action(path: &Path) -> Result<ActionManifest, AppError> {
    let text = std::fs::read_to_string(path).map_err(|err| {
        let mut error = AppError::from(err);
        error.add_context("path", &path.display().to_string());
        error
    })?;
    parse_action(&text).map_err(|err| {
        let mut error = AppError::from(err);
        error.add_context("path", &path.display().to_string());
        error
    })
}
