use crate::core::error::AppError;
use crate::core::workflow::error::WorkflowError;
use crate::core::workflow::model::{InputDecl, InputType, Job, Trigger, Workflow};
use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

/// Parse and validate a workflow document.
pub fn parse_workflow(text: &str) -> Result<Workflow, WorkflowError> {
    let workflow: Workflow = serde_yaml::from_str(text).map_err(WorkflowError::from_yaml)?;
    validate_workflow(&workflow)?;
    debug!(jobs = workflow.jobs.len(), "parsed workflow");
    Ok(workflow)
}

/// Read a workflow file from disk and parse it.
pub fn load_workflow(path: &Path) -> Result<Workflow, AppError> {
    let text = std::fs::read_to_string(path).map_err(|err| {
        let mut error = AppError::from(err);
        error.add_context("path", &path.display().to_string());
        error
    })?;
    parse_workflow(&text).map_err(|err| {
        let mut error = AppError::from(err);
        error.add_context("path", &path.display().to_string());
        error
    })
}

/// Serialize a workflow back to YAML. Output is deterministic for a given document.
pub fn to_yaml(workflow: &Workflow) -> Result<String, WorkflowError> {
    serde_yaml::to_string(workflow).map_err(|err| WorkflowError::Serialization(err.to_string()))
}

/// Structural checks serde cannot express on its own.
pub fn validate_workflow(workflow: &Workflow) -> Result<(), WorkflowError> {
    for trigger in workflow.triggers.iter() {
        let (event, inputs) = match trigger {
            Trigger::WorkflowDispatch(dispatch) => ("workflow_dispatch", &dispatch.inputs),
            Trigger::WorkflowCall(call) => ("workflow_call", &call.inputs),
            _ => continue,
        };
        validate_inputs(&format!("on.{}.inputs", event), inputs)?;
    }

    if workflow.jobs.is_empty() {
        return Err(WorkflowError::malformed(
            "jobs",
            "workflow must define at least one job",
        ));
    }

    for (id, job) in workflow.jobs() {
        validate_job(id, job)?;
    }
    Ok(())
}

pub(crate) fn validate_job(id: &str, job: &Job) -> Result<(), WorkflowError> {
    let path = format!("jobs.{}", id);
    if !job_id_pattern().is_match(id) {
        return Err(WorkflowError::malformed(
            path,
            format!(
                "invalid job id '{}'; ids must start with a letter or '_' and contain only alphanumerics, '-' or '_'",
                id
            ),
        ));
    }
    if job.steps.is_empty() {
        return Err(WorkflowError::malformed(
            path,
            "job must define at least one step",
        ));
    }

    let mut step_ids = HashSet::new();
    for (index, step) in job.steps.iter().enumerate() {
        if let Some(step_id) = &step.id {
            if !step_ids.insert(step_id.as_str()) {
                return Err(WorkflowError::malformed(
                    format!("{}.steps[{}]", path, index),
                    format!("duplicate step id '{}'", step_id),
                ));
            }
        }
    }

    if let Some(matrix) = job.matrix() {
        matrix
            .validate()
            .map_err(|message| WorkflowError::malformed(format!("{}.strategy.matrix", path), message))?;
    }
    Ok(())
}

fn validate_inputs(path: &str, inputs: &IndexMap<String, InputDecl>) -> Result<(), WorkflowError> {
    for (name, input) in inputs {
        if input.input_type == Some(InputType::Choice) && input.options.is_empty() {
            return Err(WorkflowError::malformed(
                format!("{}.{}", path, name),
                "choice input requires at least one option",
            ));
        }
    }
    Ok(())
}

fn job_id_pattern() -> &'static Regex {
    static JOB_ID: OnceLock<Regex> = OnceLock::new();
    JOB_ID.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("job id pattern is valid"))
}
