use crate::core::workflow::error::WorkflowError;
use crate::core::workflow::model::{Job, Step, Workflow};
use crate::core::workflow::parse::validate_workflow;

/// Mutable view of a workflow used during composition.
///
/// A parsed [`Workflow`] is treated as immutable; every change goes through the
/// builder and is re-validated by [`WorkflowBuilder::build`].
#[derive(Debug, Clone)]
pub struct WorkflowBuilder {
    workflow: Workflow,
}

impl WorkflowBuilder {
    pub fn new(base: Workflow) -> Self {
        Self { workflow: base }
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    pub fn contains_job(&self, id: &str) -> bool {
        self.workflow.jobs.contains(id)
    }

    /// Add a job at the end of the job list. Returns false if the id is taken.
    pub fn insert_job(&mut self, id: impl Into<String>, job: Job) -> bool {
        let id = id.into();
        if self.workflow.jobs.contains(&id) {
            return false;
        }
        self.workflow.jobs.insert(id, job);
        true
    }

    /// Replace an existing job in place, returning the previous definition.
    pub fn replace_job(&mut self, id: &str, job: Job) -> Option<Job> {
        if !self.workflow.jobs.contains(id) {
            return None;
        }
        self.workflow.jobs.insert(id.to_string(), job)
    }

    /// Append steps to an existing job. Returns false if the job is unknown.
    pub fn append_steps(&mut self, id: &str, steps: impl IntoIterator<Item = Step>) -> bool {
        match self.workflow.jobs.get_mut(id) {
            Some(job) => {
                job.steps.extend(steps);
                true
            }
            None => false,
        }
    }

    /// Union `needs` edges into a job: existing order kept, new ids appended once.
    pub fn add_needs<I, S>(&mut self, id: &str, needs: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let Some(job) = self.workflow.jobs.get_mut(id) else {
            return false;
        };
        for dependency in needs {
            let dependency = dependency.into();
            if !job.needs.contains(&dependency) {
                job.needs.push(dependency);
            }
        }
        true
    }

    pub fn build(self) -> Result<Workflow, WorkflowError> {
        validate_workflow(&self.workflow)?;
        Ok(self.workflow)
    }
}
