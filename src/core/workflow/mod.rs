//! Workflow document model, rule engine, composer and reporters.

pub mod action;
pub mod batch;
pub mod builder;
pub mod compose;
pub mod error;
pub mod graph;
pub mod lint;
pub mod matrix;
pub mod model;
pub mod parse;
pub mod report;

pub use action::{load_action, parse_action, ActionManifest, ActionRuns};
pub use batch::{check_file, check_files, collect_paths, FileReport};
pub use builder::WorkflowBuilder;
pub use compose::{compose_patterns, AppliedPattern, Composer, Composition, Pattern, PatternCatalog};
pub use error::{SourceLocation, WorkflowError};
pub use graph::JobGraph;
pub use lint::{Rule, RuleEngine};
pub use matrix::{Combination, Matrix};
pub use model::{
    Access, ActionRef, EventKind, Job, Jobs, PermissionPreset, PermissionScope, Permissions, Step,
    StepKind, Trigger, Workflow,
};
pub use parse::{load_workflow, parse_workflow, to_yaml};
pub use report::{
    render_composition, render_dot, render_findings, CompositionFormat, ReportFormat,
};
