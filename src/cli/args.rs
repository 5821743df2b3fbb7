use crate::core::workflow::{CompositionFormat, ReportFormat};
use actionsmith_types::Severity;
use clap::Args;
use std::path::PathBuf;

/// Directory linted when no path is given.
pub const DEFAULT_WORKFLOW_DIR: &str = ".github/workflows";

#[derive(Args, Debug, Clone, Default)]
pub struct LintArgs {
    /// Workflow files, action.yml manifests or directories (default: .github/workflows)
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Report format (default: report.format from actionsmith.toml, else table)
    #[arg(long, value_enum, value_name = "FORMAT", help_heading = "Output Options")]
    pub format: Option<ReportFormat>,

    /// Lowest severity that makes the command exit non-zero (default: fail)
    #[arg(long, value_name = "SEVERITY", help_heading = "Output Options")]
    pub fail_on: Option<Severity>,

    /// Skip a rule by id; repeat or separate with commas
    #[arg(long, value_name = "RULE", value_delimiter = ',', help_heading = "Rule Selection")]
    pub disable: Vec<String>,

    /// Print every built-in rule id with its description and exit
    #[arg(long, help_heading = "Rule Selection")]
    pub list_rules: bool,

    /// Path to custom config file (default: ./actionsmith.toml)
    #[arg(long, value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ComposeArgs {
    /// Base workflow the patterns are applied to
    #[arg(value_name = "BASE")]
    pub base: PathBuf,

    /// Catalog pattern to apply, in order; repeat or separate with commas
    #[arg(long = "pattern", short = 'p', value_name = "NAME", value_delimiter = ',')]
    pub patterns: Vec<String>,

    /// Pattern file to load and apply after the named patterns
    #[arg(long = "pattern-file", value_name = "FILE")]
    pub pattern_files: Vec<PathBuf>,

    /// Emit the composed YAML or a JSON document with the applied-pattern summary
    #[arg(
        long,
        value_enum,
        default_value = "yaml",
        value_name = "FORMAT",
        help_heading = "Output Options"
    )]
    pub format: CompositionFormat,

    /// Write the result to this file instead of stdout
    #[arg(long, short = 'o', value_name = "FILE", help_heading = "Output Options")]
    pub output: Option<PathBuf>,

    /// Path to custom config file (default: ./actionsmith.toml)
    #[arg(long, value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PatternsArgs {
    /// Path to custom config file (default: ./actionsmith.toml)
    #[arg(long, value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct GraphArgs {
    /// Workflow whose job dependency graph is rendered
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Print jobs in dependency order instead of Graphviz DOT
    #[arg(long)]
    pub order: bool,
}
