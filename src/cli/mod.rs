pub mod args;
pub mod commands;

pub use args::{ComposeArgs, GraphArgs, LintArgs, PatternsArgs};
use clap::{Parser, Subcommand};
use std::process::ExitCode;

const HELP_TEMPLATE: &str = "\
{name} {version}\n\
{about-with-newline}\n\
USAGE:\n    {usage}\n\
\nOPTIONS:\n{options}\n\
WORKFLOW COMMANDS:\n{subcommands}\n";

#[derive(Parser, Debug)]
#[command(name = "actionsmith")]
#[command(version = crate::VERSION)]
#[command(about = "Validate and compose GitHub Actions workflows")]
#[command(help_template = HELP_TEMPLATE)]
#[command(
    after_long_help = "Typical flow: lint the workflows in .github/workflows, compose patterns onto a base workflow, then lint the result again."
)]
pub struct Args {
    /// Suppress log output on the console
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(
        about = "Check workflows and composite actions against the rule set",
        long_about = "Lint parses every workflow or action.yml it is given, runs the built-in rules, and prints findings. Exits 1 when a finding reaches --fail-on or a file cannot be parsed.",
        after_help = "Examples:\n    actionsmith lint\n    actionsmith lint .github/workflows/ci.yml --format github --fail-on warn"
    )]
    Lint(LintArgs),
    #[command(
        about = "Apply named patterns to a base workflow",
        long_about = "Compose merges patterns from the catalog (built-ins plus compose.pattern_dirs) into a base workflow, in the order given, and prints the result.",
        after_help = "Example:\n    actionsmith compose ci.yml --pattern matrix-test --pattern dependency-cache"
    )]
    Compose(ComposeArgs),
    #[command(
        about = "List the patterns available to compose",
        after_help = "Example:\n    actionsmith patterns"
    )]
    Patterns(PatternsArgs),
    #[command(
        about = "Render a workflow's job dependency graph",
        long_about = "Graph prints the needs graph of a workflow as Graphviz DOT, or the jobs in dependency order with --order.",
        after_help = "Example:\n    actionsmith graph ci.yml | dot -Tsvg > ci.svg"
    )]
    Graph(GraphArgs),
}

pub async fn run(args: Args) -> crate::Result<ExitCode> {
    match args.command {
        Command::Lint(lint_args) => commands::lint(lint_args).await,
        Command::Compose(compose_args) => commands::compose(compose_args).await,
        Command::Patterns(patterns_args) => commands::patterns(patterns_args).await,
        Command::Graph(graph_args) => commands::graph(graph_args).await,
    }
}
