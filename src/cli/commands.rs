use crate::{
    cli::args::{ComposeArgs, GraphArgs, LintArgs, PatternsArgs, DEFAULT_WORKFLOW_DIR},
    core::{
        config::ActionsmithConfig,
        workflow::{
            check_files, collect_paths, lint::builtin_rules, load_workflow, render_composition,
            render_dot, render_findings, Composer, FileReport, JobGraph, PatternCatalog,
            RuleEngine, WorkflowError,
        },
        AppError, ConfigLoader, ConfigValidator,
    },
    Result,
};
use actionsmith_types::{Severity, SeverityCounts};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::{env, fs};

/// Load `--config` when given, otherwise `actionsmith.toml` in the workspace, and validate it.
fn load_config(workspace: &Path, explicit: Option<&Path>) -> std::result::Result<ActionsmithConfig, AppError> {
    let config = match explicit {
        Some(path) => ConfigLoader::load_from_path(path)?,
        None => ConfigLoader::load_from_workspace(workspace)?,
    };
    ConfigValidator::validate(&config)?;
    Ok(config)
}

fn emit(text: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    if !text.is_empty() && !text.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    stdout.flush()?;
    Ok(())
}

/// A run fails when any file could not be parsed or any finding reaches `threshold`.
pub fn lint_failed(reports: &[FileReport], threshold: Severity) -> bool {
    reports.iter().any(|report| {
        report.error().is_some()
            || report
                .findings()
                .iter()
                .any(|finding| finding.severity >= threshold)
    })
}

/// Rule engine honouring the configured disabled rules and severity overrides.
fn configured_engine(config: &ActionsmithConfig) -> std::result::Result<RuleEngine, AppError> {
    RuleEngine::with_settings(&config.lint.disabled_rules, &config.lint.severity_overrides)
}

fn rule_listing() -> String {
    let rules = builtin_rules();
    let width = rules.iter().map(|rule| rule.id().len()).max().unwrap_or(0);
    rules
        .iter()
        .map(|rule| format!("{:<width$}  {}\n", rule.id(), rule.description(), width = width))
        .collect()
}

pub async fn lint(args: LintArgs) -> Result<ExitCode> {
    if args.list_rules {
        emit(&rule_listing())?;
        return Ok(ExitCode::SUCCESS);
    }

    let workspace = env::current_dir()?;
    let config = load_config(&workspace, args.config.as_deref())?;

    let mut disabled = config.lint.disabled_rules.clone();
    for id in &args.disable {
        if !disabled.contains(id) {
            disabled.push(id.clone());
        }
    }
    let engine = RuleEngine::with_settings(&disabled, &config.lint.severity_overrides)?;

    let inputs = if args.paths.is_empty() {
        vec![PathBuf::from(DEFAULT_WORKFLOW_DIR)]
    } else {
        args.paths.clone()
    };
    let paths = collect_paths(&inputs)?;
    tracing::info!(files = paths.len(), "linting documents");

    let reports = check_files(Arc::new(engine), paths).await;
    let format = args.format.unwrap_or(config.report.format);
    emit(&render_findings(&reports, format).map_err(AppError::from)?)?;

    let threshold = args.fail_on.unwrap_or(config.lint.fail_on);
    let counts = SeverityCounts::tally(reports.iter().flat_map(|report| report.findings()));
    tracing::info!(
        fail = counts.fail,
        warn = counts.warn,
        info = counts.info,
        threshold = %threshold,
        "lint finished"
    );

    if lint_failed(&reports, threshold) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Built-in patterns overlaid with every configured pattern directory.
fn build_catalog(config: &ActionsmithConfig, workspace: &Path) -> Result<PatternCatalog> {
    let mut catalog = PatternCatalog::builtin().map_err(AppError::from)?;
    for dir in config.pattern_dirs(workspace) {
        let loaded = catalog.load_dir(&dir)?;
        tracing::debug!(dir = %dir.display(), loaded, "pattern directory loaded");
    }
    Ok(catalog)
}

pub async fn compose(args: ComposeArgs) -> Result<ExitCode> {
    let workspace = env::current_dir()?;
    let config = load_config(&workspace, args.config.as_deref())?;
    let mut catalog = build_catalog(&config, &workspace)?;

    let mut names = args.patterns.clone();
    for file in &args.pattern_files {
        names.push(catalog.load_file(file)?);
    }

    let base = load_workflow(&args.base)?;
    let composer = Composer::new(catalog);
    let composition = composer.compose(&base, &names).map_err(|err| {
        let mut error = AppError::from(err);
        error.add_context("base", &args.base.display().to_string());
        error
    })?;

    let findings = configured_engine(&config)?.evaluate(&composition.workflow);
    let counts = SeverityCounts::tally(&findings);
    tracing::info!(
        patterns = composition.applied.len(),
        jobs = composition.workflow.jobs.len(),
        fail = counts.fail,
        warn = counts.warn,
        "composition finished"
    );

    let rendered = render_composition(&composition, args.format).map_err(AppError::from)?;
    match &args.output {
        Some(path) => {
            fs::write(path, rendered).map_err(|err| {
                let mut error = AppError::from(err);
                error.add_context("path", &path.display().to_string());
                error
            })?;
            tracing::info!(path = %path.display(), "composed workflow written");
        }
        None => emit(&rendered)?,
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn patterns(args: PatternsArgs) -> Result<ExitCode> {
    let workspace = env::current_dir()?;
    let config = load_config(&workspace, args.config.as_deref())?;
    let catalog = build_catalog(&config, &workspace)?;

    let width = catalog
        .iter()
        .map(|pattern| pattern.name.len())
        .max()
        .unwrap_or(0);
    let mut listing = String::new();
    for pattern in catalog.iter() {
        listing.push_str(
            format!("{:<width$}  {}", pattern.name, pattern.description, width = width)
                .trim_end(),
        );
        listing.push('\n');
    }
    emit(&listing)?;
    Ok(ExitCode::SUCCESS)
}

pub async fn graph(args: GraphArgs) -> Result<ExitCode> {
    let workflow = load_workflow(&args.file)?;
    if !args.order {
        emit(&render_dot(&workflow))?;
        return Ok(ExitCode::SUCCESS);
    }

    match JobGraph::from_workflow(&workflow).topological_order() {
        Ok(order) => {
            emit(&order.join("\n"))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(cycle) => {
            let mut error = AppError::from(WorkflowError::CyclicDependency { cycle });
            error.add_context("path", &args.file.display().to_string());
            Err(error.into())
        }
    }
}
