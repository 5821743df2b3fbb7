use crate::core::error::AppError;
use crate::core::types::{DocumentKind, ErrorCategory};
use crate::core::workflow::action::parse_action;
use crate::core::workflow::compose::pattern::is_yaml;
use crate::core::workflow::lint::RuleEngine;
use crate::core::workflow::parse::parse_workflow;
use actionsmith_types::Finding;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Lint result for one file: findings, or the message of the error that stopped it.
#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    pub path: PathBuf,
    pub kind: DocumentKind,
    pub outcome: Result<Vec<Finding>, String>,
}

impl FileReport {
    pub fn findings(&self) -> &[Finding] {
        match &self.outcome {
            Ok(findings) => findings,
            Err(_) => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.outcome.as_ref().err().map(String::as_str)
    }
}

/// Expand the given paths into document files. Directories contribute their
/// `*.yml` / `*.yaml` entries (not recursively); files are taken as given.
pub fn collect_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, AppError> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found = Vec::new();
            for entry in std::fs::read_dir(input)? {
                let path = entry?.path();
                if path.is_file() && is_yaml(&path) {
                    found.push(path);
                }
            }
            if found.is_empty() {
                warn!(dir = %input.display(), "no workflow files found");
            }
            files.extend(found);
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            let mut error = AppError::new(
                ErrorCategory::IoError,
                format!("path not found: {}", input.display()),
            )
            .with_code("WF-IO-001")
            .with_suggestion("pass a workflow file or a directory such as .github/workflows");
            error.add_context("path", &input.display().to_string());
            return Err(error);
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Parse and lint a single file.
pub fn check_file(engine: &RuleEngine, path: &Path) -> FileReport {
    let kind = DocumentKind::detect(path);
    let outcome = match std::fs::read_to_string(path) {
        Ok(text) => match kind {
            DocumentKind::Workflow => parse_workflow(&text)
                .map(|workflow| engine.evaluate(&workflow))
                .map_err(|err| err.to_string()),
            DocumentKind::Action => parse_action(&text)
                .map(|action| engine.evaluate_action(&action))
                .map_err(|err| err.to_string()),
        },
        Err(err) => Err(format!("failed to read file: {}", err)),
    };
    match &outcome {
        Ok(findings) => debug!(path = %path.display(), findings = findings.len(), "file checked"),
        Err(message) => warn!(path = %path.display(), error = %message, "file rejected"),
    }
    FileReport {
        path: path.to_path_buf(),
        kind,
        outcome,
    }
}

/// Check files in parallel on the blocking pool. Results are sorted by path.
pub async fn check_files(engine: Arc<RuleEngine>, paths: Vec<PathBuf>) -> Vec<FileReport> {
    let handles: Vec<(PathBuf, JoinHandle<FileReport>)> = paths
        .into_iter()
        .map(|path| {
            let engine = Arc::clone(&engine);
            let task_path = path.clone();
            let handle = tokio::task::spawn_blocking(move || check_file(&engine, &task_path));
            (path, handle)
        })
        .collect();

    let mut reports = Vec::with_capacity(handles.len());
    for (path, handle) in handles {
        let report = match handle.await {
            Ok(report) => report,
            Err(err) => FileReport {
                kind: DocumentKind::detect(&path),
                path,
                outcome: Err(format!("lint task failed: {}", err)),
            },
        };
        reports.push(report);
    }
    reports.sort_by(|a, b| a.path.cmp(&b.path));
    info!(files = reports.len(), "batch complete");
    reports
}
