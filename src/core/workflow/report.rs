//! Text renderers for findings, compositions and job graphs.

use crate::core::types::DocumentKind;
use crate::core::workflow::batch::FileReport;
use crate::core::workflow::compose::{AppliedPattern, Composition};
use crate::core::workflow::error::WorkflowError;
use crate::core::workflow::graph::JobGraph;
use crate::core::workflow::model::Workflow;
use crate::core::workflow::parse::to_yaml;
use actionsmith_types::{Finding, Severity, SeverityCounts};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Aligned table for terminals
    #[default]
    Table,
    /// Structured document for tooling
    Json,
    /// GitHub workflow-command annotations
    Github,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "table" => Ok(ReportFormat::Table),
            "json" => Ok(ReportFormat::Json),
            "github" => Ok(ReportFormat::Github),
            other => Err(format!(
                "invalid report format '{}'; supported values are table, json, github",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CompositionFormat {
    /// The composed workflow document
    #[default]
    Yaml,
    /// Workflow, applied-pattern summary and digest
    Json,
}

pub fn render_findings(reports: &[FileReport], format: ReportFormat) -> Result<String, WorkflowError> {
    match format {
        ReportFormat::Table => Ok(render_table(reports)),
        ReportFormat::Json => render_json(reports),
        ReportFormat::Github => Ok(render_annotations(reports)),
    }
}

fn render_table(reports: &[FileReport]) -> String {
    let mut out = String::new();
    let mut counts = SeverityCounts::default();
    let mut parse_errors = 0;

    for (index, report) in reports.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "{}", report.path.display());
        match &report.outcome {
            Err(message) => {
                parse_errors += 1;
                let _ = writeln!(out, "  error: {}", message);
            }
            Ok(findings) if findings.is_empty() => {
                let _ = writeln!(out, "  ok");
            }
            Ok(findings) => {
                counts = add_counts(counts, findings);
                write_rows(&mut out, findings);
            }
        }
    }

    if !reports.is_empty() {
        out.push('\n');
    }
    let _ = writeln!(
        out,
        "{} {} checked: {} fail, {} warn, {} info, {} parse {}",
        reports.len(),
        if reports.len() == 1 { "file" } else { "files" },
        counts.fail,
        counts.warn,
        counts.info,
        parse_errors,
        if parse_errors == 1 { "error" } else { "errors" }
    );
    out
}

fn write_rows(out: &mut String, findings: &[Finding]) {
    let headers = ["SEVERITY", "RULE", "LOCATION"];
    let rows: Vec<[String; 4]> = findings
        .iter()
        .map(|f| {
            [
                f.severity.to_string(),
                f.rule_id.clone(),
                f.location.to_string(),
                f.message.clone(),
            ]
        })
        .collect();
    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.len());
        }
    }

    let _ = writeln!(
        out,
        "  {:<w0$}  {:<w1$}  {:<w2$}  MESSAGE",
        headers[0],
        headers[1],
        headers[2],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2]
    );
    for row in &rows {
        let _ = writeln!(
            out,
            "  {:<w0$}  {:<w1$}  {:<w2$}  {}",
            row[0],
            row[1],
            row[2],
            row[3],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2]
        );
    }
}

fn add_counts(mut counts: SeverityCounts, findings: &[Finding]) -> SeverityCounts {
    for finding in findings {
        counts.add(finding.severity);
    }
    counts
}

#[derive(Serialize)]
struct JsonReport<'a> {
    files: Vec<JsonFile<'a>>,
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonFile<'a> {
    path: String,
    kind: DocumentKind,
    findings: &'a [Finding],
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

#[derive(Serialize)]
struct JsonSummary {
    files: usize,
    fail: usize,
    warn: usize,
    info: usize,
    parse_errors: usize,
}

fn render_json(reports: &[FileReport]) -> Result<String, WorkflowError> {
    let counts = SeverityCounts::tally(reports.iter().flat_map(|r| r.findings()));
    let document = JsonReport {
        files: reports
            .iter()
            .map(|report| JsonFile {
                path: report.path.display().to_string(),
                kind: report.kind,
                findings: report.findings(),
                error: report.error(),
            })
            .collect(),
        summary: JsonSummary {
            files: reports.len(),
            fail: counts.fail,
            warn: counts.warn,
            info: counts.info,
            parse_errors: reports.iter().filter(|r| r.error().is_some()).count(),
        },
    };
    serde_json::to_string_pretty(&document)
        .map(|mut text| {
            text.push('\n');
            text
        })
        .map_err(|err| WorkflowError::Serialization(err.to_string()))
}

fn render_annotations(reports: &[FileReport]) -> String {
    let mut out = String::new();
    for report in reports {
        let file = escape_property(&report.path.display().to_string());
        match &report.outcome {
            Err(message) => {
                let _ = writeln!(
                    out,
                    "::error file={},title=parse-error::{}",
                    file,
                    escape_data(message)
                );
            }
            Ok(findings) => {
                for finding in findings {
                    let level = match finding.severity {
                        Severity::Fail => "error",
                        Severity::Warn => "warning",
                        Severity::Info => "notice",
                    };
                    let _ = writeln!(
                        out,
                        "::{} file={},title={}::{}: {}",
                        level,
                        file,
                        escape_property(&finding.rule_id),
                        escape_data(&finding.location.to_string()),
                        escape_data(&finding.message)
                    );
                }
            }
        }
    }
    out
}

fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}

#[derive(Serialize)]
struct JsonComposition<'a> {
    workflow: &'a Workflow,
    applied: &'a [AppliedPattern],
    sha256: String,
}

pub fn render_composition(
    composition: &Composition,
    format: CompositionFormat,
) -> Result<String, WorkflowError> {
    let yaml = to_yaml(&composition.workflow)?;
    match format {
        CompositionFormat::Yaml => Ok(yaml),
        CompositionFormat::Json => {
            let document = JsonComposition {
                workflow: &composition.workflow,
                applied: &composition.applied,
                sha256: hex::encode(Sha256::digest(yaml.as_bytes())),
            };
            serde_json::to_string_pretty(&document)
                .map(|mut text| {
                    text.push('\n');
                    text
                })
                .map_err(|err| WorkflowError::Serialization(err.to_string()))
        }
    }
}

/// Graphviz DOT of the job dependency graph.
pub fn render_dot(workflow: &Workflow) -> String {
    JobGraph::from_workflow(workflow).to_dot()
}
