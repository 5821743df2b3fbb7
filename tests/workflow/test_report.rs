use actionsmith::core::types::DocumentKind;
use actionsmith::core::workflow::{
    parse_workflow, render_composition, render_dot, render_findings, Composer, CompositionFormat,
    FileReport, ReportFormat, RuleEngine,
};
use insta::assert_snapshot;
use std::path::PathBuf;

const UNGUARDED: &str = r#"
on: push
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@main
      - run: make
"#;

fn reports() -> Vec<FileReport> {
    let findings = RuleEngine::new().evaluate(&parse_workflow(UNGUARDED).unwrap());
    vec![
        FileReport {
            path: PathBuf::from(".github/workflows/ci.yml"),
            kind: DocumentKind::Workflow,
            outcome: Ok(findings),
        },
        FileReport {
            path: PathBuf::from(".github/workflows/nightly.yml"),
            kind: DocumentKind::Workflow,
            outcome: Err("malformed document at jobs: workflow must define at least one job".to_string()),
        },
    ]
}

#[test]
fn test_github_annotations() {
    let output = render_findings(&reports(), ReportFormat::Github).unwrap();
    assert_snapshot!(output, @r"
    ::error file=.github/workflows/ci.yml,title=explicit-permissions::workflow: no permissions block is declared; the token falls back to repository defaults
    ::warning file=.github/workflows/ci.yml,title=concurrency-guard::workflow: workflow runs on push or pull_request without a concurrency group
    ::warning file=.github/workflows/ci.yml,title=timeout-present::jobs.build: job 'build' has no timeout-minutes and may run for up to 6 hours
    ::error file=.github/workflows/ci.yml,title=pinned-actions::jobs.build.steps[0]: `actions/checkout` is pinned to the moving ref `main`
    ::error file=.github/workflows/nightly.yml,title=parse-error::malformed document at jobs: workflow must define at least one job
    ");
}

#[test]
fn test_json_report_structure() {
    let output = render_findings(&reports(), ReportFormat::Json).unwrap();
    let document: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(document["summary"]["files"], 2);
    assert_eq!(document["summary"]["fail"], 2);
    assert_eq!(document["summary"]["warn"], 2);
    assert_eq!(document["summary"]["parse_errors"], 1);

    let first = &document["files"][0];
    assert_eq!(first["kind"], "workflow");
    assert_eq!(first["findings"][3]["rule_id"], "pinned-actions");
    assert_eq!(first["findings"][3]["severity"], "fail");
    assert_eq!(first["findings"][3]["location"]["job"], "build");
    assert_eq!(first["findings"][3]["location"]["step"], 0);
    assert!(first.get("error").is_none());

    let second = &document["files"][1];
    assert_eq!(second["findings"].as_array().unwrap().len(), 0);
    assert!(second["error"].as_str().unwrap().contains("at least one job"));
}

#[test]
fn test_table_summary_line() {
    let output = render_findings(&reports(), ReportFormat::Table).unwrap();
    assert!(output.contains("  error: malformed document at jobs"));
    assert!(output.ends_with("2 files checked: 2 fail, 2 warn, 0 info, 1 parse error\n"));
}

#[test]
fn test_json_composition_carries_summary_and_digest() {
    let base = parse_workflow(UNGUARDED).unwrap();
    let composition = Composer::with_builtins()
        .unwrap()
        .compose(&base, &["security-scan"])
        .unwrap();
    let output = render_composition(&composition, CompositionFormat::Json).unwrap();
    let document: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(document["applied"][0]["name"], "security-scan");
    assert_eq!(document["applied"][0]["added_jobs"][0], "dependency-review");
    assert_eq!(document["sha256"].as_str().unwrap().len(), 64);
    assert!(document["workflow"]["jobs"]["dependency-review"].is_object());
}

#[test]
fn test_dot_output_draws_needs_edges() {
    let workflow = parse_workflow(
        "on: push\njobs:\n  build:\n    runs-on: ubuntu-latest\n    steps:\n      - run: make\n  test:\n    runs-on: ubuntu-latest\n    needs: build\n    steps:\n      - run: make test\n",
    )
    .unwrap();
    let dot = render_dot(&workflow);
    assert!(dot.starts_with("digraph {"));
    assert!(dot.contains("\"build\""));
    assert!(dot.contains("0 -> 1"));
}
