use actionsmith::core::workflow::{
    load_workflow, parse_workflow, to_yaml, EventKind, SourceLocation, WorkflowError,
};
use std::fs;
use tempfile::TempDir;

const RELEASE_WORKFLOW: &str = r#"
name: release
on:
  push:
    tags: ["v*"]
  workflow_dispatch:
    inputs:
      channel:
        type: choice
        options: [stable, beta]
        default: stable
permissions:
  contents: write
concurrency:
  group: release-${{ github.ref }}
  cancel-in-progress: false
jobs:
  build:
    runs-on: ubuntu-latest
    timeout-minutes: 20
    strategy:
      matrix:
        target: [x86_64, aarch64]
        include:
          - target: aarch64
            cross: true
    steps:
      - uses: actions/checkout@b4ffde65f46336ab88eb53be808477a3936bae11
      - name: Build
        run: cargo build --release --target ${{ matrix.target }}
  publish:
    needs: build
    runs-on: ubuntu-latest
    timeout-minutes: 10
    environment:
      name: production
      reviewers: [release-managers]
    steps:
      - run: ./publish.sh
"#;

#[test]
fn test_full_workflow_parses_with_structure_intact() {
    let workflow = parse_workflow(RELEASE_WORKFLOW).unwrap();

    assert_eq!(workflow.name.as_deref(), Some("release"));
    assert_eq!(
        workflow.event_kinds(),
        vec![EventKind::Push, EventKind::WorkflowDispatch]
    );
    assert_eq!(workflow.jobs.ids().collect::<Vec<_>>(), vec!["build", "publish"]);

    let publish = workflow.job("publish").unwrap();
    assert_eq!(publish.needs, vec!["build".to_string()]);
    assert!(publish.environment.as_ref().unwrap().is_protected());

    let matrix = workflow.job("build").unwrap().matrix().unwrap();
    let combinations = matrix.expand();
    assert_eq!(combinations.len(), 2);
    assert_eq!(combinations[1]["cross"], serde_yaml::Value::Bool(true));
}

#[test]
fn test_serialized_workflow_parses_back_to_the_same_model() {
    let workflow = parse_workflow(RELEASE_WORKFLOW).unwrap();
    let yaml = to_yaml(&workflow).unwrap();
    assert_eq!(parse_workflow(&yaml).unwrap(), workflow);
}

#[test]
fn test_duplicate_job_ids_are_rejected() {
    let text = r#"
on: push
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - run: make
  build:
    runs-on: ubuntu-latest
    steps:
      - run: make test
"#;
    let err = parse_workflow(text).unwrap_err();
    assert!(err.to_string().contains("duplicate job id 'build'"));
}

#[test]
fn test_yaml_syntax_errors_carry_a_line_position() {
    let text = "on: push\njobs:\n  build: [unclosed\n";
    match parse_workflow(text).unwrap_err() {
        WorkflowError::MalformedDocument { location, .. } => {
            assert!(matches!(location, SourceLocation::Position { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_structural_errors_carry_a_document_path() {
    let text = r#"
on: push
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - id: compile
        run: make
      - id: compile
        run: make install
"#;
    let err = parse_workflow(text).unwrap_err();
    assert_eq!(
        err.location(),
        Some(&SourceLocation::Path("jobs.build.steps[1]".to_string()))
    );
}

#[test]
fn test_step_with_both_uses_and_run_is_rejected() {
    let text = r#"
on: push
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4
        run: make
"#;
    assert!(matches!(
        parse_workflow(text),
        Err(WorkflowError::MalformedDocument { .. })
    ));
}

#[test]
fn test_unsupported_event_is_rejected() {
    let text = r#"
on: issue_comment
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - run: make
"#;
    let err = parse_workflow(text).unwrap_err();
    assert!(err.to_string().contains("unsupported trigger event 'issue_comment'"));
}

#[test]
fn test_load_workflow_reports_the_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.yml");
    fs::write(&path, "on: push\njobs: {}\n").unwrap();

    let err = load_workflow(&path).unwrap_err();
    assert_eq!(err.code, "WF-PARSE-001");
    assert_eq!(
        err.context.get("path").map(String::as_str),
        Some(path.display().to_string().as_str())
    );
}
