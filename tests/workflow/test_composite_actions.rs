use actionsmith::core::workflow::{load_action, parse_action, RuleEngine, WorkflowError};
use std::fs;
use tempfile::TempDir;

const SETUP_ACTION: &str = r#"
name: setup-toolchain
description: Install the toolchain and restore caches
inputs:
  version:
    description: Toolchain version
    required: true
runs:
  using: composite
  steps:
    - uses: actions/cache@v4
      with:
        path: ~/.cache/toolchain
        key: toolchain-${{ inputs.version }}
    - run: ./install.sh "${{ github.head_ref }}"
      shell: bash
"#;

#[test]
fn test_composite_steps_go_through_step_rules() {
    let action = parse_action(SETUP_ACTION).unwrap();
    assert!(action.is_composite());

    let findings = RuleEngine::new().evaluate_action(&action);
    let summary: Vec<(String, String)> = findings
        .iter()
        .map(|f| (f.rule_id.clone(), f.location.to_string()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("cache-key-uses-lockfile".to_string(), "runs.steps[0]".to_string()),
            ("pinned-actions".to_string(), "runs.steps[0]".to_string()),
            (
                "secret-in-shell-interpolation".to_string(),
                "runs.steps[1]".to_string()
            ),
        ]
    );
}

#[test]
fn test_run_step_without_shell_is_rejected() {
    let text = r#"
name: broken
runs:
  using: composite
  steps:
    - run: echo hi
"#;
    let err = parse_action(text).unwrap_err();
    assert_eq!(
        err,
        WorkflowError::malformed(
            "runs.steps[0]",
            "run steps in a composite action must declare `shell`"
        )
    );
}

#[test]
fn test_node_and_docker_actions_have_no_steps_to_lint() {
    let node = parse_action("name: js\nruns:\n  using: node20\n  main: dist/index.js\n").unwrap();
    let docker =
        parse_action("name: img\nruns:\n  using: docker\n  image: Dockerfile\n  args: [--fast]\n")
            .unwrap();
    let engine = RuleEngine::new();
    assert!(engine.evaluate_action(&node).is_empty());
    assert!(engine.evaluate_action(&docker).is_empty());
}

#[test]
fn test_unknown_runner_kind_is_malformed() {
    let err = parse_action("name: old\nruns:\n  using: node12\n  main: index.js\n").unwrap_err();
    assert!(matches!(err, WorkflowError::MalformedDocument { .. }));
}

#[test]
fn test_load_action_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("action.yml");
    fs::write(&path, SETUP_ACTION).unwrap();
    let action = load_action(&path).unwrap();
    assert_eq!(action.name, "setup-toolchain");
    assert_eq!(action.steps().len(), 2);
}
