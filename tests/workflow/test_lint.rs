use actionsmith::core::workflow::{parse_workflow, RuleEngine};
use actionsmith_types::{Finding, Severity};
use std::collections::BTreeMap;

fn lint(text: &str) -> Vec<Finding> {
    RuleEngine::new().evaluate(&parse_workflow(text).unwrap())
}

fn with_rule<'a>(findings: &'a [Finding], rule_id: &str) -> Vec<&'a Finding> {
    findings.iter().filter(|f| f.rule_id == rule_id).collect()
}

fn single_step_workflow(uses: &str) -> String {
    format!(
        r#"
on: push
permissions:
  contents: read
concurrency: ci-${{{{ github.ref }}}}
jobs:
  build:
    runs-on: ubuntu-latest
    timeout-minutes: 10
    steps:
      - uses: {uses}
"#
    )
}

#[test]
fn test_missing_permissions_fires_exactly_once_at_workflow_scope() {
    let variants = [
        "on: push\njobs:\n  a:\n    runs-on: ubuntu-latest\n    steps:\n      - run: make\n",
        "on: [push, pull_request]\njobs:\n  a:\n    runs-on: ubuntu-latest\n    steps:\n      - run: make\n  b:\n    runs-on: ubuntu-latest\n    needs: a\n    steps:\n      - run: make test\n",
        "on:\n  schedule:\n    - cron: '0 3 * * *'\njobs:\n  nightly:\n    runs-on: ubuntu-latest\n    timeout-minutes: 30\n    steps:\n      - run: ./nightly.sh\n",
    ];
    for text in variants {
        let findings = lint(text);
        let fired = with_rule(&findings, "explicit-permissions");
        assert_eq!(fired.len(), 1, "{text}");
        assert_eq!(fired[0].severity, Severity::Fail);
        assert_eq!(fired[0].location.to_string(), "workflow");
    }
}

#[test]
fn test_job_level_permissions_satisfy_explicit_permissions() {
    let text = r#"
on: push
jobs:
  build:
    runs-on: ubuntu-latest
    permissions:
      contents: read
    steps:
      - run: make
"#;
    assert!(with_rule(&lint(text), "explicit-permissions").is_empty());
}

#[test]
fn test_sha_pinned_actions_never_fire() {
    let refs = [
        "actions/checkout@b4ffde65f46336ab88eb53be808477a3936bae11",
        "actions/cache/restore@0C45773B623BEA8C8E75F6C82B208C3CF94EA4F9",
        "docker/build-push-action@4a13e500e55cf31b7a5d59a38ab2040ab0f42f56",
    ];
    for uses in refs {
        let findings = lint(&single_step_workflow(uses));
        assert!(with_rule(&findings, "pinned-actions").is_empty(), "{uses}");
    }
}

#[test]
fn test_moving_branch_refs_fail() {
    for git_ref in ["main", "master", "latest"] {
        let uses = format!("actions/checkout@{git_ref}");
        let findings = lint(&single_step_workflow(&uses));
        let fired = with_rule(&findings, "pinned-actions");
        assert_eq!(fired.len(), 1, "{uses}");
        assert_eq!(fired[0].severity, Severity::Fail);
        assert_eq!(fired[0].location.to_string(), "jobs.build.steps[0]");
    }
}

#[test]
fn test_major_tags_warn_and_full_versions_pass() {
    let major = lint(&single_step_workflow("actions/checkout@v4"));
    assert_eq!(with_rule(&major, "pinned-actions")[0].severity, Severity::Warn);

    let full = lint(&single_step_workflow("actions/checkout@v4.1.7"));
    assert!(with_rule(&full, "pinned-actions").is_empty());
}

#[test]
fn test_pull_request_title_in_run_step_fails_at_that_step() {
    let text = r#"
on: pull_request
permissions:
  contents: read
concurrency: pr-${{ github.event.number }}
jobs:
  greet:
    runs-on: ubuntu-latest
    timeout-minutes: 5
    steps:
      - run: echo "starting"
      - run: 'echo "Title: ${{ github.event.pull_request.title }}"'
"#;
    let findings = lint(text);
    let fired = with_rule(&findings, "secret-in-shell-interpolation");
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].severity, Severity::Fail);
    assert_eq!(fired[0].location.to_string(), "jobs.greet.steps[1]");
    assert!(fired[0].message.contains("github.event.pull_request.title"));
}

#[test]
fn test_interpolation_through_env_is_clean() {
    let text = r#"
on: pull_request
permissions:
  contents: read
concurrency: pr-${{ github.event.number }}
jobs:
  greet:
    runs-on: ubuntu-latest
    timeout-minutes: 5
    steps:
      - env:
          TITLE: ${{ github.event.pull_request.title }}
        run: 'echo "Title: $TITLE"'
"#;
    assert!(lint(text).is_empty());
}

fn single_run_workflow(script: &str) -> String {
    let body: String = script
        .lines()
        .map(|line| format!("          {}\n", line))
        .collect();
    format!(
        r#"
on: pull_request
permissions:
  contents: read
concurrency: pr-${{{{ github.event.number }}}}
jobs:
  greet:
    runs-on: ubuntu-latest
    timeout-minutes: 5
    steps:
      - run: |
{body}"#
    )
}

#[test]
fn test_index_notation_and_whole_objects_are_user_controlled() {
    for script in [
        r#"echo "${{ github.event.pull_request['title'] }}""#,
        r#"echo "${{ github.event['pull_request']['title'] }}""#,
        r#"echo "${{ github.event["issue"]["body"] }}""#,
        r#"echo "${{ github.event.Pull_Request.TITLE }}""#,
        r#"echo '${{ toJSON(github.event.pull_request) }}'"#,
        r#"echo '${{ toJSON(github.event) }}'"#,
    ] {
        let findings = lint(&single_run_workflow(script));
        let fired = with_rule(&findings, "secret-in-shell-interpolation");
        assert_eq!(fired.len(), 1, "{}", script);
        assert_eq!(fired[0].severity, Severity::Fail, "{}", script);
        assert_eq!(fired[0].location.to_string(), "jobs.greet.steps[0]");
    }
}

#[test]
fn test_expression_spanning_lines_is_scanned() {
    let findings = lint(&single_run_workflow(
        "echo \"${{\n  github.event.comment.body }}\"",
    ));
    assert_eq!(with_rule(&findings, "secret-in-shell-interpolation").len(), 1);
}

#[test]
fn test_trusted_event_fields_stay_clean() {
    for script in [
        r#"echo "${{ github.event.pull_request.number }}""#,
        r#"echo "${{ github.event_name }}""#,
        r#"echo "${{ github['sha'] }}""#,
    ] {
        assert!(lint(&single_run_workflow(script)).is_empty(), "{}", script);
    }
}

#[test]
fn test_graph_rules_report_dangling_needs_and_cycles() {
    let text = r#"
on: workflow_dispatch
permissions: read-all
jobs:
  a:
    runs-on: ubuntu-latest
    timeout-minutes: 5
    needs: [c]
    steps:
      - run: "true"
  b:
    runs-on: ubuntu-latest
    timeout-minutes: 5
    needs: [a, ghost]
    steps:
      - run: "true"
  c:
    runs-on: ubuntu-latest
    timeout-minutes: 5
    needs: [b]
    steps:
      - run: "true"
"#;
    let findings = lint(text);

    let dangling = with_rule(&findings, "dangling-needs");
    assert_eq!(dangling.len(), 1);
    assert_eq!(dangling[0].location.to_string(), "jobs.b");

    let cycles = with_rule(&findings, "dependency-cycle");
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].location.to_string(), "jobs.a");
    assert!(cycles[0].message.ends_with("a, b, c"));
}

#[test]
fn test_schedule_matrix_and_environment_rules() {
    let text = r#"
on:
  schedule:
    - cron: '0 3 * *'
permissions: write-all
jobs:
  sweep:
    runs-on: ubuntu-latest
    timeout-minutes: 60
    strategy:
      matrix:
        a: [1, 2, 3, 4, 5, 6, 7, 8, 9]
        b: [1, 2, 3, 4, 5, 6, 7, 8, 9]
        c: [1, 2, 3, 4]
    steps:
      - run: ./sweep.sh
  ship:
    runs-on: ubuntu-latest
    timeout-minutes: 10
    environment: production
    steps:
      - run: ./ship.sh
"#;
    let findings = lint(text);
    let ids: Vec<&str> = findings.iter().map(|f| f.rule_id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "schedule-cron",
            "broad-permissions",
            "matrix-size",
            "environment-protection",
        ]
    );
    assert!(findings[2].message.contains("324 combinations"));
}

#[test]
fn test_cache_key_must_hash_a_lockfile() {
    let text = r#"
on: workflow_dispatch
permissions:
  contents: read
jobs:
  build:
    runs-on: ubuntu-latest
    timeout-minutes: 10
    steps:
      - uses: actions/cache@0c45773b623bea8c8e75f6c82b208c3cf94ea4f9
        with:
          path: ~/.npm
          key: npm-${{ runner.os }}
      - uses: actions/cache@0c45773b623bea8c8e75f6c82b208c3cf94ea4f9
        with:
          path: ~/.cargo
          key: cargo-${{ hashFiles('**/Cargo.lock') }}
"#;
    let findings = lint(text);
    let fired = with_rule(&findings, "cache-key-uses-lockfile");
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].location.to_string(), "jobs.build.steps[0]");
}

#[test]
fn test_severity_override_and_disable_together() {
    let workflow =
        parse_workflow("on: push\njobs:\n  a:\n    runs-on: ubuntu-latest\n    steps:\n      - run: make\n")
            .unwrap();
    let overrides = BTreeMap::from([("timeout-present".to_string(), Severity::Info)]);
    let engine =
        RuleEngine::with_settings(&["explicit-permissions".to_string()], &overrides).unwrap();
    let findings = engine.evaluate(&workflow);

    assert!(with_rule(&findings, "explicit-permissions").is_empty());
    assert_eq!(with_rule(&findings, "timeout-present")[0].severity, Severity::Info);
}

#[test]
fn test_unknown_rule_id_is_a_configuration_error() {
    let err = RuleEngine::with_settings(&["no-such-rule".to_string()], &BTreeMap::new())
        .err()
        .unwrap();
    assert_eq!(err.code, "WF-CONFIG-001");
    assert!(err.recovery_suggestions[0].contains("--list-rules"));
}

#[test]
fn test_evaluation_is_deterministic() {
    let text = "on: push\njobs:\n  a:\n    runs-on: ubuntu-latest\n    steps:\n      - uses: actions/checkout@main\n      - run: echo ${{ secrets.TOKEN }}\n";
    assert_eq!(lint(text), lint(text));
}
