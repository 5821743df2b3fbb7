use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CLEAN: &str = r#"
name: ci
on: [push, pull_request]
permissions:
  contents: read
concurrency:
  group: ci-${{ github.ref }}
  cancel-in-progress: true
jobs:
  build:
    runs-on: ubuntu-latest
    timeout-minutes: 15
    steps:
      - uses: actions/checkout@b4ffde65f46336ab88eb53be808477a3936bae11
      - run: npm ci
  deploy:
    runs-on: ubuntu-latest
    needs: build
    timeout-minutes: 20
    steps:
      - run: ./scripts/deploy.sh
"#;

const MAJOR_TAG: &str = r#"
on: workflow_dispatch
permissions:
  contents: read
jobs:
  build:
    runs-on: ubuntu-latest
    timeout-minutes: 15
    steps:
      - uses: actions/checkout@v4
"#;

const UNPINNED: &str = r#"
on: workflow_dispatch
permissions:
  contents: read
jobs:
  build:
    runs-on: ubuntu-latest
    timeout-minutes: 15
    steps:
      - uses: actions/checkout@main
"#;

fn actionsmith(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("actionsmith"));
    cmd.current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("OTEL_EXPORTER_OTLP_ENDPOINT")
        .env_remove("ACTIONSMITH_LINT_DISABLED_RULES")
        .env_remove("ACTIONSMITH_LINT_FAIL_ON")
        .env_remove("ACTIONSMITH_REPORT_FORMAT")
        .env_remove("ACTIONSMITH_PATTERN_DIRS");
    cmd
}

fn workspace_with(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    let workflows = dir.path().join(".github").join("workflows");
    fs::create_dir_all(&workflows).unwrap();
    for (name, content) in files {
        fs::write(workflows.join(name), content).unwrap();
    }
    dir
}

#[test]
fn test_help_lists_workflow_commands() {
    let dir = TempDir::new().unwrap();
    actionsmith(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("WORKFLOW COMMANDS"))
        .stdout(predicate::str::contains("lint"))
        .stdout(predicate::str::contains("compose"))
        .stdout(predicate::str::contains("patterns"))
        .stdout(predicate::str::contains("graph"));
}

#[test]
fn test_version_flag() {
    let dir = TempDir::new().unwrap();
    actionsmith(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(actionsmith::VERSION));
}

#[test]
fn test_lint_defaults_to_github_workflows() {
    let dir = workspace_with(&[("ci.yml", CLEAN)]);
    actionsmith(dir.path())
        .arg("lint")
        .assert()
        .success()
        .stdout(predicate::str::contains(".github/workflows/ci.yml\n  ok\n"))
        .stdout(predicate::str::contains(
            "1 file checked: 0 fail, 0 warn, 0 info, 0 parse errors",
        ));
}

#[test]
fn test_lint_exits_non_zero_on_fail_findings() {
    let dir = workspace_with(&[("ci.yml", CLEAN), ("release.yml", UNPINNED)]);
    actionsmith(dir.path())
        .args(["--quiet", "lint"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("pinned-actions"))
        .stdout(predicate::str::contains("jobs.build.steps[0]"));
}

#[test]
fn test_fail_on_threshold_controls_exit_code() {
    let dir = workspace_with(&[("ci.yml", MAJOR_TAG)]);
    actionsmith(dir.path()).arg("lint").assert().success();
    actionsmith(dir.path())
        .args(["lint", "--fail-on", "warn"])
        .assert()
        .code(1);
}

#[test]
fn test_disable_flag_skips_rules() {
    let dir = workspace_with(&[("ci.yml", UNPINNED)]);
    actionsmith(dir.path())
        .args(["lint", "--disable", "pinned-actions"])
        .assert()
        .success();
}

#[test]
fn test_unknown_rule_is_reported_with_code() {
    let dir = workspace_with(&[("ci.yml", CLEAN)]);
    actionsmith(dir.path())
        .args(["lint", "--disable", "no-such-rule"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("WF-CONFIG-001"))
        .stderr(predicate::str::contains("--list-rules"));
}

#[test]
fn test_config_file_drives_lint() {
    let dir = workspace_with(&[("ci.yml", MAJOR_TAG)]);
    fs::write(
        dir.path().join("actionsmith.toml"),
        "[lint]\nfail_on = \"warn\"\n\n[report]\nformat = \"github\"\n",
    )
    .unwrap();
    actionsmith(dir.path())
        .arg("lint")
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with(
            "::warning file=.github/workflows/ci.yml,title=pinned-actions::",
        ));
}

#[test]
fn test_lint_json_output() {
    let dir = workspace_with(&[("ci.yml", UNPINNED), ("broken.yml", "on: push\njobs: [\n")]);
    let output = actionsmith(dir.path())
        .args(["--quiet", "lint", "--format", "json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let document: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(document["summary"]["files"], 2);
    assert_eq!(document["summary"]["parse_errors"], 1);
    assert_eq!(document["files"][0]["path"], ".github/workflows/broken.yml");
    assert_eq!(document["files"][1]["findings"][0]["rule_id"], "pinned-actions");
}

#[test]
fn test_lint_missing_path() {
    let dir = TempDir::new().unwrap();
    actionsmith(dir.path())
        .args(["lint", "nowhere.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("WF-IO-001"));
}

#[test]
fn test_list_rules() {
    let dir = TempDir::new().unwrap();
    let assert = actionsmith(dir.path())
        .args(["lint", "--list-rules"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert_eq!(stdout.lines().count(), 12);
    assert!(stdout.starts_with("explicit-permissions"));
}

#[test]
fn test_compose_prints_merged_workflow() {
    let dir = workspace_with(&[("ci.yml", CLEAN)]);
    actionsmith(dir.path())
        .args([
            "compose",
            ".github/workflows/ci.yml",
            "--pattern",
            "matrix-test,dependency-cache",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("test-18:"))
        .stdout(predicate::str::contains("test-22:"))
        .stdout(predicate::str::contains("actions/cache@"));
}

#[test]
fn test_compose_output_file_lints_clean() {
    let dir = workspace_with(&[("ci.yml", CLEAN)]);
    actionsmith(dir.path())
        .args([
            "compose",
            ".github/workflows/ci.yml",
            "--pattern",
            "matrix-test",
            "--output",
            "composed.yml",
        ])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    actionsmith(dir.path())
        .args(["lint", "composed.yml"])
        .assert()
        .success();
}

#[test]
fn test_compose_with_pattern_file() {
    let dir = workspace_with(&[("ci.yml", CLEAN)]);
    fs::write(
        dir.path().join("smoke.yml"),
        "pattern: smoke\njobs:\n  smoke:\n    runs-on: ubuntu-latest\n    needs: deploy\n    timeout-minutes: 5\n    steps:\n      - run: ./smoke.sh\n",
    )
    .unwrap();
    actionsmith(dir.path())
        .args([
            "compose",
            ".github/workflows/ci.yml",
            "--pattern-file",
            "smoke.yml",
            "--format",
            "json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"added_jobs\""))
        .stdout(predicate::str::contains("\"smoke\""))
        .stdout(predicate::str::contains("\"sha256\""));
}

#[test]
fn test_compose_unknown_pattern() {
    let dir = workspace_with(&[("ci.yml", CLEAN)]);
    actionsmith(dir.path())
        .args(["compose", ".github/workflows/ci.yml", "--pattern", "canary"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("WF-PATTERN-001"));
}

#[test]
fn test_patterns_include_user_directory() {
    let dir = TempDir::new().unwrap();
    let patterns = dir.path().join("patterns");
    fs::create_dir_all(&patterns).unwrap();
    fs::write(
        patterns.join("lint.yml"),
        "pattern: lint-job\ndescription: Run the linter\njobs:\n  lint:\n    runs-on: ubuntu-latest\n    steps:\n      - run: npm run lint\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("actionsmith.toml"),
        "[compose]\npattern_dirs = [\"patterns\"]\n",
    )
    .unwrap();

    actionsmith(dir.path())
        .arg("patterns")
        .assert()
        .success()
        .stdout(predicate::str::contains("lint-job"))
        .stdout(predicate::str::contains("Run the linter"))
        .stdout(predicate::str::contains("matrix-test"));
}

#[test]
fn test_graph_order_and_dot() {
    let dir = workspace_with(&[("ci.yml", CLEAN)]);
    actionsmith(dir.path())
        .args(["graph", ".github/workflows/ci.yml", "--order"])
        .assert()
        .success()
        .stdout("build\ndeploy\n");
    actionsmith(dir.path())
        .args(["graph", ".github/workflows/ci.yml"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("digraph"));
}
