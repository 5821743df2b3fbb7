use actionsmith::core::config::{ConfigLoader, ConfigValidator};
use actionsmith::core::workflow::ReportFormat;
use actionsmith_types::Severity;
use insta::assert_debug_snapshot;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn clear_actionsmith_env() {
    for v in &[
        "ACTIONSMITH_LINT_DISABLED_RULES",
        "ACTIONSMITH_LINT_FAIL_ON",
        "ACTIONSMITH_REPORT_FORMAT",
        "ACTIONSMITH_PATTERN_DIRS",
    ] {
        env::remove_var(v);
    }
}

const FULL_CONFIG: &str = r#"
[lint]
disabled_rules = ["timeout-present"]
fail_on = "warn"

[lint.severity_overrides]
concurrency-guard = "fail"

[compose]
pattern_dirs = [".github/patterns", "/opt/shared/patterns"]

[report]
format = "github"
"#;

/// Test integration of config loading with environment variables
#[test]
#[serial]
fn test_config_loading_integration() {
    clear_actionsmith_env();
    let temp_dir = TempDir::new().unwrap();
    let workspace_path = temp_dir.path();
    fs::write(workspace_path.join("actionsmith.toml"), FULL_CONFIG).unwrap();

    let config = ConfigLoader::load_from_workspace(workspace_path).unwrap();
    ConfigValidator::validate(&config).unwrap();

    assert_debug_snapshot!(config, @r#"
    ActionsmithConfig {
        lint: LintConfig {
            disabled_rules: [
                "timeout-present",
            ],
            fail_on: Warn,
            severity_overrides: {
                "concurrency-guard": Fail,
            },
        },
        compose: ComposeConfig {
            pattern_dirs: [
                ".github/patterns",
                "/opt/shared/patterns",
            ],
        },
        report: ReportConfig {
            format: Github,
        },
    }
    "#);

    let dirs = config.pattern_dirs(workspace_path);
    assert_eq!(dirs[0], workspace_path.join(".github/patterns"));
    assert_eq!(dirs[1], PathBuf::from("/opt/shared/patterns"));
}

#[test]
#[serial]
fn test_env_overrides_take_precedence_over_file() {
    clear_actionsmith_env();
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("actionsmith.toml"), FULL_CONFIG).unwrap();

    env::set_var("ACTIONSMITH_LINT_DISABLED_RULES", "pinned-actions, matrix-size");
    env::set_var("ACTIONSMITH_LINT_FAIL_ON", "info");
    env::set_var("ACTIONSMITH_REPORT_FORMAT", "json");
    let config = ConfigLoader::load_from_workspace(temp_dir.path()).unwrap();
    clear_actionsmith_env();

    assert_eq!(config.lint.disabled_rules, vec!["pinned-actions", "matrix-size"]);
    assert_eq!(config.lint.fail_on, Severity::Info);
    assert_eq!(config.report.format, ReportFormat::Json);
    assert_eq!(
        config.lint.severity_overrides.get("concurrency-guard"),
        Some(&Severity::Fail)
    );
}

#[test]
#[serial]
fn test_invalid_env_values_are_ignored() {
    clear_actionsmith_env();
    let temp_dir = TempDir::new().unwrap();

    env::set_var("ACTIONSMITH_LINT_FAIL_ON", "catastrophic");
    env::set_var("ACTIONSMITH_REPORT_FORMAT", "xml");
    let config = ConfigLoader::load_from_workspace(temp_dir.path()).unwrap();
    clear_actionsmith_env();

    assert_eq!(config.lint.fail_on, Severity::Fail);
    assert_eq!(config.report.format, ReportFormat::Table);
}

#[test]
#[serial]
fn test_explicit_config_path_must_exist() {
    clear_actionsmith_env();
    let temp_dir = TempDir::new().unwrap();
    let err = ConfigLoader::load_from_path(&temp_dir.path().join("missing.toml")).unwrap_err();
    assert_eq!(err.code, "WF-CONFIG-002");
}

#[test]
#[serial]
fn test_unknown_keys_and_rules_are_rejected() {
    clear_actionsmith_env();
    let temp_dir = TempDir::new().unwrap();

    fs::write(
        temp_dir.path().join("actionsmith.toml"),
        "[lint]\nfail_on = \"fail\"\nstrict = true\n",
    )
    .unwrap();
    let err = ConfigLoader::load_from_workspace(temp_dir.path()).unwrap_err();
    assert_eq!(err.code, "WF-CONFIG-002");

    fs::write(
        temp_dir.path().join("actionsmith.toml"),
        "[lint]\ndisabled_rules = [\"no-tabs\"]\n",
    )
    .unwrap();
    let config = ConfigLoader::load_from_workspace(temp_dir.path()).unwrap();
    let err = ConfigValidator::validate(&config).unwrap_err();
    assert_eq!(err.code, "WF-CONFIG-001");
    assert_eq!(err.context.get("rule").map(String::as_str), Some("no-tabs"));
}
