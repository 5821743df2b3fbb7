use actionsmith::core::types::DocumentKind;
use actionsmith::core::workflow::{check_files, collect_paths, RuleEngine};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

const CLEAN: &str = r#"
on: workflow_dispatch
permissions:
  contents: read
jobs:
  build:
    runs-on: ubuntu-latest
    timeout-minutes: 10
    steps:
      - run: make
"#;

const UNPINNED: &str = r#"
on: workflow_dispatch
permissions:
  contents: read
jobs:
  build:
    runs-on: ubuntu-latest
    timeout-minutes: 10
    steps:
      - uses: actions/checkout@master
"#;

const ACTION: &str = r#"
name: greet
runs:
  using: composite
  steps:
    - run: echo hello
      shell: bash
"#;

fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("release.yml"), UNPINNED).unwrap();
    fs::write(dir.path().join("ci.yaml"), CLEAN).unwrap();
    fs::write(dir.path().join("broken.yml"), "on: push\njobs: [\n").unwrap();
    fs::write(dir.path().join("action.yml"), ACTION).unwrap();
    fs::write(dir.path().join("README.md"), "# workflows\n").unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    fs::write(dir.path().join("nested").join("skip.yml"), CLEAN).unwrap();
    dir
}

fn file_names(paths: &[std::path::PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[tokio::test]
async fn test_directory_batch_reports_every_file_in_path_order() {
    let dir = workspace();
    let paths = collect_paths(&[dir.path().to_path_buf()]).unwrap();
    assert_eq!(
        file_names(&paths),
        vec!["action.yml", "broken.yml", "ci.yaml", "release.yml"]
    );

    let reports = check_files(Arc::new(RuleEngine::new()), paths).await;
    let names: Vec<String> = file_names(
        &reports
            .iter()
            .map(|r| r.path.clone())
            .collect::<Vec<_>>(),
    );
    assert_eq!(names, vec!["action.yml", "broken.yml", "ci.yaml", "release.yml"]);

    assert_eq!(reports[0].kind, DocumentKind::Action);
    assert!(reports[0].findings().is_empty());

    assert!(reports[1].error().is_some());
    assert!(reports[2].findings().is_empty());

    let release = reports[3].findings();
    assert_eq!(release.len(), 1);
    assert_eq!(release[0].rule_id, "pinned-actions");
}

#[tokio::test]
async fn test_one_broken_file_does_not_hide_the_others() {
    let dir = workspace();
    let paths = vec![dir.path().join("broken.yml"), dir.path().join("release.yml")];
    let reports = check_files(Arc::new(RuleEngine::new()), paths).await;
    assert_eq!(reports.len(), 2);
    assert!(reports[0].error().unwrap().contains("malformed document"));
    assert_eq!(reports[1].findings().len(), 1);
}

#[tokio::test]
async fn test_empty_input_yields_no_reports() {
    let reports = check_files(Arc::new(RuleEngine::new()), Vec::new()).await;
    assert!(reports.is_empty());
}

#[test]
fn test_files_given_twice_are_checked_once() {
    let dir = workspace();
    let file = dir.path().join("ci.yaml");
    let paths = collect_paths(&[file.clone(), dir.path().to_path_buf()]).unwrap();
    assert_eq!(paths.iter().filter(|p| **p == file).count(), 1);
}
