use crate::core::workflow::report::ReportFormat;
use actionsmith_types::Severity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Main configuration loaded from actionsmith.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionsmithConfig {
    #[serde(default)]
    pub lint: LintConfig,

    #[serde(default)]
    pub compose: ComposeConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

/// Rule selection and failure threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LintConfig {
    /// Rule ids that never run
    #[serde(default)]
    pub disabled_rules: Vec<String>,

    /// Lowest severity that makes `lint` exit non-zero
    #[serde(default = "default_fail_on")]
    pub fail_on: Severity,

    /// Replacement severities keyed by rule id
    #[serde(default)]
    pub severity_overrides: BTreeMap<String, Severity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComposeConfig {
    /// Directories holding user pattern files
    #[serde(default)]
    pub pattern_dirs: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    #[serde(default)]
    pub format: ReportFormat,
}

fn default_fail_on() -> Severity {
    Severity::Fail
}

impl Default for LintConfig {
    fn default() -> Self {
        LintConfig {
            disabled_rules: Vec::new(),
            fail_on: default_fail_on(),
            severity_overrides: BTreeMap::new(),
        }
    }
}

impl ActionsmithConfig {
    /// Pattern directories with relative entries resolved against `workspace`.
    pub fn pattern_dirs(&self, workspace: &Path) -> Vec<PathBuf> {
        self.compose
            .pattern_dirs
            .iter()
            .map(|dir| {
                if dir.is_absolute() {
                    dir.clone()
                } else {
                    workspace.join(dir)
                }
            })
            .collect()
    }
}


pub mod loader;
pub mod validation;

pub use loader::ConfigLoader;
pub use validation::ConfigValidator;
