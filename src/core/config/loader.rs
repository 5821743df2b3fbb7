#![allow(clippy::result_large_err)]

use super::ActionsmithConfig;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const CONFIG_FILE_NAME: &str = "actionsmith.toml";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config from workspace root (workspace/actionsmith.toml)
    /// Environment variables override config file values
    pub fn load_from_workspace(workspace_path: &Path) -> Result<ActionsmithConfig, AppError> {
        let config_path = workspace_path.join(CONFIG_FILE_NAME);
        let mut config = Self::load_from_file(&config_path)?.unwrap_or_default();
        Self::apply_env_overrides(&mut config);
        Ok(config)
    }

    /// Load an explicitly named config file; unlike the workspace file it must exist
    pub fn load_from_path(path: &Path) -> Result<ActionsmithConfig, AppError> {
        let mut config = Self::load_from_file(path)?.ok_or_else(|| {
            let mut error = AppError::new(
                ErrorCategory::ConfigurationError,
                format!("config file {} does not exist", path.display()),
            )
            .with_code("WF-CONFIG-002");
            error.add_context("path", &path.display().to_string());
            error
        })?;
        Self::apply_env_overrides(&mut config);
        Ok(config)
    }

    /// Load config from specific file path
    /// Returns Ok(None) if file doesn't exist
    pub fn load_from_file(path: &Path) -> Result<Option<ActionsmithConfig>, AppError> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::new(
                ErrorCategory::IoError,
                format!("Failed to read config file {}: {}", path.display(), e),
            )
        })?;

        let config: ActionsmithConfig = toml::from_str(&content).map_err(|e| {
            AppError::new(
                ErrorCategory::ConfigurationError,
                format!("Failed to parse config file {}: {}", path.display(), e),
            )
            .with_code("WF-CONFIG-002")
        })?;

        debug!(path = %path.display(), "loaded config file");
        Ok(Some(config))
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(config: &mut ActionsmithConfig) {
        if let Ok(disabled) = env::var("ACTIONSMITH_LINT_DISABLED_RULES") {
            config.lint.disabled_rules = disabled
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(ToOwned::to_owned)
                .collect();
        }

        if let Ok(fail_on) = env::var("ACTIONSMITH_LINT_FAIL_ON") {
            match fail_on.parse() {
                Ok(severity) => config.lint.fail_on = severity,
                Err(err) => warn!(error = %err, "ignoring ACTIONSMITH_LINT_FAIL_ON"),
            }
        }

        if let Ok(format) = env::var("ACTIONSMITH_REPORT_FORMAT") {
            match format.parse() {
                Ok(format) => config.report.format = format,
                Err(err) => warn!(error = %err, "ignoring ACTIONSMITH_REPORT_FORMAT"),
            }
        }

        if let Some(dirs) = env::var_os("ACTIONSMITH_PATTERN_DIRS") {
            config.compose.pattern_dirs = env::split_paths(&dirs)
                .filter(|dir| !dir.as_os_str().is_empty())
                .collect::<Vec<PathBuf>>();
        }
    }

    /// Get documentation for supported environment variables
    pub fn env_var_documentation() -> &'static [&'static str] {
        &[
            "ACTIONSMITH_LINT_DISABLED_RULES - Comma-separated rule ids to disable",
            "ACTIONSMITH_LINT_FAIL_ON - Lowest severity that fails `lint` (fail/warn/info, default: fail)",
            "ACTIONSMITH_REPORT_FORMAT - Findings format (table/json/github, default: table)",
            "ACTIONSMITH_PATTERN_DIRS - Pattern directories, separated like PATH",
        ]
    }
}
