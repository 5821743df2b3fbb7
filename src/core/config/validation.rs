#![allow(clippy::result_large_err)]

use super::ActionsmithConfig;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use crate::core::workflow::lint::known_rule_ids;

pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration rules
    pub fn validate(config: &ActionsmithConfig) -> Result<(), AppError> {
        let known = known_rule_ids();

        for id in config
            .lint
            .disabled_rules
            .iter()
            .chain(config.lint.severity_overrides.keys())
        {
            if !known.contains(&id.as_str()) {
                let mut error = AppError::new(
                    ErrorCategory::ConfigurationError,
                    format!("unknown rule id '{}' in lint configuration", id),
                )
                .with_code("WF-CONFIG-001")
                .with_suggestion(format!("known rules: {}", known.join(", ")));
                error.add_context("rule", id);
                return Err(error);
            }
        }

        if config
            .compose
            .pattern_dirs
            .iter()
            .any(|dir| dir.as_os_str().is_empty())
        {
            return Err(AppError::new(
                ErrorCategory::ConfigurationError,
                "compose.pattern_dirs cannot contain empty entries",
            )
            .with_code("WF-CONFIG-001"));
        }

        Ok(())
    }
}
