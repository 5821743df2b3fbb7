use std::env;

/// Where the process is running, which decides console defaults.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionContext {
    /// A developer's terminal.
    Interactive,
    /// A CI runner such as GitHub Actions.
    Ci,
}

impl ExecutionContext {
    /// Colored output is only used on an interactive terminal.
    pub fn allows_ansi(self) -> bool {
        matches!(self, ExecutionContext::Interactive)
    }
}

/// Detect CI from the variables runners conventionally export.
pub fn detect_context() -> ExecutionContext {
    if flag_set("GITHUB_ACTIONS") || flag_set("CI") {
        ExecutionContext::Ci
    } else {
        ExecutionContext::Interactive
    }
}

fn flag_set(name: &str) -> bool {
    env::var(name)
        .map(|value| {
            let value = value.trim().to_lowercase();
            !value.is_empty() && value != "0" && value != "false"
        })
        .unwrap_or(false)
}
