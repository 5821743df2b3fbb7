use serde::{Deserialize, Serialize};

/// Error category enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    ValidationError,
    CompositionError,
    ConfigurationError,
    SerializationError,
    IoError,
    InternalError,
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Error severity enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Error,
    Warning,
    Info,
    Debug,
}

/// Kind of document recognised on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Workflow,
    Action,
}

impl DocumentKind {
    /// Composite action manifests are recognised by their conventional file name.
    pub fn detect(path: &std::path::Path) -> Self {
        match path.file_name().and_then(|name| name.to_str()) {
            Some("action.yml") | Some("action.yaml") => DocumentKind::Action,
            _ => DocumentKind::Workflow,
        }
    }
}
