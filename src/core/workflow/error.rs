use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Where in the source document a structural problem was detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// One-based line and column reported by the YAML parser.
    Position { line: usize, column: usize },
    /// Dotted document path such as `jobs.build.steps[2]`.
    Path(String),
    Document,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocation::Position { line, column } => {
                write!(f, "line {}, column {}", line, column)
            }
            SourceLocation::Path(path) => write!(f, "{}", path),
            SourceLocation::Document => write!(f, "document"),
        }
    }
}

/// Errors raised while parsing, composing or rendering workflow documents.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkflowError {
    #[error("malformed document at {location}: {message}")]
    MalformedDocument {
        location: SourceLocation,
        message: String,
    },
    #[error("composition conflict in pattern '{pattern}' at job '{job}': {message}")]
    CompositionConflict {
        pattern: String,
        job: String,
        message: String,
    },
    #[error("cyclic job dependency between: {}", .cycle.join(", "))]
    CyclicDependency { cycle: Vec<String> },
    #[error("unknown pattern '{0}'")]
    UnknownPattern(String),
    #[error("failed to serialize workflow: {0}")]
    Serialization(String),
}

impl WorkflowError {
    pub fn malformed(path: impl Into<String>, message: impl Into<String>) -> Self {
        WorkflowError::MalformedDocument {
            location: SourceLocation::Path(path.into()),
            message: message.into(),
        }
    }

    pub fn conflict(
        pattern: impl Into<String>,
        job: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        WorkflowError::CompositionConflict {
            pattern: pattern.into(),
            job: job.into(),
            message: message.into(),
        }
    }

    /// Convert a YAML error into `MalformedDocument`, keeping the parser's position.
    pub fn from_yaml(err: serde_yaml::Error) -> Self {
        let location = err
            .location()
            .map(|loc| SourceLocation::Position {
                line: loc.line(),
                column: loc.column(),
            })
            .unwrap_or(SourceLocation::Document);
        let message = strip_position_suffix(&err.to_string());
        WorkflowError::MalformedDocument { location, message }
    }

    /// Location of a `MalformedDocument` error.
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            WorkflowError::MalformedDocument { location, .. } => Some(location),
            _ => None,
        }
    }
}

fn strip_position_suffix(message: &str) -> String {
    static SUFFIX: OnceLock<Regex> = OnceLock::new();
    let suffix = SUFFIX.get_or_init(|| {
        Regex::new(r" at line \d+ column \d+$").expect("position suffix pattern is valid")
    });
    suffix.replace(message, "").into_owned()
}
