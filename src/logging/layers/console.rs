use crate::logging::context::ExecutionContext;
use serde::Deserialize;
use std::fmt;
use std::io::{self, IsTerminal};
use std::str::FromStr;
use tracing::Subscriber;
use tracing_subscriber::fmt::{self as tracing_fmt, format, writer::BoxMakeWriter};
use tracing_subscriber::registry::LookupSpan;

/// Layer type returned by the console builder.
pub type ConsoleFmtLayer<S> =
    tracing_fmt::Layer<S, format::DefaultFields, format::Format<format::Full>, BoxMakeWriter>;

/// Where console logs should be emitted.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleOutput {
    Stdout,
    #[default]
    Stderr,
    None,
}

impl fmt::Display for ConsoleOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleOutput::Stdout => write!(f, "stdout"),
            ConsoleOutput::Stderr => write!(f, "stderr"),
            ConsoleOutput::None => write!(f, "none"),
        }
    }
}

impl FromStr for ConsoleOutput {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "stdout" => Ok(ConsoleOutput::Stdout),
            "stderr" => Ok(ConsoleOutput::Stderr),
            "none" => Ok(ConsoleOutput::None),
            _ => Err(format!(
                "invalid logging.console_output '{}'; supported values are stdout, stderr, none",
                value
            )),
        }
    }
}

/// Pick the console sink: `--quiet` wins, then the configured value, then stderr.
pub fn select_console_output(quiet: bool, configured: Option<ConsoleOutput>) -> ConsoleOutput {
    if quiet {
        return ConsoleOutput::None;
    }
    configured.unwrap_or_default()
}

/// Build the console tracing layer for the provided subscriber type.
pub fn console_layer<S>(output: ConsoleOutput, context: ExecutionContext) -> ConsoleFmtLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let (make_writer, is_terminal) = match output {
        ConsoleOutput::Stdout => (BoxMakeWriter::new(io::stdout), io::stdout().is_terminal()),
        ConsoleOutput::Stderr => (BoxMakeWriter::new(io::stderr), io::stderr().is_terminal()),
        ConsoleOutput::None => (BoxMakeWriter::new(io::sink), false),
    };

    tracing_fmt::layer()
        .with_writer(make_writer)
        .with_ansi(context.allows_ansi() && is_terminal)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
}
