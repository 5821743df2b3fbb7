pub mod config;
pub mod context;
pub mod layers;

pub use context::{detect_context, ExecutionContext};
pub use layers::console::ConsoleOutput;

use crate::logging::config::LoggingConfig;
use crate::logging::layers::{console, file, opentelemetry, BoxLayer};
use crate::Result;
use anyhow::{anyhow, Context};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::Registry;

static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Inputs the CLI hands to [`init`].
#[derive(Debug, Clone, Default)]
pub struct LoggingOptions {
    pub workspace: Option<PathBuf>,
    pub quiet: bool,
}

/// Guards that keep logging sinks active for the duration of the command.
pub struct LoggingGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
    _otel_guard: Option<opentelemetry::OpenTelemetryGuard>,
    console_output: ConsoleOutput,
    log_file_path: Option<PathBuf>,
}

impl LoggingGuard {
    pub fn console_output(&self) -> ConsoleOutput {
        self.console_output
    }

    /// Path of the JSON log file, when the file sink is enabled.
    pub fn log_file_path(&self) -> Option<&Path> {
        self.log_file_path.as_deref()
    }
}

/// Initialize the logging framework.
///
/// Filters come from `RUST_LOG` when set and otherwise from `logging.default_level`.
/// Console output goes to stderr unless configured otherwise, and is silenced by
/// `quiet`. The file sink and the OTLP exporter are opt-in. Errors when invoked more
/// than once per process unless tests reset the guard.
pub fn init(options: &LoggingOptions) -> Result<LoggingGuard> {
    if LOGGER_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Err(anyhow!("logging already initialized"));
    }

    let context = detect_context();
    let workspace_root = options.workspace.as_deref();
    let config = LoggingConfig::load(workspace_root)?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.default_level))
        .context("failed to configure tracing level")?;

    let mut layers: Vec<BoxLayer<Registry>> = Vec::new();

    let console_output = console::select_console_output(options.quiet, config.console_output);
    if console_output != ConsoleOutput::None {
        layers.push(console::console_layer::<Registry>(console_output, context).boxed());
    }

    let (file_guard, log_file_path) = if config.enable_file {
        let path = file::log_file_path(&config, workspace_root)?;
        let (layer, guard) = file::file_layer::<Registry>(&path)?;
        layers.push(layer);
        (Some(guard), Some(path))
    } else {
        (None, None)
    };

    let mut otel_error = None;
    let otel_guard = if config.opentelemetry.enabled {
        match opentelemetry::build_opentelemetry_layer::<Registry>(&config.opentelemetry) {
            Ok((layer, guard)) => {
                layers.push(layer);
                Some(guard)
            }
            Err(err) => {
                otel_error = Some(err);
                None
            }
        }
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .context("failed to install tracing subscriber")?;

    if let Some(err) = otel_error {
        tracing::warn!("OpenTelemetry disabled: {}", err);
    }
    tracing::debug!(
        context = ?context,
        console = %console_output,
        "logging initialized"
    );

    Ok(LoggingGuard {
        _file_guard: file_guard,
        _otel_guard: otel_guard,
        console_output,
        log_file_path,
    })
}

#[cfg(test)]
/// Reset the initialization guard so tests can reconfigure logging multiple times.
pub fn reset_for_tests() {
    LOGGER_INITIALIZED.store(false, Ordering::SeqCst);
}
