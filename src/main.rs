use actionsmith::cli::{self, Args};
use actionsmith::core::{AppError, DefaultErrorReporter, ErrorReporter};
use actionsmith::logging::{self, LoggingOptions};
use clap::Parser;
use std::env;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let options = LoggingOptions {
        workspace: env::current_dir().ok(),
        quiet: args.quiet,
    };
    let _guard = match logging::init(&options) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("warning: logging disabled: {:#}", err);
            None
        }
    };

    match cli::run(args).await {
        Ok(code) => code,
        Err(err) => {
            let reporter = DefaultErrorReporter::new();
            match err.downcast_ref::<AppError>() {
                Some(app_error) => reporter.report_error(app_error),
                None => eprintln!("[ERROR] {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}
