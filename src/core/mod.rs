pub mod config;
pub mod error;
pub mod types;
pub mod workflow;

pub use config::{ActionsmithConfig, ConfigLoader, ConfigValidator};
pub use error::{AppError, DefaultErrorReporter, ErrorReporter};
pub use types::*;
