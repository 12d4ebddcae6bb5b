use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::utils::{self, Profile};

pub const LOG_FILE: &str = "tdl.log";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Could not determine data directory")]
    DataDirError,
    #[error("Failed to create log directory: {0}")]
    CreateDirError(String),
    #[error("Invalid log filter '{0}'")]
    FilterError(String),
}

/// Build the filter: `RUST_LOG` wins over the configured level
fn build_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("warn,tdl={}", level)))
        .map_err(|_| LoggingError::FilterError(level.to_string()))
}

pub fn log_dir(profile: Profile) -> Result<PathBuf, LoggingError> {
    utils::get_data_dir(profile).ok_or(LoggingError::DataDirError)
}

/// Log to `<dir>/tdl.log`. The terminal belongs to the UI, so nothing goes
/// to stdout or stderr. Keep the guard alive until exit to flush the writer.
pub fn init(dir: &Path, level: &str) -> Result<WorkerGuard, LoggingError> {
    fs::create_dir_all(dir).map_err(|e| LoggingError::CreateDirError(e.to_string()))?;
    let filter = build_filter(level)?;

    let appender = tracing_appender::rolling::never(dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let init_result = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(guard)
}
