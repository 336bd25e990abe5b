use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::error::{Result, RunError};

pub const LOG_FILE_NAME: &str = "media_collection.log";

/// Keeps the file writer alive; buffered lines are flushed when it drops.
pub struct LogGuard {
    _file: WorkerGuard,
}

/// Installs a console stream plus a daily-rolling file under `log_dir`.
pub fn init(log_dir: &Path) -> Result<LogGuard> {
    fs::create_dir_all(log_dir)
        .map_err(|err| RunError::Logging(format!("{}: {}", log_dir.display(), err)))?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(false),
        )
        .try_init()
        .map_err(|err| RunError::Logging(err.to_string()))?;

    Ok(LogGuard { _file: guard })
}
