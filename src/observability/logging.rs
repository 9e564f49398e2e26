//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Pick the console level from `RUST_LOG` or configuration
//! - Keep a debug-level log file next to the console output
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` overrides the configured console level when set
//! - The file sink is written by a background thread; its guard must
//!   live as long as the process or buffered lines are lost

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Filter applied to the log file regardless of the console level.
pub const FILE_DIRECTIVE: &str = "caching_proxy=debug";

/// Rotated log files kept on disk, including the current one.
pub const LOG_FILES_KEPT: usize = 3;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("log file {0:?} does not name a file")]
    FileName(PathBuf),

    #[error("failed to open log file: {0}")]
    Appender(#[from] InitError),
}

/// Filter directive used when `RUST_LOG` is not set.
pub fn default_directive(log_level: &str) -> String {
    format!("caching_proxy={}", log_level)
}

/// Daily-rotated appender for `path`. `logs/proxy.log` becomes
/// `logs/proxy.<date>.log`.
pub fn file_appender(path: &Path) -> Result<RollingFileAppender, LoggingError> {
    let file_name = path
        .file_name()
        .map(Path::new)
        .ok_or_else(|| LoggingError::FileName(path.to_path_buf()))?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let prefix = file_name
        .file_stem()
        .unwrap_or(file_name.as_os_str())
        .to_string_lossy()
        .into_owned();
    let mut builder = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(LOG_FILES_KEPT)
        .filename_prefix(prefix);
    if let Some(extension) = file_name.extension() {
        builder = builder.filename_suffix(extension.to_string_lossy().into_owned());
    }

    Ok(builder.build(directory)?)
}

/// Install the global tracing subscriber. Safe to call once per process.
///
/// Returns the file writer's guard when `log_file` is set.
pub fn init_logging(log_level: &str, log_file: Option<&Path>) -> Result<Option<WorkerGuard>, LoggingError> {
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(log_level)));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(file_appender(path)?);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(EnvFilter::new(FILE_DIRECTIVE));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_filter(console_filter))
        .with(file_layer)
        .init();

    Ok(guard)
}
