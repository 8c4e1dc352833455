//! Logging infrastructure for Droppy compression.
//!
//! This module provides:
//! - Global `tracing` subscriber setup (stderr, optional rolling file)
//! - Per-job loggers with file + callback dual output
//! - Tail buffer of FFmpeg output for error diagnosis
//!
//! # Example
//!
//! ```no_run
//! use droppy_core::logging::{JobLogger, LogConfig};
//!
//! let logger = JobLogger::new("clip.mov", "/path/to/logs", LogConfig::default(), None).unwrap();
//!
//! logger.phase("Compress");
//! logger.command("ffmpeg -i clip.mov ...");
//! logger.success("Wrote clip_compressed.mp4");
//! ```

mod job_logger;
mod types;

use std::path::Path;

pub use job_logger::JobLogger;
pub use types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// File name prefix of the rolling application log.
pub const LOG_FILE_PREFIX: &str = "droppy.log";

/// Initialize global tracing subscriber for application-wide logging.
///
/// Respects `RUST_LOG`, falling back to `default_level`. Output goes to
/// stderr. Fails if a global subscriber is already installed.
pub fn init_tracing(default_level: LogLevel) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(env_filter(default_level))
        .try_init()
}

/// Like [`init_tracing`], but also writes a daily-rotated `droppy.log`
/// into `log_dir`.
///
/// The returned guard flushes the file writer on drop; keep it alive for
/// the lifetime of the application.
pub fn init_tracing_with_file(
    default_level: LogLevel,
    log_dir: &Path,
) -> Result<WorkerGuard, TryInitError> {
    let (writer, guard) = file_writer(log_dir);

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .with(env_filter(default_level))
        .try_init()?;

    Ok(guard)
}

/// Non-blocking writer for `<log_dir>/droppy.log.<date>`.
pub fn file_writer(log_dir: &Path) -> (NonBlocking, WorkerGuard) {
    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    tracing_appender::non_blocking(appender)
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

fn env_filter(default_level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_to_filter_str(default_level)))
}

/// Convert LogLevel to filter string.
fn level_to_filter_str(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "trace",
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn level_to_filter_works() {
        assert_eq!(level_to_filter_str(LogLevel::Debug), "debug");
        assert_eq!(level_to_filter_str(LogLevel::Warn), "warn");
    }

    #[test]
    fn file_writer_creates_rolling_log() {
        let dir = tempdir().unwrap();
        let (mut writer, guard) = file_writer(dir.path());

        writer.write_all(b"compress started\n").unwrap();
        // Dropping the guard flushes the worker thread
        drop(guard);

        let log_file = fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .find(|e| e.file_name().to_string_lossy().starts_with(LOG_FILE_PREFIX))
            .expect("rolling log file");
        let content = fs::read_to_string(log_file.path()).unwrap();
        assert!(content.contains("compress started"));
    }

    #[test]
    fn second_init_is_rejected() {
        init_test_tracing();
        let dir = tempdir().unwrap();

        assert!(init_tracing(LogLevel::Info).is_err());
        assert!(init_tracing_with_file(LogLevel::Debug, dir.path()).is_err());
    }
}
