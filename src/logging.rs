//! Tracing setup for the `specgram` binary.
//!
//! Events go to stderr, keeping stdout free for spectrogram output, and to a
//! per-run log file. At most [`MAX_LOG_FILES`] files are kept.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::SystemTime;

use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

use crate::app_dirs::{self, AppDirError};

/// Log files retained per directory.
pub const MAX_LOG_FILES: usize = 10;
const LOG_FILE_PREFIX: &str = "specgram";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Errors raised while installing the tracing subscriber.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// The default log directory could not be resolved.
    #[error(transparent)]
    AppDir(#[from] AppDirError),
    /// Existing log files could not be listed.
    #[error("Failed to read log directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// An old log file could not be removed.
    #[error("Failed to remove old log file {path}: {source}")]
    RemoveFile {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The log file for this run could not be created.
    #[error("Failed to create log file at {path}: {source}")]
    CreateLogFile {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The timestamp for the file name could not be formatted.
    #[error("Failed to format log filename time: {0}")]
    FormatTime(#[from] time::error::Format),
    /// Another global subscriber was already installed.
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Install the global subscriber, writing files to `log_dir` or the
/// application log directory.
///
/// Repeated calls are no-ops. `RUST_LOG` overrides the default `info` level.
pub fn init(log_dir: Option<&Path>) -> Result<PathBuf, LoggingError> {
    let log_dir = match log_dir {
        Some(dir) => app_dirs::ensure_dir(dir.to_path_buf())?,
        None => app_dirs::logs_dir()?,
    };
    let file_name = log_file_name(now_local_or_utc())?;
    let log_path = log_dir.join(&file_name);
    if LOG_GUARD.get().is_some() {
        return Ok(log_path);
    }
    touch(&log_path)?;
    prune_old_logs(&log_dir, MAX_LOG_FILES)?;

    let (file_writer, guard) = tracing_appender::non_blocking(rolling::never(&log_dir, file_name));
    let timer = build_timer();
    let stderr_layer = fmt::layer()
        .with_timer(timer.clone())
        .with_writer(std::io::stderr);
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_timer(timer)
        .with_writer(file_writer);
    let subscriber = Registry::default()
        .with(build_env_filter())
        .with(stderr_layer)
        .with(file_layer);
    tracing::subscriber::set_global_default(subscriber)?;
    let _ = LOG_GUARD.set(guard);

    tracing::debug!("Logging to {}", log_path.display());
    Ok(log_path)
}

fn touch(path: &Path) -> Result<(), LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(|_| ())
        .map_err(|source| LoggingError::CreateLogFile {
            path: path.to_path_buf(),
            source,
        })
}

fn prune_old_logs(dir: &Path, max_files: usize) -> Result<(), LoggingError> {
    let mut logs: Vec<(SystemTime, PathBuf)> = fs::read_dir(dir)
        .map_err(|source| LoggingError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_file()))
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "log"))
        .map(|path| {
            let modified = fs::metadata(&path)
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, path)
        })
        .collect();
    if logs.len() <= max_files {
        return Ok(());
    }
    logs.sort_by_key(|(modified, _)| *modified);
    let excess = logs.len() - max_files;
    for (_, path) in logs.into_iter().take(excess) {
        fs::remove_file(&path).map_err(|source| LoggingError::RemoveFile { path, source })?;
    }
    Ok(())
}

fn log_file_name(now: OffsetDateTime) -> Result<String, LoggingError> {
    const NAME_FORMAT: &[FormatItem<'_>] =
        format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");
    Ok(format!("{LOG_FILE_PREFIX}_{}.log", now.format(NAME_FORMAT)?))
}

fn build_timer() -> fmt::time::OffsetTime<time::format_description::BorrowedFormatItem<'static>> {
    const DISPLAY_FORMAT: &[FormatItem<'static>] =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    fmt::time::OffsetTime::new(offset, DISPLAY_FORMAT.into())
}

fn now_local_or_utc() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

fn build_env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}
