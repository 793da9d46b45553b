use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_ENV: &str = "FLASHVOCAB_LOG";

/// Keeps the background log writer alive; drop it only at exit.
pub struct LogGuard {
    _guard: WorkerGuard,
}

pub fn default_log_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("flashvocab")
        .join("logs")
}

fn env_filter() -> EnvFilter {
    let directive = std::env::var(LOG_ENV).unwrap_or_else(|_| "info".to_string());
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Route `tracing` output to a daily rolling file. The terminal belongs to
/// the UI, so nothing is written to stdout. Returns None if the log
/// directory cannot be created.
pub fn init_file_logging(log_dir: &Path) -> Option<LogGuard> {
    if let Err(err) = std::fs::create_dir_all(log_dir) {
        eprintln!("failed to create log directory {}: {err}", log_dir.display());
        return None;
    }

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "flashvocab.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(file_layer)
        .try_init()
        .ok()?;

    Some(LogGuard { _guard: guard })
}
