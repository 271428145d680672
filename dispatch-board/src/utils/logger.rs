//! Logging Infrastructure
//!
//! Structured logging with an optional daily rolling file.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Initialize the logger on stdout at `info`
pub fn init_logger() -> Option<WorkerGuard> {
    init_logger_with_file(None, None)
}

/// Initialize the logger with optional file output
///
/// `RUST_LOG` wins over `log_level` when set. When `log_dir` exists the
/// output goes to `<log_dir>/dispatch-board.<date>`; the returned guard
/// must be kept alive to flush the file writer.
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&str>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.unwrap_or("info")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if let Some(dir) = log_dir.filter(|d| Path::new(d).is_dir()) {
        let appender = tracing_appender::rolling::daily(dir, "dispatch-board");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = builder.with_ansi(false).with_writer(writer).try_init();
        return Some(guard);
    }

    let _ = builder.try_init();
    None
}
