use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_DIRECTIVE: &str = "data_insights=info";

/// Initializes console logging (stderr) plus a daily-rolling JSON log file in `dir`.
///
/// The returned guard flushes the file writer when dropped; keep it alive for
/// the duration of the program.
pub fn init_logging(dir: &Path, file_name: &str) -> WorkerGuard {
    // Ensure logs directory exists
    let _ = fs::create_dir_all(dir);

    let file_appender = tracing_appender::rolling::daily(dir, file_name);
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);
    // stdout is reserved for command output
    let console_layer = fmt::layer().with_writer(std::io::stderr);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    // try_init so a second call (tests, embedding) leaves the first subscriber in place
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    guard
}
