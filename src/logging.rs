//! Tracing subscriber setup
//!
//! Human readable logs go to stderr. When the data directory is writable a
//! JSON copy of every event is appended to [`crate::config::log_path`].

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_DIRECTIVE: &str = "dependency_updates=info";
const VERBOSE_DIRECTIVE: &str = "dependency_updates=debug";

/// Filter directive for the given flags
///
/// `--verbose` wins over `RUST_LOG`, which wins over the default.
fn filter_directive(verbose: bool, rust_log: Option<String>) -> String {
    if verbose {
        return VERBOSE_DIRECTIVE.to_string();
    }
    rust_log
        .filter(|directive| !directive.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DIRECTIVE.to_string())
}

/// Installs the global subscriber
///
/// The returned guard flushes the file writer on drop and must be kept alive
/// until the program exits. None means file logging is unavailable.
pub fn init_logging(verbose: bool) -> Option<WorkerGuard> {
    let directive = filter_directive(verbose, std::env::var("RUST_LOG").ok());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let log_path = crate::config::log_path();
    let file_writer = log_path.parent().and_then(|dir| {
        std::fs::create_dir_all(dir).ok()?;
        let file_name = log_path.file_name()?.to_string_lossy().into_owned();
        RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(file_name)
            .build(dir)
            .ok()
    });

    match file_writer {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(file_layer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
            None
        }
    }
}
