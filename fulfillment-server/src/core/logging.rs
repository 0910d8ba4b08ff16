//! Logger initialization

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize console logging with env-filter support.
///
/// `RUST_LOG` controls verbosity, default `info`.
pub fn init_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}

/// Initialize logging with an additional daily-rotated file appender.
///
/// Returns the guard that must be held for the lifetime of the process;
/// dropping it stops the background writer.
pub fn init_logger_with_file(log_dir: &str) -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(log_dir, "fulfillment.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .init();

    guard
}
