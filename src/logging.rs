//! Process-wide `tracing` subscriber.
//!
//! Every record goes to a rolling file through a non-blocking writer. Text
//! mode additionally mirrors to stdout; JSON mode writes the file only so it
//! stays machine-parseable.

use crate::config::{AppConfig, Rotation};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn file_appender(config: &AppConfig) -> RollingFileAppender {
    match config.rotation {
        Rotation::Hourly => rolling::hourly(&config.log_dir, &config.log_file),
        Rotation::Daily => rolling::daily(&config.log_dir, &config.log_file),
        Rotation::Never => rolling::never(&config.log_dir, &config.log_file),
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `log_level`.
///
/// The returned guard flushes buffered output on drop; hold it in `main`.
pub fn init_logging(config: &AppConfig) -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(file_appender(config));

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.use_json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(writer)
                    .with_ansi(false),
            )
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(writer).with_ansi(false))
            .with(fmt::layer().with_ansi(true))
            .init();
    }

    guard
}
