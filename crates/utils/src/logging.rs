//! provides logging helpers

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::{self};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry;

fn env_filter() -> filter::EnvFilter {
    filter::EnvFilter::builder()
        .with_default_directive(filter::LevelFilter::INFO.into())
        .from_env_lossy()
}

/// initiate the global tracing subscriber
pub fn init() {
    let fmt_layer = layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(env_filter());

    registry().with(fmt_layer).init();
}

/// initiate the global tracing subscriber, additionally writing to a daily
/// rotated file `<file_name>.<date>` in `directory`.
///
/// The returned guard flushes the file writer when dropped and must be held
/// for the lifetime of the process.
pub fn init_with_file(directory: impl AsRef<Path>, file_name: &str) -> WorkerGuard {
    let appender = tracing_appender::rolling::daily(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let stderr_layer = layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(env_filter());
    let file_layer = layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_filter(env_filter());

    registry().with(stderr_layer).with(file_layer).init();
    guard
}
