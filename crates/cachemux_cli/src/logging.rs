use std::env;
use std::fs;
use std::path::Path;

use cachemux_core::logging::LogLevel;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{Builder, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Install stdout logging, plus a `cachemux.log` file in `log_dir` when given.
///
/// `RUST_LOG` overrides `level`. Keep the returned guard alive until exit so
/// buffered file output is flushed.
pub fn init_logger(level: LogLevel, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter_layer = env::var("RUST_LOG")
        .ok()
        .and_then(|f| EnvFilter::try_new(f).ok())
        .unwrap_or_else(|| EnvFilter::new(level.as_filter_str()));

    let mut guard = None;
    let file_layer = log_dir.and_then(|dir| {
        fs::create_dir_all(dir).ok()?;
        let appender = Builder::new()
            .rotation(Rotation::NEVER)
            .filename_prefix("cachemux")
            .filename_suffix("log")
            .build(dir)
            .ok()?;
        let (non_blocking, worker_guard) = tracing_appender::non_blocking(appender);
        guard = Some(worker_guard);
        Some(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
    });

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .compact()
                .with_target(false)
                .without_time()
                .with_ansi(true),
        )
        .with(file_layer)
        .with(filter_layer)
        .init();

    match log_dir {
        Some(dir) if guard.is_some() => {
            info!("Logging to stdout and {}", dir.join("cachemux.log").display())
        }
        _ => info!("Logging to stdout"),
    }

    guard
}
