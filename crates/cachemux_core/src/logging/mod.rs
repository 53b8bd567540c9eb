//! Logging infrastructure for cachemux.
//!
//! Library code logs through `tracing`. Each group additionally gets a
//! [`GroupLogger`] that tags events with the group name, can mirror them to
//! a per-group file, and keeps the tail of ffprobe/ffmpeg output for
//! failure reports.
//!
//! ```no_run
//! use cachemux_core::logging::{GroupLogger, LogConfig};
//!
//! let logger = GroupLogger::to_file("12345", "/data/out/.logs", LogConfig::default()).unwrap();
//! logger.phase("Trim");
//! logger.success("Wrote Show_1_Ep1.mp4");
//! ```

mod group_logger;
mod types;

pub use group_logger::GroupLogger;
pub use types::{LogConfig, LogLevel, Marker, ToolStream, ToolTail};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a stderr subscriber filtered by `RUST_LOG`, or by `level` when
/// the variable is unset or invalid.
///
/// For callers that only need console output; the CLI's `run` command
/// installs its own subscriber with a file layer instead. Call at most once.
pub fn init_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter_str()));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter)
        .init();
}

/// Warn-level tracing for unit tests; safe to call from every test.
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
