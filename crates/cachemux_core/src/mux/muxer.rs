//! ffmpeg execution for one output job.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use thiserror::Error;

use super::options_builder::{format_tokens_pretty, FfmpegOptionsBuilder};
use crate::config::Settings;
use crate::logging::GroupLogger;
use crate::models::OutputJob;
use crate::tools::{format_command, run_tool, ToolError};

/// Errors from a remux attempt.
#[derive(Error, Debug)]
pub enum MuxError {
    /// ffmpeg could not be started or timed out.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// ffmpeg exited non-zero.
    #[error("ffmpeg exited with code {exit_code}{}", format_tail(.stderr_tail))]
    Failed {
        exit_code: i32,
        stderr_tail: Vec<String>,
    },

    /// ffmpeg reported success but wrote nothing.
    #[error("ffmpeg reported success but {} was not created", .0.display())]
    OutputMissing(PathBuf),

    #[error("Failed to create output directory {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn format_tail(lines: &[String]) -> String {
    match lines.last() {
        Some(last) => format!(": {}", last),
        None => String::new(),
    }
}

impl MuxError {
    /// Whether retrying without the hwaccel hint could help.
    fn is_retryable(&self) -> bool {
        matches!(self, MuxError::Failed { .. } | MuxError::OutputMissing(_))
    }
}

/// How a successful mux ran.
#[derive(Debug, Clone)]
pub struct MuxReport {
    /// Whether the hwaccel hint was in effect for the run that succeeded.
    pub used_hwaccel: bool,
}

/// Remuxes paired fragments with ffmpeg.
pub struct Muxer {
    ffmpeg_path: String,
    hwaccel: Option<String>,
    timeout: Option<Duration>,
    show_options_pretty: bool,
}

impl Muxer {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            hwaccel: None,
            timeout: None,
            show_options_pretty: false,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.tools.ffmpeg_path.clone())
            .with_hwaccel(settings.tools.hwaccel().map(str::to_string))
            .with_timeout(settings.tools.timeout())
            .with_pretty_options(settings.logging.show_options_pretty)
    }

    pub fn with_hwaccel(mut self, hwaccel: Option<String>) -> Self {
        self.hwaccel = hwaccel.filter(|h| !h.is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_pretty_options(mut self, enabled: bool) -> Self {
        self.show_options_pretty = enabled;
        self
    }

    /// Mux `job`, falling back to a plain run if the hwaccel run fails.
    ///
    /// A partial output left by a failed run is not removed.
    pub fn mux(&self, job: &OutputJob, logger: &GroupLogger) -> Result<MuxReport, MuxError> {
        if let Some(parent) = job.output_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| MuxError::OutputDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let Some(hwaccel) = self.hwaccel.as_deref() else {
            return self.run_ffmpeg(job, None, logger);
        };

        match self.run_ffmpeg(job, Some(hwaccel), logger) {
            Err(e) if e.is_retryable() => {
                logger.warn(&format!(
                    "Mux with -hwaccel {} failed ({}); retrying without it",
                    hwaccel, e
                ));
                self.run_ffmpeg(job, None, logger)
            }
            other => other,
        }
    }

    fn run_ffmpeg(
        &self,
        job: &OutputJob,
        hwaccel: Option<&str>,
        logger: &GroupLogger,
    ) -> Result<MuxReport, MuxError> {
        let tokens = FfmpegOptionsBuilder::new(job).with_hwaccel(hwaccel).build();
        logger.command(&format_command(&self.ffmpeg_path, &tokens));
        if self.show_options_pretty {
            logger.options_pretty(&format_tokens_pretty(&tokens));
        }

        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.args(&tokens);
        let output = run_tool("ffmpeg", &mut cmd, self.timeout)?;
        logger.tool_output("ffmpeg", &output);

        if !output.success() {
            logger.show_tail("ffmpeg");
            return Err(MuxError::Failed {
                exit_code: output.code_or_signal(),
                stderr_tail: logger.tail(),
            });
        }

        if !job.output_path.is_file() {
            return Err(MuxError::OutputMissing(job.output_path.clone()));
        }

        Ok(MuxReport {
            used_hwaccel: hwaccel.is_some(),
        })
    }
}
