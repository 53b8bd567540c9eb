//! Structured ffprobe queries (`-select_streams` + `-show_entries`).

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use super::{resolve_kind, ProbeError, StreamProber};
use crate::models::{ProbeStrategy, StreamKind};
use crate::tools::run_tool;

/// Asks ffprobe for the `codec_type` of `v:0`, then `a:0`.
pub struct StructuredProber {
    ffprobe_path: String,
    timeout: Option<Duration>,
}

impl StructuredProber {
    pub fn new(ffprobe_path: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
            timeout,
        }
    }

    /// Arguments for one selector query.
    pub fn query_args(selector: &str, path: &Path) -> Vec<String> {
        vec![
            "-v".to_string(),
            "error".to_string(),
            "-select_streams".to_string(),
            selector.to_string(),
            "-show_entries".to_string(),
            "stream=codec_type".to_string(),
            "-of".to_string(),
            "default=noprint_wrappers=1:nokey=1".to_string(),
            path.to_string_lossy().to_string(),
        ]
    }

    /// Whether the first stream of `kind` exists in `path`.
    fn has_stream(&self, path: &Path, kind: StreamKind) -> Result<bool, ProbeError> {
        let Some(selector) = kind.selector() else {
            return Ok(false);
        };

        let mut cmd = Command::new(&self.ffprobe_path);
        cmd.args(Self::query_args(selector, path));

        let output = run_tool("ffprobe", &mut cmd, self.timeout)?;
        if !output.success() {
            return Err(ProbeError::Failed {
                tool: "ffprobe".to_string(),
                exit_code: output.code_or_signal(),
                message: output.stderr.trim().to_string(),
            });
        }

        Ok(first_codec_type(&output.stdout) == Some(kind))
    }
}

impl StreamProber for StructuredProber {
    fn name(&self) -> &str {
        ProbeStrategy::Structured.name()
    }

    fn probe(&self, path: &Path) -> Result<StreamKind, ProbeError> {
        let has_video = self.has_stream(path, StreamKind::Video)?;
        let has_audio = self.has_stream(path, StreamKind::Audio)?;
        resolve_kind(path, has_video, has_audio)
    }
}

/// First non-empty `codec_type` line of a `nokey=1` ffprobe answer.
pub fn first_codec_type(stdout: &str) -> Option<StreamKind> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(StreamKind::from_codec_type)
}
