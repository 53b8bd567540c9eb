//! Free-text scan of ffprobe's stream listing.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use super::{resolve_kind, ProbeError, StreamProber};
use crate::models::{ProbeStrategy, StreamKind};
use crate::tools::run_tool;

/// Runs `ffprobe -hide_banner <file>` and scans its diagnostic output.
pub struct TextScanProber {
    ffprobe_path: String,
    timeout: Option<Duration>,
}

impl TextScanProber {
    pub fn new(ffprobe_path: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
            timeout,
        }
    }
}

impl StreamProber for TextScanProber {
    fn name(&self) -> &str {
        ProbeStrategy::TextScan.name()
    }

    fn probe(&self, path: &Path) -> Result<StreamKind, ProbeError> {
        let mut cmd = Command::new(&self.ffprobe_path);
        cmd.arg("-hide_banner").arg(path);

        let output = run_tool("ffprobe", &mut cmd, self.timeout)?;
        if !output.success() {
            return Err(ProbeError::Failed {
                tool: "ffprobe".to_string(),
                exit_code: output.code_or_signal(),
                message: output.stderr.trim().to_string(),
            });
        }

        let (has_video, has_audio) = scan_stream_descriptors(&output.combined());
        resolve_kind(path, has_video, has_audio)
    }
}

/// Look for `Stream #..: Video:` / `Stream #..: Audio:` lines.
///
/// Returns `(has_video, has_audio)`. Cover art shows up as a video stream
/// flagged `(attached pic)` and is not counted.
pub fn scan_stream_descriptors(text: &str) -> (bool, bool) {
    let mut has_video = false;
    let mut has_audio = false;

    for line in text.lines().map(str::trim) {
        if !line.starts_with("Stream #") {
            continue;
        }
        if line.contains(": Video:") && !line.contains("(attached pic)") {
            has_video = true;
        } else if line.contains(": Audio:") {
            has_audio = true;
        }
    }

    (has_video, has_audio)
}
