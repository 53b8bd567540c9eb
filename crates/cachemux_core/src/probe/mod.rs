//! Stream classification of trimmed fragments.
//!
//! Two interchangeable ffprobe strategies sit behind [`StreamProber`]:
//!
//! - **Structured** ([`StructuredProber`]): asks for `codec_type` of the
//!   first video stream, then the first audio stream. An empty answer
//!   means "no such stream".
//! - **Text scan** ([`TextScanProber`]): reads the human-readable stream
//!   listing and looks for `Video:` / `Audio:` stream descriptors.
//!
//! Either way the answer is normalized to [`StreamKind`]. A fragment is
//! never both: one reporting a video *and* an audio stream is not an
//! elementary-stream fragment and classifies as `Unknown`.

mod structured;
mod text_scan;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::ToolSettings;
use crate::models::{ProbeStrategy, StreamKind};
use crate::tools::ToolError;

pub use structured::{first_codec_type, StructuredProber};
pub use text_scan::{scan_stream_descriptors, TextScanProber};

/// Why a fragment could not be classified.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// ffprobe could not be run or timed out.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// ffprobe ran but rejected the file.
    #[error("{tool} exited with code {exit_code}: {message}")]
    Failed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    /// The file holds both a video and an audio stream.
    #[error("{} reports both video and audio streams", .0.display())]
    BothKinds(std::path::PathBuf),
}

/// Classifies a trimmed fragment as video, audio, or unknown.
pub trait StreamProber: Send + Sync {
    /// Strategy name (for logging).
    fn name(&self) -> &str;

    /// Inspect `path` and report its kind, or why that failed.
    ///
    /// `Ok(StreamKind::Unknown)` means the inspector ran fine but found
    /// neither kind.
    fn probe(&self, path: &Path) -> Result<StreamKind, ProbeError>;

    /// Like `probe`, but every failure collapses to `Unknown`.
    fn classify(&self, path: &Path) -> StreamKind {
        match self.probe(path) {
            Ok(kind) => kind,
            Err(e) => {
                tracing::warn!("Could not classify {}: {}", path.display(), e);
                StreamKind::Unknown
            }
        }
    }
}

/// Build the prober selected in the tool settings.
pub fn create_prober(tools: &ToolSettings) -> Arc<dyn StreamProber> {
    create_prober_with(tools.probe_strategy, &tools.ffprobe_path, tools.timeout())
}

/// Build a prober for an explicit strategy.
pub fn create_prober_with(
    strategy: ProbeStrategy,
    ffprobe_path: &str,
    timeout: Option<Duration>,
) -> Arc<dyn StreamProber> {
    match strategy {
        ProbeStrategy::Structured => Arc::new(StructuredProber::new(ffprobe_path, timeout)),
        ProbeStrategy::TextScan => Arc::new(TextScanProber::new(ffprobe_path, timeout)),
    }
}

/// Combine "has video" / "has audio" answers into one kind.
pub(crate) fn resolve_kind(
    path: &Path,
    has_video: bool,
    has_audio: bool,
) -> Result<StreamKind, ProbeError> {
    match (has_video, has_audio) {
        (true, true) => Err(ProbeError::BothKinds(path.to_path_buf())),
        (true, false) => Ok(StreamKind::Video),
        (false, true) => Ok(StreamKind::Audio),
        (false, false) => Ok(StreamKind::Unknown),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<StreamKind, ()>);

    impl StreamProber for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn probe(&self, path: &Path) -> Result<StreamKind, ProbeError> {
            self.0
                .map_err(|_| ProbeError::BothKinds(path.to_path_buf()))
        }
    }

    #[test]
    fn classify_collapses_errors_to_unknown() {
        let path = Path::new("/tmp/#seg.m4s");
        assert_eq!(Fixed(Ok(StreamKind::Audio)).classify(path), StreamKind::Audio);
        assert_eq!(Fixed(Err(())).classify(path), StreamKind::Unknown);
    }

    #[test]
    fn never_both_kinds() {
        let path = Path::new("/x");
        assert!(resolve_kind(path, true, true).is_err());
        assert_eq!(resolve_kind(path, true, false).unwrap(), StreamKind::Video);
        assert_eq!(resolve_kind(path, false, true).unwrap(), StreamKind::Audio);
        assert_eq!(resolve_kind(path, false, false).unwrap(), StreamKind::Unknown);
    }

    #[test]
    fn factory_honors_strategy() {
        let mut tools = ToolSettings::default();
        assert_eq!(create_prober(&tools).name(), "structured");
        tools.probe_strategy = ProbeStrategy::TextScan;
        assert_eq!(create_prober(&tools).name(), "text_scan");
    }
}
