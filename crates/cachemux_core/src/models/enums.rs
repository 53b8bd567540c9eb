//! Core enums used throughout the pipeline.

use serde::{Deserialize, Serialize};

/// Media kind of a trimmed fragment, as reported by the stream inspector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    /// Not probed yet, or the inspector reported neither (or both) kinds.
    #[default]
    Unknown,
    Video,
    Audio,
}

impl StreamKind {
    /// ffprobe stream selector for the first stream of this kind.
    pub fn selector(&self) -> Option<&'static str> {
        match self {
            StreamKind::Video => Some("v:0"),
            StreamKind::Audio => Some("a:0"),
            StreamKind::Unknown => None,
        }
    }

    /// Parse the `codec_type` value reported by ffprobe.
    pub fn from_codec_type(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "video" => Some(StreamKind::Video),
            "audio" => Some(StreamKind::Audio),
            _ => None,
        }
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamKind::Unknown => write!(f, "unknown"),
            StreamKind::Video => write!(f, "video"),
            StreamKind::Audio => write!(f, "audio"),
        }
    }
}

/// Forward-only stages of a group's pipeline pass.
///
/// A group starts at `Discovered` and advances one stage per step.
/// `Skipped` is not a stage: it is the terminal outcome reachable from
/// any of these (see `GroupOutcome`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStage {
    #[default]
    Discovered,
    Trimmed,
    Classified,
    Paired,
    MetadataResolved,
    Muxed,
    CleanedUp,
}

impl GroupStage {
    /// The stage that directly follows this one, if any.
    pub fn next(&self) -> Option<Self> {
        match self {
            GroupStage::Discovered => Some(GroupStage::Trimmed),
            GroupStage::Trimmed => Some(GroupStage::Classified),
            GroupStage::Classified => Some(GroupStage::Paired),
            GroupStage::Paired => Some(GroupStage::MetadataResolved),
            GroupStage::MetadataResolved => Some(GroupStage::Muxed),
            GroupStage::Muxed => Some(GroupStage::CleanedUp),
            GroupStage::CleanedUp => None,
        }
    }
}

impl std::fmt::Display for GroupStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GroupStage::Discovered => "Discovered",
            GroupStage::Trimmed => "Trimmed",
            GroupStage::Classified => "Classified",
            GroupStage::Paired => "Paired",
            GroupStage::MetadataResolved => "MetadataResolved",
            GroupStage::Muxed => "Muxed",
            GroupStage::CleanedUp => "CleanedUp",
        };
        write!(f, "{}", name)
    }
}

/// Which stream inspection strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStrategy {
    /// `-select_streams` query per kind, empty result when absent.
    #[default]
    Structured,
    /// Scan diagnostic text for `Video:` / `Audio:` stream descriptors.
    TextScan,
}

impl ProbeStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Structured => "structured",
            Self::TextScan => "text_scan",
        }
    }
}

/// When trimmed temporary fragments are deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupPolicy {
    /// Delete after any mux attempt, and when a group is skipped after trimming.
    #[default]
    Always,
    /// Delete only when the group completed; keep otherwise for diagnosis.
    OnSuccess,
}

/// What to do when two groups derive the same output filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Later groups (in directory-name order) get `_2`, `_3`, ... appended.
    #[default]
    Suffix,
    /// Later groups overwrite earlier ones.
    Overwrite,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_type_parses_case_insensitively() {
        assert_eq!(StreamKind::from_codec_type("video\n"), Some(StreamKind::Video));
        assert_eq!(StreamKind::from_codec_type("Audio"), Some(StreamKind::Audio));
        assert_eq!(StreamKind::from_codec_type("subtitle"), None);
        assert_eq!(StreamKind::from_codec_type(""), None);
    }

    #[test]
    fn stages_only_move_forward() {
        let mut stage = GroupStage::Discovered;
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            assert!(next > stage);
            stage = next;
            seen.push(stage);
        }
        assert_eq!(seen.len(), 7);
        assert_eq!(stage, GroupStage::CleanedUp);
    }

    #[test]
    fn policies_deserialize_from_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            cleanup: CleanupPolicy,
            collision: CollisionPolicy,
            probe: ProbeStrategy,
        }
        let w: Wrapper = serde_json::from_str(
            r#"{"cleanup":"on_success","collision":"overwrite","probe":"text_scan"}"#,
        )
        .unwrap();
        assert_eq!(w.cleanup, CleanupPolicy::OnSuccess);
        assert_eq!(w.collision, CollisionPolicy::Overwrite);
        assert_eq!(w.probe, ProbeStrategy::TextScan);
    }
}
