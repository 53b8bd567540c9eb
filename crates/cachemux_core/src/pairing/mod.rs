//! Video/audio pairing of a group's classified fragments.

use thiserror::Error;

use crate::models::{Fragment, StreamKind};

/// The classified fragments do not form exactly one video + one audio pair.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassificationFailure {
    /// More than one fragment classified as `kind`.
    #[error("ambiguous {kind} stream ({count} candidates)")]
    Ambiguous { kind: StreamKind, count: usize },

    /// No fragment of the listed kind(s).
    #[error("missing {} stream", .0.iter().map(|k| k.to_string()).collect::<Vec<_>>().join(" and "))]
    Missing(Vec<StreamKind>),
}

/// The selected pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentPair {
    pub video: Fragment,
    pub audio: Fragment,
}

/// Select exactly one video and one audio fragment.
///
/// Video ambiguity is reported before audio ambiguity, and ambiguity
/// before absence. Unknown fragments are ignored.
pub fn pair_fragments(fragments: &[Fragment]) -> Result<FragmentPair, ClassificationFailure> {
    let videos: Vec<&Fragment> = fragments
        .iter()
        .filter(|f| f.kind == StreamKind::Video)
        .collect();
    let audios: Vec<&Fragment> = fragments
        .iter()
        .filter(|f| f.kind == StreamKind::Audio)
        .collect();

    for (kind, bucket) in [(StreamKind::Video, &videos), (StreamKind::Audio, &audios)] {
        if bucket.len() > 1 {
            return Err(ClassificationFailure::Ambiguous {
                kind,
                count: bucket.len(),
            });
        }
    }

    match (videos.first(), audios.first()) {
        (Some(video), Some(audio)) => Ok(FragmentPair {
            video: (*video).clone(),
            audio: (*audio).clone(),
        }),
        (video, audio) => {
            let mut missing = Vec::new();
            if video.is_none() {
                missing.push(StreamKind::Video);
            }
            if audio.is_none() {
                missing.push(StreamKind::Audio);
            }
            Err(ClassificationFailure::Missing(missing))
        }
    }
}
