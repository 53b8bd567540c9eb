//! Job-related data structures (metadata, mux jobs, outcomes).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::enums::GroupStage;
use super::media::Fragment;

/// Title information read from a group's sidecar record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Episode / part title.
    pub title: String,
    /// Title of the series or upload the part belongs to.
    pub group_title: String,
    /// 1-based part number.
    pub part: u32,
}

impl Metadata {
    pub fn new(title: impl Into<String>, group_title: impl Into<String>, part: u32) -> Self {
        Self {
            title: title.into(),
            group_title: group_title.into(),
            part,
        }
    }
}

/// Everything the muxer needs for one output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputJob {
    pub video: Fragment,
    pub audio: Fragment,
    pub cover_image: Option<PathBuf>,
    pub output_path: PathBuf,
}

impl OutputJob {
    pub fn new(video: Fragment, audio: Fragment, output_path: impl Into<PathBuf>) -> Self {
        Self {
            video,
            audio,
            cover_image: None,
            output_path: output_path.into(),
        }
    }

    pub fn with_cover(mut self, cover: Option<PathBuf>) -> Self {
        self.cover_image = cover;
        self
    }
}

/// Final result of one group's pipeline pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GroupOutcome {
    /// Output written; `warnings` lists temporaries that could not be removed.
    Completed {
        group: String,
        output_path: PathBuf,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<String>,
    },
    /// Group abandoned; `stage` is the last stage reached.
    Skipped {
        group: String,
        stage: GroupStage,
        reason: String,
    },
}

impl GroupOutcome {
    pub fn completed(group: impl Into<String>, output_path: PathBuf) -> Self {
        Self::Completed {
            group: group.into(),
            output_path,
            warnings: Vec::new(),
        }
    }

    /// Attach cleanup warnings to a completed outcome.
    pub fn with_warnings(mut self, new_warnings: Vec<String>) -> Self {
        if let Self::Completed { warnings, .. } = &mut self {
            *warnings = new_warnings;
        }
        self
    }

    pub fn warnings(&self) -> &[String] {
        match self {
            Self::Completed { warnings, .. } => warnings,
            Self::Skipped { .. } => &[],
        }
    }

    pub fn skipped(group: impl Into<String>, stage: GroupStage, reason: impl Into<String>) -> Self {
        Self::Skipped {
            group: group.into(),
            stage,
            reason: reason.into(),
        }
    }

    pub fn group(&self) -> &str {
        match self {
            Self::Completed { group, .. } | Self::Skipped { group, .. } => group,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn output_path(&self) -> Option<&PathBuf> {
        match self {
            Self::Completed { output_path, .. } => Some(output_path),
            Self::Skipped { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Skipped { reason, .. } => Some(reason),
            Self::Completed { .. } => None,
        }
    }
}

/// Outcomes of a whole batch run, in group order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub outcomes: Vec<GroupOutcome>,
}

impl BatchReport {
    pub fn completed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_completed()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes.len() - self.completed_count()
    }

    /// Find the outcome for a group by name.
    pub fn outcome(&self, group: &str) -> Option<&GroupOutcome> {
        self.outcomes.iter().find(|o| o.group() == group)
    }
}
