//! Step and pipeline errors.
//!
//! Every failure inside a group ends as a `PipelineError`, which the
//! pipeline turns into `GroupOutcome::Skipped`. Nothing here escapes the
//! group boundary.

use thiserror::Error;

use crate::metadata::MetadataError;
use crate::models::GroupStage;
use crate::mux::MuxError;
use crate::pairing::ClassificationFailure;

/// A step failed; `stage` is the last stage the group reached.
#[derive(Error, Debug)]
#[error("Group '{group}' failed at step '{step}': {source}")]
pub struct PipelineError {
    pub group: String,
    pub step: String,
    pub stage: GroupStage,
    #[source]
    pub source: StepError,
}

impl PipelineError {
    pub fn new(
        group: impl Into<String>,
        step: impl Into<String>,
        stage: GroupStage,
        source: StepError,
    ) -> Self {
        Self {
            group: group.into(),
            step: step.into(),
            stage,
            source,
        }
    }

    /// Short reason suitable for a skip record.
    pub fn reason(&self) -> String {
        self.source.to_string()
    }
}

#[derive(Error, Debug)]
pub enum StepError {
    /// The step was reached out of order.
    #[error("group is at stage {at}, step needs {expected}")]
    WrongStage { at: GroupStage, expected: GroupStage },

    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    #[error("Output validation failed: {0}")]
    InvalidOutput(String),

    #[error("cannot read group directory: {0}")]
    UnreadableGroup(String),

    #[error("found {found} fragment(s), need at least {required}")]
    TooFewFragments { found: usize, required: usize },

    #[error(transparent)]
    Classification(#[from] ClassificationFailure),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// Metadata already failed while planning output names.
    #[error("{0}")]
    MetadataUnavailable(String),

    #[error(transparent)]
    Mux(#[from] MuxError),

    #[error("cleanup requested before any mux attempt")]
    MuxNotAttempted,
}

impl StepError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }
}

pub type StepResult<T> = Result<T, StepError>;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StreamKind;

    #[test]
    fn wrong_stage_names_both_stages() {
        let err = StepError::WrongStage {
            at: GroupStage::Trimmed,
            expected: GroupStage::Paired,
        };
        let msg = err.to_string();
        assert!(msg.contains(&GroupStage::Trimmed.to_string()));
        assert!(msg.contains(&GroupStage::Paired.to_string()));
    }

    #[test]
    fn pipeline_error_reason_is_the_step_error() {
        let step_err = StepError::from(ClassificationFailure::Ambiguous {
            kind: StreamKind::Video,
            count: 2,
        });
        let err = PipelineError::new("12345", "Pair", GroupStage::Classified, step_err);

        let msg = err.to_string();
        assert!(msg.contains("12345"));
        assert!(msg.contains("Pair"));
        assert!(err.reason().starts_with("ambiguous video stream"));
    }
}
