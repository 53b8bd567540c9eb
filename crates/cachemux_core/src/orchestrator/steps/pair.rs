//! Pair step - selects one video and one audio fragment.

use crate::models::GroupStage;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, GroupState, StepOutcome};
use crate::pairing::pair_fragments;

pub struct PairStep;

impl PairStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PairStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for PairStep {
    fn name(&self) -> &str {
        "Pair"
    }

    fn requires(&self) -> GroupStage {
        GroupStage::Classified
    }

    fn stage(&self) -> GroupStage {
        GroupStage::Paired
    }

    fn description(&self) -> &str {
        "Select exactly one video and one audio fragment"
    }

    fn execute(&self, ctx: &Context, state: &mut GroupState) -> StepResult<StepOutcome> {
        let pair = pair_fragments(&state.fragments)?;

        ctx.logger.info(&format!(
            "Video: {}, audio: {}",
            pair.video.display_name(),
            pair.audio.display_name()
        ));

        state.video = Some(pair.video);
        state.audio = Some(pair.audio);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &GroupState) -> StepResult<()> {
        if state.video.is_none() || state.audio.is_none() {
            return Err(StepError::invalid_output("Pair not recorded"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::logging::{GroupLogger, LogConfig};
    use crate::models::{Fragment, Group, StreamKind};
    use crate::pairing::ClassificationFailure;
    use crate::probe::create_prober;
    use std::sync::Arc;

    fn context() -> Context {
        let settings = Settings::default();
        let prober = create_prober(&settings.tools);
        Context::new(
            Group::new("/in/g"),
            settings,
            "/out".into(),
            Arc::new(GroupLogger::console("g", LogConfig::default())),
            prober,
        )
    }

    fn classified(name: &str, kind: StreamKind) -> Fragment {
        Fragment::new(format!("/in/g/{}", name))
            .with_trimmed(format!("/in/g/#{}", name))
            .with_kind(kind)
    }

    #[test]
    fn records_the_selected_pair() {
        let ctx = context();
        let mut state = GroupState::new("g");
        state.stage = GroupStage::Classified;
        state.fragments = vec![
            classified("30280.m4s", StreamKind::Audio),
            classified("30080.m4s", StreamKind::Video),
        ];

        let step = PairStep::new();
        assert_eq!(step.execute(&ctx, &mut state).unwrap(), StepOutcome::Success);
        step.validate_output(&ctx, &state).unwrap();

        assert_eq!(state.video.unwrap().display_name(), "30080.m4s");
        assert_eq!(state.audio.unwrap().display_name(), "30280.m4s");
    }

    #[test]
    fn two_videos_are_a_classification_error() {
        let ctx = context();
        let mut state = GroupState::new("g");
        state.fragments = vec![
            classified("a.m4s", StreamKind::Video),
            classified("b.m4s", StreamKind::Video),
            classified("c.m4s", StreamKind::Audio),
        ];

        let err = PairStep::new().execute(&ctx, &mut state).unwrap_err();

        assert!(matches!(
            err,
            StepError::Classification(ClassificationFailure::Ambiguous {
                kind: StreamKind::Video,
                count: 2,
            })
        ));
        assert!(state.video.is_none());
        assert!(state.audio.is_none());
    }
}
