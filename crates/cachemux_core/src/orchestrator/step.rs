//! The contract every group pipeline step fulfils.

use super::errors::StepResult;
use super::types::{Context, GroupState, StepOutcome};
use crate::models::GroupStage;

/// One transition of the group state machine.
///
/// A step runs only when the group is exactly at [`requires`](Self::requires);
/// the pipeline checks this before calling `validate_input`. When
/// `execute` and both validations pass, the group moves to
/// [`stage`](Self::stage).
///
/// ```ignore
/// struct PairStep;
///
/// impl PipelineStep for PairStep {
///     fn name(&self) -> &str { "Pair" }
///     fn requires(&self) -> GroupStage { GroupStage::Classified }
///     fn stage(&self) -> GroupStage { GroupStage::Paired }
///
///     fn execute(&self, _ctx: &Context, state: &mut GroupState) -> StepResult<StepOutcome> {
///         let pair = pair_fragments(&state.fragments)?;
///         state.video = Some(pair.video);
///         state.audio = Some(pair.audio);
///         Ok(StepOutcome::Success)
///     }
/// }
/// ```
pub trait PipelineStep: Send + Sync {
    /// Short name used in logs and skip reasons.
    fn name(&self) -> &str;

    fn requires(&self) -> GroupStage;

    fn stage(&self) -> GroupStage;

    /// Step-specific preconditions beyond the stage check.
    fn validate_input(&self, _ctx: &Context, _state: &GroupState) -> StepResult<()> {
        Ok(())
    }

    /// Record results in `state`; the only method allowed to touch the filesystem.
    fn execute(&self, ctx: &Context, state: &mut GroupState) -> StepResult<StepOutcome>;

    /// Checked only after `execute` returned `Success`.
    fn validate_output(&self, _ctx: &Context, _state: &GroupState) -> StepResult<()> {
        Ok(())
    }

    fn description(&self) -> &str {
        self.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopStep;

    impl PipelineStep for NoopStep {
        fn name(&self) -> &str {
            "Noop"
        }

        fn requires(&self) -> GroupStage {
            GroupStage::Discovered
        }

        fn stage(&self) -> GroupStage {
            GroupStage::Trimmed
        }

        fn execute(&self, _ctx: &Context, _state: &mut GroupState) -> StepResult<StepOutcome> {
            Ok(StepOutcome::Success)
        }
    }

    #[test]
    fn defaults_fall_back_to_name() {
        let step: Box<dyn PipelineStep> = Box::new(NoopStep);

        assert_eq!(step.description(), "Noop");
        assert_eq!(step.requires().next(), Some(step.stage()));
    }
}
