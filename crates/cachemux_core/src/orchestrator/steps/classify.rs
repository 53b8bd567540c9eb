//! Classify step - probes each trimmed fragment once.

use crate::models::{GroupStage, StreamKind};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, GroupState, StepOutcome};

/// Classify step for tagging fragments as video, audio or unknown.
///
/// Inspector failures never fail the step; the fragment stays `Unknown`.
pub struct ClassifyStep;

impl ClassifyStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ClassifyStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for ClassifyStep {
    fn name(&self) -> &str {
        "Classify"
    }

    fn requires(&self) -> GroupStage {
        GroupStage::Trimmed
    }

    fn stage(&self) -> GroupStage {
        GroupStage::Classified
    }

    fn description(&self) -> &str {
        "Identify the stream kind of each trimmed fragment"
    }

    fn validate_input(&self, _ctx: &Context, state: &GroupState) -> StepResult<()> {
        if let Some(f) = state.fragments.iter().find(|f| !f.is_trimmed()) {
            return Err(StepError::invalid_input(format!(
                "{} has no trimmed copy",
                f.display_name()
            )));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut GroupState) -> StepResult<StepOutcome> {
        ctx.logger
            .info(&format!("Probing with {} strategy", ctx.prober.name()));

        for fragment in state.fragments.iter_mut() {
            let kind = match ctx.prober.probe(fragment.media_path()) {
                Ok(kind) => kind,
                Err(e) => {
                    ctx.logger
                        .warn(&format!("Could not classify {}: {}", fragment.display_name(), e));
                    StreamKind::Unknown
                }
            };
            ctx.logger
                .info(&format!("{}: {}", fragment.display_name(), kind));
            fragment.kind = kind;
        }

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, _state: &GroupState) -> StepResult<()> {
        Ok(())
    }
}
