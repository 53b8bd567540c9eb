//! Cleanup step - removes trimmed fragments after a successful mux.
//!
//! Failed passes are cleaned up by the pipeline itself, according to the
//! cleanup policy.

use crate::cleanup::cleanup;
use crate::models::GroupStage;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{CleanupOutput, Context, GroupState, StepOutcome};

pub struct CleanupStep;

impl CleanupStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CleanupStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for CleanupStep {
    fn name(&self) -> &str {
        "Cleanup"
    }

    fn requires(&self) -> GroupStage {
        GroupStage::Muxed
    }

    fn stage(&self) -> GroupStage {
        GroupStage::CleanedUp
    }

    fn description(&self) -> &str {
        "Remove temporary trimmed fragments"
    }

    fn validate_input(&self, _ctx: &Context, state: &GroupState) -> StepResult<()> {
        if !state.mux_attempted {
            return Err(StepError::MuxNotAttempted);
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut GroupState) -> StepResult<StepOutcome> {
        let temps = state.temp_paths();
        if temps.is_empty() {
            state.cleanup = Some(CleanupOutput::default());
            return Ok(StepOutcome::Skipped("no temporary files".to_string()));
        }

        let report = cleanup(&temps);
        for warning in &report.warnings {
            ctx.logger.warn(&warning.to_string());
        }
        ctx.logger.info(&format!(
            "Removed {} of {} temporary file(s)",
            report.removed.len(),
            temps.len()
        ));

        state.cleanup = Some(CleanupOutput {
            warnings: report.warnings.iter().map(|w| w.to_string()).collect(),
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &GroupState) -> StepResult<()> {
        if state.cleanup.is_none() {
            return Err(StepError::invalid_output("Cleanup not recorded"));
        }
        Ok(())
    }
}
