//! Metadata step - fixes the group's output path.
//!
//! Normally the batch planner has already resolved the sidecar and picked
//! a collision-free name (`OutputPlan::Ready`). A standalone pipeline run
//! (`OutputPlan::Unplanned`) resolves the sidecar here instead.

use crate::metadata::{derive_base_name, resolve_metadata};
use crate::models::GroupStage;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, GroupState, OutputPlan, StepOutcome};

pub struct MetadataStep;

impl MetadataStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MetadataStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for MetadataStep {
    fn name(&self) -> &str {
        "Metadata"
    }

    fn requires(&self) -> GroupStage {
        GroupStage::Paired
    }

    fn stage(&self) -> GroupStage {
        GroupStage::MetadataResolved
    }

    fn description(&self) -> &str {
        "Read the sidecar record and derive the output name"
    }

    fn execute(&self, ctx: &Context, state: &mut GroupState) -> StepResult<StepOutcome> {
        let (metadata, output_path) = match &ctx.plan {
            OutputPlan::Ready {
                metadata,
                output_path,
            } => (metadata.clone(), output_path.clone()),
            OutputPlan::Failed(reason) => {
                return Err(StepError::MetadataUnavailable(reason.clone()));
            }
            OutputPlan::Unplanned => {
                let metadata = resolve_metadata(&ctx.sidecar_path())?;
                let file_name = format!(
                    "{}.{}",
                    derive_base_name(&metadata),
                    ctx.settings.processing.output_extension
                );
                (metadata, ctx.output_dir.join(file_name))
            }
        };

        ctx.logger.info(&format!(
            "Title: '{}', group title: '{}', part {}",
            metadata.title, metadata.group_title, metadata.part
        ));
        ctx.logger.info(&format!("Output: {}", output_path.display()));

        state.metadata = Some(metadata);
        state.output_path = Some(output_path);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &GroupState) -> StepResult<()> {
        if state.output_path.is_none() {
            return Err(StepError::invalid_output("Output path not decided"));
        }
        Ok(())
    }
}
