//! Trim step - strips the cache header from every fragment.
//!
//! A fragment that cannot be trimmed is dropped from the group with a
//! warning; the remaining ones continue. Pairing later decides whether
//! what is left is usable.

use crate::models::GroupStage;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, GroupState, StepOutcome};
use crate::trim::FragmentTrimmer;

/// Fewest fragments a group can be paired from.
pub const MIN_FRAGMENTS: usize = 2;

/// Trim step for writing header-free copies of the fragments.
pub struct TrimStep;

impl TrimStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TrimStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for TrimStep {
    fn name(&self) -> &str {
        "Trim"
    }

    fn requires(&self) -> GroupStage {
        GroupStage::Discovered
    }

    fn stage(&self) -> GroupStage {
        GroupStage::Trimmed
    }

    fn description(&self) -> &str {
        "Strip the fixed header from each fragment"
    }

    fn validate_input(&self, ctx: &Context, _state: &GroupState) -> StepResult<()> {
        if let Some(reason) = &ctx.group.scan_error {
            return Err(StepError::UnreadableGroup(reason.clone()));
        }
        let found = ctx.group.fragments.len();
        if found < MIN_FRAGMENTS {
            return Err(StepError::TooFewFragments {
                found,
                required: MIN_FRAGMENTS,
            });
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut GroupState) -> StepResult<StepOutcome> {
        let trimmer = FragmentTrimmer::from_settings(&ctx.settings.processing);
        ctx.logger.info(&format!(
            "Trimming {} fragment(s) ({}-byte header)",
            ctx.group.fragments.len(),
            trimmer.header_skip_bytes()
        ));

        for fragment in &ctx.group.fragments {
            match trimmer.trim(&fragment.source_path) {
                Ok(trimmed) => {
                    ctx.logger.debug(&format!(
                        "{} -> {}",
                        fragment.display_name(),
                        trimmed.display()
                    ));
                    state.fragments.push(fragment.clone().with_trimmed(trimmed));
                }
                Err(e) => {
                    ctx.logger
                        .warn(&format!("Skipping fragment {}: {}", fragment.display_name(), e));
                    state.trim_failures.push(e.to_string());
                }
            }
        }

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &GroupState) -> StepResult<()> {
        for fragment in &state.fragments {
            let exists = fragment
                .trimmed_path
                .as_ref()
                .map(|p| p.is_file())
                .unwrap_or(false);
            if !exists {
                return Err(StepError::invalid_output(format!(
                    "Trimmed copy of {} missing",
                    fragment.display_name()
                )));
            }
        }
        Ok(())
    }
}
