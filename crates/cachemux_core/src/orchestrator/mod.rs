//! Pipeline orchestrator for coordinating group processing.
//!
//! This module provides the infrastructure for running each cached group
//! through a fixed sequence of steps. Each step validates, executes, and
//! records its results, and moves the group one stage forward.
//!
//! # Architecture
//!
//! ```text
//! BatchRunner
//!     └── per group: Pipeline
//!             ├── Step: Trim      -> Trimmed
//!             ├── Step: Classify  -> Classified
//!             ├── Step: Pair      -> Paired
//!             ├── Step: Metadata  -> MetadataResolved
//!             ├── Step: Mux       -> Muxed
//!             └── Step: Cleanup   -> CleanedUp
//! ```
//!
//! Any failure ends the pass with `GroupOutcome::Skipped`, recording the
//! last stage reached.
//!
//! # Example
//!
//! ```ignore
//! use cachemux_core::orchestrator::{create_group_pipeline, Context};
//!
//! let ctx = Context::new(group, settings, output_dir, logger, prober);
//! let outcome = create_group_pipeline().process(&ctx);
//! ```

mod batch;
mod errors;
mod pipeline;
mod step;
pub mod steps;
mod types;

pub use batch::{plan_outputs, BatchError, BatchRunner};
pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::Pipeline;
pub use step::PipelineStep;
pub use steps::{ClassifyStep, CleanupStep, MetadataStep, MuxStep, PairStep, TrimStep};
pub use types::{CleanupOutput, Context, GroupState, MuxOutput, OutputPlan, StepOutcome};

/// Create the group pipeline with all steps in the correct order.
///
/// 1. Trim - strip the cache header from each fragment
/// 2. Classify - probe each trimmed fragment
/// 3. Pair - pick one video and one audio fragment
/// 4. Metadata - fix the output path from the sidecar
/// 5. Mux - remux with ffmpeg stream copy
/// 6. Cleanup - remove the trimmed copies
pub fn create_group_pipeline() -> Pipeline {
    Pipeline::new()
        .with_step(TrimStep::new())
        .with_step(ClassifyStep::new())
        .with_step(PairStep::new())
        .with_step(MetadataStep::new())
        .with_step(MuxStep::new())
        .with_step(CleanupStep::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GroupStage;

    #[test]
    fn group_pipeline_walks_every_stage_in_order() {
        let pipeline = create_group_pipeline();
        assert_eq!(
            pipeline.step_names(),
            vec!["Trim", "Classify", "Pair", "Metadata", "Mux", "Cleanup"]
        );

        let stages = [
            (TrimStep::new().requires(), TrimStep::new().stage()),
            (ClassifyStep::new().requires(), ClassifyStep::new().stage()),
            (PairStep::new().requires(), PairStep::new().stage()),
            (MetadataStep::new().requires(), MetadataStep::new().stage()),
            (MuxStep::new().requires(), MuxStep::new().stage()),
            (CleanupStep::new().requires(), CleanupStep::new().stage()),
        ];
        let mut expected = GroupStage::Discovered;
        for (requires, stage) in stages {
            assert_eq!(requires, expected);
            expected = expected.next().unwrap();
            assert_eq!(stage, expected);
        }
    }
}
