//! Mux step - remuxes the pair into the output file using ffmpeg.

use crate::models::{GroupStage, OutputJob};
use crate::mux::Muxer;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, GroupState, MuxOutput, StepOutcome};

/// Mux step for combining video, audio and cover with ffmpeg.
///
/// Builds an `OutputJob` from the pair and the planned output path and
/// hands it to the `Muxer`.
pub struct MuxStep;

impl MuxStep {
    pub fn new() -> Self {
        Self
    }

    /// Build the job from the paired state.
    fn build_job(&self, ctx: &Context, state: &GroupState) -> StepResult<OutputJob> {
        let (Some(video), Some(audio), Some(output_path)) =
            (&state.video, &state.audio, &state.output_path)
        else {
            return Err(StepError::invalid_input("Pair or output path missing"));
        };

        Ok(OutputJob::new(video.clone(), audio.clone(), output_path.clone())
            .with_cover(ctx.group.cover_image_path.clone()))
    }
}

impl Default for MuxStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for MuxStep {
    fn name(&self) -> &str {
        "Mux"
    }

    fn requires(&self) -> GroupStage {
        GroupStage::MetadataResolved
    }

    fn stage(&self) -> GroupStage {
        GroupStage::Muxed
    }

    fn description(&self) -> &str {
        "Remux video and audio (and cover) with ffmpeg stream copy"
    }

    fn validate_input(&self, ctx: &Context, state: &GroupState) -> StepResult<()> {
        self.build_job(ctx, state).map(|_| ())
    }

    fn execute(&self, ctx: &Context, state: &mut GroupState) -> StepResult<StepOutcome> {
        let job = self.build_job(ctx, state)?;

        ctx.logger.section("Executing ffmpeg");
        if let Some(ref cover) = job.cover_image {
            ctx.logger
                .info(&format!("Cover image: {}", cover.display()));
        }

        state.mux_attempted = true;
        let report = Muxer::from_settings(&ctx.settings).mux(&job, &ctx.logger)?;

        if report.used_hwaccel {
            ctx.logger.debug("Muxed with hwaccel hint");
        }

        state.mux = Some(MuxOutput {
            output_path: job.output_path.clone(),
        });

        ctx.logger.success(&format!(
            "Muxed to: {}",
            job.output_path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
        ));

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &GroupState) -> StepResult<()> {
        // Check that mux output was recorded
        let mux = state
            .mux
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Mux results not recorded"))?;

        // Check that output file exists
        if !mux.output_path.exists() {
            return Err(StepError::invalid_output(format!(
                "Output file not created: {}",
                mux.output_path.display()
            )));
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
    use crate::probe::create_prober;
    use std::path::PathBuf;
    use std::sync::Arc;

    #[test]
    fn mux_step_has_correct_name() {
        let step = MuxStep::new();
        assert_eq!(step.name(), "Mux");
        assert_eq!(step.stage(), GroupStage::Muxed);
    }

    #[test]
    fn job_carries_cover_image() {
        let settings = Settings::default();
        let prober = create_prober(&settings.tools);
        let mut group = Group::new("/in/g");
        group.cover_image_path = Some(PathBuf::from("/in/g/image.jpg"));
        let ctx = Context::new(
            group,
            settings,
            "/out".into(),
            Arc::new(GroupLogger::console("g", LogConfig::default())),
            prober,
        );

        let mut state = GroupState::new("g");
        state.stage = GroupStage::MetadataResolved;
        state.video = Some(Fragment::new("/in/g/seg1.m4s").with_kind(StreamKind::Video));
        state.audio = Some(Fragment::new("/in/g/seg2.m4s").with_kind(StreamKind::Audio));
        state.output_path = Some(PathBuf::from("/out/Show_1.mp4"));

        let step = MuxStep::new();
        step.validate_input(&ctx, &state).unwrap();
        let job = step.build_job(&ctx, &state).unwrap();
        assert_eq!(job.cover_image, Some(PathBuf::from("/in/g/image.jpg")));
        assert_eq!(job.output_path, PathBuf::from("/out/Show_1.mp4"));
    }
}
