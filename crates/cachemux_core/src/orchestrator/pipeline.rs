//! Pipeline runner that executes steps in sequence.

use super::errors::{PipelineError, PipelineResult, StepError, StepResult};
use super::step::PipelineStep;
use super::types::{CleanupOutput, Context, GroupState, StepOutcome};
use crate::cleanup::cleanup;
use crate::models::{CleanupPolicy, GroupOutcome};

/// Pipeline that runs a sequence of steps over one group.
///
/// The pipeline executes steps in order, running validation before
/// and after each step. The first failure ends the pass.
pub struct Pipeline {
    /// Steps to execute in order.
    steps: Vec<Box<dyn PipelineStep>>,
}

impl Pipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Add a step to the pipeline.
    pub fn add_step<S: PipelineStep + 'static>(&mut self, step: S) -> &mut Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Add a step (builder pattern).
    pub fn with_step<S: PipelineStep + 'static>(mut self, step: S) -> Self {
        self.add_step(step);
        self
    }

    /// Run every step in order over `state`.
    ///
    /// Per step: stage check, `validate_input`, `execute`, then
    /// `validate_output` when the step did work. The group then advances
    /// to the step's stage. The first error ends the run.
    pub fn run(&self, ctx: &Context, state: &mut GroupState) -> PipelineResult<()> {
        for step in &self.steps {
            let step_name = step.name();
            ctx.logger.phase(step_name);
            ctx.logger.debug(step.description());

            if let Err(e) = run_step(step.as_ref(), ctx, state) {
                ctx.logger.error(&format!("{} failed: {}", step_name, e));
                return Err(PipelineError::new(
                    &ctx.group_name,
                    step_name,
                    state.stage,
                    e,
                ));
            }

            state.stage = step.stage();
        }

        Ok(())
    }

    /// Run one full pass for a group and turn the result into an outcome.
    ///
    /// On failure, trimmed temporaries are removed or kept according to
    /// `processing.cleanup_policy`. Fragments dropped while trimming are
    /// named in the skip reason; cleanup warnings travel with a completed
    /// outcome.
    pub fn process(&self, ctx: &Context) -> GroupOutcome {
        let mut state = GroupState::new(&ctx.group_name);

        match self.run(ctx, &mut state) {
            Ok(()) => match state.output_path.clone() {
                Some(output_path) if state.mux.is_some() => {
                    ctx.logger
                        .success(&format!("Wrote {}", output_path.display()));
                    let warnings = state.cleanup.take().map(|c| c.warnings).unwrap_or_default();
                    GroupOutcome::completed(&ctx.group_name, output_path).with_warnings(warnings)
                }
                _ => GroupOutcome::skipped(
                    &ctx.group_name,
                    state.stage,
                    "pipeline finished without producing an output",
                ),
            },
            Err(e) => {
                let stage = e.stage;
                let mut reason = e.reason();
                if !state.trim_failures.is_empty() {
                    reason = format!("{} ({})", reason, state.trim_failures.join("; "));
                }
                ctx.logger.skipped(&format!("at {}: {}", stage, reason));
                teardown(ctx, &mut state);
                GroupOutcome::skipped(&ctx.group_name, stage, reason)
            }
        }
    }

    /// Get the number of steps in the pipeline.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Get step names in order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn run_step(
    step: &dyn PipelineStep,
    ctx: &Context,
    state: &mut GroupState,
) -> StepResult<()> {
    if state.stage != step.requires() {
        return Err(StepError::WrongStage {
            at: state.stage,
            expected: step.requires(),
        });
    }

    step.validate_input(ctx, state)?;

    match step.execute(ctx, state)? {
        StepOutcome::Success => step.validate_output(ctx, state)?,
        StepOutcome::Skipped(reason) => {
            ctx.logger
                .debug(&format!("{} had nothing to do: {}", step.name(), reason));
        }
    }
    Ok(())
}

/// Remove (or keep) temporaries left by a failed pass.
fn teardown(ctx: &Context, state: &mut GroupState) {
    if !state.has_pending_temps() {
        return;
    }

    let temps = state.temp_paths();
    match ctx.settings.processing.cleanup_policy {
        CleanupPolicy::Always => {
            let report = cleanup(&temps);
            for warning in &report.warnings {
                ctx.logger.warn(&warning.to_string());
            }
            ctx.logger.debug(&format!(
                "Removed {} temporary file(s) after skip",
                report.removed.len()
            ));
            state.cleanup = Some(CleanupOutput {
                warnings: report.warnings.iter().map(|w| w.to_string()).collect(),
            });
        }
        CleanupPolicy::OnSuccess => {
            ctx.logger.info(&format!(
                "Keeping {} temporary file(s) for diagnosis",
                temps.len()
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::logging::{GroupLogger, LogConfig};
    use crate::models::{Group, GroupStage};
    use crate::probe::create_prober;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const STAGES: [GroupStage; 4] = [
        GroupStage::Discovered,
        GroupStage::Trimmed,
        GroupStage::Classified,
        GroupStage::Paired,
    ];

    struct CountingStep {
        name: &'static str,
        requires: GroupStage,
        stage: GroupStage,
        fail: bool,
        execute_count: Arc<AtomicUsize>,
    }

    impl CountingStep {
        fn new(
            name: &'static str,
            requires: GroupStage,
            stage: GroupStage,
            count: &Arc<AtomicUsize>,
        ) -> Self {
            Self {
                name,
                requires,
                stage,
                fail: false,
                execute_count: Arc::clone(count),
            }
        }

        fn at(name: &'static str, index: usize, count: &Arc<AtomicUsize>) -> Self {
            Self::new(name, STAGES[index], STAGES[index + 1], count)
        }

        fn failing(mut self) -> Self {
            self.fail = true;
            self
        }
    }

    impl PipelineStep for CountingStep {
        fn name(&self) -> &str {
            self.name
        }

        fn requires(&self) -> GroupStage {
            self.requires
        }

        fn stage(&self) -> GroupStage {
            self.stage
        }

        fn execute(&self, _ctx: &Context, _state: &mut GroupState) -> StepResult<StepOutcome> {
            self.execute_count.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(StepError::invalid_input("boom"));
            }
            Ok(StepOutcome::Success)
        }
    }

    fn test_context() -> Context {
        let settings = Settings::default();
        let prober = create_prober(&settings.tools);
        Context::new(
            Group::new("/input/123"),
            settings,
            "/output".into(),
            Arc::new(GroupLogger::console("123", LogConfig::default())),
            prober,
        )
    }

    #[test]
    fn pipeline_builds_correctly() {
        let count = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new()
            .with_step(CountingStep::at("Step1", 0, &count))
            .with_step(CountingStep::at("Step2", 1, &count));

        assert_eq!(pipeline.step_count(), 2);
        assert_eq!(pipeline.step_names(), vec!["Step1", "Step2"]);
    }

    #[test]
    fn run_advances_stage_per_step() {
        let count = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new()
            .with_step(CountingStep::at("Step1", 0, &count))
            .with_step(CountingStep::at("Step2", 1, &count));
        let ctx = test_context();
        let mut state = GroupState::new("123");

        pipeline.run(&ctx, &mut state).unwrap();

        assert_eq!(state.stage, GroupStage::Classified);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failure_stops_the_pass_and_records_last_stage() {
        crate::logging::init_test_tracing();
        let count = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new()
            .with_step(CountingStep::at("Step1", 0, &count))
            .with_step(CountingStep::at("Step2", 1, &count).failing())
            .with_step(CountingStep::at("Step3", 2, &count));
        let ctx = test_context();

        let outcome = pipeline.process(&ctx);

        assert_eq!(count.load(Ordering::SeqCst), 2);
        match outcome {
            GroupOutcome::Skipped { stage, reason, .. } => {
                assert_eq!(stage, GroupStage::Trimmed);
                assert!(reason.contains("boom"));
            }
            other => panic!("expected skip, got {:?}", other),
        }
    }

    #[test]
    fn out_of_order_step_is_rejected_before_execute() {
        let count = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new().with_step(CountingStep::new(
            "Late",
            GroupStage::Paired,
            GroupStage::MetadataResolved,
            &count,
        ));
        let mut state = GroupState::new("123");

        let err = pipeline.run(&test_context(), &mut state).unwrap_err();

        assert!(matches!(err.source, StepError::WrongStage { .. }));
        assert_eq!(err.stage, GroupStage::Discovered);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn pass_without_mux_is_not_completed() {
        let count = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new().with_step(CountingStep::at("Step1", 0, &count));

        let outcome = pipeline.process(&test_context());
        assert!(!outcome.is_completed());
    }
}
