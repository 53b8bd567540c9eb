//! Core types for the orchestrator pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Settings;
use crate::logging::GroupLogger;
use crate::models::{Fragment, Group, GroupStage, Metadata};
use crate::probe::StreamProber;

/// Output name decided for a group before its pipeline runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputPlan {
    /// Nothing decided up front; the metadata step resolves the sidecar itself.
    Unplanned,
    /// Metadata resolved and a collision-free output path assigned.
    Ready {
        metadata: Metadata,
        output_path: PathBuf,
    },
    /// Metadata could not be resolved; the group skips at the metadata step.
    Failed(String),
}

/// Read-only context passed to pipeline steps.
///
/// Contains group configuration and shared resources that steps can read
/// but not modify. Mutable state goes in `GroupState`.
pub struct Context {
    /// The discovered group.
    pub group: Group,
    /// Application settings.
    pub settings: Settings,
    /// Group name (directory name).
    pub group_name: String,
    /// Flat output directory.
    pub output_dir: PathBuf,
    /// Output name decided during batch planning.
    pub plan: OutputPlan,
    /// Per-group logger.
    pub logger: Arc<GroupLogger>,
    /// Stream classifier.
    pub prober: Arc<dyn StreamProber>,
}

impl Context {
    /// Create a new context for a group.
    pub fn new(
        group: Group,
        settings: Settings,
        output_dir: PathBuf,
        logger: Arc<GroupLogger>,
        prober: Arc<dyn StreamProber>,
    ) -> Self {
        Self {
            group_name: group.name(),
            group,
            settings,
            output_dir,
            plan: OutputPlan::Unplanned,
            logger,
            prober,
        }
    }

    /// Set the output plan.
    pub fn with_plan(mut self, plan: OutputPlan) -> Self {
        self.plan = plan;
        self
    }

    /// Where the group's sidecar is (or would be).
    pub fn sidecar_path(&self) -> PathBuf {
        self.group
            .sidecar_path
            .clone()
            .unwrap_or_else(|| self.group.directory.join(&self.settings.processing.metadata_file))
    }
}

/// Mutable state accumulated by pipeline steps for one group.
///
/// Steps only add to it; `stage` moves forward once per successful step.
#[derive(Debug, Clone, Default)]
pub struct GroupState {
    /// Group name.
    pub group_name: String,
    /// Last stage reached.
    pub stage: GroupStage,
    /// Successfully trimmed fragments (with kinds once classified).
    pub fragments: Vec<Fragment>,
    /// Fragments that could not be trimmed, with the reason.
    pub trim_failures: Vec<String>,
    /// Selected video fragment (from Pair step).
    pub video: Option<Fragment>,
    /// Selected audio fragment (from Pair step).
    pub audio: Option<Fragment>,
    /// Resolved metadata.
    pub metadata: Option<Metadata>,
    /// Output path decided by the metadata step.
    pub output_path: Option<PathBuf>,
    /// Whether ffmpeg has been run for this group.
    pub mux_attempted: bool,
    /// Mux step results.
    pub mux: Option<MuxOutput>,
    /// Cleanup step results.
    pub cleanup: Option<CleanupOutput>,
}

impl GroupState {
    /// Create a new state for the named group.
    pub fn new(group_name: impl Into<String>) -> Self {
        Self {
            group_name: group_name.into(),
            ..Default::default()
        }
    }

    /// Trimmed copies written so far.
    pub fn temp_paths(&self) -> Vec<PathBuf> {
        self.fragments
            .iter()
            .filter_map(|f| f.trimmed_path.clone())
            .collect()
    }

    /// Whether temporaries still need removing.
    pub fn has_pending_temps(&self) -> bool {
        self.cleanup.is_none() && self.fragments.iter().any(|f| f.is_trimmed())
    }
}

/// Output from the Mux step.
#[derive(Debug, Clone)]
pub struct MuxOutput {
    /// Path to the muxed file.
    pub output_path: PathBuf,
}

/// Output from the Cleanup step.
#[derive(Debug, Clone, Default)]
pub struct CleanupOutput {
    /// Temporaries that could not be removed; carried into the group outcome.
    pub warnings: Vec<String>,
}

/// Result of executing a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed successfully.
    Success,
    /// Step had nothing to do (not an error).
    Skipped(String),
}
