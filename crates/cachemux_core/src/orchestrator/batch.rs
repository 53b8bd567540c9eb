//! Batch runner for processing every group under the input root.
//!
//! The `BatchRunner` validates the roots, discovers groups, plans every
//! output name up front, and then runs the group pipeline for each group
//! either sequentially or on a rayon thread pool.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use thiserror::Error;

use crate::config::{validate_settings, ConfigError, Settings};
use crate::discovery::discover_groups;
use crate::logging::{GroupLogger, LogConfig};
use crate::metadata::{derive_base_name, resolve_metadata};
use crate::models::{BatchReport, CollisionPolicy, Group, GroupOutcome};
use crate::probe::{create_prober, StreamProber};

use super::steps::MIN_FRAGMENTS;
use super::types::{Context, OutputPlan};
use super::create_group_pipeline;

/// Conditions that stop the batch before any group runs.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("{0} is not set")]
    NotSet(&'static str),

    #[error("{what} must be an absolute path: {}", .path.display())]
    RelativePath { what: &'static str, path: PathBuf },

    #[error("Input root does not exist or is not a directory: {}", .0.display())]
    InputRootMissing(PathBuf),

    #[error("Cannot create output root {}: {source}", .path.display())]
    OutputRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot scan input root {}: {source}", .path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot start worker pool: {0}")]
    ThreadPool(String),

    #[error(transparent)]
    Settings(#[from] ConfigError),
}

/// Runs the group pipeline over a whole input root.
///
/// # Example
///
/// ```ignore
/// let runner = BatchRunner::new(settings);
/// let report = runner.run()?;
/// println!("{} completed, {} skipped", report.completed_count(), report.skipped_count());
/// ```
pub struct BatchRunner {
    /// Application settings.
    settings: Settings,
    /// Stream classifier shared by all groups.
    prober: Arc<dyn StreamProber>,
}

impl BatchRunner {
    /// Create a runner using the prober selected in `settings.tools`.
    pub fn new(settings: Settings) -> Self {
        let prober = create_prober(&settings.tools);
        Self { settings, prober }
    }

    /// Replace the stream classifier.
    pub fn with_prober(mut self, prober: Arc<dyn StreamProber>) -> Self {
        self.prober = prober;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Check the settings and roots, then create the output root.
    ///
    /// Returns `(input_root, output_root)`.
    pub fn prepare_roots(&self) -> Result<(PathBuf, PathBuf), BatchError> {
        validate_settings(&self.settings)?;

        let input_root = required_absolute("paths.input_root", &self.settings.paths.input_root)?;
        let output_root =
            required_absolute("paths.output_root", &self.settings.paths.output_root)?;

        if !input_root.is_dir() {
            return Err(BatchError::InputRootMissing(input_root));
        }

        fs::create_dir_all(&output_root).map_err(|source| BatchError::OutputRoot {
            path: output_root.clone(),
            source,
        })?;

        Ok((input_root, output_root))
    }

    /// Directory for per-group log files (relative folders live under the output root).
    pub fn logs_dir(&self, output_root: &Path) -> PathBuf {
        let folder = self.settings.logs_folder();
        if folder.is_absolute() {
            folder
        } else {
            output_root.join(folder)
        }
    }

    /// Process every group and report per-group outcomes.
    pub fn run(&self) -> Result<BatchReport, BatchError> {
        let (input_root, output_root) = self.prepare_roots()?;
        self.run_prepared(&input_root, &output_root)
    }

    /// Like [`run`](Self::run), for roots already returned by
    /// [`prepare_roots`](Self::prepare_roots).
    pub fn run_prepared(
        &self,
        input_root: &Path,
        output_root: &Path,
    ) -> Result<BatchReport, BatchError> {
        let groups = discover_groups(input_root, &self.settings.processing).map_err(|source| {
            BatchError::Discovery {
                path: input_root.to_path_buf(),
                source,
            }
        })?;

        let plans = plan_outputs(&groups, &self.settings, output_root);
        let work: Vec<(Group, OutputPlan)> = groups.into_iter().zip(plans).collect();
        let total = work.len();

        let parallel = self.settings.processing.parallel_groups.max(1);
        tracing::info!(
            "Processing {} group(s) from {} into {} ({} worker(s))",
            total,
            input_root.display(),
            output_root.display(),
            parallel
        );

        let outcomes: Vec<GroupOutcome> = if parallel > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(parallel)
                .build()
                .map_err(|e| BatchError::ThreadPool(e.to_string()))?;
            pool.install(|| {
                work.into_par_iter()
                    .map(|(group, plan)| self.process_group(group, plan, output_root))
                    .collect()
            })
        } else {
            work.into_iter()
                .enumerate()
                .map(|(i, (group, plan))| {
                    tracing::info!("Processing group {}/{}: {}", i + 1, total, group.name());
                    self.process_group(group, plan, output_root)
                })
                .collect()
        };

        let report = BatchReport { outcomes };
        tracing::info!(
            "Batch finished: {} completed, {} skipped",
            report.completed_count(),
            report.skipped_count()
        );
        Ok(report)
    }

    /// Run the pipeline for a single group.
    pub fn process_group(&self, group: Group, plan: OutputPlan, output_root: &Path) -> GroupOutcome {
        let group_name = group.name();
        let logger = Arc::new(self.create_logger(&group_name, output_root));

        let ctx = Context::new(
            group,
            self.settings.clone(),
            output_root.to_path_buf(),
            Arc::clone(&logger),
            Arc::clone(&self.prober),
        )
        .with_plan(plan);

        let outcome = create_group_pipeline().process(&ctx);
        logger.close();
        outcome
    }

    fn create_logger(&self, group_name: &str, output_root: &Path) -> GroupLogger {
        let config = LogConfig::from(&self.settings.logging);
        if !self.settings.logging.group_logs {
            return GroupLogger::console(group_name, config);
        }

        let logs_dir = self.logs_dir(output_root);
        match GroupLogger::to_file(group_name, &logs_dir, config.clone()) {
            Ok(logger) => logger,
            Err(e) => {
                tracing::warn!(
                    "Cannot create log file for {} in {}: {}",
                    group_name,
                    logs_dir.display(),
                    e
                );
                GroupLogger::console(group_name, config)
            }
        }
    }
}

fn required_absolute(what: &'static str, value: &str) -> Result<PathBuf, BatchError> {
    if value.trim().is_empty() {
        return Err(BatchError::NotSet(what));
    }
    let path = PathBuf::from(value);
    if !path.is_absolute() {
        return Err(BatchError::RelativePath { what, path });
    }
    Ok(path)
}

/// Resolve metadata and assign output paths for `groups`, in order.
///
/// Groups that cannot reach the metadata stage (too few fragments) get
/// `Unplanned` and reserve no name. With `CollisionPolicy::Suffix`, a
/// name already taken (case-insensitively) by an earlier group gets
/// `_2`, `_3`, ... appended.
pub fn plan_outputs(groups: &[Group], settings: &Settings, output_root: &Path) -> Vec<OutputPlan> {
    let extension = &settings.processing.output_extension;
    let mut taken: HashSet<String> = HashSet::new();

    groups
        .iter()
        .map(|group| {
            if group.fragments.len() < MIN_FRAGMENTS {
                return OutputPlan::Unplanned;
            }

            let sidecar = group
                .sidecar_path
                .clone()
                .unwrap_or_else(|| group.directory.join(&settings.processing.metadata_file));
            let metadata = match resolve_metadata(&sidecar) {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!("Group {}: {}", group.name(), e);
                    return OutputPlan::Failed(e.to_string());
                }
            };

            let base = derive_base_name(&metadata);
            let name = match settings.processing.collision_policy {
                CollisionPolicy::Suffix => unique_name(&base, &mut taken),
                CollisionPolicy::Overwrite => {
                    if !taken.insert(base.to_lowercase()) {
                        tracing::warn!(
                            "Group {} writes {}.{} again; the earlier output will be overwritten",
                            group.name(),
                            base,
                            extension
                        );
                    }
                    base
                }
            };

            OutputPlan::Ready {
                metadata,
                output_path: output_root.join(format!("{}.{}", name, extension)),
            }
        })
        .collect()
}

fn unique_name(base: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(base.to_lowercase()) {
        return base.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}_{}", base, n);
        if taken.insert(candidate.to_lowercase()) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Fragment;
    use tempfile::tempdir;

    fn group_with_sidecar(root: &Path, name: &str, json: &str) -> Group {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        let sidecar = dir.join("videoInfo.json");
        fs::write(&sidecar, json).unwrap();
        let mut group = Group::new(&dir);
        group.fragments = vec![
            Fragment::new(dir.join("seg1.m4s")),
            Fragment::new(dir.join("seg2.m4s")),
        ];
        group.sidecar_path = Some(sidecar);
        group
    }

    fn planned_name(plan: &OutputPlan) -> String {
        match plan {
            OutputPlan::Ready { output_path, .. } => output_path
                .file_name()
                .unwrap()
                .to_string_lossy()
                .to_string(),
            other => panic!("expected a planned output, got {:?}", other),
        }
    }

    #[test]
    fn colliding_names_get_suffixes_in_order() {
        let root = tempdir().unwrap();
        let json = r#"{"title":"Foo","groupTitle":"Foo","p":1}"#;
        let groups = vec![
            group_with_sidecar(root.path(), "a", json),
            group_with_sidecar(root.path(), "b", json),
            group_with_sidecar(root.path(), "c", json),
        ];

        let plans = plan_outputs(&groups, &Settings::default(), Path::new("/out"));

        let names: Vec<String> = plans.iter().map(planned_name).collect();
        assert_eq!(names, vec!["Foo_1.mp4", "Foo_1_2.mp4", "Foo_1_3.mp4"]);
    }

    #[test]
    fn overwrite_policy_keeps_the_same_name() {
        let root = tempdir().unwrap();
        let json = r#"{"title":"Foo","groupTitle":"Foo","p":1}"#;
        let groups = vec![
            group_with_sidecar(root.path(), "a", json),
            group_with_sidecar(root.path(), "b", json),
        ];
        let mut settings = Settings::default();
        settings.processing.collision_policy = CollisionPolicy::Overwrite;

        let plans = plan_outputs(&groups, &settings, Path::new("/out"));
        assert_eq!(planned_name(&plans[0]), planned_name(&plans[1]));
    }

    #[test]
    fn bad_metadata_and_small_groups_reserve_nothing() {
        let root = tempdir().unwrap();
        let json = r#"{"title":"Foo","groupTitle":"Foo","p":1}"#;
        let mut small = group_with_sidecar(root.path(), "a", json);
        small.fragments.truncate(1);
        let groups = vec![
            small,
            group_with_sidecar(root.path(), "b", "{broken"),
            group_with_sidecar(root.path(), "c", json),
        ];

        let plans = plan_outputs(&groups, &Settings::default(), Path::new("/out"));

        assert_eq!(plans[0], OutputPlan::Unplanned);
        assert!(matches!(plans[1], OutputPlan::Failed(_)));
        assert_eq!(planned_name(&plans[2]), "Foo_1.mp4");
    }

    #[test]
    fn suffix_skips_names_already_taken() {
        let mut taken = HashSet::new();
        assert_eq!(unique_name("Show_1_2", &mut taken), "Show_1_2");
        assert_eq!(unique_name("Show_1", &mut taken), "Show_1");
        assert_eq!(unique_name("Show_1", &mut taken), "Show_1_3");
        assert_eq!(unique_name("show_1", &mut taken), "show_1_4");
    }

    #[test]
    fn roots_must_be_absolute_and_present() {
        let mut settings = Settings::default();
        assert!(matches!(
            BatchRunner::new(settings.clone()).prepare_roots(),
            Err(BatchError::NotSet("paths.input_root"))
        ));

        settings.paths.input_root = "relative/in".into();
        settings.paths.output_root = "/tmp/out".into();
        assert!(matches!(
            BatchRunner::new(settings.clone()).prepare_roots(),
            Err(BatchError::RelativePath { .. })
        ));

        let root = tempdir().unwrap();
        settings.paths.input_root = root.path().join("missing").to_string_lossy().to_string();
        assert!(matches!(
            BatchRunner::new(settings).prepare_roots(),
            Err(BatchError::InputRootMissing(_))
        ));
    }

    #[test]
    fn prepare_creates_output_root() {
        let root = tempdir().unwrap();
        let mut settings = Settings::default();
        settings.paths.input_root = root.path().to_string_lossy().to_string();
        let out = root.path().join("nested").join("out");
        settings.paths.output_root = out.to_string_lossy().to_string();

        let runner = BatchRunner::new(settings);
        let (_, output_root) = runner.prepare_roots().unwrap();

        assert!(output_root.is_dir());
        assert_eq!(runner.logs_dir(&output_root), out.join(".logs"));
    }

    #[test]
    fn invalid_settings_stop_the_batch() {
        let root = tempdir().unwrap();
        let mut settings = Settings::default();
        settings.paths.input_root = root.path().to_string_lossy().to_string();
        settings.paths.output_root = root.path().join("out").to_string_lossy().to_string();
        settings.processing.temp_prefix = String::new();

        let err = BatchRunner::new(settings).run().unwrap_err();
        assert!(matches!(err, BatchError::Settings(_)));
        assert!(!root.path().join("out").exists());
    }
}
