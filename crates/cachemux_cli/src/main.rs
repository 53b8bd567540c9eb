mod commands;
mod logging;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use colored::Colorize;
use tracing::{debug, info};

use cachemux_core::config::{ConfigManager, Settings};
use cachemux_core::logging::{init_tracing, LogLevel};
use cachemux_core::models::{BatchReport, CleanupPolicy, CollisionPolicy, GroupOutcome};
use cachemux_core::orchestrator::BatchRunner;

use commands::{Cli, Commands, RunArgs};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Run(args)) => run(args),
        Some(Commands::InitConfig { config, force }) => init_config(&config, force),
        Some(Commands::PrintConfig { config }) => print_config(&config),
        None => {
            let mut cmd = Cli::command();
            return match cmd.print_long_help() {
                Ok(()) => ExitCode::SUCCESS,
                Err(_) => ExitCode::FAILURE,
            };
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: RunArgs) -> Result<()> {
    let mut settings = load_settings(&args.config)?;
    apply_overrides(&mut settings, &args)?;

    let runner = BatchRunner::new(settings);

    // File logging starts only once the roots are valid
    let (input_root, output_root) = runner.prepare_roots().context("batch run failed")?;
    let log_dir = runner.logs_dir(&output_root);
    let _guard = logging::init_logger(runner.settings().logging.level, Some(log_dir.as_path()));

    debug!("Effective settings: {:?}", runner.settings());

    let report = runner
        .run_prepared(&input_root, &output_root)
        .context("batch run failed")?;

    print_summary(&report);

    if let Some(path) = &args.report {
        write_report(path, &report)?;
        info!("Wrote report to {}", path.display());
    }

    Ok(())
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    init_tracing(LogLevel::Warn);

    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to replace it)",
            path.display()
        );
    }

    let manager = ConfigManager::new(path);
    manager
        .save()
        .with_context(|| format!("failed to write {}", path.display()))?;

    println!("{} {}", "Wrote".green(), path.display());
    Ok(())
}

fn print_config(path: &Path) -> Result<()> {
    init_tracing(LogLevel::Warn);

    let mut manager = ConfigManager::new(path);
    if path.exists() {
        manager
            .load()
            .with_context(|| format!("failed to load {}", path.display()))?;
    }

    let rendered = manager
        .generate_config_with_comments()
        .context("failed to render configuration")?;
    print!("{}", rendered);
    Ok(())
}

/// Settings from `path`, or defaults when the file does not exist.
///
/// An existing file is validated and rewritten if it has unknown or missing keys.
fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }

    let mut manager = ConfigManager::new(path);
    manager
        .load_or_create()
        .with_context(|| format!("failed to load {}", path.display()))?;
    Ok(manager.into_settings())
}

fn apply_overrides(settings: &mut Settings, args: &RunArgs) -> Result<()> {
    if let Some(input) = &args.input {
        settings.paths.input_root = absolutize(input)?.to_string_lossy().into_owned();
    }
    if let Some(output) = &args.output {
        settings.paths.output_root = absolutize(output)?.to_string_lossy().into_owned();
    }
    if let Some(jobs) = args.jobs {
        if jobs == 0 {
            bail!("--jobs must be at least 1");
        }
        settings.processing.parallel_groups = jobs;
    }
    if let Some(probe) = args.probe {
        settings.tools.probe_strategy = probe.into();
    }
    if let Some(hwaccel) = &args.hwaccel {
        settings.tools.hwaccel = hwaccel.clone();
    }
    if let Some(timeout) = args.timeout {
        settings.tools.timeout_secs = timeout;
    }
    if args.keep_temp {
        settings.processing.cleanup_policy = CleanupPolicy::OnSuccess;
    }
    if args.overwrite {
        settings.processing.collision_policy = CollisionPolicy::Overwrite;
    }
    if args.group_logs {
        settings.logging.group_logs = true;
    }
    if args.verbose {
        settings.logging.level = LogLevel::Debug;
    }
    Ok(())
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = env::current_dir().context("failed to read the current directory")?;
    Ok(cwd.join(path))
}

fn print_summary(report: &BatchReport) {
    println!();
    for outcome in &report.outcomes {
        match outcome {
            GroupOutcome::Completed {
                group,
                output_path,
                warnings,
            } => {
                println!(
                    "{} {} -> {}",
                    "[OK]".green().bold(),
                    group,
                    output_path.display()
                );
                for warning in warnings {
                    println!("     {} {}", "warning:".yellow(), warning);
                }
            }
            GroupOutcome::Skipped {
                group,
                stage,
                reason,
            } => {
                println!(
                    "{} {} at {}: {}",
                    "[SKIP]".yellow().bold(),
                    group,
                    stage,
                    reason
                );
            }
        }
    }

    let completed = report.completed_count().to_string();
    let skipped = report.skipped_count().to_string();
    println!(
        "\n{} completed, {} skipped, {} total",
        completed.green(),
        if report.skipped_count() > 0 {
            skipped.yellow()
        } else {
            skipped.normal()
        },
        report.outcomes.len()
    );
}

fn write_report(path: &Path, report: &BatchReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
