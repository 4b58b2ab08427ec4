mod config;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use config::{CliOverrides, ConfigMerger};
use depsync_core::FsWorkspace;
use depsync_core::adapters::{CommandInstaller, CommandOracle, FsWritePort};
use depsync_core::pipeline::{
    run_lockfile_check, run_overlap, run_sync, run_unused, workspace_for, write_report,
};
use depsync_core::settings::{SyncSettings, UnusedSettings};
use depsync_render::{
    render_lockfile_failure, render_lockfile_ok, render_overlap, render_sync_summary,
    render_unused_summary,
};
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "depsync",
    version,
    about = "Detect and converge dependency version conflicts across a JavaScript workspace."
)]
struct Cli {
    /// Workspace root containing the root package.json (default: current directory).
    #[arg(long, global = true, default_value = ".")]
    root: Utf8PathBuf,

    /// Pick the highest specifier instead of preferring the root manifest's.
    #[arg(long, global = true, default_value_t = false)]
    latest: bool,

    /// Report what would change without rewriting manifests or running the install.
    #[arg(long, global = true, default_value_t = false)]
    no_fix: bool,

    /// Report file (default: <root>/deps-sync-report.json).
    #[arg(long, global = true)]
    report: Option<Utf8PathBuf>,

    /// Print the unified diff of manifest rewrites.
    #[arg(long, global = true, default_value_t = false)]
    diff: bool,

    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List sub-package dependencies that the root also declares, and whether they match.
    Overlap,
    /// Run the frozen-lockfile install to check the lockfile is current.
    CheckLockfile,
    /// Find declared dependencies that no package imports (exit 1 when any remain).
    Unused(UnusedArgs),
}

#[derive(Debug, clap::Args)]
struct UnusedArgs {
    /// Remove redundant declarations and reinstall; manifests are backed up first.
    /// With --no-fix, only show what would be removed.
    #[arg(long, default_value_t = false)]
    clean: bool,
}

fn main() -> ExitCode {
    match real_main() {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(1)
        }
    }
}

fn real_main() -> anyhow::Result<u8> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load config file and merge with CLI arguments
    let file_config = config::load_or_default(&cli.root).context("load depsync.toml config")?;
    let overrides = CliOverrides {
        latest: cli.latest,
        no_fix: cli.no_fix,
        report: cli.report.clone(),
    };
    let merger = ConfigMerger::new(file_config);
    let settings = merger.merge_sync_args(&cli.root, &overrides);
    debug!(
        "merged config: strategy={}, auto_fix={}, packages_dir={}, report={}",
        settings.strategy, settings.auto_fix, settings.packages_dir, settings.report_path
    );

    match cli.cmd {
        None => cmd_sync(&settings, cli.diff),
        Some(Command::Overlap) => cmd_overlap(&settings),
        Some(Command::CheckLockfile) => cmd_check_lockfile(&settings),
        Some(Command::Unused(args)) => {
            let unused = merger.merge_unused_args(&cli.root, &overrides, args.clean);
            cmd_unused(&unused, cli.diff)
        }
    }
}

fn cmd_sync(settings: &SyncSettings, show_diff: bool) -> anyhow::Result<u8> {
    // Checked up front so a bad command fails before any manifest is rewritten.
    anyhow::ensure!(
        !settings.auto_fix || !settings.install_command.is_empty(),
        "invalid [install] command: install command is empty"
    );
    let ws = workspace_for(settings);
    let installer = CommandInstaller::new(&settings.install_command);

    let outcome = run_sync(settings, &ws, &installer)?;

    let report_file = settings.report_file();
    write_report(&outcome.report, &report_file, &FsWritePort)?;

    print!("{}", render_sync_summary(&outcome.report));
    println!("\nReport written to {}", report_file);
    if show_diff && !outcome.patch.is_empty() {
        println!();
        print!("{}", outcome.patch);
    }

    Ok(outcome.exit_code())
}

fn cmd_unused(settings: &UnusedSettings, show_diff: bool) -> anyhow::Result<u8> {
    let ws = FsWorkspace::new(settings.workspace_root.clone())
        .with_packages_dir(settings.packages_dir.clone());
    anyhow::ensure!(
        !settings.oracle_command.is_empty(),
        "invalid [unused] command: command is empty"
    );
    anyhow::ensure!(
        !settings.clean || settings.dry_run || !settings.install_command.is_empty(),
        "invalid [install] command: install command is empty"
    );
    let oracle = CommandOracle::new(&settings.oracle_command);
    let installer = CommandInstaller::new(&settings.install_command);

    let outcome = run_unused(settings, &ws, &oracle, &installer, &FsWritePort)?;

    let report_file = settings.report_file();
    write_report(&outcome.report, &report_file, &FsWritePort)?;

    print!("{}", render_unused_summary(&outcome.report));
    println!("\nReport written to {}", report_file);
    if show_diff && !outcome.patch.is_empty() {
        println!();
        print!("{}", outcome.patch);
    }

    Ok(outcome.exit_code())
}

fn cmd_overlap(settings: &SyncSettings) -> anyhow::Result<u8> {
    let ws = workspace_for(settings);
    let overlaps = run_overlap(&ws)?;
    print!("{}", render_overlap(&overlaps));
    Ok(0)
}

fn cmd_check_lockfile(settings: &SyncSettings) -> anyhow::Result<u8> {
    anyhow::ensure!(
        !settings.frozen_install_command.is_empty(),
        "invalid [install] frozen_command: install command is empty"
    );
    let installer = CommandInstaller::new(&settings.frozen_install_command);

    match run_lockfile_check(&settings.workspace_root, &installer) {
        Ok(()) => {
            print!("{}", render_lockfile_ok());
            Ok(0)
        }
        Err(e) => {
            error!("{}", e);
            eprint!("{}", render_lockfile_failure(&settings.install_command));
            Ok(1)
        }
    }
}
