//! Core sync and unused-dependency pipelines, extracted from the CLI.
//!
//! These entry points are I/O-agnostic: manifests go through [`Workspace`], and the install
//! and report writes go through the port traits.

use crate::ports::{InstallError, Installer, UnusedOracle, WritePort};
use crate::settings::{SyncSettings, UnusedSettings};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use depsync_domain::{
    FsWorkspace, PackageOverlap, Planner, Workspace, WorkspaceReadError, WorkspaceScan,
    plan_removals, read_workspace, root_overlaps,
};
use depsync_edit::{ApplyOptions, EditError, apply_fix_plan, apply_removals};
use depsync_types::conflict::Severity;
use depsync_types::manifest::{MANIFEST_FILE, Manifest};
use depsync_types::report::{ReportSummary, SyncReport};
use depsync_types::unused::{PackageCheck, UnusedReport, UnusedSummary};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Error type for pipeline results. Every variant exits 1.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    WorkspaceRead(#[from] WorkspaceReadError),

    /// Rewriting a manifest failed; earlier rewrites in the run stand.
    #[error("apply aborted: {0}")]
    ManifestWrite(#[from] EditError),

    /// Manifests were already rewritten when the install failed. They are not rolled back.
    #[error("install failed after rewriting manifests: {0}")]
    InstallCommand(#[from] InstallError),

    /// The reinstall after removing declarations failed; manifests were put back from backup.
    #[error("install failed; manifests restored from {backup_dir}: {source}")]
    InstallRestored {
        backup_dir: Utf8PathBuf,
        #[source]
        source: InstallError,
    },

    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl SyncError {
    pub fn exit_code(&self) -> u8 {
        1
    }
}

/// Outcome of `run_sync`.
pub struct SyncOutcome {
    pub report: SyncReport,
    /// Unified diff of the manifest rewrites (or would-be rewrites in a dry run).
    pub patch: String,
}

impl SyncOutcome {
    /// 1 when the scan found any high-severity conflict, else 0.
    ///
    /// Detected conflicts decide the status even when this run rewrote them; a clean rerun
    /// exits 0.
    pub fn exit_code(&self) -> u8 {
        if self
            .report
            .conflicts
            .iter()
            .any(|c| c.severity == Severity::High)
        {
            1
        } else {
            0
        }
    }
}

/// The filesystem workspace described by `settings`.
pub fn workspace_for(settings: &SyncSettings) -> FsWorkspace {
    FsWorkspace::new(settings.workspace_root.clone())
        .with_packages_dir(settings.packages_dir.clone())
}

/// Run the sync pipeline: scan, detect, plan, then apply and install when auto-fix is on.
///
/// With auto-fix off the same edits run as a dry run, so the report and patch still show what
/// would change. The caller persists the report (see [`write_report`]).
pub fn run_sync(
    settings: &SyncSettings,
    ws: &dyn Workspace,
    installer: &dyn Installer,
) -> Result<SyncOutcome, SyncError> {
    let planner = Planner::new(settings.strategy);
    let analysis = planner.analyze(ws)?;

    info!(
        "found {} conflicts across {} dependencies",
        analysis.conflicts.len(),
        analysis.index.len()
    );

    let mut report = SyncReport::new(settings.strategy, settings.auto_fix);
    report.duplicates = analysis.index.duplicates();
    report.warnings = analysis.scan.warnings();
    report.conflicts = analysis.conflicts;
    report.fix_plan = analysis.fix_plan;

    let mut patch = String::new();
    if !report.fix_plan.is_empty() {
        let opts = ApplyOptions {
            dry_run: !settings.auto_fix,
        };
        let (mut apply, diff) = apply_fix_plan(ws, &report.fix_plan, &opts)?;
        patch = diff;

        if settings.auto_fix {
            installer.install(ws.root())?;
            apply.installed = true;
        }
        report.apply = Some(apply);
    }

    report.summary = summarize(&report);
    if report.summary.unresolved_high > 0 {
        warn!(
            "{} high-severity conflicts remain unresolved",
            report.summary.unresolved_high
        );
    }

    Ok(SyncOutcome { report, patch })
}

fn summarize(report: &SyncReport) -> ReportSummary {
    let count = |severity: Severity| {
        report
            .conflicts
            .iter()
            .filter(|c| c.severity == severity)
            .count() as u64
    };

    ReportSummary {
        conflicts: report.conflicts.len() as u64,
        high: count(Severity::High),
        medium: count(Severity::Medium),
        low: count(Severity::Low),
        fixes_planned: report.fix_plan.len() as u64,
        changes_planned: report.fix_plan.iter().map(|f| f.changes.len() as u64).sum(),
        changes_applied: report
            .apply
            .as_ref()
            .filter(|a| !a.dry_run)
            .map_or(0, |a| a.summary.applied),
        unresolved_high: report.unresolved_high().count() as u64,
    }
}

/// Persist a report as pretty JSON, replacing any previous report.
pub fn write_report<T: Serialize>(
    report: &T,
    path: &Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<()> {
    let mut json = serde_json::to_string_pretty(report).context("serialize report")?;
    json.push('\n');
    writer.write_file(path, json.as_bytes())?;
    info!("wrote report to {}", path);
    Ok(())
}

/// Outcome of `run_unused`.
pub struct UnusedOutcome {
    pub report: UnusedReport,
    /// Unified diff of the removals (or would-be removals in a dry run).
    pub patch: String,
}

impl UnusedOutcome {
    /// 1 while redundant declarations remain, else 0. A clean that removed them and reinstalled
    /// exits 0; missing dependencies never fail the run.
    pub fn exit_code(&self) -> u8 {
        let cleaned = self
            .report
            .clean
            .as_ref()
            .is_some_and(|c| !c.dry_run && c.installed);
        if self.report.has_redundant() && !cleaned {
            1
        } else {
            0
        }
    }
}

/// Ask the oracle about every manifest, then optionally remove what it flagged.
///
/// A package the oracle cannot check is recorded with its error and left alone. With
/// `settings.clean`, every manifest is copied to the backup directory first, and put back if
/// the removals or the reinstall fail.
pub fn run_unused(
    settings: &UnusedSettings,
    ws: &dyn Workspace,
    oracle: &dyn UnusedOracle,
    installer: &dyn Installer,
    writer: &dyn WritePort,
) -> Result<UnusedOutcome, SyncError> {
    let scan = read_workspace(ws)?;

    let mut report = UnusedReport::new();
    report.warnings = scan.warnings();
    report.packages = scan
        .manifests
        .iter()
        .map(|m| check_package(ws, m, oracle))
        .collect();

    let removals = plan_removals(&report.packages);
    info!(
        "{} redundant declarations across {} packages",
        removals.len(),
        report.packages.len()
    );

    let mut patch = String::new();
    if settings.clean && !removals.is_empty() {
        let opts = ApplyOptions {
            dry_run: settings.dry_run,
        };

        if settings.dry_run {
            let (clean, diff) = apply_removals(ws, &removals, &opts)?;
            patch = diff;
            report.clean = Some(clean);
        } else {
            let backup_dir = settings.backup_dir();
            let backup = back_up_manifests(ws, &scan, &backup_dir, writer)?;

            let (mut clean, diff) = match apply_removals(ws, &removals, &opts) {
                Ok(applied) => applied,
                Err(e) => {
                    restore_manifests(ws, &backup)?;
                    return Err(e.into());
                }
            };
            patch = diff;

            if let Err(source) = installer.install(ws.root()) {
                restore_manifests(ws, &backup)?;
                return Err(SyncError::InstallRestored { backup_dir, source });
            }
            clean.installed = true;
            clean.backup_dir = Some(backup_dir);
            report.clean = Some(clean);
        }
    }

    report.summary = summarize_unused(&report);
    Ok(UnusedOutcome { report, patch })
}

fn check_package(
    ws: &dyn Workspace,
    manifest: &Manifest,
    oracle: &dyn UnusedOracle,
) -> PackageCheck {
    let package_root = if manifest.is_root() {
        ws.root().to_path_buf()
    } else {
        ws.root().join(&manifest.dir)
    };

    let mut check = PackageCheck {
        package: manifest.name.clone(),
        path: manifest.dir.clone(),
        findings: Default::default(),
        error: None,
    };
    match oracle.check(&package_root) {
        Ok(findings) => {
            debug!(
                package = manifest.name.as_str(),
                redundant = findings.redundant_count(),
                missing = findings.missing.len(),
                "checked package"
            );
            check.findings = findings;
        }
        Err(e) => {
            warn!("{}: unused-dependency check failed: {}", manifest.name, e);
            check.error = Some(e.to_string());
        }
    }
    check
}

/// Copy every manifest to `backup_dir` as `<package>-package.json`.
fn back_up_manifests(
    ws: &dyn Workspace,
    scan: &WorkspaceScan,
    backup_dir: &Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<Vec<(Utf8PathBuf, String)>> {
    let mut backup = Vec::with_capacity(scan.manifests.len());
    for manifest in &scan.manifests {
        let contents = ws
            .read_manifest(&manifest.dir)
            .with_context(|| format!("back up {}", manifest.name))?;
        let file = backup_dir.join(format!("{}-{}", manifest.name, MANIFEST_FILE));
        writer.write_file(&file, contents.as_bytes())?;
        backup.push((manifest.dir.clone(), contents));
    }
    info!("backed up {} manifests to {}", backup.len(), backup_dir);
    Ok(backup)
}

/// Put back every manifest whose contents differ from the backup.
fn restore_manifests(
    ws: &dyn Workspace,
    backup: &[(Utf8PathBuf, String)],
) -> anyhow::Result<()> {
    let mut restored = 0;
    for (dir, contents) in backup {
        let current = ws.read_manifest(dir).ok();
        if current.as_deref() == Some(contents.as_str()) {
            continue;
        }
        ws.write_manifest(dir, contents)
            .with_context(|| format!("restore {}", dir))?;
        restored += 1;
    }
    warn!("restored {} manifests from backup", restored);
    Ok(())
}

fn summarize_unused(report: &UnusedReport) -> UnusedSummary {
    let checked = report.packages.iter().filter(|p| p.error.is_none());
    UnusedSummary {
        packages_checked: checked.clone().count() as u64,
        failed: report.packages.iter().filter(|p| p.error.is_some()).count() as u64,
        redundant: checked
            .clone()
            .map(|p| p.findings.redundant_count() as u64)
            .sum(),
        missing: checked.map(|p| p.findings.missing.len() as u64).sum(),
        removed: report
            .clean
            .as_ref()
            .filter(|c| !c.dry_run)
            .map_or(0, |c| c.summary.applied),
    }
}

/// Compare every sub-package against the root manifest. Read-only.
pub fn run_overlap(ws: &dyn Workspace) -> Result<Vec<PackageOverlap>, SyncError> {
    let scan = read_workspace(ws)?;
    Ok(root_overlaps(&scan.manifests))
}

/// Run the frozen-lockfile install once; failure means the lockfile is stale.
pub fn run_lockfile_check(root: &Utf8Path, installer: &dyn Installer) -> Result<(), InstallError> {
    match installer.install(root) {
        Ok(()) => {
            info!("lockfile is up to date");
            Ok(())
        }
        Err(e) => {
            warn!("frozen-lockfile install failed: {}", e);
            Err(e)
        }
    }
}
