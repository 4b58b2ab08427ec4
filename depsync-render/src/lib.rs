//! Rendering helpers (plain text) for console output.

use depsync_domain::PackageOverlap;
use depsync_types::apply::{ApplyRecord, ChangeStatus};
use depsync_types::conflict::{Conflict, Severity};
use depsync_types::report::SyncReport;
use depsync_types::unused::{CleanRecord, UnusedReport};

pub fn render_sync_summary(report: &SyncReport) -> String {
    let mut out = String::new();
    let s = &report.summary;
    out.push_str(&format!(
        "depsync ({} strategy): {} conflicts (high {}, medium {}, low {})\n",
        report.strategy, s.conflicts, s.high, s.medium, s.low
    ));

    if !report.warnings.is_empty() {
        out.push_str("\nSkipped packages\n");
        for w in &report.warnings {
            out.push_str(&format!("  ! {} ({}): {}\n", w.package, w.path, w.reason));
        }
    }

    if report.conflicts.is_empty() {
        out.push_str("\nNo dependency conflicts found.\n");
        return out;
    }

    out.push_str("\nConflicts\n");
    for severity in [Severity::High, Severity::Medium, Severity::Low] {
        for conflict in report.conflicts.iter().filter(|c| c.severity == severity) {
            render_conflict(&mut out, conflict);
        }
    }

    out.push_str("\nFix plan\n");
    if report.fix_plan.is_empty() {
        out.push_str("  nothing to change\n");
    }
    for fix in &report.fix_plan {
        let packages: Vec<&str> = fix.changes.iter().map(|c| c.package.as_str()).collect();
        out.push_str(&format!(
            "  {} -> {} ({} {}: {})\n",
            fix.dependency,
            fix.target_version,
            fix.changes.len(),
            plural(fix.changes.len(), "change", "changes"),
            packages.join(", ")
        ));
    }

    out.push('\n');
    match &report.apply {
        Some(apply) => render_apply(&mut out, apply),
        None if report.auto_fix => out.push_str("Nothing to apply.\n"),
        None => out.push_str("Auto-fix disabled; manifests left untouched.\n"),
    }

    let unresolved: Vec<&str> = report
        .unresolved_high()
        .map(|c| c.dependency.as_str())
        .collect();
    if !unresolved.is_empty() {
        out.push_str(&format!(
            "\nUnresolved high-severity conflicts: {}\n",
            unresolved.join(", ")
        ));
    } else if s.high > 0 {
        out.push_str(
            "\nHigh-severity conflicts were rewritten this run; rerun to confirm convergence.\n",
        );
    }

    out
}

fn render_conflict(out: &mut String, conflict: &Conflict) {
    out.push_str(&format!("  [{}] {}\n", conflict.severity, conflict.dependency));
    for group in &conflict.versions {
        out.push_str(&format!(
            "    {}: {}\n",
            group.version,
            group.packages.join(", ")
        ));
    }
}

fn render_apply(out: &mut String, apply: &ApplyRecord) {
    let s = &apply.summary;
    if apply.dry_run {
        out.push_str(&format!(
            "Dry run: {} of {} changes would rewrite {} manifests.\n",
            s.applied, s.attempted, s.files_modified
        ));
    } else {
        out.push_str(&format!(
            "Applied {} of {} changes across {} manifests.\n",
            s.applied, s.attempted, s.files_modified
        ));
    }

    for r in apply
        .results
        .iter()
        .filter(|r| r.status == ChangeStatus::Skipped)
    {
        out.push_str(&format!(
            "  skipped {} in {}: {}\n",
            r.dependency,
            r.package,
            r.message.as_deref().unwrap_or("-")
        ));
    }

    if !apply.dry_run && s.attempted > 0 {
        let status = if apply.installed { "ok" } else { "not run" };
        out.push_str(&format!("Install: {}\n", status));
    }
}

/// Per-package overlap between sub-package declarations and the root manifest.
pub fn render_overlap(overlaps: &[PackageOverlap]) -> String {
    let mut out = String::new();
    if overlaps.is_empty() {
        out.push_str("No sub-packages found.\n");
        return out;
    }

    for pkg in overlaps {
        out.push_str(&format!("{} ({})\n", pkg.package, pkg.dir));
        let mut any = false;
        for section in pkg.sections.iter().filter(|s| !s.entries.is_empty()) {
            any = true;
            out.push_str(&format!("  {}\n", section.declaration_type));
            for e in &section.entries {
                if e.matches() {
                    out.push_str(&format!("    = {} {}\n", e.dependency, e.version));
                } else {
                    out.push_str(&format!(
                        "    ! {} {} (root {})\n",
                        e.dependency, e.version, e.root_version
                    ));
                }
            }
        }
        if !any {
            out.push_str("  no overlap with root\n");
        }
    }

    let mismatched: usize = overlaps.iter().map(PackageOverlap::mismatches).sum();
    out.push_str(&format!(
        "\n{} {} from the root.\n",
        mismatched,
        plural(mismatched, "declaration differs", "declarations differ")
    ));
    out
}

pub fn render_lockfile_ok() -> String {
    "Lockfile is up to date.\n".to_string()
}

/// Remediation steps printed when the frozen-lockfile install fails.
pub fn render_lockfile_failure(install_command: &[String]) -> String {
    let mut out = String::new();
    out.push_str("Lockfile or sub-package dependencies are out of date.\n");
    out.push_str("To fix:\n");
    out.push_str(&format!("  1. Run `{}`\n", install_command.join(" ")));
    out.push_str("  2. Commit the updated lockfile\n");
    out.push_str("  3. Run `depsync` to check sub-packages for version conflicts\n");
    out
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 { one } else { many }
}

/// Per-package redundant and missing dependencies, plus the clean outcome if one ran.
pub fn render_unused_summary(report: &UnusedReport) -> String {
    let mut out = String::new();
    let s = &report.summary;
    out.push_str(&format!(
        "depsync unused: {} redundant, {} missing across {} packages\n",
        s.redundant, s.missing, s.packages_checked
    ));

    let mut any = false;
    for pkg in &report.packages {
        let f = &pkg.findings;
        if pkg.error.is_none() && f.redundant_count() == 0 && f.missing.is_empty() {
            continue;
        }
        any = true;
        out.push_str(&format!("\n{} ({})\n", pkg.package, pkg.path));
        if let Some(err) = &pkg.error {
            out.push_str(&format!("  ! check failed: {}\n", err));
            continue;
        }
        if !f.dependencies.is_empty() {
            out.push_str(&format!(
                "  redundant dependencies ({}): {}\n",
                f.dependencies.len(),
                f.dependencies.join(", ")
            ));
        }
        if !f.dev_dependencies.is_empty() {
            out.push_str(&format!(
                "  redundant devDependencies ({}): {}\n",
                f.dev_dependencies.len(),
                f.dev_dependencies.join(", ")
            ));
        }
        for (dep, files) in &f.missing {
            out.push_str(&format!("  missing {}: {}\n", dep, files.join(", ")));
        }
    }

    if !any {
        out.push_str("\nNo redundant or missing dependencies found.\n");
        return out;
    }

    match &report.clean {
        Some(clean) => render_clean(&mut out, clean),
        None if s.redundant > 0 => {
            out.push_str("\nRun `depsync unused --clean` to remove the redundant entries.\n")
        }
        None => {}
    }
    if s.missing > 0 {
        out.push_str("Missing dependencies must be added by hand.\n");
    }

    out
}

fn render_clean(out: &mut String, clean: &CleanRecord) {
    let s = &clean.summary;
    out.push('\n');
    if clean.dry_run {
        out.push_str(&format!(
            "Dry run: {} of {} removals would rewrite {} manifests.\n",
            s.applied, s.attempted, s.files_modified
        ));
        return;
    }

    out.push_str(&format!(
        "Removed {} of {} declarations across {} manifests.\n",
        s.applied, s.attempted, s.files_modified
    ));
    if let Some(dir) = &clean.backup_dir {
        out.push_str(&format!("Backup: {}\n", dir));
    }
    let status = if clean.installed { "ok" } else { "not run" };
    out.push_str(&format!("Install: {}\n", status));
}
