//! Edit engine for depsync fix plans.
//!
//! Responsibilities:
//! - Re-read each target manifest fresh, right before editing it.
//! - Rewrite `manifest[type][dependency]` and nothing else.
//! - Delete redundant declarations reported by the unused-dependency check.
//! - Run the same edits against an in-memory overlay for dry runs.
//! - Generate a unified diff preview and per-file sha256 before/after.

mod error;

pub use error::{EditError, EditResult};

use camino::{Utf8Path, Utf8PathBuf};
use depsync_domain::Workspace;
use depsync_types::apply::{ApplyRecord, ChangeResult, ChangeStatus, FileChange};
use depsync_types::manifest::{DeclarationType, manifest_path};
use depsync_types::plan::FixPlan;
use depsync_types::unused::{CleanRecord, Removal, RemovalResult};
use diffy::PatchFormatter;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Compute results and a patch without writing anything.
    pub dry_run: bool,
}

/// Set `section.dependency` to `to` in manifest `contents`.
///
/// Returns `Ok(None)` when the manifest no longer declares the dependency in that section.
/// Output is pretty JSON with two-space indentation and a trailing newline; key order is
/// preserved.
pub fn set_specifier(
    contents: &str,
    ty: DeclarationType,
    dependency: &str,
    to: &str,
) -> Result<Option<String>, serde_json::Error> {
    let mut doc: Value = serde_json::from_str(contents)?;
    let Some(slot) = doc
        .get_mut(ty.key())
        .and_then(|section| section.get_mut(dependency))
    else {
        return Ok(None);
    };
    *slot = Value::String(to.to_string());

    let mut out = serde_json::to_string_pretty(&doc)?;
    out.push('\n');
    Ok(Some(out))
}

/// Delete `section.dependency` from manifest `contents`.
///
/// Returns `Ok(None)` when the manifest no longer declares the dependency in that section. The
/// section itself stays, even when it ends up empty.
pub fn remove_declaration(
    contents: &str,
    ty: DeclarationType,
    dependency: &str,
) -> Result<Option<String>, serde_json::Error> {
    let mut doc: Value = serde_json::from_str(contents)?;
    let removed = doc
        .get_mut(ty.key())
        .and_then(Value::as_object_mut)
        .and_then(|section| section.shift_remove(dependency));
    if removed.is_none() {
        return Ok(None);
    }

    let mut out = serde_json::to_string_pretty(&doc)?;
    out.push('\n');
    Ok(Some(out))
}

/// Preview the patch a fix plan would produce, without writing.
pub fn preview_patch(ws: &dyn Workspace, plans: &[FixPlan]) -> EditResult<String> {
    let (_, patch) = apply_fix_plan(ws, plans, &ApplyOptions { dry_run: true })?;
    Ok(patch)
}

/// Apply a fix plan. When `opts.dry_run` is true, no files are written, but results and a patch
/// are still produced.
///
/// When writing, every change re-reads its manifest from the workspace first so edits made by
/// earlier changes (or by anyone else) are kept. The first read or write failure aborts; files
/// already written are not restored.
pub fn apply_fix_plan(
    ws: &dyn Workspace,
    plans: &[FixPlan],
    opts: &ApplyOptions,
) -> EditResult<(ApplyRecord, String)> {
    let mut before: BTreeMap<Utf8PathBuf, String> = BTreeMap::new();
    let mut after: BTreeMap<Utf8PathBuf, String> = BTreeMap::new();
    let mut record = ApplyRecord::new(opts.dry_run);

    for plan in plans {
        for change in &plan.changes {
            record.summary.attempted += 1;

            let current = match after.get(&change.path) {
                Some(overlay) if opts.dry_run => overlay.clone(),
                _ => read(ws, &change.path)?,
            };
            before
                .entry(change.path.clone())
                .or_insert_with(|| current.clone());

            let updated = set_specifier(
                &current,
                change.declaration_type,
                &plan.dependency,
                &change.to,
            )
            .map_err(|source| EditError::ManifestParse {
                path: manifest_path(&change.path),
                source,
            })?;

            match updated {
                Some(updated) => {
                    if !opts.dry_run {
                        ws.write_manifest(&change.path, &updated).map_err(|e| {
                            EditError::ManifestWrite {
                                path: manifest_path(&change.path),
                                reason: format!("{:#}", e),
                            }
                        })?;
                    }
                    debug!(
                        package = change.package.as_str(),
                        dependency = plan.dependency.as_str(),
                        from = change.from.as_str(),
                        to = change.to.as_str(),
                        dry_run = opts.dry_run,
                        "rewrote declaration"
                    );
                    after.insert(change.path.clone(), updated);
                    record.summary.applied += 1;
                    record.results.push(ChangeResult::new(
                        &plan.dependency,
                        change,
                        ChangeStatus::Applied,
                    ));
                }
                None => {
                    debug!(
                        package = change.package.as_str(),
                        dependency = plan.dependency.as_str(),
                        "declaration no longer present"
                    );
                    after.entry(change.path.clone()).or_insert(current);
                    record.summary.skipped += 1;
                    let mut result =
                        ChangeResult::new(&plan.dependency, change, ChangeStatus::Skipped);
                    result.message = Some(format!(
                        "`{}.{}` is no longer declared",
                        change.declaration_type, plan.dependency
                    ));
                    record.results.push(result);
                }
            }
        }
    }

    record.files = file_changes(&before, &after);
    record.summary.files_modified = record.files.len() as u64;

    if !opts.dry_run {
        info!(
            "rewrote {} manifests ({} changes, {} skipped)",
            record.summary.files_modified, record.summary.applied, record.summary.skipped
        );
    }

    let patch = render_patch(&before, &after);
    Ok((record, patch))
}

/// Delete redundant declarations, one removal at a time, with the same fresh-read and dry-run
/// rules as [`apply_fix_plan`].
pub fn apply_removals(
    ws: &dyn Workspace,
    removals: &[Removal],
    opts: &ApplyOptions,
) -> EditResult<(CleanRecord, String)> {
    let mut before: BTreeMap<Utf8PathBuf, String> = BTreeMap::new();
    let mut after: BTreeMap<Utf8PathBuf, String> = BTreeMap::new();
    let mut record = CleanRecord::new(opts.dry_run);

    for removal in removals {
        record.summary.attempted += 1;

        let current = match after.get(&removal.path) {
            Some(overlay) if opts.dry_run => overlay.clone(),
            _ => read(ws, &removal.path)?,
        };
        before
            .entry(removal.path.clone())
            .or_insert_with(|| current.clone());

        let updated = remove_declaration(&current, removal.declaration_type, &removal.dependency)
            .map_err(|source| EditError::ManifestParse {
                path: manifest_path(&removal.path),
                source,
            })?;

        let (status, message) = match updated {
            Some(updated) => {
                if !opts.dry_run {
                    ws.write_manifest(&removal.path, &updated).map_err(|e| {
                        EditError::ManifestWrite {
                            path: manifest_path(&removal.path),
                            reason: format!("{:#}", e),
                        }
                    })?;
                }
                debug!(
                    package = removal.package.as_str(),
                    dependency = removal.dependency.as_str(),
                    dry_run = opts.dry_run,
                    "removed declaration"
                );
                after.insert(removal.path.clone(), updated);
                record.summary.applied += 1;
                (ChangeStatus::Applied, None)
            }
            None => {
                after.entry(removal.path.clone()).or_insert(current);
                record.summary.skipped += 1;
                (
                    ChangeStatus::Skipped,
                    Some(format!(
                        "`{}.{}` is no longer declared",
                        removal.declaration_type, removal.dependency
                    )),
                )
            }
        };
        record.results.push(RemovalResult {
            removal: removal.clone(),
            status,
            message,
        });
    }

    record.files = file_changes(&before, &after);
    record.summary.files_modified = record.files.len() as u64;

    if !opts.dry_run {
        info!(
            "removed {} declarations from {} manifests",
            record.summary.applied, record.summary.files_modified
        );
    }

    let patch = render_patch(&before, &after);
    Ok((record, patch))
}

fn file_changes(
    before: &BTreeMap<Utf8PathBuf, String>,
    after: &BTreeMap<Utf8PathBuf, String>,
) -> Vec<FileChange> {
    before
        .iter()
        .filter_map(|(dir, old)| {
            let new = after.get(dir).unwrap_or(old);
            (old != new).then(|| FileChange {
                path: manifest_path(dir),
                sha256_before: Some(sha256_hex(old.as_bytes())),
                sha256_after: Some(sha256_hex(new.as_bytes())),
            })
        })
        .collect()
}

fn read(ws: &dyn Workspace, dir: &Utf8Path) -> EditResult<String> {
    ws.read_manifest(dir).map_err(|e| EditError::ManifestRead {
        path: manifest_path(dir),
        reason: format!("{:#}", e),
    })
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn render_patch(
    before: &BTreeMap<Utf8PathBuf, String>,
    after: &BTreeMap<Utf8PathBuf, String>,
) -> String {
    let mut out = String::new();
    let formatter = PatchFormatter::new();

    for (dir, old) in before {
        let new = after.get(dir).unwrap_or(old);
        if old == new {
            continue;
        }

        let path = manifest_path(dir);
        out.push_str(&format!("diff --git a/{0} b/{0}\n", path));
        out.push_str(&format!("--- a/{0}\n+++ b/{0}\n", path));

        let patch = diffy::create_patch(old, new);
        let rendered = formatter.fmt_patch(&patch).to_string();
        // Skip diffy's own ---/+++ header; ours carries the real path.
        for line in rendered.lines().skip_while(|l| !l.starts_with("@@")) {
            out.push_str(line);
            out.push('\n');
        }
    }

    out
}
