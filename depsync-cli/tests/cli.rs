//! End-to-end tests against the built `depsync` binary.

#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn depsync() -> Command {
    Command::cargo_bin("depsync").expect("depsync binary")
}

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn read_json(root: &Path, rel: &str) -> Value {
    serde_json::from_str(&fs::read_to_string(root.join(rel)).unwrap()).unwrap()
}

/// Root pins lodash ^4.17.21; x is behind on the same major, y is a major behind.
fn create_high_conflict_repo() -> TempDir {
    let td = tempfile::tempdir().expect("tempdir");
    let root = td.path();
    write(
        root,
        "package.json",
        r#"{ "name": "mono", "private": true, "dependencies": { "lodash": "^4.17.21", "react": "^18.2.0" } }"#,
    );
    write(
        root,
        "packages/x/package.json",
        r#"{ "name": "@mono/x", "dependencies": { "lodash": "^4.17.0", "react": "^17.0.0" } }"#,
    );
    write(
        root,
        "packages/y/package.json",
        r#"{ "name": "@mono/y", "devDependencies": { "lodash": "^3.0.0" } }"#,
    );
    td
}

fn create_low_conflict_repo() -> TempDir {
    let td = tempfile::tempdir().expect("tempdir");
    let root = td.path();
    write(root, "package.json", "{}");
    write(
        root,
        "packages/x/package.json",
        r#"{ "dependencies": { "chalk": "4.1.0" } }"#,
    );
    write(
        root,
        "packages/y/package.json",
        r#"{ "dependencies": { "chalk": "4.1.2" } }"#,
    );
    td
}

#[test]
fn test_no_fix_with_high_conflict_exits_one_and_leaves_manifests() {
    let temp = create_high_conflict_repo();
    let before = fs::read_to_string(temp.path().join("packages/y/package.json")).unwrap();

    depsync()
        .current_dir(temp.path())
        .arg("--no-fix")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("[high] lodash"))
        .stdout(predicate::str::contains("Dry run"));

    let after = fs::read_to_string(temp.path().join("packages/y/package.json")).unwrap();
    assert_eq!(before, after);

    let report = read_json(temp.path(), "deps-sync-report.json");
    assert_eq!(report["autoFix"], false);
    assert_eq!(report["summary"]["unresolvedHigh"], 2);
}

#[test]
fn test_low_conflict_only_exits_zero() {
    let temp = create_low_conflict_repo();

    depsync()
        .arg("--root")
        .arg(temp.path())
        .arg("--no-fix")
        .assert()
        .success()
        .stdout(predicate::str::contains("[low] chalk"));
}

#[test]
fn test_no_conflicts_succeeds_without_install() {
    let td = tempfile::tempdir().unwrap();
    write(td.path(), "package.json", r#"{"dependencies":{"react":"^18.2.0"}}"#);
    write(
        td.path(),
        "packages/a/package.json",
        r#"{"dependencies":{"react":"^18.2.0"}}"#,
    );
    // Installing would fail; nothing to fix means it never runs.
    write(td.path(), "depsync.toml", "[install]\ncommand = [\"depsync-test-no-such-program\"]\n");

    depsync()
        .current_dir(td.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No dependency conflicts found."));
    assert!(td.path().join("deps-sync-report.json").exists());
}

#[test]
fn test_missing_root_manifest_fails() {
    let td = tempfile::tempdir().unwrap();
    write(td.path(), "packages/a/package.json", "{}");

    depsync()
        .current_dir(td.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("package.json"));
    assert!(!td.path().join("deps-sync-report.json").exists());
}

#[test]
fn test_latest_flag_overrides_config() {
    let temp = create_high_conflict_repo();
    write(temp.path(), "depsync.toml", "strategy = \"workspace-first\"\n");

    depsync()
        .current_dir(temp.path())
        .args(["--no-fix", "--latest"])
        .assert()
        .code(1);

    let report = read_json(temp.path(), "deps-sync-report.json");
    assert_eq!(report["strategy"], "latest");
}

#[test]
fn test_report_flag_sets_path() {
    let temp = create_low_conflict_repo();

    depsync()
        .current_dir(temp.path())
        .args(["--no-fix", "--report", "out/deps.json"])
        .assert()
        .success();

    assert!(temp.path().join("out/deps.json").exists());
    assert!(!temp.path().join("deps-sync-report.json").exists());
}

#[test]
fn test_diff_flag_prints_patch() {
    let temp = create_low_conflict_repo();

    depsync()
        .current_dir(temp.path())
        .args(["--no-fix", "--diff"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "diff --git a/packages/x/package.json b/packages/x/package.json",
        ))
        .stdout(predicate::str::contains("+    \"chalk\": \"4.1.2\""));
}

#[test]
fn test_invalid_config_fails() {
    let temp = create_low_conflict_repo();
    write(temp.path(), "depsync.toml", "strategy = \"newest\"\n");

    depsync()
        .current_dir(temp.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("depsync.toml"));
}

#[test]
fn test_overlap_lists_root_mismatches() {
    let temp = create_high_conflict_repo();

    depsync()
        .current_dir(temp.path())
        .arg("overlap")
        .assert()
        .success()
        .stdout(predicate::str::contains("! react ^17.0.0 (root ^18.2.0)"))
        .stdout(predicate::str::contains("y (packages/y)\n  no overlap with root"));
    assert!(!temp.path().join("deps-sync-report.json").exists());
}

#[test]
fn test_packages_dir_from_config() {
    let td = tempfile::tempdir().unwrap();
    write(td.path(), "package.json", "{}");
    write(td.path(), "apps/a/package.json", r#"{"dependencies":{"zod":"3.0.0"}}"#);
    write(td.path(), "apps/b/package.json", r#"{"dependencies":{"zod":"3.1.0"}}"#);
    write(td.path(), "depsync.toml", "packages_dir = \"apps\"\n");

    depsync()
        .current_dir(td.path())
        .arg("--no-fix")
        .assert()
        .success()
        .stdout(predicate::str::contains("[low] zod"));
}

#[cfg(unix)]
#[test]
fn test_auto_fix_rewrites_and_installs() {
    let temp = create_high_conflict_repo();
    write(temp.path(), "depsync.toml", "[install]\ncommand = [\"true\"]\n");

    // The high-severity lodash split was detected, so the fixing run still exits 1.
    depsync()
        .current_dir(temp.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Install: ok"));

    let x = read_json(temp.path(), "packages/x/package.json");
    assert_eq!(x["dependencies"]["lodash"], "^4.17.21");
    assert_eq!(x["dependencies"]["react"], "^18.2.0");
    assert_eq!(x["name"], "@mono/x");
    let y = read_json(temp.path(), "packages/y/package.json");
    assert_eq!(y["devDependencies"]["lodash"], "^4.17.21");

    let report = read_json(temp.path(), "deps-sync-report.json");
    assert_eq!(report["apply"]["installed"], true);
    assert_eq!(report["summary"]["unresolvedHigh"], 0);

    // Converged: a second run has nothing to do.
    depsync()
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No dependency conflicts found."));
}

#[cfg(unix)]
#[test]
fn test_install_failure_exits_one_and_keeps_rewrites() {
    let temp = create_high_conflict_repo();
    write(temp.path(), "depsync.toml", "[install]\ncommand = [\"false\"]\n");

    depsync()
        .current_dir(temp.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("install failed"));

    let y = read_json(temp.path(), "packages/y/package.json");
    assert_eq!(y["devDependencies"]["lodash"], "^4.17.21");
}

#[cfg(unix)]
#[test]
fn test_check_lockfile_passes_and_fails() {
    let temp = create_low_conflict_repo();

    write(
        temp.path(),
        "depsync.toml",
        "[install]\nfrozen_command = [\"true\"]\n",
    );
    depsync()
        .current_dir(temp.path())
        .arg("check-lockfile")
        .assert()
        .success()
        .stdout(predicate::str::contains("Lockfile is up to date."));

    write(
        temp.path(),
        "depsync.toml",
        "[install]\ncommand = [\"pnpm\", \"install\"]\nfrozen_command = [\"false\"]\n",
    );
    depsync()
        .current_dir(temp.path())
        .arg("check-lockfile")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("1. Run `pnpm install`"));
}

#[test]
fn test_no_fix_ignores_empty_install_command() {
    let temp = create_low_conflict_repo();
    write(temp.path(), "depsync.toml", "[install]\ncommand = []\n");

    depsync()
        .current_dir(temp.path())
        .arg("--no-fix")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"));
    assert!(temp.path().join("deps-sync-report.json").exists());

    depsync()
        .current_dir(temp.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("install command is empty"));
    let x = read_json(temp.path(), "packages/x/package.json");
    assert_eq!(x["dependencies"]["chalk"], "4.1.0");
}

/// Every package reports `chalk` as unused, the way depcheck prints it.
#[cfg(unix)]
fn unused_config(install: &str) -> String {
    format!(
        "[unused]\ncommand = [\"sh\", \"-c\", \"echo '{{\\\"dependencies\\\":[\\\"chalk\\\"]}}'; exit 255\"]\n\
         [install]\ncommand = [\"{install}\"]\n"
    )
}

#[cfg(unix)]
#[test]
fn test_unused_check_reports_and_exits_one() {
    let temp = create_low_conflict_repo();
    write(temp.path(), "depsync.toml", &unused_config("false"));

    depsync()
        .current_dir(temp.path())
        .arg("unused")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("redundant dependencies (1): chalk"))
        .stdout(predicate::str::contains("depsync unused --clean"));

    let report = read_json(temp.path(), "deps-check-report.json");
    assert_eq!(report["schema"], "depsync.unused.v1");
    assert_eq!(report["summary"]["redundant"], 3);
    let x = read_json(temp.path(), "packages/x/package.json");
    assert_eq!(x["dependencies"]["chalk"], "4.1.0");
}

#[cfg(unix)]
#[test]
fn test_unused_clean_removes_and_backs_up() {
    let temp = create_low_conflict_repo();
    write(temp.path(), "depsync.toml", &unused_config("true"));

    depsync()
        .current_dir(temp.path())
        .args(["unused", "--clean"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 2 of 3 declarations across 2 manifests."))
        .stdout(predicate::str::contains("Install: ok"));

    let x = read_json(temp.path(), "packages/x/package.json");
    assert!(x["dependencies"].get("chalk").is_none());
    let backup = read_json(temp.path(), ".deps-backup/x-package.json");
    assert_eq!(backup["dependencies"]["chalk"], "4.1.0");
    assert!(temp.path().join(".deps-backup/root-package.json").exists());
}

#[cfg(unix)]
#[test]
fn test_unused_clean_dry_run_and_failed_install() {
    let temp = create_low_conflict_repo();
    write(temp.path(), "depsync.toml", &unused_config("false"));

    depsync()
        .current_dir(temp.path())
        .args(["unused", "--clean", "--no-fix", "--diff"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Dry run: 2 of 3 removals"))
        .stdout(predicate::str::contains(
            "-{ \"dependencies\": { \"chalk\": \"4.1.0\" } }",
        ));
    assert!(!temp.path().join(".deps-backup").exists());

    depsync()
        .current_dir(temp.path())
        .args(["unused", "--clean"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("manifests restored"));
    let y = read_json(temp.path(), "packages/y/package.json");
    assert_eq!(y["dependencies"]["chalk"], "4.1.2");
}
