//! Clap-free settings for the sync and unused-dependency pipelines.

use camino::{Utf8Path, Utf8PathBuf};
use depsync_domain::DEFAULT_PACKAGES_DIR;
use depsync_types::plan::Strategy;

/// Report file name, relative to the workspace root.
pub const DEFAULT_REPORT_FILE: &str = "deps-sync-report.json";

/// Unused-dependency report file name, relative to the workspace root.
pub const DEFAULT_UNUSED_REPORT_FILE: &str = "deps-check-report.json";

/// Manifest backup directory for `unused --clean`, relative to the workspace root.
pub const DEFAULT_BACKUP_DIR: &str = ".deps-backup";

/// depcheck with the usual tooling-only packages and build output ignored.
pub fn default_unused_command() -> Vec<String> {
    [
        "npx",
        "depcheck",
        "--json",
        "--ignores=@types/*,eslint-*,prettier,husky,lint-staged",
        "--ignore-patterns=dist,build,coverage,node_modules,.next,.nuxt",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

pub fn default_install_command() -> Vec<String> {
    vec!["pnpm".to_string(), "install".to_string()]
}

pub fn default_frozen_install_command() -> Vec<String> {
    vec![
        "pnpm".to_string(),
        "install".to_string(),
        "--frozen-lockfile".to_string(),
    ]
}

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub workspace_root: Utf8PathBuf,
    pub packages_dir: Utf8PathBuf,
    pub strategy: Strategy,

    /// Rewrite manifests and run the install. When off, the run is a dry run.
    pub auto_fix: bool,

    /// Relative paths resolve against `workspace_root`.
    pub report_path: Utf8PathBuf,

    // Package manager
    pub install_command: Vec<String>,
    pub frozen_install_command: Vec<String>,
}

impl SyncSettings {
    pub fn report_file(&self) -> Utf8PathBuf {
        resolve(&self.workspace_root, &self.report_path)
    }
}

fn resolve(root: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Settings for the unused-dependency check and clean.
#[derive(Debug, Clone)]
pub struct UnusedSettings {
    pub workspace_root: Utf8PathBuf,
    pub packages_dir: Utf8PathBuf,

    /// Remove the redundant declarations, then reinstall.
    pub clean: bool,

    /// With `clean`, report the removals without writing or installing.
    pub dry_run: bool,

    /// Relative paths resolve against `workspace_root`.
    pub report_path: Utf8PathBuf,
    pub backup_dir: Utf8PathBuf,

    pub oracle_command: Vec<String>,
    pub install_command: Vec<String>,
}

impl UnusedSettings {
    pub fn report_file(&self) -> Utf8PathBuf {
        resolve(&self.workspace_root, &self.report_path)
    }

    pub fn backup_dir(&self) -> Utf8PathBuf {
        resolve(&self.workspace_root, &self.backup_dir)
    }
}

impl Default for UnusedSettings {
    fn default() -> Self {
        Self {
            workspace_root: Utf8PathBuf::from("."),
            packages_dir: Utf8PathBuf::from(DEFAULT_PACKAGES_DIR),
            clean: false,
            dry_run: false,
            report_path: Utf8PathBuf::from(DEFAULT_UNUSED_REPORT_FILE),
            backup_dir: Utf8PathBuf::from(DEFAULT_BACKUP_DIR),
            oracle_command: default_unused_command(),
            install_command: default_install_command(),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            workspace_root: Utf8PathBuf::from("."),
            packages_dir: Utf8PathBuf::from(DEFAULT_PACKAGES_DIR),
            strategy: Strategy::default(),
            auto_fix: true,
            report_path: Utf8PathBuf::from(DEFAULT_REPORT_FILE),
            install_command: default_install_command(),
            frozen_install_command: default_frozen_install_command(),
        }
    }
}
