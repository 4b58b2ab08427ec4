//! Configuration file loading for depsync.
//!
//! Discovers and loads `depsync.toml` from the workspace root.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use depsync_core::settings::{
    DEFAULT_BACKUP_DIR, DEFAULT_REPORT_FILE, DEFAULT_UNUSED_REPORT_FILE, SyncSettings,
    UnusedSettings, default_frozen_install_command, default_install_command,
    default_unused_command,
};
use depsync_types::plan::Strategy;
use fs_err as fs;
use serde::Deserialize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "depsync.toml";

/// Top-level configuration from depsync.toml.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DepsyncConfig {
    /// Target version strategy (`workspace-first` or `latest`).
    pub strategy: Strategy,

    /// Directory holding sub-packages, relative to the workspace root.
    pub packages_dir: Utf8PathBuf,

    /// Report file, relative to the workspace root.
    pub report: Utf8PathBuf,

    pub fix: FixConfig,

    pub install: InstallConfig,

    pub unused: UnusedConfig,
}

impl Default for DepsyncConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            packages_dir: SyncSettings::default().packages_dir,
            report: Utf8PathBuf::from(DEFAULT_REPORT_FILE),
            fix: FixConfig::default(),
            install: InstallConfig::default(),
            unused: UnusedConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FixConfig {
    /// Rewrite manifests and run the install.
    pub auto: bool,
}

impl Default for FixConfig {
    fn default() -> Self {
        Self { auto: true }
    }
}

/// Package-manager commands, as argv lists.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstallConfig {
    pub command: Vec<String>,
    pub frozen_command: Vec<String>,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            command: default_install_command(),
            frozen_command: default_frozen_install_command(),
        }
    }
}

/// The unused-dependency oracle and where `depsync unused` writes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UnusedConfig {
    /// Oracle argv; must print a depcheck-style JSON report on stdout.
    pub command: Vec<String>,
    pub report: Utf8PathBuf,
    pub backup_dir: Utf8PathBuf,
}

impl Default for UnusedConfig {
    fn default() -> Self {
        Self {
            command: default_unused_command(),
            report: Utf8PathBuf::from(DEFAULT_UNUSED_REPORT_FILE),
            backup_dir: Utf8PathBuf::from(DEFAULT_BACKUP_DIR),
        }
    }
}

/// Discover the depsync.toml config file.
///
/// Returns `None` if no config file is found.
pub fn discover_config(workspace_root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = workspace_root.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a depsync.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<DepsyncConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<DepsyncConfig> {
    let config: DepsyncConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from the workspace root, or return default if not found.
pub fn load_or_default(workspace_root: &Utf8Path) -> anyhow::Result<DepsyncConfig> {
    match discover_config(workspace_root) {
        Some(path) => load_config(&path),
        None => Ok(DepsyncConfig::default()),
    }
}

/// CLI flags that override the config file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub latest: bool,
    pub no_fix: bool,
    pub report: Option<Utf8PathBuf>,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: DepsyncConfig,
}

impl ConfigMerger {
    pub fn new(config: DepsyncConfig) -> Self {
        Self { config }
    }

    /// `--latest` forces the `latest` strategy, `--no-fix` forces auto-fix off, `--report`
    /// replaces the report path.
    pub fn merge_sync_args(&self, workspace_root: &Utf8Path, cli: &CliOverrides) -> SyncSettings {
        let config = &self.config;
        let strategy = if cli.latest {
            Strategy::Latest
        } else {
            config.strategy
        };

        SyncSettings {
            workspace_root: workspace_root.to_path_buf(),
            packages_dir: config.packages_dir.clone(),
            strategy,
            auto_fix: config.fix.auto && !cli.no_fix,
            report_path: cli.report.clone().unwrap_or_else(|| config.report.clone()),
            install_command: config.install.command.clone(),
            frozen_install_command: config.install.frozen_command.clone(),
        }
    }

    /// `--no-fix` turns `--clean` into a dry run; `--report` replaces the unused report path.
    pub fn merge_unused_args(
        &self,
        workspace_root: &Utf8Path,
        cli: &CliOverrides,
        clean: bool,
    ) -> UnusedSettings {
        let config = &self.config;
        UnusedSettings {
            workspace_root: workspace_root.to_path_buf(),
            packages_dir: config.packages_dir.clone(),
            clean,
            dry_run: cli.no_fix,
            report_path: cli
                .report
                .clone()
                .unwrap_or_else(|| config.unused.report.clone()),
            backup_dir: config.unused.backup_dir.clone(),
            oracle_command: config.unused.command.clone(),
            install_command: config.install.command.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_example_config() {
        let contents = r#"
strategy = "latest"
packages_dir = "apps"
report = "reports/deps.json"

[fix]
auto = false

[install]
command = ["npm", "install"]
frozen_command = ["npm", "ci"]
"#;

        let config = parse_config(contents).unwrap();
        assert_eq!(config.strategy, Strategy::Latest);
        assert_eq!(config.packages_dir.as_str(), "apps");
        assert_eq!(config.report.as_str(), "reports/deps.json");
        assert!(!config.fix.auto);
        assert_eq!(config.install.command, vec!["npm", "install"]);
        assert_eq!(config.install.frozen_command, vec!["npm", "ci"]);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config("").unwrap();
        assert_eq!(config.strategy, Strategy::WorkspaceFirst);
        assert_eq!(config.packages_dir.as_str(), "packages");
        assert_eq!(config.report.as_str(), "deps-sync-report.json");
        assert!(config.fix.auto);
        assert_eq!(config.install.command, vec!["pnpm", "install"]);
        assert_eq!(
            config.install.frozen_command,
            vec!["pnpm", "install", "--frozen-lockfile"]
        );
    }

    #[test]
    fn test_parse_partial_section_keeps_defaults() {
        let config = parse_config("[install]\ncommand = [\"yarn\"]\n").unwrap();
        assert_eq!(config.install.command, vec!["yarn"]);
        assert_eq!(
            config.install.frozen_command,
            vec!["pnpm", "install", "--frozen-lockfile"]
        );
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        assert!(parse_config("strategy = \"newest\"").is_err());
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(parse_config("stratgy = \"latest\"").is_err());
    }

    #[test]
    fn test_discover_config_not_found() {
        let temp = TempDir::new().unwrap();
        let root = Utf8Path::from_path(temp.path()).unwrap();
        assert!(discover_config(root).is_none());
        assert!(load_or_default(root).unwrap().fix.auto);
    }

    #[test]
    fn test_load_config_from_root() {
        let temp = TempDir::new().unwrap();
        let root = Utf8Path::from_path(temp.path()).unwrap();
        std::fs::write(root.join(CONFIG_FILE_NAME), "strategy = \"latest\"\n").unwrap();

        let config = load_or_default(root).unwrap();
        assert_eq!(config.strategy, Strategy::Latest);
    }

    #[test]
    fn test_invalid_toml_names_file() {
        let temp = TempDir::new().unwrap();
        let root = Utf8Path::from_path(temp.path()).unwrap();
        std::fs::write(root.join(CONFIG_FILE_NAME), "[fix\n").unwrap();

        let err = load_or_default(root).unwrap_err();
        assert!(format!("{:#}", err).contains(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_cli_overrides_config() {
        let config = parse_config(
            "strategy = \"workspace-first\"\nreport = \"a.json\"\n[fix]\nauto = true\n",
        )
        .unwrap();
        let cli = CliOverrides {
            latest: true,
            no_fix: true,
            report: Some(Utf8PathBuf::from("b.json")),
        };

        let settings = ConfigMerger::new(config).merge_sync_args(Utf8Path::new("/repo"), &cli);
        assert_eq!(settings.strategy, Strategy::Latest);
        assert!(!settings.auto_fix);
        assert_eq!(settings.report_path.as_str(), "b.json");
        assert_eq!(settings.workspace_root.as_str(), "/repo");
    }

    #[test]
    fn test_unused_section_and_overrides() {
        let config = parse_config(
            "[unused]\ncommand = [\"depcheck\", \"--json\"]\nbackup_dir = \"tmp/bak\"\n\
             [install]\ncommand = [\"npm\", \"install\"]\n",
        )
        .unwrap();
        let merger = ConfigMerger::new(config);

        let settings =
            merger.merge_unused_args(Utf8Path::new("/repo"), &CliOverrides::default(), true);
        assert!(settings.clean);
        assert!(!settings.dry_run);
        assert_eq!(settings.oracle_command, vec!["depcheck", "--json"]);
        assert_eq!(settings.install_command, vec!["npm", "install"]);
        assert_eq!(settings.report_path.as_str(), "deps-check-report.json");
        assert_eq!(settings.backup_dir.as_str(), "tmp/bak");

        let cli = CliOverrides {
            no_fix: true,
            report: Some(Utf8PathBuf::from("unused.json")),
            ..CliOverrides::default()
        };
        let settings = merger.merge_unused_args(Utf8Path::new("/repo"), &cli, true);
        assert!(settings.dry_run);
        assert_eq!(settings.report_path.as_str(), "unused.json");
    }

    #[test]
    fn test_unused_defaults_run_depcheck() {
        let config = parse_config("").unwrap();
        assert_eq!(config.unused.command[..2], ["npx", "depcheck"]);
        assert!(parse_config("[unused]\nclean = true\n").is_err());
    }

    #[test]
    fn test_config_applies_without_flags() {
        let config = parse_config("strategy = \"latest\"\n[fix]\nauto = false\n").unwrap();
        let settings = ConfigMerger::new(config)
            .merge_sync_args(Utf8Path::new("."), &CliOverrides::default());
        assert_eq!(settings.strategy, Strategy::Latest);
        assert!(!settings.auto_fix);
        assert_eq!(settings.report_path.as_str(), "deps-sync-report.json");
    }
}
