//! Default process- and filesystem-backed port implementations.

use crate::ports::{InstallError, Installer, OracleError, UnusedOracle, WritePort};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use depsync_types::unused::UnusedFindings;
use fs_err as fs;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Runs an external command, e.g. `pnpm install`, with inherited stdio.
///
/// The command is checked when it runs, so an empty command only fails a run that installs.
#[derive(Debug, Clone)]
pub struct CommandInstaller {
    command: Vec<String>,
}

impl CommandInstaller {
    pub fn new(command: &[String]) -> Self {
        Self {
            command: command.to_vec(),
        }
    }

    /// The command line as typed in a shell.
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

impl Installer for CommandInstaller {
    fn install(&self, root: &Utf8Path) -> Result<(), InstallError> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or(InstallError::EmptyCommand)?;
        let command = self.command_line();
        info!("running `{}` in {}", command, root);

        let status = Command::new(program)
            .args(args)
            .current_dir(root)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| InstallError::Spawn {
                command: command.clone(),
                reason: e.to_string(),
            })?;

        if !status.success() {
            return Err(InstallError::Failed {
                command,
                status: status.to_string(),
            });
        }
        debug!("`{}` finished", command);
        Ok(())
    }
}

/// Records install calls instead of running anything, for embedding and testing.
#[derive(Debug, Default)]
pub struct RecordingInstaller {
    calls: RefCell<Vec<Utf8PathBuf>>,
    fail: bool,
}

impl RecordingInstaller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails as if the command exited non-zero.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Roots passed to `install`, in call order.
    pub fn calls(&self) -> Vec<Utf8PathBuf> {
        self.calls.borrow().clone()
    }
}

impl Installer for RecordingInstaller {
    fn install(&self, root: &Utf8Path) -> Result<(), InstallError> {
        self.calls.borrow_mut().push(root.to_path_buf());
        if self.fail {
            return Err(InstallError::Failed {
                command: "recording install".to_string(),
                status: "exit status: 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Runs a JSON-reporting oracle such as `npx depcheck --json` inside each package.
///
/// depcheck exits non-zero whenever it finds something, so the exit status only matters when
/// stdout is not a readable report.
#[derive(Debug, Clone)]
pub struct CommandOracle {
    command: Vec<String>,
}

impl CommandOracle {
    pub fn new(command: &[String]) -> Self {
        Self {
            command: command.to_vec(),
        }
    }

    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

impl UnusedOracle for CommandOracle {
    fn check(&self, package_root: &Utf8Path) -> Result<UnusedFindings, OracleError> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or(OracleError::EmptyCommand)?;
        let command = self.command_line();
        debug!("running `{}` in {}", command, package_root);

        let output = Command::new(program)
            .args(args)
            .current_dir(package_root)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|e| OracleError::Spawn {
                command: command.clone(),
                reason: e.to_string(),
            })?;

        match serde_json::from_slice::<UnusedFindings>(&output.stdout) {
            Ok(findings) => Ok(findings),
            Err(_) if !output.status.success() => Err(OracleError::Failed {
                command,
                status: output.status.to_string(),
            }),
            Err(e) => Err(OracleError::InvalidOutput {
                command,
                reason: e.to_string(),
            }),
        }
    }
}

/// Canned oracle answers keyed by package root. Unknown roots are reported clean.
#[derive(Debug, Default)]
pub struct RecordingOracle {
    findings: BTreeMap<Utf8PathBuf, UnusedFindings>,
    failing: BTreeSet<Utf8PathBuf>,
    calls: RefCell<Vec<Utf8PathBuf>>,
}

impl RecordingOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_findings(
        mut self,
        package_root: impl Into<Utf8PathBuf>,
        findings: UnusedFindings,
    ) -> Self {
        self.findings.insert(package_root.into(), findings);
        self
    }

    /// Checks of `package_root` fail as if the oracle crashed.
    pub fn failing_for(mut self, package_root: impl Into<Utf8PathBuf>) -> Self {
        self.failing.insert(package_root.into());
        self
    }

    pub fn calls(&self) -> Vec<Utf8PathBuf> {
        self.calls.borrow().clone()
    }
}

impl UnusedOracle for RecordingOracle {
    fn check(&self, package_root: &Utf8Path) -> Result<UnusedFindings, OracleError> {
        self.calls.borrow_mut().push(package_root.to_path_buf());
        if self.failing.contains(package_root) {
            return Err(OracleError::Failed {
                command: "recording oracle".to_string(),
                status: "exit status: 2".to_string(),
            });
        }
        Ok(self
            .findings
            .get(package_root)
            .cloned()
            .unwrap_or_default())
    }
}

/// Filesystem write operations.
#[derive(Debug, Clone, Default)]
pub struct FsWritePort;

impl WritePort for FsWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("create parent dir for {}", path))?;
        }
        fs::write(path, contents).with_context(|| format!("write {}", path))
    }
}

/// Keeps written files in memory, for embedding and testing.
#[derive(Debug, Default)]
pub struct InMemoryWritePort {
    files: RefCell<BTreeMap<Utf8PathBuf, Vec<u8>>>,
}

impl InMemoryWritePort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<String> {
        self.files
            .borrow()
            .get(Utf8Path::new(path))
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Written paths, sorted.
    pub fn paths(&self) -> Vec<Utf8PathBuf> {
        self.files.borrow().keys().cloned().collect()
    }
}

impl WritePort for InMemoryWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(cmd: &[&str]) -> Vec<String> {
        cmd.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_command_fails_only_when_run() {
        let installer = CommandInstaller::new(&[]);
        assert_eq!(installer.command_line(), "");
        assert_eq!(
            installer.install(Utf8Path::new(".")).expect_err("empty"),
            InstallError::EmptyCommand
        );
    }

    #[test]
    fn command_line_joins_program_and_args() {
        let installer =
            CommandInstaller::new(&args(&["pnpm", "install", "--frozen-lockfile"]));
        assert_eq!(installer.command_line(), "pnpm install --frozen-lockfile");
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8Path::from_path(temp.path()).expect("utf8");
        let installer = CommandInstaller::new(&args(&["depsync-test-no-such-program"]));
        assert!(matches!(
            installer.install(root),
            Err(InstallError::Spawn { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn exit_status_decides_success() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8Path::from_path(temp.path()).expect("utf8");

        CommandInstaller::new(&args(&["true"]))
            .install(root)
            .expect("true succeeds");

        let err = CommandInstaller::new(&args(&["false"]))
            .install(root)
            .expect_err("false fails");
        assert!(matches!(err, InstallError::Failed { .. }));
        assert!(err.to_string().starts_with("`false` exited with"));
    }

    #[test]
    fn recording_installer_tracks_calls() {
        let ok = RecordingInstaller::new();
        ok.install(Utf8Path::new("/ws")).expect("ok");
        assert_eq!(ok.calls(), vec![Utf8PathBuf::from("/ws")]);

        let failing = RecordingInstaller::failing();
        assert!(failing.install(Utf8Path::new("/ws")).is_err());
        assert_eq!(failing.calls().len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn command_oracle_reads_stdout_even_on_failure_status() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8Path::from_path(temp.path()).expect("utf8");
        let script = r#"echo '{"dependencies":["left-pad"],"devDependencies":[],"missing":{}}'; exit 255"#;

        let findings = CommandOracle::new(&args(&["sh", "-c", script]))
            .check(root)
            .expect("report on stdout");
        assert_eq!(findings.dependencies, vec!["left-pad"]);
    }

    #[cfg(unix)]
    #[test]
    fn command_oracle_without_report_fails() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8Path::from_path(temp.path()).expect("utf8");

        let err = CommandOracle::new(&args(&["false"]))
            .check(root)
            .expect_err("no report");
        assert!(matches!(err, OracleError::Failed { .. }));

        let err = CommandOracle::new(&args(&["echo", "not json"]))
            .check(root)
            .expect_err("garbage report");
        assert!(matches!(err, OracleError::InvalidOutput { .. }));

        assert_eq!(
            CommandOracle::new(&[]).check(root).expect_err("empty"),
            OracleError::EmptyCommand
        );
    }

    #[test]
    fn recording_oracle_answers_per_root() {
        let oracle = RecordingOracle::new()
            .with_findings(
                "/ws/packages/a",
                UnusedFindings {
                    dev_dependencies: vec!["jest".to_string()],
                    ..UnusedFindings::default()
                },
            )
            .failing_for("/ws/packages/b");

        let a = oracle.check(Utf8Path::new("/ws/packages/a")).expect("a");
        assert_eq!(a.dev_dependencies, vec!["jest"]);
        assert_eq!(oracle.check(Utf8Path::new("/ws")).expect("root"), UnusedFindings::default());
        assert!(oracle.check(Utf8Path::new("/ws/packages/b")).is_err());
        assert_eq!(oracle.calls().len(), 3);
    }

    #[test]
    fn fs_write_port_creates_parent_dirs() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8Path::from_path(temp.path()).expect("utf8");
        let path = root.join("out/nested/report.json");

        FsWritePort.write_file(&path, b"{}").expect("write");
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "{}");
    }
}
