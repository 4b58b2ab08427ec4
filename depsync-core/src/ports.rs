//! Port traits abstracting side effects away from the pipeline.

use camino::Utf8Path;
use depsync_types::unused::UnusedFindings;

/// Package-manager install, run in the workspace root.
///
/// Blocks until the command exits. Its output goes straight to the invoking terminal.
pub trait Installer {
    fn install(&self, root: &Utf8Path) -> Result<(), InstallError>;
}

/// Static analysis answering "which declared dependencies are never imported", e.g. depcheck.
///
/// `package_root` is the absolute directory of one package (the workspace root for the root
/// manifest).
pub trait UnusedOracle {
    fn check(&self, package_root: &Utf8Path) -> Result<UnusedFindings, OracleError>;
}

/// File-system writes. Parent directories are created as needed.
pub trait WritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InstallError {
    #[error("install command is empty")]
    EmptyCommand,

    #[error("could not start `{command}`: {reason}")]
    Spawn { command: String, reason: String },

    #[error("`{command}` exited with {status}")]
    Failed { command: String, status: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("unused-dependency command is empty")]
    EmptyCommand,

    #[error("could not start `{command}`: {reason}")]
    Spawn { command: String, reason: String },

    #[error("`{command}` exited with {status} and no report")]
    Failed { command: String, status: String },

    #[error("`{command}` printed an unreadable report: {reason}")]
    InvalidOutput { command: String, reason: String },
}
