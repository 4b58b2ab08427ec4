//! Error types for depsync-edit.
//!
//! Every variant aborts the remaining apply step. Manifests rewritten before the failure stay
//! rewritten.

use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditError {
    /// The manifest could not be re-read right before rewriting it.
    #[error("read {path}: {reason}")]
    ManifestRead { path: Utf8PathBuf, reason: String },

    /// The freshly read manifest is no longer valid JSON.
    #[error("parse {path}: {source}")]
    ManifestParse {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The rewritten manifest could not be written back (permissions, disk full, ...).
    #[error("write {path}: {reason}")]
    ManifestWrite { path: Utf8PathBuf, reason: String },
}

impl EditError {
    pub fn path(&self) -> &Utf8PathBuf {
        match self {
            EditError::ManifestRead { path, .. }
            | EditError::ManifestParse { path, .. }
            | EditError::ManifestWrite { path, .. } => path,
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(self, EditError::ManifestWrite { .. })
    }
}

/// Result type alias using EditError.
pub type EditResult<T> = Result<T, EditError>;
