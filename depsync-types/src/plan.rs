use crate::manifest::DeclarationType;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rule used to pick one target specifier per conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Prefer the root manifest's specifier, falling back to `Latest`.
    #[default]
    WorkspaceFirst,
    /// Highest specifier by numeric-aware comparison.
    Latest,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::WorkspaceFirst => "workspace-first",
            Strategy::Latest => "latest",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One manifest edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub package: String,

    /// Member directory relative to the workspace root.
    pub path: Utf8PathBuf,

    #[serde(rename = "type")]
    pub declaration_type: DeclarationType,

    pub from: String,
    pub to: String,
}

/// The edits needed to converge one conflicting dependency on its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixPlan {
    pub dependency: String,
    pub target_version: String,
    pub changes: Vec<Change>,
}
