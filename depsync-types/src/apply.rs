use crate::manifest::DeclarationType;
use crate::plan::Change;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRecord {
    /// True when manifests were left untouched and results describe what would change.
    pub dry_run: bool,

    #[serde(default)]
    pub results: Vec<ChangeResult>,

    #[serde(default)]
    pub files: Vec<FileChange>,

    /// True once the package-manager install completed successfully.
    #[serde(default)]
    pub installed: bool,

    pub summary: ApplySummary,
}

impl ApplyRecord {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    /// Whether every planned change for `dependency` was written.
    pub fn all_applied(&self, dependency: &str) -> bool {
        !self.dry_run
            && self
                .results
                .iter()
                .filter(|r| r.dependency == dependency)
                .all(|r| r.status == ChangeStatus::Applied)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeResult {
    pub dependency: String,
    pub package: String,
    pub path: Utf8PathBuf,

    #[serde(rename = "type")]
    pub declaration_type: DeclarationType,

    pub from: String,
    pub to: String,
    pub status: ChangeStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ChangeResult {
    pub fn new(dependency: &str, change: &Change, status: ChangeStatus) -> Self {
        Self {
            dependency: dependency.to_string(),
            package: change.package.clone(),
            path: change.path.clone(),
            declaration_type: change.declaration_type,
            from: change.from.clone(),
            to: change.to.clone(),
            status,
            message: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeStatus {
    Applied,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    pub path: Utf8PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256_before: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256_after: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplySummary {
    pub attempted: u64,
    pub applied: u64,
    pub skipped: u64,
    pub files_modified: u64,
}
