use crate::apply::{ApplySummary, ChangeStatus, FileChange};
use crate::manifest::DeclarationType;
use crate::report::ReadWarning;
use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// What the unused-dependency oracle reports for one package.
///
/// Matches the `depcheck --json` output; keys it does not know are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnusedFindings {
    /// Declared in `dependencies` but never imported.
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Declared in `devDependencies` but never imported.
    #[serde(default)]
    pub dev_dependencies: Vec<String>,

    /// Imported but not declared, mapped to the importing files.
    #[serde(default)]
    pub missing: BTreeMap<String, Vec<String>>,
}

impl UnusedFindings {
    pub fn redundant_count(&self) -> usize {
        self.dependencies.len() + self.dev_dependencies.len()
    }
}

/// Oracle result for one package, or the reason it could not be checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageCheck {
    pub package: String,
    pub path: Utf8PathBuf,

    #[serde(flatten)]
    pub findings: UnusedFindings,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A redundant declaration to delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Removal {
    pub package: String,
    pub path: Utf8PathBuf,

    #[serde(rename = "type")]
    pub declaration_type: DeclarationType,

    pub dependency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovalResult {
    #[serde(flatten)]
    pub removal: Removal,

    pub status: ChangeStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Outcome of removing redundant declarations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanRecord {
    pub dry_run: bool,

    #[serde(default)]
    pub results: Vec<RemovalResult>,

    #[serde(default)]
    pub files: Vec<FileChange>,

    /// Where every manifest was copied before the first removal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_dir: Option<Utf8PathBuf>,

    #[serde(default)]
    pub installed: bool,

    pub summary: ApplySummary,
}

impl CleanRecord {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }
}

/// The persisted outcome of one unused-dependency check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnusedReport {
    pub schema: String,
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,

    /// Root first, then members in directory order.
    #[serde(default)]
    pub packages: Vec<PackageCheck>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ReadWarning>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clean: Option<CleanRecord>,

    pub summary: UnusedSummary,
}

impl Default for UnusedReport {
    fn default() -> Self {
        Self {
            schema: crate::schema::DEPSYNC_UNUSED_V1.to_string(),
            run_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            packages: vec![],
            warnings: vec![],
            clean: None,
            summary: UnusedSummary::default(),
        }
    }
}

impl UnusedReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_redundant(&self) -> bool {
        self.packages
            .iter()
            .any(|p| p.findings.redundant_count() > 0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnusedSummary {
    pub packages_checked: u64,
    pub failed: u64,
    pub redundant: u64,
    pub missing: u64,
    pub removed: u64,
}
