use crate::apply::ApplyRecord;
use crate::conflict::{Conflict, Location, Severity};
use crate::plan::{FixPlan, Strategy};
use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raw duplicate map: `[dependency, [[specifier, [location, ...]], ...]]`.
pub type RawDuplicates = Vec<(String, Vec<(String, Vec<Location>)>)>;

/// The persisted outcome of one sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub schema: String,
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub strategy: Strategy,
    pub auto_fix: bool,

    #[serde(default)]
    pub conflicts: Vec<Conflict>,

    #[serde(default)]
    pub fix_plan: Vec<FixPlan>,

    #[serde(default)]
    pub duplicates: RawDuplicates,

    /// Sub-packages excluded from the index.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ReadWarning>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply: Option<ApplyRecord>,

    pub summary: ReportSummary,
}

impl SyncReport {
    pub fn new(strategy: Strategy, auto_fix: bool) -> Self {
        Self {
            schema: crate::schema::DEPSYNC_REPORT_V1.to_string(),
            run_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            strategy,
            auto_fix,
            conflicts: vec![],
            fix_plan: vec![],
            duplicates: vec![],
            warnings: vec![],
            apply: None,
            summary: ReportSummary::default(),
        }
    }

    /// High-severity conflicts not converged by this run.
    pub fn unresolved_high(&self) -> impl Iterator<Item = &Conflict> {
        self.conflicts.iter().filter(move |c| {
            c.severity == Severity::High
                && !self
                    .apply
                    .as_ref()
                    .is_some_and(|a| a.installed && a.all_applied(&c.dependency))
        })
    }
}

/// A sub-package manifest that could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadWarning {
    pub package: String,
    pub path: Utf8PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub conflicts: u64,
    pub high: u64,
    pub medium: u64,
    pub low: u64,
    pub fixes_planned: u64,
    pub changes_planned: u64,
    pub changes_applied: u64,
    pub unresolved_high: u64,
}
