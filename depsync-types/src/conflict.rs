use crate::manifest::DeclarationType;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a single declaration of a dependency lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub package: String,

    #[serde(rename = "type")]
    pub declaration_type: DeclarationType,

    /// Member directory relative to the workspace root.
    pub path: Utf8PathBuf,
}

/// All declarations of one dependency that share a specifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionGroup {
    pub version: String,
    pub packages: Vec<String>,
    pub locations: Vec<Location>,
}

/// Heuristic risk of a version disagreement.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dependency declared with more than one distinct specifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub dependency: String,
    pub versions: Vec<VersionGroup>,
    pub severity: Severity,
}

impl Conflict {
    /// Distinct specifiers, in index order.
    pub fn specifiers(&self) -> impl Iterator<Item = &str> {
        self.versions.iter().map(|v| v.version.as_str())
    }

    /// The specifier `package` declared, if it declared this dependency at all.
    pub fn specifier_of(&self, package: &str) -> Option<&str> {
        self.versions
            .iter()
            .find(|v| v.packages.iter().any(|p| p == package))
            .map(|v| v.version.as_str())
    }

    pub fn locations(&self) -> impl Iterator<Item = (&str, &Location)> {
        self.versions
            .iter()
            .flat_map(|v| v.locations.iter().map(move |l| (v.version.as_str(), l)))
    }
}
