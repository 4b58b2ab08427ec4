//! Domain logic: turn workspace manifests into conflicts and a deterministic fix plan.
//!
//! This crate owns *what* should change and why. It does not own *how* manifests are rewritten;
//! that's the `depsync-edit` crate.
//!
//! Every stage is a plain function over the previous stage's value:
//! [`read_workspace`] → [`build_index`] → [`detect_conflicts`] → [`select_target`] →
//! [`plan_fix`]. [`Planner`] threads them together.

mod detect;
mod index;
mod overlap;
mod planner;
mod ports;
mod reader;
mod select;
mod severity;
mod specifier;
mod unused;

pub use detect::detect_conflicts;
pub use index::{DependencyIndex, IndexEntry, build_index};
pub use overlap::{OverlapEntry, PackageOverlap, SectionOverlap, root_overlaps};
pub use planner::{Analysis, Planner, plan_fix};
pub use ports::{DEFAULT_PACKAGES_DIR, FsWorkspace, InMemoryWorkspace, Workspace};
pub use reader::{
    ManifestParseError, ManifestReadError, WorkspaceReadError, WorkspaceScan, parse_manifest,
    read_workspace,
};
pub use select::select_target;
pub use severity::classify;
pub use specifier::{HeuristicScheme, SpecifierScheme};
pub use unused::plan_removals;
