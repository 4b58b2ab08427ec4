use crate::detect::detect_conflicts;
use crate::index::{DependencyIndex, build_index};
use crate::ports::Workspace;
use crate::reader::{WorkspaceReadError, WorkspaceScan, read_workspace};
use crate::select::select_target;
use crate::specifier::{HeuristicScheme, SpecifierScheme};
use depsync_types::conflict::Conflict;
use depsync_types::plan::{Change, FixPlan, Strategy};
use tracing::{debug, info};

/// Edits needed to move every declaration of `conflict` to `target`.
///
/// Locations already at `target` are left out. Returns `None` when nothing would change.
pub fn plan_fix(conflict: &Conflict, target: &str) -> Option<FixPlan> {
    let changes: Vec<Change> = conflict
        .locations()
        .filter(|(version, _)| *version != target)
        .map(|(version, loc)| Change {
            package: loc.package.clone(),
            path: loc.path.clone(),
            declaration_type: loc.declaration_type,
            from: version.to_string(),
            to: target.to_string(),
        })
        .collect();

    if changes.is_empty() {
        return None;
    }
    Some(FixPlan {
        dependency: conflict.dependency.clone(),
        target_version: target.to_string(),
        changes,
    })
}

/// Snapshot of one detection run. Fix plans are only valid against this snapshot.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub scan: WorkspaceScan,
    pub index: DependencyIndex,
    pub conflicts: Vec<Conflict>,
    pub fix_plan: Vec<FixPlan>,
}

pub struct Planner {
    strategy: Strategy,
    scheme: Box<dyn SpecifierScheme>,
}

impl Default for Planner {
    fn default() -> Self {
        Self::new(Strategy::default())
    }
}

impl Planner {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            scheme: Box::new(HeuristicScheme),
        }
    }

    pub fn with_scheme(strategy: Strategy, scheme: Box<dyn SpecifierScheme>) -> Self {
        Self { strategy, scheme }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Read the workspace from scratch and plan.
    pub fn analyze(&self, ws: &dyn Workspace) -> Result<Analysis, WorkspaceReadError> {
        let scan = read_workspace(ws)?;
        Ok(self.analyze_scan(scan))
    }

    pub fn analyze_scan(&self, scan: WorkspaceScan) -> Analysis {
        let index = build_index(&scan.manifests);
        let conflicts = detect_conflicts(&index, self.scheme.as_ref());
        let fix_plan = self.plan(&conflicts);

        info!(
            "indexed {} dependencies, {} conflicts, {} fixes planned",
            index.len(),
            conflicts.len(),
            fix_plan.len()
        );

        Analysis {
            scan,
            index,
            conflicts,
            fix_plan,
        }
    }

    pub fn plan(&self, conflicts: &[Conflict]) -> Vec<FixPlan> {
        conflicts
            .iter()
            .filter_map(|c| {
                let target = select_target(c, self.strategy, self.scheme.as_ref());
                debug!(
                    dependency = c.dependency.as_str(),
                    target = target.as_str(),
                    "selected target"
                );
                plan_fix(c, &target)
            })
            .collect()
    }
}
