use crate::specifier::SpecifierScheme;
use depsync_types::conflict::Conflict;
use depsync_types::manifest::ROOT_PACKAGE;
use depsync_types::plan::Strategy;
use std::cmp::Ordering;

/// Pick the single specifier every declaration of `conflict` should converge on.
pub fn select_target(
    conflict: &Conflict,
    strategy: Strategy,
    scheme: &dyn SpecifierScheme,
) -> String {
    match strategy {
        Strategy::WorkspaceFirst => match conflict.specifier_of(ROOT_PACKAGE) {
            Some(root) => root.to_string(),
            None => latest(conflict, scheme),
        },
        Strategy::Latest => latest(conflict, scheme),
    }
}

// Ties keep the earliest specifier in index order.
fn latest(conflict: &Conflict, scheme: &dyn SpecifierScheme) -> String {
    let mut best: Option<&str> = None;
    for spec in conflict.specifiers() {
        match best {
            Some(current) if scheme.compare(spec, current) != Ordering::Greater => {}
            _ => best = Some(spec),
        }
    }
    best.unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specifier::HeuristicScheme;
    use camino::Utf8PathBuf;
    use depsync_types::conflict::{Location, Severity, VersionGroup};
    use depsync_types::manifest::DeclarationType;

    fn conflict(groups: &[(&str, &str)]) -> Conflict {
        Conflict {
            dependency: "lodash".to_string(),
            versions: groups
                .iter()
                .map(|(version, package)| VersionGroup {
                    version: version.to_string(),
                    packages: vec![package.to_string()],
                    locations: vec![Location {
                        package: package.to_string(),
                        declaration_type: DeclarationType::Dependencies,
                        path: Utf8PathBuf::from(format!("packages/{package}")),
                    }],
                })
                .collect(),
            severity: Severity::High,
        }
    }

    #[test]
    fn workspace_first_prefers_root_even_when_older() {
        let c = conflict(&[("^4.17.0", "x"), ("^3.0.0", "root"), ("^4.17.21", "y")]);
        assert_eq!(
            select_target(&c, Strategy::WorkspaceFirst, &HeuristicScheme),
            "^3.0.0"
        );
    }

    #[test]
    fn workspace_first_falls_back_to_latest() {
        let c = conflict(&[("4.1.0", "x"), ("4.1.2", "y")]);
        assert_eq!(
            select_target(&c, Strategy::WorkspaceFirst, &HeuristicScheme),
            "4.1.2"
        );
    }

    #[test]
    fn latest_ignores_root() {
        let c = conflict(&[("^9.0.0", "root"), ("^10.0.0", "x")]);
        assert_eq!(select_target(&c, Strategy::Latest, &HeuristicScheme), "^10.0.0");
    }

    #[test]
    fn latest_tie_keeps_first_seen() {
        let c = conflict(&[("^4.1.0", "x"), ("4.1.0", "y")]);
        assert_eq!(select_target(&c, Strategy::Latest, &HeuristicScheme), "^4.1.0");
    }
}
