use crate::index::DependencyIndex;
use crate::severity::classify;
use crate::specifier::SpecifierScheme;
use depsync_types::conflict::{Conflict, VersionGroup};
use tracing::debug;

/// One conflict per indexed dependency with two or more distinct specifiers, in index order.
///
/// Specifiers are compared literally; no normalization happens here.
pub fn detect_conflicts(index: &DependencyIndex, scheme: &dyn SpecifierScheme) -> Vec<Conflict> {
    let mut out = Vec::new();
    for entry in index.iter() {
        if entry.distinct_specifiers() < 2 {
            continue;
        }

        let versions: Vec<VersionGroup> = entry
            .versions
            .iter()
            .map(|(version, locations)| VersionGroup {
                version: version.clone(),
                packages: locations.iter().map(|l| l.package.clone()).collect(),
                locations: locations.clone(),
            })
            .collect();

        let severity = classify(versions.iter().map(|v| v.version.as_str()), scheme);
        debug!(
            dependency = entry.dependency.as_str(),
            specifiers = versions.len(),
            severity = severity.as_str(),
            "conflict"
        );

        out.push(Conflict {
            dependency: entry.dependency.clone(),
            versions,
            severity,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::build_index;
    use crate::specifier::HeuristicScheme;
    use depsync_types::conflict::Severity;
    use depsync_types::manifest::Manifest;

    fn member(name: &str, deps: &[(&str, &str)]) -> Manifest {
        let mut m = Manifest::new(name, format!("packages/{name}"));
        m.dependencies = deps.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect();
        m
    }

    #[test]
    fn single_declaration_is_not_a_conflict() {
        let index = build_index(&[member("x", &[("dayjs", "^1.11.0")])]);
        assert!(detect_conflicts(&index, &HeuristicScheme).is_empty());
    }

    #[test]
    fn same_specifier_everywhere_is_not_a_conflict() {
        let index = build_index(&[
            member("x", &[("dayjs", "^1.11.0")]),
            member("y", &[("dayjs", "^1.11.0")]),
        ]);
        assert!(detect_conflicts(&index, &HeuristicScheme).is_empty());
    }

    #[test]
    fn textual_difference_is_a_conflict() {
        let index = build_index(&[
            member("x", &[("chalk", "^4.1.0")]),
            member("y", &[("chalk", "4.1.0")]),
        ]);
        let conflicts = detect_conflicts(&index, &HeuristicScheme);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].severity, Severity::Low);
        assert_eq!(conflicts[0].versions[1].packages, vec!["y".to_string()]);
    }
}
