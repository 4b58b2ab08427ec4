use depsync_types::manifest::DeclarationType;
use depsync_types::unused::{PackageCheck, Removal};

/// Removals for every redundant declaration the oracle reported.
///
/// Packages whose check failed contribute nothing. Order follows `checks`, with
/// `dependencies` before `devDependencies` inside a package.
pub fn plan_removals(checks: &[PackageCheck]) -> Vec<Removal> {
    let mut out = Vec::new();
    for check in checks.iter().filter(|c| c.error.is_none()) {
        let sections = [
            (DeclarationType::Dependencies, &check.findings.dependencies),
            (
                DeclarationType::DevDependencies,
                &check.findings.dev_dependencies,
            ),
        ];
        for (ty, deps) in sections {
            for dep in deps {
                out.push(Removal {
                    package: check.package.clone(),
                    path: check.path.clone(),
                    declaration_type: ty,
                    dependency: dep.clone(),
                });
            }
        }
    }
    out
}
