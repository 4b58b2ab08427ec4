use crate::ports::Workspace;
use camino::{Utf8Path, Utf8PathBuf};
use depsync_types::manifest::{DeclarationType, Manifest, ROOT_PACKAGE, manifest_path};
use depsync_types::report::ReadWarning;
use serde_json::Value;
use tracing::{debug, info, warn};

/// The root manifest is missing or unparsable. The run cannot proceed.
#[derive(Debug, thiserror::Error)]
#[error("workspace root manifest {path} could not be read: {reason}")]
pub struct WorkspaceReadError {
    pub path: Utf8PathBuf,
    pub reason: String,
}

/// A sub-package manifest is missing or unparsable. The package is excluded from the index.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{package}: manifest {path} excluded: {reason}")]
pub struct ManifestReadError {
    pub package: String,
    pub path: Utf8PathBuf,
    pub reason: String,
}

impl From<&ManifestReadError> for ReadWarning {
    fn from(err: &ManifestReadError) -> Self {
        ReadWarning {
            package: err.package.clone(),
            path: err.path.clone(),
            reason: err.reason.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ManifestParseError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("manifest is not a JSON object")]
    NotAnObject,

    #[error("`{section}` is not an object")]
    SectionNotObject { section: &'static str },

    #[error("`{section}.{dependency}` is not a string specifier")]
    NonStringSpecifier {
        section: &'static str,
        dependency: String,
    },
}

/// Manifests read from disk plus the sub-packages that had to be skipped.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceScan {
    /// Root first, then members in directory-name order.
    pub manifests: Vec<Manifest>,
    pub skipped: Vec<ManifestReadError>,
}

impl WorkspaceScan {
    pub fn root(&self) -> Option<&Manifest> {
        self.manifests.iter().find(|m| m.is_root())
    }

    pub fn get(&self, package: &str) -> Option<&Manifest> {
        self.manifests.iter().find(|m| m.name == package)
    }

    pub fn warnings(&self) -> Vec<ReadWarning> {
        self.skipped.iter().map(ReadWarning::from).collect()
    }
}

/// Read the root manifest and every sub-package manifest.
pub fn read_workspace(ws: &dyn Workspace) -> Result<WorkspaceScan, WorkspaceReadError> {
    let root_dir = Utf8Path::new(".");
    let root_path = ws.root().join(manifest_path(root_dir));
    let root = ws
        .read_manifest(root_dir)
        .map_err(|e| format!("{:#}", e))
        .and_then(|contents| {
            parse_manifest(ROOT_PACKAGE, root_dir, &contents).map_err(|e| e.to_string())
        })
        .map_err(|reason| WorkspaceReadError {
            path: root_path,
            reason,
        })?;

    let mut scan = WorkspaceScan {
        manifests: vec![root],
        skipped: Vec::new(),
    };

    let dirs = match ws.member_dirs() {
        Ok(dirs) => dirs,
        Err(e) => {
            warn!("cannot list workspace members: {:#}", e);
            Vec::new()
        }
    };

    for dir in dirs {
        let package = dir.file_name().unwrap_or(dir.as_str()).to_string();
        match read_member(ws, &package, &dir) {
            Ok(manifest) => {
                debug!(
                    package = manifest.name.as_str(),
                    deps = manifest.dependencies.len(),
                    dev_deps = manifest.dev_dependencies.len(),
                    peer_deps = manifest.peer_dependencies.len(),
                    "scanned manifest"
                );
                scan.manifests.push(manifest);
            }
            Err(err) => {
                warn!("{}", err);
                scan.skipped.push(err);
            }
        }
    }

    info!(
        "scanned {} manifests ({} skipped)",
        scan.manifests.len(),
        scan.skipped.len()
    );
    Ok(scan)
}

fn read_member(
    ws: &dyn Workspace,
    package: &str,
    dir: &Utf8Path,
) -> Result<Manifest, ManifestReadError> {
    let fail = |reason: String| ManifestReadError {
        package: package.to_string(),
        path: manifest_path(dir),
        reason,
    };

    if package == ROOT_PACKAGE {
        return Err(fail(format!(
            "package name `{}` is reserved for the workspace root",
            ROOT_PACKAGE
        )));
    }

    let contents = ws
        .read_manifest(dir)
        .map_err(|e| fail(format!("{:#}", e)))?;
    parse_manifest(package, dir, &contents).map_err(|e| fail(e.to_string()))
}

/// Parse `package.json` contents into a [`Manifest`], keeping declaration order.
pub fn parse_manifest(
    name: &str,
    dir: &Utf8Path,
    contents: &str,
) -> Result<Manifest, ManifestParseError> {
    let value: Value = serde_json::from_str(contents)?;
    let Value::Object(obj) = value else {
        return Err(ManifestParseError::NotAnObject);
    };

    let mut manifest = Manifest::new(name, dir);
    for ty in DeclarationType::ALL {
        let section = ty.key();
        let Some(item) = obj.get(section) else {
            continue;
        };
        // Peer declarations are never indexed, so malformed ones are dropped, not fatal.
        let lenient = !DeclarationType::INDEXED.contains(&ty);
        let Value::Object(deps) = item else {
            if lenient {
                warn!(package = name, "ignoring `{}`: not an object", section);
                continue;
            }
            return Err(ManifestParseError::SectionNotObject { section });
        };

        let out = manifest.declarations_mut(ty);
        for (dep, spec) in deps {
            let Value::String(spec) = spec else {
                if lenient {
                    warn!(
                        package = name,
                        "ignoring `{}.{}`: not a string specifier", section, dep
                    );
                    continue;
                }
                return Err(ManifestParseError::NonStringSpecifier {
                    section,
                    dependency: dep.clone(),
                });
            };
            out.push((dep.clone(), spec.clone()));
        }
    }

    Ok(manifest)
}
