use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fmt;

/// File name of a workspace member manifest.
pub const MANIFEST_FILE: &str = "package.json";

/// Package name under which the workspace root manifest is recorded.
pub const ROOT_PACKAGE: &str = "root";

/// Declarations in the order they appear in the manifest file.
pub type DependencyMap = Vec<(String, String)>;

/// The section of a manifest a dependency is declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeclarationType {
    Dependencies,
    DevDependencies,
    PeerDependencies,
}

impl DeclarationType {
    /// Every section a manifest is scanned for.
    pub const ALL: [DeclarationType; 3] = [
        DeclarationType::Dependencies,
        DeclarationType::DevDependencies,
        DeclarationType::PeerDependencies,
    ];

    /// Sections that take part in conflict detection. Peer declarations are scanned but not
    /// indexed.
    pub const INDEXED: [DeclarationType; 2] =
        [DeclarationType::Dependencies, DeclarationType::DevDependencies];

    /// The JSON key of this section inside `package.json`.
    pub fn key(self) -> &'static str {
        match self {
            DeclarationType::Dependencies => "dependencies",
            DeclarationType::DevDependencies => "devDependencies",
            DeclarationType::PeerDependencies => "peerDependencies",
        }
    }
}

impl fmt::Display for DeclarationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A workspace member's declared dependency set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// `root` for the workspace root, otherwise the member directory name.
    pub name: String,

    /// Member directory relative to the workspace root (`.` for the root).
    pub dir: Utf8PathBuf,

    #[serde(default)]
    pub dependencies: DependencyMap,

    #[serde(default)]
    pub dev_dependencies: DependencyMap,

    #[serde(default)]
    pub peer_dependencies: DependencyMap,
}

impl Manifest {
    pub fn new(name: impl Into<String>, dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            dependencies: Vec::new(),
            dev_dependencies: Vec::new(),
            peer_dependencies: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.name == ROOT_PACKAGE
    }

    pub fn declarations(&self, ty: DeclarationType) -> &[(String, String)] {
        match ty {
            DeclarationType::Dependencies => &self.dependencies,
            DeclarationType::DevDependencies => &self.dev_dependencies,
            DeclarationType::PeerDependencies => &self.peer_dependencies,
        }
    }

    pub fn declarations_mut(&mut self, ty: DeclarationType) -> &mut DependencyMap {
        match ty {
            DeclarationType::Dependencies => &mut self.dependencies,
            DeclarationType::DevDependencies => &mut self.dev_dependencies,
            DeclarationType::PeerDependencies => &mut self.peer_dependencies,
        }
    }

    /// Specifier declared for `dependency` in section `ty`, if any.
    pub fn specifier(&self, ty: DeclarationType, dependency: &str) -> Option<&str> {
        self.declarations(ty)
            .iter()
            .find(|(name, _)| name == dependency)
            .map(|(_, spec)| spec.as_str())
    }

    pub fn manifest_path(&self) -> Utf8PathBuf {
        manifest_path(&self.dir)
    }
}

/// Path of the `package.json` inside a member directory.
pub fn manifest_path(dir: &Utf8Path) -> Utf8PathBuf {
    if dir.as_str().is_empty() || dir.as_str() == "." {
        Utf8PathBuf::from(MANIFEST_FILE)
    } else {
        dir.join(MANIFEST_FILE)
    }
}
