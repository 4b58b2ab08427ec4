use camino::Utf8PathBuf;
use depsync_types::manifest::{DeclarationType, Manifest};

/// A sub-package declaration that the root also declares in the same section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapEntry {
    pub dependency: String,
    pub version: String,
    pub root_version: String,
}

impl OverlapEntry {
    pub fn matches(&self) -> bool {
        self.version == self.root_version
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionOverlap {
    pub declaration_type: DeclarationType,
    pub entries: Vec<OverlapEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOverlap {
    pub package: String,
    pub dir: Utf8PathBuf,
    /// One section per declaration type, peer dependencies included.
    pub sections: Vec<SectionOverlap>,
}

impl PackageOverlap {
    pub fn mismatches(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|s| &s.entries)
            .filter(|e| !e.matches())
            .count()
    }
}

/// Compare each sub-package against the root, section by section.
///
/// Unlike conflict detection this covers `peerDependencies` as well.
pub fn root_overlaps(manifests: &[Manifest]) -> Vec<PackageOverlap> {
    let Some(root) = manifests.iter().find(|m| m.is_root()) else {
        return Vec::new();
    };

    manifests
        .iter()
        .filter(|m| !m.is_root())
        .map(|member| PackageOverlap {
            package: member.name.clone(),
            dir: member.dir.clone(),
            sections: DeclarationType::ALL
                .iter()
                .map(|&ty| SectionOverlap {
                    declaration_type: ty,
                    entries: member
                        .declarations(ty)
                        .iter()
                        .filter_map(|(dep, version)| {
                            root.specifier(ty, dep).map(|root_version| OverlapEntry {
                                dependency: dep.clone(),
                                version: version.clone(),
                                root_version: root_version.to_string(),
                            })
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect()
}
