use depsync_types::conflict::Location;
use depsync_types::manifest::{DeclarationType, Manifest};
use depsync_types::report::RawDuplicates;
use std::collections::HashMap;

/// Every declaration of one dependency, bucketed by specifier in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub dependency: String,
    pub versions: Vec<(String, Vec<Location>)>,
}

impl IndexEntry {
    pub fn distinct_specifiers(&self) -> usize {
        self.versions.len()
    }

    fn push(&mut self, specifier: &str, location: Location) {
        match self.versions.iter_mut().find(|(v, _)| v == specifier) {
            Some((_, locations)) => locations.push(location),
            None => self.versions.push((specifier.to_string(), vec![location])),
        }
    }
}

/// Cross-package dependency index over `dependencies` and `devDependencies`.
///
/// Iteration follows the order dependencies were first seen while walking manifests in scan
/// order, so identical inputs always yield identical output.
#[derive(Debug, Clone, Default)]
pub struct DependencyIndex {
    entries: Vec<IndexEntry>,
    positions: HashMap<String, usize>,
}

impl DependencyIndex {
    pub fn get(&self, dependency: &str) -> Option<&IndexEntry> {
        self.positions.get(dependency).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, dependency: &str) -> bool {
        self.positions.contains_key(dependency)
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The raw duplicate map: entries with more than one distinct specifier.
    pub fn duplicates(&self) -> RawDuplicates {
        self.entries
            .iter()
            .filter(|e| e.distinct_specifiers() > 1)
            .map(|e| (e.dependency.clone(), e.versions.clone()))
            .collect()
    }

    fn record(&mut self, dependency: &str, specifier: &str, location: Location) {
        let idx = match self.positions.get(dependency) {
            Some(&i) => i,
            None => {
                self.entries.push(IndexEntry {
                    dependency: dependency.to_string(),
                    versions: Vec::new(),
                });
                let i = self.entries.len() - 1;
                self.positions.insert(dependency.to_string(), i);
                i
            }
        };
        self.entries[idx].push(specifier, location);
    }
}

/// Build the index from scanned manifests. Peer declarations are not indexed.
pub fn build_index(manifests: &[Manifest]) -> DependencyIndex {
    let mut index = DependencyIndex::default();
    for manifest in manifests {
        for ty in DeclarationType::INDEXED {
            for (dependency, specifier) in manifest.declarations(ty) {
                index.record(
                    dependency,
                    specifier,
                    Location {
                        package: manifest.name.clone(),
                        declaration_type: ty,
                        path: manifest.dir.clone(),
                    },
                );
            }
        }
    }
    index
}
