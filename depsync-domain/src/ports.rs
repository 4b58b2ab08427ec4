use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use depsync_types::manifest::manifest_path;
use fs_err as fs;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Default name of the directory holding sub-packages.
pub const DEFAULT_PACKAGES_DIR: &str = "packages";

/// Workspace access: member discovery plus manifest read/write.
///
/// Member directories are relative to [`Workspace::root`]; the root itself is `.`.
pub trait Workspace {
    fn root(&self) -> &Utf8Path;

    /// Immediate subdirectories of the packages directory, sorted by name.
    ///
    /// Returns an empty list when the packages directory does not exist.
    fn member_dirs(&self) -> anyhow::Result<Vec<Utf8PathBuf>>;

    fn read_manifest(&self, dir: &Utf8Path) -> anyhow::Result<String>;

    fn write_manifest(&self, dir: &Utf8Path, contents: &str) -> anyhow::Result<()>;
}

/// File-system backed `Workspace`.
#[derive(Debug, Clone)]
pub struct FsWorkspace {
    root: Utf8PathBuf,
    packages_dir: Utf8PathBuf,
}

impl FsWorkspace {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self {
            root,
            packages_dir: Utf8PathBuf::from(DEFAULT_PACKAGES_DIR),
        }
    }

    pub fn with_packages_dir(mut self, packages_dir: impl Into<Utf8PathBuf>) -> Self {
        self.packages_dir = packages_dir.into();
        self
    }

    fn abs_manifest(&self, dir: &Utf8Path) -> Utf8PathBuf {
        let rel = manifest_path(dir);
        if rel.is_absolute() {
            rel
        } else {
            self.root.join(rel)
        }
    }
}

impl Workspace for FsWorkspace {
    fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn member_dirs(&self) -> anyhow::Result<Vec<Utf8PathBuf>> {
        let abs = self.root.join(&self.packages_dir);
        if !abs.is_dir() {
            debug!("no packages directory at {}", abs);
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&abs).with_context(|| format!("list {}", abs))? {
            let entry = entry.with_context(|| format!("list {}", abs))?;
            // Follows symlinks, so linked packages count as members.
            if !entry.path().is_dir() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => debug!("skipping non-utf8 member directory {:?}", raw),
            }
        }
        names.sort();

        Ok(names
            .into_iter()
            .map(|name| self.packages_dir.join(name))
            .collect())
    }

    fn read_manifest(&self, dir: &Utf8Path) -> anyhow::Result<String> {
        let abs = self.abs_manifest(dir);
        fs::read_to_string(&abs).with_context(|| format!("read {}", abs))
    }

    fn write_manifest(&self, dir: &Utf8Path, contents: &str) -> anyhow::Result<()> {
        let abs = self.abs_manifest(dir);
        fs::write(&abs, contents).with_context(|| format!("write {}", abs))
    }
}

/// In-memory `Workspace` for embedding and testing.
///
/// Members are listed in name order, like [`FsWorkspace`]. A member may be registered without a
/// manifest to model a sub-directory that has no `package.json`.
#[derive(Debug, Default)]
pub struct InMemoryWorkspace {
    root: Utf8PathBuf,
    members: BTreeSet<Utf8PathBuf>,
    manifests: RefCell<BTreeMap<Utf8PathBuf, String>>,
    read_only: BTreeSet<Utf8PathBuf>,
}

impl InMemoryWorkspace {
    pub fn new() -> Self {
        Self {
            root: Utf8PathBuf::from("/workspace"),
            ..Self::default()
        }
    }

    pub fn with_root_manifest(self, contents: impl Into<String>) -> Self {
        self.manifests
            .borrow_mut()
            .insert(Utf8PathBuf::from("."), contents.into());
        self
    }

    pub fn with_member(mut self, name: &str, contents: Option<&str>) -> Self {
        let dir = Utf8PathBuf::from(DEFAULT_PACKAGES_DIR).join(name);
        if let Some(contents) = contents {
            self.manifests
                .borrow_mut()
                .insert(dir.clone(), contents.to_string());
        }
        self.members.insert(dir);
        self
    }

    /// Make writes to `dir` fail, as a permission error would.
    pub fn with_read_only(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.read_only.insert(dir.into());
        self
    }

    /// Current manifest contents of `dir`.
    pub fn manifest(&self, dir: &str) -> Option<String> {
        self.manifests.borrow().get(Utf8Path::new(dir)).cloned()
    }
}

impl Workspace for InMemoryWorkspace {
    fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn member_dirs(&self) -> anyhow::Result<Vec<Utf8PathBuf>> {
        Ok(self.members.iter().cloned().collect())
    }

    fn read_manifest(&self, dir: &Utf8Path) -> anyhow::Result<String> {
        self.manifests
            .borrow()
            .get(dir)
            .cloned()
            .with_context(|| format!("read {}: not found", manifest_path(dir)))
    }

    fn write_manifest(&self, dir: &Utf8Path, contents: &str) -> anyhow::Result<()> {
        if self.read_only.contains(dir) {
            anyhow::bail!("write {}: permission denied", manifest_path(dir));
        }
        self.manifests
            .borrow_mut()
            .insert(dir.to_path_buf(), contents.to_string());
        Ok(())
    }
}
