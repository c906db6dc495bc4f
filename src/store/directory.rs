//! A plain directory of `.rpm` files treated as a store (spec §4.9),
//! grounded on `microsoft-rpmoci`'s `rpm::Package::open` usage and
//! `walkdir` for the recursive scan.
use crate::errors::*;
use crate::package::{Depend, DependFlag, Evr, Package, PackageBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub struct StoreDirectory {
    root: PathBuf,
    id: String,
}

impl StoreDirectory {
    pub fn new(root: impl Into<PathBuf>, id: impl Into<String>) -> Self {
        StoreDirectory {
            root: root.into(),
            id: id.into(),
        }
    }

    fn rpm_paths(&self) -> Vec<PathBuf> {
        WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_path_buf())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("rpm"))
            .collect()
    }

    fn load_one(&self, path: &Path) -> Result<Package> {
        let pkg = rpm::Package::open(path)?;
        let meta = &pkg.metadata;
        let name = meta.get_name()?.to_string();
        let version = meta.get_version()?.to_string();
        let release = meta.get_release()?.to_string();
        let arch = meta.get_arch().unwrap_or("noarch").to_string();
        let epoch = meta.get_epoch().ok();
        let summary = meta.get_summary().map(|s| s.to_string()).unwrap_or_default();
        let description = meta.get_description().map(|s| s.to_string()).unwrap_or_default();
        let license = meta.get_license().map(|s| s.to_string()).unwrap_or_default();
        let url = meta.get_url().map(|s| s.to_string()).unwrap_or_default();
        let size = meta.get_installed_size().unwrap_or(0);

        let requires = meta
            .get_requires()
            .map(|deps| deps.iter().map(to_depend).collect())
            .unwrap_or_default();
        let provides = meta
            .get_provides()
            .map(|deps| deps.iter().map(to_depend).collect())
            .unwrap_or_default();

        Ok(PackageBuilder {
            name,
            evr: Evr { epoch, version, release },
            arch,
            source: self.id.clone(),
            summary,
            description,
            license,
            url,
            size,
            requires,
            provides,
            location_href: Some(path.to_string_lossy().into_owned()),
            ..Default::default()
        }
        .build())
    }

    pub fn get_packages(&self) -> Result<Vec<Package>> {
        self.rpm_paths().iter().map(|p| self.load_one(p)).collect()
    }

    pub fn size(&self) -> usize {
        self.rpm_paths().len()
    }
}

fn to_depend(dep: &rpm::Dependency) -> Depend {
    let flag = if dep.flags.contains(rpm::DependencyFlags::LESS) {
        DependFlag::Less
    } else if dep.flags.contains(rpm::DependencyFlags::GREATER) {
        DependFlag::Greater
    } else if dep.flags.contains(rpm::DependencyFlags::EQUAL) {
        DependFlag::Equal
    } else {
        DependFlag::Any
    };
    Depend::new(&dep.name, flag, dep.version.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_directory_yields_no_packages() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreDirectory::new(dir.path(), "local-dir");
        assert_eq!(store.get_packages().unwrap().len(), 0);
        assert_eq!(store.size(), 0);
    }

    #[test]
    fn non_rpm_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"hello").unwrap();
        let store = StoreDirectory::new(dir.path(), "local-dir");
        assert_eq!(store.size(), 0);
    }
}
