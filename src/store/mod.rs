//! The `Store` family: one kind of catalog of packages (spec §3, §9 —
//! "a sealed enum of concrete kinds replaces the reference-counted
//! polymorphic `ZifStore` hierarchy").
pub mod directory;
pub mod local;
pub mod remote;

use crate::errors::*;
use crate::package::Package;
use directory::StoreDirectory;
use local::StoreLocal;
use remote::StoreRemote;
use std::sync::Arc;

/// A single store, whichever concrete kind backs it. Array/Repos code
/// matches on this instead of going through a trait object, since the
/// set of kinds is closed (spec §9 Design Notes).
pub enum Store {
    Local(Arc<StoreLocal>),
    Remote(Arc<StoreRemote>),
    Directory(Arc<StoreDirectory>),
}

impl Store {
    pub fn id(&self) -> &str {
        match self {
            Store::Local(_) => crate::package::INSTALLED_SOURCE,
            Store::Remote(s) => s.id(),
            Store::Directory(_) => "directory",
        }
    }

    pub fn enabled(&self) -> bool {
        match self {
            Store::Local(_) | Store::Directory(_) => true,
            Store::Remote(s) => s.enabled(),
        }
    }

    pub fn get_packages(&self) -> Result<Vec<Package>> {
        match self {
            Store::Local(s) => s.get_packages(),
            Store::Remote(s) => Ok(s.get_packages()?.as_ref().clone()),
            Store::Directory(s) => s.get_packages(),
        }
    }

    pub fn resolve(&self, name: &str) -> Result<Package> {
        match self {
            Store::Local(s) => s.find_by_name(name),
            Store::Remote(s) => s.resolve(name),
            Store::Directory(s) => {
                let mut matches: Vec<Package> = s.get_packages()?.into_iter().filter(|p| p.name() == name).collect();
                match matches.len() {
                    0 => Err(Error::FailedToFind(name.to_string())),
                    1 => Ok(matches.remove(0)),
                    _ => Err(Error::MultipleMatches(name.to_string())),
                }
            }
        }
    }

    pub fn search_name(&self, needle: &str) -> Result<Vec<Package>> {
        match self {
            Store::Remote(s) => s.search_name(needle),
            _ => Ok(self
                .get_packages()?
                .into_iter()
                .filter(|p| p.name().contains(needle))
                .collect()),
        }
    }

    pub fn what_provides(&self, name: &str) -> Result<Vec<Package>> {
        match self {
            Store::Remote(s) => s.what_provides(name),
            _ => Ok(self
                .get_packages()?
                .into_iter()
                .filter(|p| p.provides.iter().any(|d| d.name == name) || p.name() == name)
                .collect()),
        }
    }

    /// Only a `StoreRemote` can produce an RPM on disk; installed and
    /// directory-backed packages have nowhere further to fetch from.
    pub fn download(&self, relative_path: &str, target_dir: &std::path::Path, state: &crate::state::State) -> Result<std::path::PathBuf> {
        match self {
            Store::Remote(s) => s.download_full(relative_path, target_dir, state),
            _ => Err(Error::NoSupport("download is only supported for remote stores".into())),
        }
    }

    pub fn what_requires(&self, name: &str) -> Result<Vec<Package>> {
        match self {
            Store::Remote(s) => s.what_requires(name),
            _ => Ok(self.get_packages()?.into_iter().filter(|p| p.requires.iter().any(|d| d.name == name)).collect()),
        }
    }

    pub fn what_conflicts(&self, name: &str) -> Result<Vec<Package>> {
        match self {
            Store::Remote(s) => s.what_conflicts(name),
            _ => Ok(self.get_packages()?.into_iter().filter(|p| p.conflicts.iter().any(|d| d.name == name)).collect()),
        }
    }

    pub fn what_obsoletes(&self, dep: &crate::package::Depend) -> Result<Vec<Package>> {
        match self {
            Store::Remote(s) => s.what_obsoletes(dep),
            _ => {
                let target_evr = crate::package::Evr::parse(&dep.evr);
                Ok(self
                    .get_packages()?
                    .into_iter()
                    .filter(|p| {
                        p.obsoletes
                            .iter()
                            .any(|o| crate::package::depend_matches(o, &dep.name, &target_evr))
                    })
                    .collect())
            }
        }
    }

    pub fn find_package(&self, pkgid: &str) -> Result<Option<Package>> {
        match self {
            Store::Remote(s) => s.find_package(pkgid),
            _ => Ok(self.get_packages()?.into_iter().find(|p| p.pkgid.as_deref() == Some(pkgid))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_store_id_is_installed() {
        let store = Store::Local(Arc::new(StoreLocal::new("/tmp/no-such-rpmdb")));
        assert_eq!(store.id(), crate::package::INSTALLED_SOURCE);
        assert!(store.enabled());
    }
}
