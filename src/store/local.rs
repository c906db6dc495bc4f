//! Installed-package store, backed by the system package database (spec
//! §4.7).
//!
//! `rpm` (the crate) reads standalone `.rpm` files, not the installed
//! Berkeley/sqlite rpmdb itself, so this queries it by shelling out to
//! the `rpm` binary with `--dbpath` and a fixed `--queryformat`, one
//! query for the package list and one `-ql` per package for its file
//! list.
use crate::errors::*;
use crate::package::{Evr, Group, Package, PackageBuilder, INSTALLED_SOURCE};
use std::path::{Path, PathBuf};
use std::process::Command;

const QUERY_FORMAT: &str = "%{NAME}\\t%{EPOCH}\\t%{VERSION}\\t%{RELEASE}\\t%{ARCH}\\t%{SIZE}\\t%{SUMMARY}\\t%{LICENSE}\\t%{URL}\\t%{GROUP}\\n";

pub struct StoreLocal {
    dbpath: PathBuf,
}

impl StoreLocal {
    pub fn new(dbpath: impl Into<PathBuf>) -> Self {
        StoreLocal { dbpath: dbpath.into() }
    }

    fn rpm_query(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("rpm")
            .arg("--dbpath")
            .arg(&self.dbpath)
            .args(args)
            .output()
            .map_err(|e| Error::NoSupport(format!("rpm binary unavailable: {e}")))?;
        if !output.status.success() {
            return Err(Error::FailedToFind(String::from_utf8_lossy(&output.stderr).into_owned()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn parse_line(line: &str) -> Option<Package> {
        let mut f = line.split('\t');
        let name = f.next()?.to_string();
        let epoch = f.next()?;
        let version = f.next()?.to_string();
        let release = f.next()?.to_string();
        let arch = f.next()?.to_string();
        let size: u64 = f.next()?.parse().unwrap_or(0);
        let summary = f.next().unwrap_or("").to_string();
        let license = f.next().unwrap_or("").to_string();
        let url = f.next().unwrap_or("").to_string();
        let group = f.next().unwrap_or("");

        Some(
            PackageBuilder {
                name,
                evr: Evr {
                    epoch: (epoch != "(none)").then(|| epoch.parse().ok()).flatten(),
                    version,
                    release,
                },
                arch,
                source: INSTALLED_SOURCE.to_string(),
                size,
                summary,
                license,
                url,
                group: Some(group_from_rpm(group)),
                installed: true,
                ..Default::default()
            }
            .build(),
        )
    }

    /// All installed packages, empty-query-proof against an empty rpmdb.
    pub fn get_packages(&self) -> Result<Vec<Package>> {
        let out = self.rpm_query(&["-qa", "--queryformat", QUERY_FORMAT])?;
        Ok(out.lines().filter_map(Self::parse_line).collect())
    }

    pub fn find_by_name(&self, name: &str) -> Result<Package> {
        let packages = self.get_packages()?;
        let mut matches = packages.into_iter().filter(|p| p.name() == name);
        match (matches.next(), matches.next()) {
            (None, _) => Err(Error::FailedToFind(name.to_string())),
            (Some(pkg), None) => Ok(pkg),
            (Some(_), Some(_)) => Err(Error::MultipleMatches(name.to_string())),
        }
    }

    pub fn query_files(&self, nevra: &str) -> Result<Vec<String>> {
        let out = self.rpm_query(&["-ql", nevra])?;
        Ok(out.lines().map(str::to_string).collect())
    }

    pub fn dbpath(&self) -> &Path {
        &self.dbpath
    }
}

fn group_from_rpm(text: &str) -> Group {
    match text {
        s if s.starts_with("System") => Group::System,
        s if s.starts_with("Applications") => Group::Applications,
        s if s.starts_with("Development") => Group::Development,
        s if s.starts_with("Documentation") => Group::Documentation,
        _ => Group::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_line_handles_missing_epoch() {
        let line = "bash\t(none)\t5.2\t2.fc41\tx86_64\t8200000\tThe GNU Bourne Again shell\tGPLv3+\thttps://www.gnu.org/software/bash\tSystem Environment/Shells";
        let pkg = StoreLocal::parse_line(line).unwrap();
        assert_eq!(pkg.name(), "bash");
        assert_eq!(pkg.evr().epoch, None);
        assert_eq!(pkg.group, Group::System);
        assert!(pkg.installed);
    }

    #[test]
    fn parse_line_rejects_truncated_rows() {
        assert!(StoreLocal::parse_line("bash\t0\t5.2").is_none());
    }
}
