//! Parses `.repo` files under a `reposdir` into [`StoreRemote`]s (spec
//! §4.10, §6 "Repo file format").
//!
//! Reuses [`crate::config::ini`] (same INI shape, one `[id]` section per
//! repository) rather than a second hand-rolled parser.
use crate::config::ini;
use crate::download::Download;
use crate::errors::*;
use crate::store::remote::{RepoDef, StoreRemote};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub struct Repos {
    cache_root: PathBuf,
    download: Arc<Download>,
    retries: u32,
    default_metadata_expire: Duration,
}

impl Repos {
    pub fn new(cache_root: PathBuf, download: Arc<Download>, retries: u32, default_metadata_expire: Duration) -> Self {
        Repos {
            cache_root,
            download,
            retries,
            default_metadata_expire,
        }
    }

    /// Reads every `*.repo` file directly under `reposdir` (no recursion,
    /// matching the flat layout spec §6 describes) and returns one store
    /// per `[id]` section, sorted by id for deterministic iteration
    /// regardless of directory-enumeration order.
    pub fn load_dir(&self, reposdir: &Path) -> Result<Vec<StoreRemote>> {
        let mut stores = Vec::new();
        let mut paths: Vec<PathBuf> = std::fs::read_dir(reposdir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("repo"))
            .collect();
        paths.sort();

        for path in paths {
            let text = std::fs::read_to_string(&path)?;
            let doc = ini::parse(&text);
            for section in doc.sections {
                let map = section.as_map();
                let id = section.name.clone();
                let enabled = map
                    .get("enabled")
                    .map(|v| crate::config::boolean_from_text(v))
                    .unwrap_or(true);
                let baseurl = map
                    .get("baseurl")
                    .map(|v| v.split_whitespace().map(str::to_string).collect())
                    .unwrap_or_default();
                let def = RepoDef {
                    id: id.clone(),
                    name: map.get("name").cloned().unwrap_or_else(|| id.clone()),
                    enabled,
                    baseurl,
                    mirrorlist: map.get("mirrorlist").cloned(),
                    metalink: map.get("metalink").cloned(),
                    gpgcheck: map
                        .get("gpgcheck")
                        .map(|v| crate::config::boolean_from_text(v))
                        .unwrap_or(false),
                    metadata_expire: map
                        .get("metadata_expire")
                        .and_then(|v| crate::config::parse_duration(v))
                        .unwrap_or(self.default_metadata_expire),
                };
                let cache_dir = self.cache_root.join(&id);
                std::fs::create_dir_all(&cache_dir)?;
                stores.push(StoreRemote::new(def, cache_dir, self.download.clone(), self.retries));
            }
        }
        stores.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(stores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_enabled_flag_and_baseurl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fedora.repo");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            "[fedora]\nname=Fedora $releasever\nenabled=1\nbaseurl=https://dl.fp.org/releases/41/Everything/x86_64/os/\ngpgcheck=1\n"
        )
        .unwrap();
        writeln!(f, "[fedora-debug]\nenabled=0\nbaseurl=https://dl.fp.org/debug/\n").unwrap();

        let download = Arc::new(Download::new(Duration::from_secs(5), None, true).unwrap());
        let repos = Repos::new(dir.path().to_path_buf(), download, 3, Duration::from_secs(86400));
        let stores = repos.load_dir(dir.path()).unwrap();
        assert_eq!(stores.len(), 2);
        assert!(stores.iter().find(|s| s.id() == "fedora").unwrap().enabled());
        assert!(!stores.iter().find(|s| s.id() == "fedora-debug").unwrap().enabled());
    }

    #[test]
    fn sorts_stores_by_id_regardless_of_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = std::fs::File::create(dir.path().join("a.repo")).unwrap();
        writeln!(a, "[zeta]\nbaseurl=https://example/zeta/\n").unwrap();
        let mut b = std::fs::File::create(dir.path().join("b.repo")).unwrap();
        writeln!(b, "[alpha]\nbaseurl=https://example/alpha/\n").unwrap();

        let download = Arc::new(Download::new(Duration::from_secs(5), None, true).unwrap());
        let repos = Repos::new(dir.path().to_path_buf(), download, 3, Duration::from_secs(86400));
        let stores = repos.load_dir(dir.path()).unwrap();
        let ids: Vec<&str> = stores.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["alpha", "zeta"]);
    }
}
