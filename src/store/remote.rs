//! A network (or locally-cached) repository: resolves `repomd.xml`,
//! tracks one [`MetadataHandle`] per advertised kind, and answers
//! package queries against the loaded primary listing (spec §4.8, the
//! largest single component).
//!
//! Location assembly order: baseurl entries always go in first, then
//! mirrorlist XOR metalink contributes the rest. Retry accounting is one
//! shared budget for the whole refresh, not per-file.
use crate::download::{Download, LocationPolicy};
use crate::errors::*;
use crate::metadata::{repomd, ChecksumKind, MetadataHandle, MetadataKind};
use crate::package::Package;
use crate::state::State;
use crate::updates::Update;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct RepoDef {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub baseurl: Vec<String>,
    pub mirrorlist: Option<String>,
    pub metalink: Option<String>,
    pub gpgcheck: bool,
    pub metadata_expire: Duration,
}

pub struct StoreRemote {
    pub def: RepoDef,
    cache_dir: PathBuf,
    download: Arc<Download>,
    handles: Mutex<HashMap<MetadataKind, MetadataHandle>>,
    packages: Mutex<Option<Arc<Vec<Package>>>>,
    retries_remaining: Mutex<u32>,
}

impl StoreRemote {
    pub fn new(def: RepoDef, cache_dir: PathBuf, download: Arc<Download>, retries: u32) -> Self {
        StoreRemote {
            def,
            cache_dir,
            download,
            handles: Mutex::new(HashMap::new()),
            packages: Mutex::new(None),
            retries_remaining: Mutex::new(retries),
        }
    }

    pub fn id(&self) -> &str {
        &self.def.id
    }

    pub fn enabled(&self) -> bool {
        self.def.enabled
    }

    /// Assembles the download location pool: baseurl entries always go
    /// in, then either the mirrorlist or the metalink's URIs, never
    /// both.
    fn seed_locations(&self, state: &State) -> Result<()> {
        self.download.location_clear();
        self.download.location_add_array(&self.def.baseurl);

        if let Some(mirrorlist) = &self.def.mirrorlist {
            let handle = self.handle_for(MetadataKind::Mirrorlist, "mirrorlist.txt".into());
            self.download
                .file_full(mirrorlist, &handle.local_path, None, None, None, None, state)?;
            self.download.location_add_md(&handle)?;
        } else if let Some(metalink) = &self.def.metalink {
            let handle = self.handle_for(MetadataKind::Metalink, "metalink.xml".into());
            self.download
                .file_full(metalink, &handle.local_path, None, None, None, None, state)?;
            self.download.location_add_md(&handle)?;
        }

        if self.download.location_size() == 0 {
            return Err(Error::NoData(format!("{} has no usable locations", self.def.id)));
        }
        Ok(())
    }

    fn handle_for(&self, kind: MetadataKind, location: String) -> MetadataHandle {
        MetadataHandle::new(
            kind,
            &self.def.id,
            self.cache_dir.clone(),
            crate::metadata::MetadataInfo {
                timestamp: std::time::SystemTime::now(),
                location,
                checksum: String::new(),
                checksum_uncompressed: String::new(),
                checksum_type: ChecksumKind::Sha256,
                max_age: self.def.metadata_expire,
            },
        )
    }

    /// Downloads and decompresses `repomd.xml` plus every metadata kind
    /// it names, skipping an xml variant when its sql sibling already
    /// loaded (spec §4.8 fixed skip-order). Retries consume one shared
    /// budget for the whole call, not one per file.
    pub fn refresh(&self, state: &State) -> Result<()> {
        if !self.def.enabled {
            return Err(Error::NotEnabled(self.def.id.clone()));
        }
        self.download.location_set_policy(LocationPolicy::Ordered);
        self.seed_locations(state)?;

        let repomd_path = self.cache_dir.join("repomd.xml");
        self.try_with_budget(|| {
            self.download
                .location_full("repodata/repomd.xml", &repomd_path, None, None, None, None, state)
        })?;

        let xml = std::fs::read_to_string(&repomd_path)?;
        let entries = repomd::parse(&xml, self.def.metadata_expire)?;
        let mut loaded_sql = Vec::new();
        let mut handles = HashMap::new();

        for entry in &entries {
            // Skip an xml entry once its sql sibling already loaded in this
            // same pass. Only catches the sibling when repomd.xml lists the
            // sql `<data>` entry before the xml one; the reverse order
            // still loads both.
            if loaded_sql.iter().any(|sql_kind: &MetadataKind| sql_kind.is_sql_variant_of(entry.kind)) {
                continue;
            }
            let handle = MetadataHandle::new(entry.kind, &self.def.id, self.cache_dir.clone(), entry.info.clone());
            if handle.check_uncompressed().is_ok() {
                handles.insert(entry.kind, handle);
                continue;
            }
            self.try_with_budget(|| {
                self.download.location_full(
                    &handle.info.location,
                    &handle.compressed_path(),
                    None,
                    None,
                    Some(handle.info.checksum_type),
                    Some(&handle.info.checksum),
                    state,
                )
            })?;
            handle.decompress_and_remove()?;
            handle.check_uncompressed()?;
            if matches!(entry.kind, MetadataKind::PrimarySql | MetadataKind::FilelistsSql | MetadataKind::OtherSql) {
                loaded_sql.push(entry.kind);
            }
            handles.insert(entry.kind, handle);
        }

        *self.handles.lock().unwrap() = handles;
        *self.packages.lock().unwrap() = None;
        Ok(())
    }

    fn try_with_budget(&self, mut op: impl FnMut() -> Result<()>) -> Result<()> {
        loop {
            match op() {
                Ok(()) => return Ok(()),
                Err(e) => {
                    let mut remaining = self.retries_remaining.lock().unwrap();
                    if *remaining == 0 {
                        return Err(e);
                    }
                    *remaining -= 1;
                }
            }
        }
    }

    pub fn handle(&self, kind: MetadataKind) -> Option<MetadataHandle> {
        self.handles.lock().unwrap().get(&kind).cloned()
    }

    /// Loads (parsing lazily, caching after first call) the package
    /// listing from whichever primary variant this refresh picked.
    pub fn get_packages(&self) -> Result<Arc<Vec<Package>>> {
        if let Some(cached) = self.packages.lock().unwrap().clone() {
            return Ok(cached);
        }
        let handles = self.handles.lock().unwrap();
        let packages = if let Some(handle) = handles.get(&MetadataKind::PrimaryXml) {
            let xml = std::fs::read_to_string(&handle.local_path)?;
            crate::metadata::primary::parse(&xml, &self.def.id)?
        } else if let Some(handle) = handles.get(&MetadataKind::PrimarySql) {
            let conn = rusqlite::Connection::open(&handle.local_path)?;
            crate::metadata::primary::parse_sql(&conn, &self.def.id)?
        } else {
            return Err(Error::NoData("no primary metadata loaded; call refresh() first".into()));
        };
        drop(handles);
        let packages = Arc::new(packages);
        *self.packages.lock().unwrap() = Some(packages.clone());
        Ok(packages)
    }

    pub fn search_name(&self, needle: &str) -> Result<Vec<Package>> {
        Ok(self
            .get_packages()?
            .iter()
            .filter(|p| p.name().contains(needle))
            .cloned()
            .collect())
    }

    pub fn search_details(&self, needle: &str) -> Result<Vec<Package>> {
        Ok(self
            .get_packages()?
            .iter()
            .filter(|p| p.name().contains(needle) || p.summary.contains(needle) || p.description.contains(needle))
            .cloned()
            .collect())
    }

    /// Files owned by `pkgid`, read from whichever filelists variant this
    /// refresh loaded. Empty (not an error) when no filelists metadata was
    /// advertised.
    fn files_for(&self, pkgid: &str) -> Result<Vec<String>> {
        let handles = self.handles.lock().unwrap();
        if let Some(handle) = handles.get(&MetadataKind::FilelistsSql) {
            let path = handle.local_path.clone();
            drop(handles);
            let conn = rusqlite::Connection::open(&path)?;
            crate::metadata::filelists::query_files_sql(&conn, pkgid)
        } else if let Some(handle) = handles.get(&MetadataKind::FilelistsXml) {
            let path = handle.local_path.clone();
            drop(handles);
            let xml = std::fs::read_to_string(&path)?;
            Ok(crate::metadata::filelists::parse_xml(&xml)?.remove(pkgid).unwrap_or_default())
        } else {
            Ok(Vec::new())
        }
    }

    /// Packages owning `path`, routed through filelists rather than
    /// `Package.files` (primary never populates it; spec §4.5/§4.8).
    pub fn search_file(&self, path: &str) -> Result<Vec<Package>> {
        let packages = self.get_packages()?;
        let mut found = Vec::new();
        for pkg in packages.iter() {
            let Some(pkgid) = &pkg.pkgid else { continue };
            if self.files_for(pkgid)?.iter().any(|f| f == path) {
                found.push(pkg.clone());
            }
        }
        Ok(found)
    }

    /// Name/self-provide matches from primary, plus (spec §4.8) a
    /// filelists lookup when `name` looks like an absolute file path —
    /// `Any`-flag file dependencies aren't listed in primary's provides.
    pub fn what_provides(&self, name: &str) -> Result<Vec<Package>> {
        let mut found: Vec<Package> = self
            .get_packages()?
            .iter()
            .filter(|p| p.provides.iter().any(|d| d.name == name) || p.name() == name)
            .cloned()
            .collect();
        if name.starts_with('/') {
            found.extend(self.search_file(name)?);
        }
        let mut seen = std::collections::HashSet::new();
        found.retain(|p| seen.insert(p.nevra()));
        Ok(found)
    }

    pub fn what_requires(&self, name: &str) -> Result<Vec<Package>> {
        Ok(self
            .get_packages()?
            .iter()
            .filter(|p| p.requires.iter().any(|d| d.name == name))
            .cloned()
            .collect())
    }

    pub fn what_conflicts(&self, name: &str) -> Result<Vec<Package>> {
        Ok(self
            .get_packages()?
            .iter()
            .filter(|p| p.conflicts.iter().any(|d| d.name == name))
            .cloned()
            .collect())
    }

    /// Packages whose `Obsoletes:` list is satisfied by `dep` (spec §4.5,
    /// §4.11 scenario 5 "Obsoletes as updates").
    pub fn what_obsoletes(&self, dep: &crate::package::Depend) -> Result<Vec<Package>> {
        let target_evr = crate::package::Evr::parse(&dep.evr);
        Ok(self
            .get_packages()?
            .iter()
            .filter(|p| {
                p.obsoletes
                    .iter()
                    .any(|o| crate::package::depend_matches(o, &dep.name, &target_evr))
            })
            .cloned()
            .collect())
    }

    pub fn find_package(&self, pkgid: &str) -> Result<Option<Package>> {
        Ok(self.get_packages()?.iter().find(|p| p.pkgid.as_deref() == Some(pkgid)).cloned())
    }

    fn comps_document(&self) -> Result<Option<crate::metadata::comps::CompsDocument>> {
        let handles = self.handles.lock().unwrap();
        let Some(handle) = handles.get(&MetadataKind::Comps) else {
            return Ok(None);
        };
        let path = handle.local_path.clone();
        drop(handles);
        let xml = std::fs::read_to_string(&path)?;
        Ok(Some(crate::metadata::comps::parse(&xml)?))
    }

    pub fn get_categories(&self) -> Result<Vec<crate::metadata::comps::Category>> {
        Ok(self.comps_document()?.map(|d| d.categories).unwrap_or_default())
    }

    pub fn get_groups_for_category(&self, cat_id: &str) -> Result<Vec<crate::metadata::comps::CompsGroup>> {
        let Some(doc) = self.comps_document()? else {
            return Ok(Vec::new());
        };
        let Some(cat) = doc.categories.iter().find(|c| c.id == cat_id) else {
            return Ok(Vec::new());
        };
        Ok(doc.groups.into_iter().filter(|g| cat.group_ids.contains(&g.id)).collect())
    }

    /// Resolves `cat_id` to its member package names via comps, then
    /// resolves each name first against `rpmdb` (preferring the installed
    /// version), falling back to this store's own listing. Names that
    /// resolve nowhere are skipped rather than erroring (spec §4.8).
    pub fn search_category(&self, cat_id: &str, rpmdb: &crate::store::local::StoreLocal) -> Result<Vec<Package>> {
        let groups = self.get_groups_for_category(cat_id)?;
        let mut names: Vec<String> = Vec::new();
        for g in &groups {
            names.extend(g.mandatory_packages.iter().cloned());
            names.extend(g.optional_packages.iter().cloned());
        }
        names.sort();
        names.dedup();

        let mut found = Vec::new();
        for name in names {
            if let Ok(pkg) = rpmdb.find_by_name(&name) {
                found.push(pkg);
            } else if let Ok(pkg) = self.resolve(&name) {
                found.push(pkg);
            }
        }
        Ok(found)
    }

    /// Changelog entries for `name` at or above `floor`, read from
    /// whichever `other` variant this refresh loaded. Empty (not an
    /// error) when the repo carries no `other` metadata.
    pub fn changelog_since(
        &self,
        name: &str,
        floor: &crate::package::Evr,
    ) -> Result<Vec<crate::metadata::other::ChangelogEntry>> {
        let pkg = match self.resolve(name) {
            Ok(p) => p,
            Err(_) => return Ok(Vec::new()),
        };
        let Some(pkgid) = pkg.pkgid.clone() else {
            return Ok(Vec::new());
        };

        let handles = self.handles.lock().unwrap();
        let (is_sql, path) = match (handles.get(&MetadataKind::OtherSql), handles.get(&MetadataKind::OtherXml)) {
            (Some(h), _) => (true, h.local_path.clone()),
            (None, Some(h)) => (false, h.local_path.clone()),
            (None, None) => return Ok(Vec::new()),
        };
        drop(handles);

        let all = if is_sql {
            let conn = rusqlite::Connection::open(&path)?;
            crate::metadata::other::query_changelog_sql(&conn, &pkgid)?
        } else {
            let xml = std::fs::read_to_string(&path)?;
            crate::metadata::other::parse_xml(&xml)?.remove(&pkgid).unwrap_or_default()
        };

        Ok(all
            .into_iter()
            .filter(|c| match crate::metadata::other::entry_evr(c) {
                Some(evr) => crate::package::evr_compare(&evr, floor) != std::cmp::Ordering::Less,
                None => true,
            })
            .collect())
    }

    /// The delta (if any) that would rebuild `name` from `old_evr` to its
    /// current candidate version, read from `prestodelta.xml` (spec §2
    /// prestodelta, GLOSSARY "Delta RPM"). `None` when the repo carries no
    /// prestodelta metadata or no matching transition exists.
    pub fn find_delta(&self, name: &str, old_evr: &str) -> Result<Option<crate::metadata::prestodelta::DeltaRpm>> {
        let handles = self.handles.lock().unwrap();
        let Some(handle) = handles.get(&MetadataKind::Prestodelta) else {
            return Ok(None);
        };
        let path = handle.local_path.clone();
        drop(handles);
        let xml = std::fs::read_to_string(&path)?;
        let deltas = crate::metadata::prestodelta::parse(&xml)?;
        let new_evr = self.resolve(name).ok().map(|p| p.evr().to_string()).unwrap_or_default();
        Ok(crate::metadata::prestodelta::find_delta(&deltas, name, old_evr, &new_evr).cloned())
    }

    /// Looks up `name`'s update detail: the newest matching advisory if
    /// `updateinfo` names it, or a placeholder (fixed title, no real
    /// metadata) when this repo carries no `updateinfo` at all — kept so
    /// the changelog attachment below still runs for repos (e.g. Fedora)
    /// that publish changelogs but not update notices for every package.
    /// Changelog entries are filtered to those at or above `installed`'s
    /// EVR when `installed` is given.
    pub fn get_update_detail(&self, name: &str, installed: Option<&Package>) -> Result<Vec<Update>> {
        let pkg = self.resolve(name)?;
        let handle = self.handle(MetadataKind::Updateinfo);
        let advisory = match &handle {
            Some(h) => {
                let xml = std::fs::read_to_string(&h.local_path)?;
                let advisories = crate::metadata::updateinfo::parse(&xml)?;
                crate::metadata::updateinfo::find_for_package(&advisories, name)
                    .into_iter()
                    .next()
                    .cloned()
            }
            None => Some(crate::metadata::updateinfo::Advisory {
                id: format!("{}-generated", self.def.id),
                from: self.def.id.clone(),
                status: String::new(),
                update_type: String::new(),
                title: format!("{name} update"),
                issued: String::new(),
                description: String::new(),
                references: Vec::new(),
                packages: Vec::new(),
            }),
        };

        let floor = installed.map(|p| p.evr().clone()).unwrap_or_default();
        let changelog = self.changelog_since(name, &floor)?;

        Ok(vec![Update {
            installed: installed.cloned().unwrap_or_else(|| pkg.clone()),
            available: pkg,
            advisory,
            changelog,
        }])
    }

    pub fn resolve(&self, name: &str) -> Result<Package> {
        let mut matches: Vec<Package> = self
            .get_packages()?
            .iter()
            .filter(|p| p.name() == name)
            .cloned()
            .collect();
        match matches.len() {
            0 => Err(Error::FailedToFind(name.to_string())),
            1 => Ok(matches.remove(0)),
            _ => Err(Error::MultipleMatches(name.to_string())),
        }
    }

    /// Downloads the RPM at `relative_path` (a package's `location_href`)
    /// into `target_dir/<basename>`, re-seeding the location pool first
    /// since a prior refresh may have exhausted mirrors from it.
    pub fn download_full(&self, relative_path: &str, target_dir: &std::path::Path, state: &State) -> Result<PathBuf> {
        self.download.location_set_policy(LocationPolicy::Ordered);
        self.seed_locations(state)?;
        let filename = relative_path.rsplit('/').next().unwrap_or(relative_path);
        let target = target_dir.join(filename);
        self.try_with_budget(|| self.download.location_full(relative_path, &target, None, None, None, None, state))
            .map_err(|_| Error::FailedToDownload)?;
        Ok(target)
    }

    pub fn clean(&self) -> Result<()> {
        for handle in self.handles.lock().unwrap().values() {
            handle.clean()?;
        }
        let _ = std::fs::remove_file(self.cache_dir.join("repomd.xml"));
        *self.packages.lock().unwrap() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(baseurl: Vec<String>) -> RepoDef {
        RepoDef {
            id: "test-repo".into(),
            name: "Test Repo".into(),
            enabled: true,
            baseurl,
            mirrorlist: None,
            metalink: None,
            gpgcheck: false,
            metadata_expire: Duration::from_secs(86400),
        }
    }

    #[test]
    fn refresh_rejects_disabled_store() {
        let dir = tempfile::tempdir().unwrap();
        let download = Arc::new(Download::new(Duration::from_secs(1), None, true).unwrap());
        let mut repo_def = def(vec!["/nonexistent".into()]);
        repo_def.enabled = false;
        let store = StoreRemote::new(repo_def, dir.path().to_path_buf(), download, 1);
        let state = State::root();
        assert!(matches!(store.refresh(&state), Err(Error::NotEnabled(_))));
    }

    #[test]
    fn get_packages_without_refresh_is_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let download = Arc::new(Download::new(Duration::from_secs(1), None, true).unwrap());
        let store = StoreRemote::new(def(vec!["/nonexistent".into()]), dir.path().to_path_buf(), download, 1);
        assert!(matches!(store.get_packages(), Err(Error::NoData(_))));
    }

    #[test]
    fn refresh_loads_local_repo_tree() {
        let repo_dir = tempfile::tempdir().unwrap();
        let repodata = repo_dir.path().join("repodata");
        std::fs::create_dir_all(&repodata).unwrap();

        let primary_xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata xmlns="http://linux.duke.edu/metadata/common" xmlns:rpm="http://linux.duke.edu/metadata/rpm" packages="1">
<package type="rpm">
  <name>bash</name>
  <arch>x86_64</arch>
  <version epoch="0" ver="5.2" rel="2.fc41"/>
  <summary>shell</summary>
  <location href="Packages/bash-5.2-2.fc41.x86_64.rpm"/>
</package>
</metadata>
"#;
        let checksum = crate::chksums::sha256_hex(primary_xml.as_bytes());
        std::fs::write(repodata.join("primary.xml"), primary_xml).unwrap();

        let repomd_xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<repomd xmlns="http://linux.duke.edu/metadata/repo">
  <data type="primary">
    <checksum type="sha256">{checksum}</checksum>
    <open-checksum type="sha256">{checksum}</open-checksum>
    <location href="repodata/primary.xml"/>
    <timestamp>1712990625</timestamp>
  </data>
</repomd>
"#
        );
        std::fs::write(repodata.join("repomd.xml"), repomd_xml).unwrap();

        let cache_dir = tempfile::tempdir().unwrap();
        let download = Arc::new(Download::new(Duration::from_secs(1), None, true).unwrap());
        let store = StoreRemote::new(
            def(vec![repo_dir.path().to_string_lossy().into_owned()]),
            cache_dir.path().to_path_buf(),
            download,
            2,
        );
        let state = State::root();
        store.refresh(&state).unwrap();

        let packages = store.get_packages().unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].name(), "bash");

        let found = store.resolve("bash").unwrap();
        assert_eq!(found.nevra(), "bash;0:5.2-2.fc41;x86_64;test-repo");
    }

    fn handle_for_kind(store: &StoreRemote, kind: MetadataKind, filename: &str) -> MetadataHandle {
        crate::metadata::MetadataHandle::new(
            kind,
            &store.def.id,
            store.cache_dir.clone(),
            crate::metadata::MetadataInfo {
                timestamp: std::time::SystemTime::now(),
                location: filename.to_string(),
                checksum: String::new(),
                checksum_uncompressed: String::new(),
                checksum_type: ChecksumKind::Sha256,
                max_age: Duration::from_secs(86400),
            },
        )
    }

    #[test]
    fn get_packages_reads_primary_sql_when_xml_absent() {
        let cache_dir = tempfile::tempdir().unwrap();
        let download = Arc::new(Download::new(Duration::from_secs(1), None, true).unwrap());
        let store = StoreRemote::new(def(vec!["/nonexistent".into()]), cache_dir.path().to_path_buf(), download, 1);

        let handle = handle_for_kind(&store, MetadataKind::PrimarySql, "primary.sqlite");
        let conn = rusqlite::Connection::open(&handle.local_path).unwrap();
        conn.execute_batch(
            "CREATE TABLE packages (
                pkgKey INTEGER PRIMARY KEY, pkgId TEXT, name TEXT, arch TEXT, epoch TEXT,
                version TEXT, release TEXT, summary TEXT, description TEXT, url TEXT,
                rpm_license TEXT, rpm_group TEXT, size_package INTEGER, location_href TEXT
             );
             CREATE TABLE requires (name TEXT, flags TEXT, epoch TEXT, version TEXT, release TEXT, pkgKey INTEGER);
             CREATE TABLE provides (name TEXT, flags TEXT, epoch TEXT, version TEXT, release TEXT, pkgKey INTEGER);
             CREATE TABLE obsoletes (name TEXT, flags TEXT, epoch TEXT, version TEXT, release TEXT, pkgKey INTEGER);
             CREATE TABLE conflicts (name TEXT, flags TEXT, epoch TEXT, version TEXT, release TEXT, pkgKey INTEGER);
             INSERT INTO packages VALUES
                (1, 'abc123', 'bash', 'x86_64', '0', '5.2', '2.fc41', 'shell', 'desc', 'https://x',
                 'GPLv3+', 'System', 8200000, 'Packages/bash.rpm');",
        )
        .unwrap();
        drop(conn);
        store.handles.lock().unwrap().insert(MetadataKind::PrimarySql, handle);

        let packages = store.get_packages().unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].name(), "bash");
        assert_eq!(packages[0].pkgid.as_deref(), Some("abc123"));
    }

    #[test]
    fn what_obsoletes_matches_exact_nevr() {
        let cache_dir = tempfile::tempdir().unwrap();
        let download = Arc::new(Download::new(Duration::from_secs(1), None, true).unwrap());
        let store = StoreRemote::new(def(vec!["/nonexistent".into()]), cache_dir.path().to_path_buf(), download, 1);

        let handle = handle_for_kind(&store, MetadataKind::PrimarySql, "primary.sqlite");
        let conn = rusqlite::Connection::open(&handle.local_path).unwrap();
        conn.execute_batch(
            "CREATE TABLE packages (
                pkgKey INTEGER PRIMARY KEY, pkgId TEXT, name TEXT, arch TEXT, epoch TEXT,
                version TEXT, release TEXT, summary TEXT, description TEXT, url TEXT,
                rpm_license TEXT, rpm_group TEXT, size_package INTEGER, location_href TEXT
             );
             CREATE TABLE requires (name TEXT, flags TEXT, epoch TEXT, version TEXT, release TEXT, pkgKey INTEGER);
             CREATE TABLE provides (name TEXT, flags TEXT, epoch TEXT, version TEXT, release TEXT, pkgKey INTEGER);
             CREATE TABLE obsoletes (name TEXT, flags TEXT, epoch TEXT, version TEXT, release TEXT, pkgKey INTEGER);
             CREATE TABLE conflicts (name TEXT, flags TEXT, epoch TEXT, version TEXT, release TEXT, pkgKey INTEGER);
             INSERT INTO packages VALUES
                (1, 'bar1', 'bar', 'i386', '0', '2.0', '1', 's', 'd', 'u', 'GPL', 'System', 1, 'bar.rpm');
             INSERT INTO obsoletes VALUES ('foo', 'EQ', '0', '1.0', '1', 1);",
        )
        .unwrap();
        drop(conn);
        store.handles.lock().unwrap().insert(MetadataKind::PrimarySql, handle);

        let dep = crate::package::Depend::new("foo", crate::package::DependFlag::Equal, "0:1.0-1");
        let matches = store.what_obsoletes(&dep).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name(), "bar");
    }
}
