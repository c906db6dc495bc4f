//! Fan-out operations over a set of [`Store`]s (spec §4.11).
//!
//! Each method folds per-store results into one answer. A store that
//! fails with `NotEnabled` (it got disabled mid-iteration) is always
//! skipped silently; any other per-store error is handed to the
//! caller-supplied [`ErrorHandler`], which decides whether the fan-out
//! continues or aborts (spec §9 Design Notes). Operations that are
//! inherently single-valued (`resolve`, `find_package`) additionally
//! treat "not found in this store" as unremarkable, but an empty result
//! across every store is still a `FailedToFind`/`MultipleMatches`.
use crate::errors::*;
use crate::package::{evr_compare, Depend, DependFlag, Package};
use crate::store::Store;
use crate::updates::Update;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

/// What a fan-out does after a per-store, non-`NotEnabled` error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    Continue,
    Abort,
}

/// Per-call error policy threaded through every [`StoreArray`] fan-out
/// (spec §4.11, §9: "a per-call `ErrorHandler` strategy object with a
/// single method `on_error(store_id, error) -> Continue|Abort`").
pub trait ErrorHandler {
    fn on_error(&self, store_id: &str, error: &Error) -> ErrorAction;
}

/// Skips every per-store failure; matches this crate's historical
/// swallow-all behavior and is what the CLI uses by default.
pub struct ContinueOnError;

impl ErrorHandler for ContinueOnError {
    fn on_error(&self, _store_id: &str, _error: &Error) -> ErrorAction {
        ErrorAction::Continue
    }
}

/// Stops the whole fan-out at the first non-`NotEnabled` failure.
pub struct AbortOnError;

impl ErrorHandler for AbortOnError {
    fn on_error(&self, _store_id: &str, _error: &Error) -> ErrorAction {
        ErrorAction::Abort
    }
}

/// Which field(s) of a package `resolve_full` pattern is matched
/// against, plus the pattern language (plain equality unless `regex` or
/// `glob` is set) and whether matching folds case. OR-combinable; if
/// none of the `use_name*` fields are set, `use_name` is implied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveFlags {
    pub use_name: bool,
    pub use_name_arch: bool,
    pub use_name_version: bool,
    pub use_name_version_arch: bool,
    pub regex: bool,
    pub glob: bool,
    pub case_insensitive: bool,
}

impl ResolveFlags {
    pub fn exact_name() -> Self {
        ResolveFlags {
            use_name: true,
            ..Default::default()
        }
    }
}

fn keys_for(pkg: &Package, flags: ResolveFlags) -> Vec<String> {
    let mut keys = Vec::new();
    let none_selected = !flags.use_name_arch && !flags.use_name_version && !flags.use_name_version_arch;
    if flags.use_name || none_selected {
        keys.push(pkg.name().to_string());
    }
    if flags.use_name_arch {
        keys.push(format!("{}.{}", pkg.name(), pkg.arch()));
    }
    if flags.use_name_version {
        keys.push(format!("{}-{}", pkg.name(), pkg.evr()));
    }
    if flags.use_name_version_arch {
        keys.push(format!("{}-{}.{}", pkg.name(), pkg.evr(), pkg.arch()));
    }
    keys
}

fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::from("^");
    for c in pattern.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '.' | '+' | '(' | ')' | '|' | '^' | '$' | '\\' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            other => out.push(other),
        }
    }
    out.push('$');
    out
}

fn pattern_matches(key: &str, pattern: &str, flags: ResolveFlags) -> bool {
    if flags.regex {
        let pat = if flags.case_insensitive { format!("(?i){pattern}") } else { pattern.to_string() };
        regex::Regex::new(&pat).map(|re| re.is_match(key)).unwrap_or(false)
    } else if flags.glob {
        let translated = glob_to_regex(pattern);
        let pat = if flags.case_insensitive { format!("(?i){translated}") } else { translated };
        regex::Regex::new(&pat).map(|re| re.is_match(key)).unwrap_or(false)
    } else if flags.case_insensitive {
        key.eq_ignore_ascii_case(pattern)
    } else {
        key == pattern
    }
}

pub struct StoreArray {
    stores: Vec<Store>,
}

impl StoreArray {
    pub fn new(stores: Vec<Store>) -> Self {
        StoreArray { stores }
    }

    fn enabled_stores(&self) -> impl Iterator<Item = &Store> {
        self.stores.iter().filter(|s| s.enabled())
    }

    fn require_nonempty(&self) -> Result<()> {
        if self.stores.is_empty() {
            Err(Error::ArrayIsEmpty)
        } else {
            Ok(())
        }
    }

    /// Runs `op` against every enabled store, concatenating results.
    /// `NotEnabled` is always swallowed; any other error consults
    /// `on_error`.
    fn fold_store_results<T>(
        &self,
        on_error: &dyn ErrorHandler,
        mut op: impl FnMut(&Store) -> Result<Vec<T>>,
    ) -> Result<Vec<T>> {
        let mut all = Vec::new();
        for store in self.enabled_stores() {
            match op(store) {
                Ok(items) => all.extend(items),
                Err(Error::NotEnabled(_)) => continue,
                Err(e) => match on_error.on_error(store.id(), &e) {
                    ErrorAction::Continue => continue,
                    ErrorAction::Abort => return Err(e),
                },
            }
        }
        Ok(all)
    }

    pub fn get_packages(&self, on_error: &dyn ErrorHandler) -> Result<Vec<Package>> {
        self.require_nonempty()?;
        self.fold_store_results(on_error, |s| s.get_packages())
    }

    /// The general pattern-matching primitive every name-based lookup
    /// below is built on (spec §4.5 `resolve_full`). Each of `names` is
    /// matched, per `flags`, against every enabled store's packages; a
    /// package is kept if any pattern matches any of its selected keys.
    pub fn resolve_full(&self, names: &[String], flags: ResolveFlags, on_error: &dyn ErrorHandler) -> Result<Vec<Package>> {
        self.require_nonempty()?;
        let packages = self.fold_store_results(on_error, |s| s.get_packages())?;
        Ok(packages
            .into_iter()
            .filter(|pkg| {
                let keys = keys_for(pkg, flags);
                names.iter().any(|pattern| keys.iter().any(|key| pattern_matches(key, pattern, flags)))
            })
            .collect())
    }

    /// Substring match on name, expressed as a `resolve_full` glob
    /// (`*needle*` against `use_name`).
    pub fn search_name(&self, needle: &str, on_error: &dyn ErrorHandler) -> Result<Vec<Package>> {
        self.require_nonempty()?;
        self.resolve_full(
            &[format!("*{needle}*")],
            ResolveFlags {
                use_name: true,
                glob: true,
                ..Default::default()
            },
            on_error,
        )
    }

    pub fn search_details(&self, needle: &str, on_error: &dyn ErrorHandler) -> Result<Vec<Package>> {
        self.require_nonempty()?;
        Ok(self
            .get_packages(on_error)?
            .into_iter()
            .filter(|p| p.name().contains(needle) || p.summary.contains(needle) || p.description.contains(needle))
            .collect())
    }

    pub fn search_file(&self, path: &str, on_error: &dyn ErrorHandler) -> Result<Vec<Package>> {
        self.require_nonempty()?;
        self.fold_store_results(on_error, |s| match s {
            Store::Remote(r) => r.search_file(path).map_err(Into::into),
            _ => Ok(s.get_packages()?.into_iter().filter(|p| p.files.iter().any(|f| f == path)).collect()),
        })
    }

    pub fn search_group(&self, group: crate::package::Group, on_error: &dyn ErrorHandler) -> Result<Vec<Package>> {
        self.require_nonempty()?;
        Ok(self.get_packages(on_error)?.into_iter().filter(|p| p.group == group).collect())
    }

    pub fn search_pkgid(&self, pkgids: &[String], on_error: &dyn ErrorHandler) -> Result<Vec<Package>> {
        self.require_nonempty()?;
        let packages = self.fold_store_results(on_error, |s| s.get_packages())?;
        Ok(packages
            .into_iter()
            .filter(|p| p.pkgid.as_deref().map(|id| pkgids.iter().any(|x| x == id)).unwrap_or(false))
            .collect())
    }

    /// Stops at the first store that has `pkgid` (spec §4.11).
    pub fn find_package(&self, pkgid: &str, on_error: &dyn ErrorHandler) -> Result<Package> {
        self.require_nonempty()?;
        for store in self.enabled_stores() {
            match store.find_package(pkgid) {
                Ok(Some(pkg)) => return Ok(pkg),
                Ok(None) => continue,
                Err(Error::NotEnabled(_)) => continue,
                Err(e) => match on_error.on_error(store.id(), &e) {
                    ErrorAction::Continue => continue,
                    ErrorAction::Abort => return Err(e),
                },
            }
        }
        Err(Error::FailedToFind(pkgid.to_string()))
    }

    pub fn what_provides(&self, name: &str, on_error: &dyn ErrorHandler) -> Result<Vec<Package>> {
        self.require_nonempty()?;
        self.fold_store_results(on_error, |s| s.what_provides(name))
    }

    pub fn what_requires(&self, name: &str, on_error: &dyn ErrorHandler) -> Result<Vec<Package>> {
        self.require_nonempty()?;
        self.fold_store_results(on_error, |s| s.what_requires(name))
    }

    pub fn what_conflicts(&self, name: &str, on_error: &dyn ErrorHandler) -> Result<Vec<Package>> {
        self.require_nonempty()?;
        self.fold_store_results(on_error, |s| s.what_conflicts(name))
    }

    pub fn what_obsoletes(&self, dep: &Depend, on_error: &dyn ErrorHandler) -> Result<Vec<Package>> {
        self.require_nonempty()?;
        self.fold_store_results(on_error, |s| s.what_obsoletes(dep))
    }

    pub fn get_depends(&self, pkg: &Package, on_error: &dyn ErrorHandler) -> Result<Vec<Package>> {
        self.require_nonempty()?;
        let mut resolved = Vec::new();
        for dep in &pkg.requires {
            resolved.append(&mut self.what_provides(&dep.name, on_error)?);
        }
        Ok(resolved)
    }

    /// Every category named by any remote store's comps data, deduped by
    /// id (spec §4.11).
    pub fn get_categories(&self, on_error: &dyn ErrorHandler) -> Result<Vec<crate::metadata::comps::Category>> {
        self.require_nonempty()?;
        let mut all = Vec::new();
        for store in self.enabled_stores() {
            let Store::Remote(r) = store else { continue };
            match r.get_categories() {
                Ok(cats) => all.extend(cats),
                Err(Error::NotEnabled(_)) => continue,
                Err(e) => match on_error.on_error(store.id(), &e) {
                    ErrorAction::Continue => continue,
                    ErrorAction::Abort => return Err(e),
                },
            }
        }
        let mut seen = HashSet::new();
        all.retain(|c| seen.insert(c.id.clone()));
        Ok(all)
    }

    /// Packages named by `cat_id`'s member groups, across every remote
    /// store, deduped by package id (spec §4.11).
    pub fn search_category(
        &self,
        cat_id: &str,
        rpmdb: &crate::store::local::StoreLocal,
        on_error: &dyn ErrorHandler,
    ) -> Result<Vec<Package>> {
        self.require_nonempty()?;
        let mut all = Vec::new();
        for store in self.enabled_stores() {
            let Store::Remote(r) = store else { continue };
            match r.search_category(cat_id, rpmdb) {
                Ok(pkgs) => all.extend(pkgs),
                Err(Error::NotEnabled(_)) => continue,
                Err(e) => match on_error.on_error(store.id(), &e) {
                    ErrorAction::Continue => continue,
                    ErrorAction::Abort => return Err(e),
                },
            }
        }
        let mut seen = HashSet::new();
        all.retain(|p| seen.insert(p.pkgid.clone().unwrap_or_else(|| p.nevra())));
        Ok(all)
    }

    /// Resolves `name` to exactly one package across every store, built
    /// atop `resolve_full` with an exact-name match (spec §4.11).
    pub fn resolve(&self, name: &str, on_error: &dyn ErrorHandler) -> Result<Package> {
        self.require_nonempty()?;
        let mut found = self.resolve_full(&[name.to_string()], ResolveFlags::exact_name(), on_error)?;
        match found.len() {
            0 => Err(Error::FailedToFind(name.to_string())),
            1 => Ok(found.remove(0)),
            _ => Err(Error::MultipleMatches(name.to_string())),
        }
    }

    /// Looks for a `StoreRemote` in this array whose `id()` matches
    /// `source`, and asks it for `name`'s full update detail (advisory +
    /// changelog). `None` when no such store exists or it has nothing to
    /// say about `name`.
    fn remote_update_detail(&self, name: &str, installed: Option<&Package>, source: &str) -> Option<Update> {
        self.stores.iter().find_map(|s| match s {
            Store::Remote(r) if r.id() == source => r
                .get_update_detail(name, installed)
                .ok()
                .and_then(|mut v| if v.is_empty() { None } else { Some(v.remove(0)) }),
            _ => None,
        })
    }

    fn newest_per_name(packages: Vec<Package>) -> Vec<Package> {
        let mut by_name: std::collections::HashMap<String, Package> = std::collections::HashMap::new();
        for pkg in packages {
            let keep = match by_name.get(pkg.name()) {
                Some(existing) => evr_compare(pkg.evr(), existing.evr()) == Ordering::Greater,
                None => true,
            };
            if keep {
                by_name.insert(pkg.name().to_string(), pkg);
            }
        }
        by_name.into_values().collect()
    }

    /// Five-step update scan (spec §4.11):
    /// 1. newest installed package per name;
    /// 2. newest same-name candidate from every other store;
    /// 3. a strictly-greater-EVR match becomes an `Update`;
    /// 4. `what_obsoletes` against each installed package's exact NEVR,
    ///    filtered to architectures compatible with `basearch`, also
    ///    becomes an `Update` (scenario 5, "Obsoletes as updates");
    /// 5. dedup the combined set by package id (falling back to NEVRA
    ///    when a source doesn't populate `pkgid`).
    pub fn get_updates(
        &self,
        advisories: &[crate::metadata::updateinfo::Advisory],
        basearch: &str,
        on_error: &dyn ErrorHandler,
    ) -> Result<Vec<Update>> {
        self.require_nonempty()?;

        let installed = Self::newest_per_name(
            self.enabled_stores()
                .filter(|s| matches!(s, Store::Local(_)))
                .flat_map(|s| s.get_packages().unwrap_or_default())
                .collect(),
        );

        let candidates = Self::newest_per_name(self.fold_store_results(on_error, |s| {
            if matches!(s, Store::Local(_)) {
                Ok(Vec::new())
            } else {
                s.get_packages()
            }
        })?);

        let compatible_arches: &[&str] = crate::config::BASEARCH_SETS
            .iter()
            .find(|(base, _)| *base == basearch)
            .map(|(_, arches)| *arches)
            .unwrap_or(&[]);

        let mut updates = Vec::new();

        for old in &installed {
            if let Some(candidate) = candidates
                .iter()
                .filter(|c| c.name() == old.name())
                .filter(|c| evr_compare(c.evr(), old.evr()) == Ordering::Greater)
                .max_by(|a, b| evr_compare(a.evr(), b.evr()))
            {
                updates.push(self.build_update(old, candidate, advisories));
            }
        }

        for old in &installed {
            let dep = Depend::new(old.name(), DependFlag::Equal, old.evr().to_string());
            let obsoleting = self.fold_store_results(on_error, |s| {
                if matches!(s, Store::Local(_)) {
                    Ok(Vec::new())
                } else {
                    s.what_obsoletes(&dep)
                }
            })?;
            let best = obsoleting
                .into_iter()
                .filter(|cand| compatible_arches.is_empty() || compatible_arches.contains(&cand.arch()))
                .max_by(|a, b| evr_compare(a.evr(), b.evr()));
            if let Some(candidate) = best {
                updates.push(self.build_update(old, &candidate, advisories));
            }
        }

        let mut seen = HashSet::new();
        updates.retain(|u| seen.insert(u.available.pkgid.clone().unwrap_or_else(|| u.available.nevra())));
        Ok(updates)
    }

    fn build_update(&self, old: &Package, candidate: &Package, advisories: &[crate::metadata::updateinfo::Advisory]) -> Update {
        if let Some(mut update) = self.remote_update_detail(candidate.name(), Some(old), candidate.source()) {
            update.available.installed_version = Some(Arc::new(old.clone()));
            return update;
        }
        let mut available = candidate.clone();
        available.installed_version = Some(Arc::new(old.clone()));
        let advisory = crate::metadata::updateinfo::find_for_package(advisories, old.name())
            .first()
            .map(|a| (*a).clone());
        Update {
            installed: old.clone(),
            available,
            advisory,
            changelog: Vec::new(),
        }
    }

    /// Resolves `name` to a package, then downloads it through the store
    /// that produced it (spec §4.6 `Package::download`, adapted since a
    /// `Package` here carries no back-reference to its owning store).
    pub fn download(&self, name: &str, target_dir: &std::path::Path, state: &crate::state::State) -> Result<std::path::PathBuf> {
        self.require_nonempty()?;
        let pkg = self.resolve(name, &ContinueOnError)?;
        let href = pkg
            .location_href
            .as_deref()
            .ok_or_else(|| Error::NoSupport(format!("`{name}` has no location_href to download")))?;
        let store = self
            .stores
            .iter()
            .find(|s| s.id() == pkg.source())
            .ok_or_else(|| Error::FailedToFind(pkg.source().to_string()))?;
        std::fs::create_dir_all(target_dir)?;
        store.download(href, target_dir, state)
    }

    pub fn clean(&self) -> Result<()> {
        self.require_nonempty()?;
        for store in &self.stores {
            if let Store::Remote(s) = store {
                s.clean()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_array_rejects_every_operation() {
        let array = StoreArray::new(Vec::new());
        assert!(matches!(array.get_packages(&ContinueOnError), Err(Error::ArrayIsEmpty)));
        assert!(matches!(array.resolve("bash", &ContinueOnError), Err(Error::ArrayIsEmpty)));
        assert!(matches!(array.get_updates(&[], "x86_64", &ContinueOnError), Err(Error::ArrayIsEmpty)));
    }

    #[test]
    fn download_fails_without_location_href() {
        let store = Store::Local(std::sync::Arc::new(crate::store::local::StoreLocal::new("/no-such-rpmdb")));
        let array = StoreArray::new(vec![store]);
        let dir = tempfile::tempdir().unwrap();
        let state = crate::state::State::root();
        let err = array.download("bash", dir.path(), &state).unwrap_err();
        assert!(matches!(err, Error::FailedToFind(_)));
    }

    fn pkg(name: &str, evr: &str, arch: &str, source: &str) -> Package {
        crate::package::PackageBuilder {
            name: name.into(),
            evr: crate::package::Evr::parse(evr),
            arch: arch.into(),
            source: source.into(),
            ..Default::default()
        }
        .build()
    }

    #[test]
    fn resolve_full_glob_matches_substring() {
        let flags = ResolveFlags {
            use_name: true,
            glob: true,
            ..Default::default()
        };
        assert!(pattern_matches("bash-completion", "*bash*", flags));
        assert!(!pattern_matches("zsh", "*bash*", flags));
    }

    #[test]
    fn resolve_full_case_insensitive_exact_match() {
        let flags = ResolveFlags {
            use_name: true,
            case_insensitive: true,
            ..Default::default()
        };
        assert!(pattern_matches("Bash", "bash", flags));
    }

    #[test]
    fn abort_on_error_propagates_non_not_enabled_errors() {
        assert_eq!(AbortOnError.on_error("repo", &Error::ArrayIsEmpty), ErrorAction::Abort);
        assert_eq!(ContinueOnError.on_error("repo", &Error::ArrayIsEmpty), ErrorAction::Continue);
    }

    #[test]
    fn get_updates_newest_per_name_picks_highest_evr() {
        let packages = vec![pkg("foo", "1.0-1", "x86_64", "a"), pkg("foo", "2.0-1", "x86_64", "a")];
        let newest = StoreArray::newest_per_name(packages);
        assert_eq!(newest.len(), 1);
        assert_eq!(newest[0].evr().to_string(), "2.0-1");
    }
}
