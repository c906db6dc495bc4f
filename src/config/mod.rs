//! Process-wide configuration (spec §4.1).
//!
//! Three tiers are consulted in order: a runtime override installed by
//! `set_*`, an override file, then the main file; a fixed set of
//! defaults backstops all three. `$releasever`/`$basearch`/`$srcdir`
//! substitution happens lazily, on every `get_*` call, never at parse
//! time (spec: "never at file-read time").
pub(crate) mod ini;

use crate::errors::*;
use crate::monitor::Monitor;
use crate::utils::expand_vars;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

pub const BASEARCH_SETS: &[(&str, &[&str])] = &[
    ("i386", &["i386", "i486", "i586", "i686", "noarch"]),
    ("x86_64", &["x86_64", "noarch"]),
    ("aarch64", &["aarch64", "noarch"]),
    ("armhfp", &["armv7hl", "armv7hnl", "noarch"]),
];

fn default_entries() -> HashMap<String, String> {
    let mut m = HashMap::new();
    m.insert("cachedir".into(), "/var/cache/repocat".into());
    m.insert("reposdir".into(), "/etc/repocat/repos.d".into());
    m.insert("pidfile".into(), "/var/run/repocat".into());
    m.insert("metadata_expire".into(), "21600".into()); // 6h, seconds
    m.insert("mirrorlist_expire".into(), "86400".into());
    m.insert("connection_timeout".into(), "5".into());
    m.insert("retries".into(), "3".into());
    m.insert("network".into(), "true".into());
    m.insert("basearch".into(), std::env::consts::ARCH.into());
    m.insert("releasever".into(), "0".into());
    m.insert("lock_compat".into(), "false".into());
    m.insert("installroot".into(), "/".into());
    m
}

#[derive(Debug, Default)]
struct Tiers {
    runtime: HashMap<String, String>,
    override_file: HashMap<String, String>,
    main_file: HashMap<String, String>,
}

pub struct Config {
    filename: RwLock<Option<PathBuf>>,
    override_filename: RwLock<Option<PathBuf>>,
    tiers: RwLock<Tiers>,
    loaded: Mutex<bool>,
    defaults: HashMap<String, String>,
    #[allow(dead_code)]
    monitor: Option<Arc<Monitor>>,
}

impl Config {
    pub fn new() -> Self {
        Config {
            filename: RwLock::new(None),
            override_filename: RwLock::new(None),
            tiers: RwLock::new(Tiers::default()),
            loaded: Mutex::new(false),
            defaults: default_entries(),
            monitor: None,
        }
    }

    /// Attaches a [`Monitor`] that will clear the `loaded` flag (forcing
    /// a lazy reparse on next getter) whenever the backing file changes.
    pub fn with_monitor(self, monitor: Arc<Monitor>, path: &Path) -> Result<Self> {
        monitor.add_watch(path)?;
        Ok(Config {
            monitor: Some(monitor),
            ..self
        })
    }

    pub fn set_filename(&self, path: Option<&Path>) -> Result<()> {
        *self.filename.write().unwrap() = path.map(Path::to_path_buf);
        *self.loaded.lock().unwrap() = false;
        Ok(())
    }

    pub fn set_override_filename(&self, path: Option<&Path>) -> Result<()> {
        *self.override_filename.write().unwrap() = path.map(Path::to_path_buf);
        *self.loaded.lock().unwrap() = false;
        Ok(())
    }

    /// Clears the `loaded` flag so the next getter reparses from disk.
    /// Called by a [`Monitor`] callback on file change.
    pub fn invalidate(&self) {
        *self.loaded.lock().unwrap() = false;
    }

    fn ensure_loaded(&self) -> Result<()> {
        let mut loaded = self.loaded.lock().unwrap();
        if *loaded {
            return Ok(());
        }
        let mut tiers = self.tiers.write().unwrap();
        tiers.main_file.clear();
        tiers.override_file.clear();

        if let Some(path) = self.filename.read().unwrap().clone() {
            let text = std::fs::read_to_string(&path)?;
            let doc = ini::parse(&text);
            let main = doc
                .sections
                .into_iter()
                .find(|s| s.name == "main")
                .ok_or_else(|| Error::Malformed("missing [main] section".into()))?;
            let map = main.as_map();
            match map.get("config_schema_version").map(|s| s.as_str()) {
                Some("1") => {}
                _ => return Err(Error::UnsupportedSchemaVersion),
            }
            if let Some(over) = map.get("override_config") {
                *self.override_filename.write().unwrap() = Some(PathBuf::from(over));
            }
            tiers.main_file = map;
        }

        if let Some(path) = self.override_filename.read().unwrap().clone() {
            if let Ok(text) = std::fs::read_to_string(&path) {
                let doc = ini::parse(&text);
                if let Some(main) = doc.sections.into_iter().find(|s| s.name == "main") {
                    tiers.override_file = main.as_map();
                }
            }
        }

        *loaded = true;
        Ok(())
    }

    fn raw_get(&self, key: &str) -> Result<String> {
        self.ensure_loaded()?;
        let tiers = self.tiers.read().unwrap();
        if let Some(v) = tiers.runtime.get(key) {
            return Ok(v.clone());
        }
        if let Some(v) = tiers.override_file.get(key) {
            return Ok(v.clone());
        }
        if let Some(v) = tiers.main_file.get(key) {
            return Ok(v.clone());
        }
        if let Some(v) = self.defaults.get(key) {
            return Ok(v.clone());
        }
        Err(Error::MissingConfigKey(key.to_string()))
    }

    pub fn get_string(&self, key: &str) -> Result<String> {
        let raw = self.raw_get(key)?;
        Ok(self.expand_substitutions(&raw))
    }

    pub fn get_bool(&self, key: &str) -> Result<bool> {
        Ok(boolean_from_text(&self.raw_get(key)?))
    }

    pub fn get_uint(&self, key: &str) -> Result<u64> {
        let raw = self.raw_get(key)?;
        raw.trim()
            .parse()
            .map_err(|_| Error::Malformed(format!("`{key}` is not an unsigned integer")))
    }

    pub fn get_duration(&self, key: &str) -> Result<Duration> {
        let raw = self.raw_get(key)?;
        parse_duration(&raw).ok_or_else(|| Error::Malformed(format!("`{key}` is not a duration")))
    }

    pub fn get_strv(&self, key: &str) -> Result<Vec<String>> {
        Ok(self
            .get_string(key)?
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect())
    }

    pub fn get_enum<T>(&self, key: &str, mapper: impl Fn(&str) -> Option<T>) -> Result<T> {
        let raw = self.get_string(key)?;
        mapper(&raw).ok_or_else(|| Error::Malformed(format!("`{key}` has an unrecognised value `{raw}`")))
    }

    pub fn set_string(&self, key: &str, value: &str) -> Result<()> {
        let mut tiers = self.tiers.write().unwrap();
        if let Some(existing) = tiers.runtime.get(key) {
            if existing == value {
                return Ok(());
            }
            return Err(Error::AlreadySet(key.to_string()));
        }
        tiers.runtime.insert(key.to_string(), value.to_string());
        Ok(())
    }

    pub fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.set_string(key, if value { "true" } else { "false" })
    }

    pub fn set_uint(&self, key: &str, value: u64) -> Result<()> {
        self.set_string(key, &value.to_string())
    }

    pub fn unset(&self, key: &str) {
        self.tiers.write().unwrap().runtime.remove(key);
    }

    pub fn reset_defaults(&self) {
        self.tiers.write().unwrap().runtime.clear();
    }

    pub fn expand_substitutions(&self, text: &str) -> String {
        expand_vars(text, |name| match name {
            "releasever" => self.raw_get("releasever").ok(),
            "basearch" => self.raw_get("basearch").ok(),
            "srcdir" => self.raw_get("srcdir").ok(),
            _ => None,
        })
    }

    pub fn basearch_array(&self) -> Result<Vec<String>> {
        let basearch = self.get_string("basearch")?;
        if let Some((_, archs)) = BASEARCH_SETS.iter().find(|(k, _)| *k == basearch) {
            Ok(archs.iter().map(|s| s.to_string()).collect())
        } else {
            Ok(vec![basearch, "noarch".to_string()])
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

pub fn boolean_from_text(text: &str) -> bool {
    matches!(text.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1")
}

/// Parses `s`/`m`/`h`/`d`-suffixed or bare-integer-seconds durations.
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let (digits, mult) = match raw.chars().last().unwrap() {
        's' => (&raw[..raw.len() - 1], 1),
        'm' => (&raw[..raw.len() - 1], 60),
        'h' => (&raw[..raw.len() - 1], 60 * 60),
        'd' => (&raw[..raw.len() - 1], 60 * 60 * 24),
        _ => (raw, 1),
    };
    let n: u64 = digits.parse().ok()?;
    Some(Duration::from_secs(n * mult))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_conf(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("repocat.conf");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn rejects_missing_schema_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_conf(&dir, "[main]\ncachedir=/tmp/x\n");
        let cfg = Config::new();
        cfg.set_filename(Some(&path)).unwrap();
        assert!(matches!(cfg.get_string("cachedir"), Err(Error::UnsupportedSchemaVersion)));
    }

    #[test]
    fn lookup_order_runtime_beats_file_beats_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_conf(
            &dir,
            "[main]\nconfig_schema_version=1\ncachedir=/from/file\n",
        );
        let cfg = Config::new();
        cfg.set_filename(Some(&path)).unwrap();
        assert_eq!(cfg.get_string("cachedir").unwrap(), "/from/file");
        assert_eq!(cfg.get_string("reposdir").unwrap(), "/etc/repocat/repos.d");

        cfg.set_string("cachedir", "/from/runtime").unwrap();
        assert_eq!(cfg.get_string("cachedir").unwrap(), "/from/runtime");
    }

    #[test]
    fn set_string_idempotent_but_rejects_conflict() {
        let cfg = Config::new();
        cfg.set_string("network", "false").unwrap();
        cfg.set_string("network", "false").unwrap();
        assert!(matches!(
            cfg.set_string("network", "true"),
            Err(Error::AlreadySet(_))
        ));
    }

    #[test]
    fn duration_parsing() {
        assert_eq!(parse_duration("90"), Some(Duration::from_secs(90)));
        assert_eq!(parse_duration("2h"), Some(Duration::from_secs(7200)));
        assert_eq!(parse_duration("1d"), Some(Duration::from_secs(86400)));
    }

    #[test]
    fn boolean_parsing() {
        assert!(boolean_from_text("YES"));
        assert!(!boolean_from_text("no"));
        assert!(!boolean_from_text(""));
    }

    #[test]
    fn expands_substitutions() {
        let cfg = Config::new();
        cfg.set_string("releasever", "15").unwrap();
        cfg.set_string("basearch", "i386").unwrap();
        assert_eq!(
            cfg.expand_substitutions("$releasever-$basearch"),
            "15-i386"
        );
    }
}
