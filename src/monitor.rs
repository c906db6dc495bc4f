//! Filesystem-change observer (spec §4.2).
//!
//! No filesystem-event crate appears anywhere in the reference corpus,
//! so watching is done by polling mtimes on a background thread; this
//! keeps the "state is stale, re-derive, don't diff" contract without
//! pulling in an unused dependency. Listeners are plain closures,
//! matching REDESIGN FLAGS §9 ("the change-callback pattern becomes a
//! capability").
use crate::errors::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, SystemTime};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

type Listener = Box<dyn Fn() + Send + Sync>;

struct Watched {
    path: PathBuf,
    last_seen: Option<SystemTime>,
}

#[derive(Default)]
struct Inner {
    watches: HashMap<PathBuf, Watched>,
    listeners: Vec<Listener>,
}

pub struct Monitor {
    inner: Arc<Mutex<Inner>>,
}

impl Monitor {
    pub fn new() -> Arc<Self> {
        let monitor = Arc::new(Monitor {
            inner: Arc::new(Mutex::new(Inner::default())),
        });
        let weak = Arc::downgrade(&monitor.inner);
        thread::spawn(move || loop {
            thread::sleep(POLL_INTERVAL);
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let mut inner = inner.lock().unwrap();
            let mut changed = false;
            let paths: Vec<PathBuf> = inner.watches.keys().cloned().collect();
            for path in paths {
                let mtime = std::fs::metadata(&path).ok().and_then(|m| m.modified().ok());
                if let Some(watch) = inner.watches.get_mut(&path) {
                    if watch.last_seen != mtime {
                        watch.last_seen = mtime;
                        changed = true;
                    }
                }
            }
            if changed {
                for listener in &inner.listeners {
                    listener();
                }
            }
        });
        monitor
    }

    pub fn add_watch(&self, path: &Path) -> Result<()> {
        let mtime = std::fs::metadata(path).ok().and_then(|m| m.modified().ok());
        self.inner.lock().unwrap().watches.insert(
            path.to_path_buf(),
            Watched {
                path: path.to_path_buf(),
                last_seen: mtime,
            },
        );
        Ok(())
    }

    /// Registers a `changed` listener. Multiple listeners may be
    /// registered; each fires once per aggregate interval.
    pub fn on_changed(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.inner.lock().unwrap().listeners.push(Box::new(listener));
    }
}
