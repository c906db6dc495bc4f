//! Process-level cooperative lock, one slot per [`LockType`] (spec §4.3).
//!
//! PID-file protocol: first `take` writes this process's PID into
//! `<pidfile>-<kind>.lock` (or a single `<pidfile>.lock` in
//! `lock_compat` mode); a pre-existing file is honoured only if
//! `/proc/<pid>/cmdline` for its PID still exists, otherwise it's a
//! stale lock and is overwritten. `fd-lock` guards the
//! read-modify-write of the PID file itself against other threads in
//! this same process; it is not what provides the cross-process
//! `AlreadyLocked` semantics, which names the holder's command line.
use crate::errors::*;
use fd_lock::RwLock as FdRwLock;
use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockType {
    RpmDb,
    Repo,
    Metadata,
    Groups,
    Release,
    Config,
    History,
}

impl LockType {
    fn slug(self) -> &'static str {
        match self {
            LockType::RpmDb => "rpmdb",
            LockType::Repo => "repo",
            LockType::Metadata => "metadata-write",
            LockType::Groups => "groups",
            LockType::Release => "release",
            LockType::Config => "config",
            LockType::History => "history",
        }
    }
}

impl fmt::Display for LockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

#[derive(Default)]
struct Slot {
    refcount: u32,
}

pub struct Lock {
    pidfile_prefix: PathBuf,
    compat: bool,
    slots: Mutex<HashMap<LockType, Slot>>,
    pid: u32,
}

impl Lock {
    pub fn new(pidfile_prefix: impl Into<PathBuf>, compat: bool) -> Self {
        Lock {
            pidfile_prefix: pidfile_prefix.into(),
            compat,
            slots: Mutex::new(HashMap::new()),
            pid: std::process::id(),
        }
    }

    fn path_for(&self, kind: LockType) -> PathBuf {
        if self.compat {
            self.pidfile_prefix.with_extension("lock")
        } else {
            let mut p = self.pidfile_prefix.clone();
            let mut name = p.file_name().map(|n| n.to_owned()).unwrap_or_default();
            name.push(format!("-{}.lock", kind.slug()));
            p.set_file_name(name);
            p
        }
    }

    pub fn take(&self, kind: LockType) -> Result<()> {
        let mut slots = self.slots.lock().unwrap();
        let slot = slots.entry(kind).or_default();
        if slot.refcount > 0 {
            slot.refcount += 1;
            return Ok(());
        }

        let path = self.path_for(kind);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        if let Ok(mut f) = File::open(&path) {
            let mut contents = String::new();
            f.read_to_string(&mut contents)?;
            if let Ok(other_pid) = contents.trim().parse::<u32>() {
                if other_pid != self.pid && process_alive(other_pid) {
                    let cmdline = cmdline_for_pid(other_pid)
                        .unwrap_or_else(|| format!("pid {other_pid}"));
                    return Err(Error::AlreadyLocked(cmdline));
                }
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&path)?;
        let mut guarded = FdRwLock::new(file);
        let mut write_guard = guarded
            .try_write()
            .map_err(|e| Error::Permission(e.to_string()))?;
        write_guard.write_all(self.pid.to_string().as_bytes())?;
        slot.refcount = 1;
        Ok(())
    }

    pub fn release(&self, kind: LockType) -> Result<()> {
        let mut slots = self.slots.lock().unwrap();
        let slot = slots.get_mut(&kind).ok_or(Error::NotLocked)?;
        if slot.refcount == 0 {
            return Err(Error::NotLocked);
        }
        slot.refcount -= 1;
        if slot.refcount == 0 {
            let path = self.path_for(kind);
            let _ = fs::remove_file(path);
        }
        Ok(())
    }
}

fn process_alive(pid: u32) -> bool {
    std::path::Path::new(&format!("/proc/{pid}/cmdline")).exists()
}

fn cmdline_for_pid(pid: u32) -> Option<String> {
    let raw = fs::read(format!("/proc/{pid}/cmdline")).ok()?;
    let cmdline = raw
        .split(|&b| b == 0)
        .filter(|s| !s.is_empty())
        .map(|s| String::from_utf8_lossy(s).into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    Some(format!("{cmdline} ({pid})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_then_release_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("repocat");
        let lock = Lock::new(&prefix, false);
        lock.take(LockType::Metadata).unwrap();
        let path = lock.path_for(LockType::Metadata);
        assert!(path.exists());
        lock.release(LockType::Metadata).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn release_without_take_fails() {
        let dir = tempfile::tempdir().unwrap();
        let lock = Lock::new(dir.path().join("repocat"), false);
        assert!(matches!(lock.release(LockType::Repo), Err(Error::NotLocked)));
    }

    #[test]
    fn nested_take_is_refcounted() {
        let dir = tempfile::tempdir().unwrap();
        let lock = Lock::new(dir.path().join("repocat"), false);
        lock.take(LockType::Repo).unwrap();
        lock.take(LockType::Repo).unwrap();
        lock.release(LockType::Repo).unwrap();
        assert!(lock.path_for(LockType::Repo).exists());
        lock.release(LockType::Repo).unwrap();
        assert!(!lock.path_for(LockType::Repo).exists());
    }

    #[test]
    fn compat_mode_uses_single_file_for_all_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let lock = Lock::new(dir.path().join("repocat"), true);
        assert_eq!(lock.path_for(LockType::Repo), lock.path_for(LockType::Metadata));
    }

    #[test]
    fn stale_lock_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let lock = Lock::new(dir.path().join("repocat"), false);
        let path = lock.path_for(LockType::Repo);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "999999999").unwrap();
        lock.take(LockType::Repo).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, std::process::id().to_string());
    }
}
