//! Fetch primitive with proxy, timeout, cancellation, progress,
//! verification and a location pool (spec §4.4).
use crate::errors::*;
use crate::metadata::{ChecksumKind, MetadataHandle};
use crate::state::State;
use crate::utils;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationPolicy {
    Random,
    Ordered,
}

pub struct Download {
    client: reqwest::blocking::Client,
    network_enabled: bool,
    locations: Mutex<Vec<String>>,
    policy: Mutex<LocationPolicy>,
    cancelled: Arc<AtomicBool>,
}

impl Download {
    pub fn new(connect_timeout: Duration, proxy: Option<&str>, network_enabled: bool) -> Result<Self> {
        Ok(Download {
            client: utils::http_client(connect_timeout, proxy)?,
            network_enabled,
            locations: Mutex::new(Vec::new()),
            policy: Mutex::new(LocationPolicy::Ordered),
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancelled.load(Ordering::SeqCst) {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    pub fn location_add_uri(&self, uri: &str) {
        self.locations.lock().unwrap().push(uri.trim_end_matches('/').to_string());
    }

    pub fn location_add_array(&self, uris: &[String]) {
        for uri in uris {
            self.location_add_uri(uri);
        }
    }

    /// Parses a metalink or mirrorlist handle's on-disk body into URIs
    /// and adds them to the pool.
    pub fn location_add_md(&self, handle: &MetadataHandle) -> Result<()> {
        use crate::metadata::MetadataKind;
        let body = fs::read_to_string(&handle.local_path)?;
        let uris = match handle.kind {
            MetadataKind::Metalink => crate::metadata::metalink::parse_uris(&body)?,
            MetadataKind::Mirrorlist => crate::metadata::mirrorlist::parse_uris(&body),
            _ => return Err(Error::NoSupport("location_add_md requires metalink/mirrorlist".into())),
        };
        self.location_add_array(&uris);
        Ok(())
    }

    pub fn location_remove_uri(&self, uri: &str) {
        self.locations.lock().unwrap().retain(|u| u != uri);
    }

    pub fn location_clear(&self) {
        self.locations.lock().unwrap().clear();
    }

    pub fn location_size(&self) -> usize {
        self.locations.lock().unwrap().len()
    }

    pub fn location_set_policy(&self, policy: LocationPolicy) {
        *self.policy.lock().unwrap() = policy;
    }

    fn ordered_candidates(&self) -> Vec<String> {
        let mut locs = self.locations.lock().unwrap().clone();
        if *self.policy.lock().unwrap() == LocationPolicy::Random {
            // Fisher-Yates using fastrand.
            for i in (1..locs.len()).rev() {
                let j = fastrand::usize(..=i);
                locs.swap(i, j);
            }
        }
        locs
    }

    /// Fetches `uri` directly (absolute URL) or copies it (local path
    /// starting with `/`) to `target_path`, verifying size/type/checksum.
    pub fn file_full(
        &self,
        uri: &str,
        target_path: &Path,
        expected_size: Option<u64>,
        expected_content_type: Option<&str>,
        checksum_kind: Option<ChecksumKind>,
        expected_checksum: Option<&str>,
        state: &State,
    ) -> Result<()> {
        self.check_cancelled()?;
        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = target_path.with_extension("part");

        let result = if uri.starts_with('/') {
            self.copy_local(uri, &tmp_path)
        } else {
            if !self.network_enabled {
                return Err(Error::Offline);
            }
            self.fetch_http(uri, &tmp_path, expected_content_type)
        };

        if let Err(e) = result {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        if let Err(e) = self.verify(&tmp_path, expected_size, checksum_kind, expected_checksum) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        fs::rename(&tmp_path, target_path)?;
        state.done();
        Ok(())
    }

    fn copy_local(&self, uri: &str, tmp_path: &Path) -> Result<()> {
        self.check_cancelled()?;
        fs::copy(uri, tmp_path)?;
        Ok(())
    }

    fn fetch_http(&self, uri: &str, tmp_path: &Path, expected_content_type: Option<&str>) -> Result<()> {
        self.check_cancelled()?;
        let resp = self
            .client
            .get(uri)
            .send()
            .map_err(|e| Error::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Error::Transport(format!("HTTP {}", resp.status())));
        }
        if let Some(expected) = expected_content_type {
            let actual = resp
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("");
            if !actual.starts_with(expected) {
                return Err(Error::ContentTypeMismatch {
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                });
            }
        }
        let mut out = File::create(tmp_path)?;
        let mut reader = resp;
        let mut buf = [0u8; 64 * 1024];
        loop {
            self.check_cancelled()?;
            let n = reader.read(&mut buf).map_err(|e| Error::Transport(e.to_string()))?;
            if n == 0 {
                break;
            }
            out.write_all(&buf[..n])?;
        }
        Ok(())
    }

    fn verify(
        &self,
        path: &Path,
        expected_size: Option<u64>,
        checksum_kind: Option<ChecksumKind>,
        expected_checksum: Option<&str>,
    ) -> Result<()> {
        if let Some(expected) = expected_size {
            let actual = fs::metadata(path)?.len();
            if actual != expected {
                return Err(Error::SizeMismatch { expected, actual });
            }
        }
        if let (Some(kind), Some(expected)) = (checksum_kind, expected_checksum) {
            let file = File::open(path)?;
            let actual = crate::chksums::digest_file(file, kind)?;
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(Error::ChecksumMismatch {
                    expected: expected.to_string(),
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Tries each URI in the pool (per the configured policy), removing
    /// any that fail, until one succeeds or the pool is exhausted.
    /// Terminates after at most `|pool|` attempts.
    pub fn location_full(
        &self,
        relative_path: &str,
        target_path: &Path,
        expected_size: Option<u64>,
        content_type: Option<&str>,
        checksum_kind: Option<ChecksumKind>,
        checksum: Option<&str>,
        state: &State,
    ) -> Result<()> {
        if !self.network_enabled && !target_path.exists() {
            let candidates = self.ordered_candidates();
            if candidates.iter().all(|c| !c.starts_with('/')) {
                return Err(Error::Offline);
            }
        }
        let candidates = self.ordered_candidates();
        if candidates.is_empty() {
            return Err(Error::NoData("location pool is empty".into()));
        }
        let mut last_err = Error::NoData("location pool is empty".into());
        for base in &candidates {
            self.check_cancelled()?;
            let uri = format!("{base}/{relative_path}");
            match self.file_full(
                &uri,
                target_path,
                expected_size,
                content_type,
                checksum_kind,
                checksum,
                state,
            ) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    self.location_remove_uri(base);
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }
}

pub fn io_copy_counted(reader: &mut impl Read, writer: &mut impl Write) -> io::Result<u64> {
    io::copy(reader, writer)
}
