//! Uniform capability for "a file on disk that describes some repository
//! facet" (spec §4.5), with one concrete reader per [`MetadataKind`].
pub mod comps;
pub mod filelists;
pub mod metalink;
pub mod mirrorlist;
pub mod other;
pub mod prestodelta;
pub mod primary;
pub mod repomd;
pub mod updateinfo;

use crate::errors::*;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    PrimarySql,
    PrimaryXml,
    FilelistsSql,
    FilelistsXml,
    OtherSql,
    OtherXml,
    Comps,
    Updateinfo,
    Prestodelta,
    Metalink,
    Mirrorlist,
    Pkgtags,
}

impl MetadataKind {
    /// Matches a kind's `_sql` variant to its `_xml` counterpart; used by
    /// `StoreRemote::refresh`'s fixed skip-order (spec §4.8).
    pub fn is_sql_variant_of(self, other: MetadataKind) -> bool {
        use MetadataKind::*;
        matches!(
            (self, other),
            (PrimarySql, PrimaryXml) | (FilelistsSql, FilelistsXml) | (OtherSql, OtherXml)
        )
    }

    pub fn from_repomd_type(data_type: &str) -> Option<MetadataKind> {
        use MetadataKind::*;
        Some(match data_type {
            "primary_db" => PrimarySql,
            "primary" => PrimaryXml,
            "filelists_db" => FilelistsSql,
            "filelists" => FilelistsXml,
            "other_db" => OtherSql,
            "other" => OtherXml,
            "group" | "group_gz" => Comps,
            "updateinfo" => Updateinfo,
            "prestodelta" => Prestodelta,
            "pkgtags" => Pkgtags,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumKind {
    Sha,
    Sha1,
    Sha256,
    Md5,
}

impl ChecksumKind {
    pub fn parse(text: &str) -> Result<ChecksumKind> {
        match text {
            "sha" => Ok(ChecksumKind::Sha),
            "sha1" => Ok(ChecksumKind::Sha1),
            "sha256" => Ok(ChecksumKind::Sha256),
            "md5" => Ok(ChecksumKind::Md5),
            other => Err(Error::Malformed(format!("unsupported checksum type `{other}`"))),
        }
    }
}

/// `{timestamp, location, checksum, checksum_uncompressed, checksum_type,
/// max_age}` (spec §3).
#[derive(Debug, Clone)]
pub struct MetadataInfo {
    pub timestamp: SystemTime,
    pub location: String,
    pub checksum: String,
    pub checksum_uncompressed: String,
    pub checksum_type: ChecksumKind,
    pub max_age: Duration,
}

#[derive(Debug, Clone)]
pub struct MetadataHandle {
    pub kind: MetadataKind,
    pub id: String,
    pub cache_dir: PathBuf,
    pub local_path: PathBuf,
    pub filename: String,
    pub filename_raw: String,
    pub info: MetadataInfo,
}

impl MetadataHandle {
    pub fn new(kind: MetadataKind, id: &str, cache_dir: PathBuf, info: MetadataInfo) -> Self {
        let filename_raw = info
            .location
            .rsplit('/')
            .next()
            .unwrap_or(&info.location)
            .to_string();
        let filename = crate::compression::uncompressed_filename(&filename_raw).to_string();
        let local_path = cache_dir.join(&filename);
        MetadataHandle {
            kind,
            id: id.to_string(),
            cache_dir,
            local_path,
            filename,
            filename_raw,
            info,
        }
    }

    pub fn compressed_path(&self) -> PathBuf {
        self.cache_dir.join(&self.filename_raw)
    }

    fn checksum_of(&self, path: &PathBuf) -> Result<String> {
        let file = std::fs::File::open(path)?;
        crate::chksums::digest_file(file, self.info.checksum_type).map_err(Error::from)
    }

    /// Compressed-file checksum against `info.checksum`.
    pub fn check(&self) -> Result<()> {
        let path = self.compressed_path();
        if !path.exists() {
            return Err(Error::Recoverable(format!("{} is missing", path.display())));
        }
        let actual = self.checksum_of(&path)?;
        if actual.eq_ignore_ascii_case(&self.info.checksum) {
            Ok(())
        } else {
            Err(Error::Recoverable(format!(
                "{} checksum mismatch",
                path.display()
            )))
        }
    }

    /// Uncompressed-file checksum against `info.checksum_uncompressed`,
    /// plus the `now - timestamp <= max_age` freshness invariant.
    pub fn check_uncompressed(&self) -> Result<()> {
        if !self.local_path.exists() {
            return Err(Error::Recoverable(format!(
                "{} is missing",
                self.local_path.display()
            )));
        }
        let actual = self.checksum_of(&self.local_path)?;
        if !actual.eq_ignore_ascii_case(&self.info.checksum_uncompressed) {
            return Err(Error::Recoverable(format!(
                "{} checksum mismatch",
                self.local_path.display()
            )));
        }
        if self.get_age()? > self.info.max_age {
            return Err(Error::Recoverable("metadata is stale".into()));
        }
        Ok(())
    }

    pub fn get_age(&self) -> Result<Duration> {
        Ok(SystemTime::now()
            .duration_since(self.info.timestamp)
            .unwrap_or_default())
    }

    pub fn is_loaded(&self) -> bool {
        self.check_uncompressed().is_ok()
    }

    pub fn is_fresh(&self) -> bool {
        self.get_age().map(|age| age <= self.info.max_age).unwrap_or(false)
    }

    pub fn clean(&self) -> Result<()> {
        if self.local_path.exists() {
            std::fs::remove_file(&self.local_path)?;
        }
        let compressed = self.compressed_path();
        if compressed.exists() {
            std::fs::remove_file(&compressed)?;
        }
        Ok(())
    }

    /// Decompresses `compressed_path()` into `local_path`, then removes
    /// the compressed copy (spec §4.8 refresh step).
    pub fn decompress_and_remove(&self) -> Result<()> {
        let compressed = self.compressed_path();
        if compressed == self.local_path {
            return Ok(());
        }
        let input = std::fs::File::open(&compressed)?;
        let mut decoder = crate::compression::Decompressor::for_filename(&self.filename_raw, input);
        let mut out = std::fs::File::create(&self.local_path)?;
        std::io::copy(&mut decoder, &mut out)?;
        std::fs::remove_file(&compressed)?;
        Ok(())
    }

    pub fn filesystem_filename(&self) -> &str {
        &self.filename
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn handle_for(dir: &std::path::Path, checksum: &str) -> MetadataHandle {
        MetadataHandle::new(
            MetadataKind::PrimaryXml,
            "fedora",
            dir.to_path_buf(),
            MetadataInfo {
                timestamp: SystemTime::now(),
                location: "repodata/primary.xml".into(),
                checksum: checksum.to_string(),
                checksum_uncompressed: checksum.to_string(),
                checksum_type: ChecksumKind::Sha256,
                max_age: Duration::from_secs(3600),
            },
        )
    }

    #[test]
    fn check_uncompressed_matches_iff_checksum_and_age_ok() {
        let dir = tempfile::tempdir().unwrap();
        let content = b"<metadata/>";
        let checksum = crate::chksums::sha256_hex(content);
        let handle = handle_for(dir.path(), &checksum);
        std::fs::write(&handle.local_path, content).unwrap();
        assert!(handle.check_uncompressed().is_ok());
        assert!(handle.is_loaded());
    }

    #[test]
    fn check_uncompressed_fails_on_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let handle = handle_for(dir.path(), "deadbeef");
        std::fs::write(&handle.local_path, b"<metadata/>").unwrap();
        assert!(handle.check_uncompressed().is_err());
    }

    #[test]
    fn check_uncompressed_fails_when_stale() {
        let dir = tempfile::tempdir().unwrap();
        let content = b"<metadata/>";
        let checksum = crate::chksums::sha256_hex(content);
        let mut handle = handle_for(dir.path(), &checksum);
        handle.info.timestamp = SystemTime::now() - Duration::from_secs(10_000);
        std::fs::write(&handle.local_path, content).unwrap();
        assert!(handle.check_uncompressed().is_err());
    }

    #[test]
    fn sql_variant_detection_matches_named_pairs() {
        assert!(MetadataKind::PrimarySql.is_sql_variant_of(MetadataKind::PrimaryXml));
        assert!(!MetadataKind::PrimarySql.is_sql_variant_of(MetadataKind::FilelistsXml));
    }
}
