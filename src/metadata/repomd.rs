//! Parses `repodata/repomd.xml`, the manifest that names every other
//! metadata file in a repository (spec §6).
//!
//! `serde_xml_rs::from_str` over a `#[derive(Deserialize)]` struct tree,
//! extended with the checksum/timestamp/size fields a name-only mirror
//! reader wouldn't need.
use crate::errors::*;
use crate::metadata::{ChecksumKind, MetadataInfo, MetadataKind};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, PartialEq, Deserialize)]
struct Checksum {
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "$value")]
    value: String,
}

#[derive(Debug, PartialEq, Deserialize)]
struct Location {
    href: String,
}

#[derive(Debug, PartialEq, Deserialize)]
struct Data {
    #[serde(rename = "type")]
    data_type: String,
    checksum: Checksum,
    #[serde(rename = "open-checksum")]
    open_checksum: Option<Checksum>,
    location: Location,
    timestamp: f64,
    size: Option<u64>,
    #[serde(rename = "open-size")]
    open_size: Option<u64>,
}

#[derive(Debug, PartialEq, Deserialize)]
struct RepoMd {
    #[serde(rename = "data", default)]
    data: Vec<Data>,
}

/// One `<data>` entry resolved into a loadable [`MetadataHandle`].
pub struct RepomdEntry {
    pub kind: MetadataKind,
    pub info: MetadataInfo,
}

/// Parses `repomd.xml`, keeping only entries whose `type` this crate
/// understands (unknown types, e.g. a vendor extension, are skipped).
pub fn parse(xml: &str, max_age: Duration) -> Result<Vec<RepomdEntry>> {
    let repomd: RepoMd = serde_xml_rs::from_str(xml)?;
    let mut entries = Vec::new();
    for data in repomd.data {
        let Some(kind) = MetadataKind::from_repomd_type(&data.data_type) else {
            continue;
        };
        let checksum_type = ChecksumKind::parse(&data.checksum.kind)?;
        let checksum_uncompressed = data
            .open_checksum
            .as_ref()
            .map(|c| c.value.clone())
            .unwrap_or_else(|| data.checksum.value.clone());
        let timestamp = UNIX_EPOCH + Duration::from_secs_f64(data.timestamp);
        entries.push(RepomdEntry {
            kind,
            info: MetadataInfo {
                timestamp,
                location: data.location.href,
                checksum: data.checksum.value,
                checksum_uncompressed,
                checksum_type,
                max_age,
            },
        });
    }
    Ok(entries)
}

/// Builds a [`crate::metadata::MetadataHandle`] for each parsed entry,
/// rooted at `cache_dir`.
pub fn to_handles(
    entries: Vec<RepomdEntry>,
    id: &str,
    cache_dir: PathBuf,
) -> Vec<crate::metadata::MetadataHandle> {
    entries
        .into_iter()
        .map(|e| crate::metadata::MetadataHandle::new(e.kind, id, cache_dir.clone(), e.info))
        .collect()
}

pub fn now() -> SystemTime {
    SystemTime::now()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<repomd xmlns="http://linux.duke.edu/metadata/repo" xmlns:rpm="http://linux.duke.edu/metadata/rpm">
  <revision>1712990641</revision>
  <data type="primary">
    <checksum type="sha256">fa72c03d43e9ffe131633347045c0c56fbeacbd3281b2b03a6351f487218a158</checksum>
    <open-checksum type="sha256">259d84fce5ecb46226a21765561539eb992fff76356df088f9ed3d1d3d44cd28</open-checksum>
    <location href="repodata/fa72c03d43e9ffe131633347045c0c56fbeacbd3281b2b03a6351f487218a158-primary.xml.gz"/>
    <timestamp>1712990625</timestamp>
    <size>7587566</size>
    <open-size>49907129</open-size>
  </data>
  <data type="filelists">
    <checksum type="sha256">caf9e9202dbd97fcf4da6ca3f228fd459505f0b17d37fb387240b03c8dc0e84a</checksum>
    <open-checksum type="sha256">a35a9e10b149715434f405d3b5f3a895699d9a2939adb3435358337194bad323</open-checksum>
    <location href="repodata/caf9e9202dbd97fcf4da6ca3f228fd459505f0b17d37fb387240b03c8dc0e84a-filelists.xml.gz"/>
    <timestamp>1712990625</timestamp>
    <size>2013585</size>
    <open-size>7783810</open-size>
  </data>
  <data type="prestodelta">
    <checksum type="sha256">00000000000000000000000000000000000000000000000000000000000001</checksum>
    <location href="repodata/prestodelta.xml.gz"/>
    <timestamp>1712990625</timestamp>
  </data>
  <data type="vendor-extension">
    <checksum type="sha256">00000000000000000000000000000000000000000000000000000000000002</checksum>
    <location href="repodata/vendor-extension.xml"/>
    <timestamp>1712990625</timestamp>
  </data>
</repomd>
"#;

    #[test]
    fn parses_known_entries_and_skips_unknown_types() {
        let entries = parse(SAMPLE, Duration::from_secs(86400)).unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().any(|e| matches!(e.kind, MetadataKind::PrimaryXml)));
        assert!(entries.iter().any(|e| matches!(e.kind, MetadataKind::Prestodelta)));
    }

    #[test]
    fn falls_back_to_checksum_when_open_checksum_absent() {
        let entries = parse(SAMPLE, Duration::from_secs(86400)).unwrap();
        let presto = entries
            .iter()
            .find(|e| matches!(e.kind, MetadataKind::Prestodelta))
            .unwrap();
        assert_eq!(presto.info.checksum, presto.info.checksum_uncompressed);
    }

    #[test]
    fn to_handles_resolves_filenames_under_cache_dir() {
        let entries = parse(SAMPLE, Duration::from_secs(86400)).unwrap();
        let handles = to_handles(entries, "fedora", PathBuf::from("/var/cache/repocat/fedora"));
        let primary = handles
            .iter()
            .find(|h| matches!(h.kind, MetadataKind::PrimaryXml))
            .unwrap();
        assert_eq!(primary.filename, "fa72c03d43e9ffe131633347045c0c56fbeacbd3281b2b03a6351f487218a158-primary.xml");
    }
}
