//! `primary.xml` / `primary.xml.gz` reader, the package listing every
//! store ultimately resolves to (spec §4.5).
//!
//! XML shape follows `serde_xml_rs::from_str` over a
//! `#[derive(Deserialize)]` struct tree; fields for `summary`,
//! `description`, `license`, `url`, `group`, `size` and the
//! `rpm:requires`/`rpm:provides` entries follow rpmrepo_metadata's
//! `Package` struct shape.
use crate::errors::*;
use crate::package::{Depend, DependFlag, Evr, Group, Package, PackageBuilder};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct VersionField {
    epoch: Option<String>,
    ver: String,
    rel: String,
}

#[derive(Debug, Deserialize)]
struct LocationField {
    href: String,
}

#[derive(Debug, Deserialize)]
struct ChecksumField {
    #[serde(default)]
    pkgid: Option<String>,
    #[serde(rename = "$value")]
    value: String,
}

#[derive(Debug, Deserialize, Default)]
struct SizeField {
    package: u64,
}

#[derive(Debug, Deserialize)]
struct EntryField {
    name: String,
    flags: Option<String>,
    epoch: Option<String>,
    ver: Option<String>,
    rel: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct DependList {
    #[serde(rename = "entry", default)]
    entry: Vec<EntryField>,
}

#[derive(Debug, Deserialize, Default)]
struct Format {
    #[serde(rename = "license")]
    license: Option<String>,
    group: Option<String>,
    requires: Option<DependList>,
    provides: Option<DependList>,
    obsoletes: Option<DependList>,
    conflicts: Option<DependList>,
}

#[derive(Debug, Deserialize)]
struct PackageField {
    name: String,
    arch: String,
    version: VersionField,
    #[serde(default)]
    checksum: Option<ChecksumField>,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    url: String,
    location: LocationField,
    #[serde(default)]
    size: SizeField,
    #[serde(default)]
    format: Format,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    #[serde(rename = "package", default)]
    package: Vec<PackageField>,
}

fn depend_flag(flags: Option<&str>) -> DependFlag {
    match flags {
        Some("LT") => DependFlag::Less,
        Some("GT") => DependFlag::Greater,
        Some("EQ") => DependFlag::Equal,
        Some("LE") => DependFlag::LessEqual,
        Some("GE") => DependFlag::GreaterEqual,
        _ => DependFlag::Any,
    }
}

fn to_depend(e: &EntryField) -> Depend {
    let evr = match (&e.epoch, &e.ver, &e.rel) {
        (epoch, Some(ver), rel) => Evr {
            epoch: epoch.as_deref().and_then(|s| s.parse().ok()),
            version: ver.clone(),
            release: rel.clone().unwrap_or_default(),
        }
        .to_string(),
        _ => String::new(),
    };
    Depend::new(&e.name, depend_flag(e.flags.as_deref()), evr)
}

fn group_from_text(text: &str) -> Group {
    match text {
        s if s.starts_with("System") => Group::System,
        s if s.starts_with("Applications") => Group::Applications,
        s if s.starts_with("Development") => Group::Development,
        s if s.starts_with("Documentation") => Group::Documentation,
        s if s.starts_with("Graphics") => Group::Graphics,
        s if s.starts_with("Internet") => Group::Internet,
        s if s.starts_with("Multimedia") => Group::Multimedia,
        s if s.starts_with("Office") || s.starts_with("Productivity") => Group::Office,
        s if s.starts_with("Games") || s.starts_with("Amusements") => Group::Games,
        _ => Group::Unknown,
    }
}

/// Parses a full `primary.xml` document into package records, tagging
/// each with `source` (the repository id that owns this listing).
pub fn parse(xml: &str, source: &str) -> Result<Vec<Package>> {
    let metadata: Metadata = serde_xml_rs::from_str(xml)?;
    Ok(metadata
        .package
        .into_iter()
        .map(|p| {
            let format = p.format;
            let pkgid = p.checksum.and_then(|c| (c.pkgid.as_deref() == Some("YES")).then_some(c.value));
            PackageBuilder {
                name: p.name,
                evr: Evr {
                    epoch: p.version.epoch.and_then(|s| s.parse().ok()),
                    version: p.version.ver,
                    release: p.version.rel,
                },
                arch: p.arch,
                source: source.to_string(),
                pkgid,
                summary: p.summary,
                description: p.description,
                license: format.license.unwrap_or_default(),
                url: p.url,
                group: Some(format.group.as_deref().map(group_from_text).unwrap_or(Group::Unknown)),
                size: p.size.package,
                location_href: Some(p.location.href),
                requires: format.requires.unwrap_or_default().entry.iter().map(to_depend).collect(),
                provides: format.provides.unwrap_or_default().entry.iter().map(to_depend).collect(),
                obsoletes: format.obsoletes.unwrap_or_default().entry.iter().map(to_depend).collect(),
                conflicts: format.conflicts.unwrap_or_default().entry.iter().map(to_depend).collect(),
                ..Default::default()
            }
            .build()
        })
        .collect())
}

/// Reads `primary.sqlite` (createrepo_c layout: `packages(pkgKey, pkgId,
/// name, arch, epoch, version, release, summary, description, url,
/// rpm_license, rpm_group, size_package, location_href)` joined to
/// `requires`/`provides`/`obsoletes`/`conflicts(name, flags, epoch,
/// version, release, pkgKey)`), mirroring the xml reader's output shape
/// so `StoreRemote::get_packages` can treat both variants uniformly.
pub fn parse_sql(conn: &rusqlite::Connection, source: &str) -> Result<Vec<Package>> {
    let mut stmt = conn.prepare(
        "SELECT pkgKey, pkgId, name, arch, epoch, version, release, summary, description,
                url, rpm_license, rpm_group, size_package, location_href
         FROM packages",
    )?;
    let mut rows = stmt.query([])?;
    let mut packages = Vec::new();
    while let Some(row) = rows.next()? {
        let pkg_key: i64 = row.get(0)?;
        let pkgid: String = row.get(1)?;
        let name: String = row.get(2)?;
        let arch: String = row.get(3)?;
        let epoch: Option<String> = row.get(4)?;
        let version: String = row.get(5)?;
        let release: String = row.get(6)?;
        let summary: String = row.get(7)?;
        let description: String = row.get(8)?;
        let url: String = row.get(9)?;
        let license: String = row.get(10)?;
        let group: String = row.get(11)?;
        let size: u64 = row.get(12)?;
        let location_href: String = row.get(13)?;

        packages.push(
            PackageBuilder {
                name,
                evr: Evr {
                    epoch: epoch.and_then(|s| s.parse().ok()),
                    version,
                    release,
                },
                arch,
                source: source.to_string(),
                pkgid: Some(pkgid),
                summary,
                description,
                license,
                url,
                group: Some(group_from_text(&group)),
                size,
                location_href: Some(location_href),
                requires: depend_rows_sql(conn, "requires", pkg_key)?,
                provides: depend_rows_sql(conn, "provides", pkg_key)?,
                obsoletes: depend_rows_sql(conn, "obsoletes", pkg_key)?,
                conflicts: depend_rows_sql(conn, "conflicts", pkg_key)?,
                ..Default::default()
            }
            .build(),
        );
    }
    Ok(packages)
}

fn depend_rows_sql(conn: &rusqlite::Connection, table: &str, pkg_key: i64) -> Result<Vec<Depend>> {
    let sql = format!("SELECT name, flags, epoch, version, release FROM {table} WHERE pkgKey = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([pkg_key])?;
    let mut deps = Vec::new();
    while let Some(row) = rows.next()? {
        let name: String = row.get(0)?;
        let flags: Option<String> = row.get(1)?;
        let epoch: Option<String> = row.get(2)?;
        let version: Option<String> = row.get(3)?;
        let release: Option<String> = row.get(4)?;
        let evr = match version {
            Some(ver) => Evr {
                epoch: epoch.and_then(|s| s.parse().ok()),
                version: ver,
                release: release.unwrap_or_default(),
            }
            .to_string(),
            None => String::new(),
        };
        deps.push(Depend::new(name, depend_flag(flags.as_deref()), evr));
    }
    Ok(deps)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata xmlns="http://linux.duke.edu/metadata/common" xmlns:rpm="http://linux.duke.edu/metadata/rpm" packages="1">
<package type="rpm">
  <name>0ad</name>
  <arch>src</arch>
  <version epoch="0" ver="0.0.26" rel="21.fc41"/>
  <summary>Cross-Platform RTS Game of Ancient Warfare</summary>
  <description>A game.</description>
  <url>http://play0ad.com</url>
  <size package="80972827"/>
  <location href="Packages/0/0ad-0.0.26-21.fc41.src.rpm"/>
  <format>
    <rpm:license>GPLv2+ and BSD and MIT</rpm:license>
    <rpm:group>Amusements/Games</rpm:group>
    <rpm:provides>
      <rpm:entry name="0ad" flags="EQ" epoch="0" ver="0.0.26" rel="21.fc41"/>
    </rpm:provides>
    <rpm:requires>
      <rpm:entry name="SDL2-devel"/>
    </rpm:requires>
  </format>
</package>
</metadata>
"#;

    #[test]
    fn parses_package_with_depends_and_group() {
        let packages = parse(SAMPLE, "fedora").unwrap();
        assert_eq!(packages.len(), 1);
        let pkg = &packages[0];
        assert_eq!(pkg.name(), "0ad");
        assert_eq!(pkg.arch(), "src");
        assert_eq!(pkg.evr().to_string(), "0:0.0.26-21.fc41");
        assert_eq!(pkg.group, Group::Games);
        assert_eq!(pkg.requires.len(), 1);
        assert_eq!(pkg.provides.len(), 1);
        assert_eq!(pkg.location_href.as_deref(), Some("Packages/0/0ad-0.0.26-21.fc41.src.rpm"));
    }

    #[test]
    fn parse_sql_reads_createrepo_schema() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
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
                 'GPLv3+', 'System Environment/Shells', 8200000, 'Packages/bash-5.2-2.fc41.x86_64.rpm');
             INSERT INTO requires VALUES ('glibc', 'GE', '0', '2.38', '1', 1);
             INSERT INTO obsoletes VALUES ('bash-old', 'LT', NULL, NULL, NULL, 1);",
        )
        .unwrap();

        let packages = parse_sql(&conn, "fedora").unwrap();
        assert_eq!(packages.len(), 1);
        let pkg = &packages[0];
        assert_eq!(pkg.name(), "bash");
        assert_eq!(pkg.pkgid.as_deref(), Some("abc123"));
        assert_eq!(pkg.evr().to_string(), "0:5.2-2.fc41");
        assert_eq!(pkg.requires.len(), 1);
        assert_eq!(pkg.requires[0].flag, DependFlag::GreaterEqual);
        assert_eq!(pkg.obsoletes.len(), 1);
        assert_eq!(pkg.obsoletes[0].evr, "");
    }
}
