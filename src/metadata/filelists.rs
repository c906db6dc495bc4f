//! File-list lookup by package id, with an XML reader (`filelists.xml`)
//! and a SQL reader (`filelists.sqlite`) sharing one return shape (spec
//! §4.5, §2 filelists/filelists_db).
use crate::errors::*;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
struct FileEntry {
    #[serde(rename = "$value")]
    path: String,
}

#[derive(Debug, Deserialize)]
struct PackageEntry {
    pkgid: String,
    #[serde(rename = "file", default)]
    files: Vec<FileEntry>,
}

#[derive(Debug, Deserialize)]
struct Filelists {
    #[serde(rename = "package", default)]
    package: Vec<PackageEntry>,
}

/// Parses a whole `filelists.xml` document into a pkgid -> file paths map.
pub fn parse_xml(xml: &str) -> Result<HashMap<String, Vec<String>>> {
    let doc: Filelists = serde_xml_rs::from_str(xml)?;
    Ok(doc
        .package
        .into_iter()
        .map(|p| (p.pkgid, p.files.into_iter().map(|f| f.path).collect()))
        .collect())
}

/// Looks up one package's files from `filelists.sqlite` (createrepo_c
/// layout: `packages(pkgKey, pkgId)` joined to `filelist(pkgKey, dirname,
/// filenames, filetypes)`).
pub fn query_files_sql(conn: &rusqlite::Connection, pkgid: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT filelist.dirname, filelist.filenames
         FROM filelist
         JOIN packages ON packages.pkgKey = filelist.pkgKey
         WHERE packages.pkgId = ?1",
    )?;
    let mut files = Vec::new();
    let mut rows = stmt.query([pkgid])?;
    while let Some(row) = rows.next()? {
        let dirname: String = row.get(0)?;
        let filenames: String = row.get(1)?;
        for name in filenames.split('/') {
            if name.is_empty() {
                continue;
            }
            files.push(format!("{dirname}/{name}"));
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<filelists xmlns="http://linux.duke.edu/metadata/filelists" packages="1">
  <package pkgid="abc123" name="0ad" arch="src">
    <version epoch="0" ver="0.0.26" rel="21.fc41"/>
    <file type="dir">/usr/bin</file>
    <file>/usr/bin/0ad</file>
  </package>
</filelists>
"#;

    #[test]
    fn parse_xml_maps_pkgid_to_files() {
        let map = parse_xml(SAMPLE).unwrap();
        assert_eq!(map["abc123"], vec!["/usr/bin".to_string(), "/usr/bin/0ad".to_string()]);
    }

    #[test]
    fn query_files_sql_reads_createrepo_schema() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE packages (pkgKey INTEGER PRIMARY KEY, pkgId TEXT);
             CREATE TABLE filelist (pkgKey INTEGER, dirname TEXT, filenames TEXT, filetypes TEXT);
             INSERT INTO packages VALUES (1, 'abc123');
             INSERT INTO filelist VALUES (1, '/usr/bin', '0ad', 'f');",
        )
        .unwrap();
        let files = query_files_sql(&conn, "abc123").unwrap();
        assert_eq!(files, vec!["/usr/bin/0ad".to_string()]);
    }
}
