//! Changelog lookup by package id, XML (`other.xml`) and SQL
//! (`other.sqlite`) readers (spec §4.5, §2 other/other_db).
use crate::errors::*;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogEntry {
    pub author: String,
    pub date: i64,
    pub text: String,
}

#[derive(Debug, Deserialize)]
struct ChangelogField {
    author: String,
    date: i64,
    #[serde(rename = "$value")]
    text: String,
}

#[derive(Debug, Deserialize)]
struct PackageEntry {
    pkgid: String,
    #[serde(rename = "changelog", default)]
    changelog: Vec<ChangelogField>,
}

#[derive(Debug, Deserialize)]
struct Otherdata {
    #[serde(rename = "package", default)]
    package: Vec<PackageEntry>,
}

pub fn parse_xml(xml: &str) -> Result<HashMap<String, Vec<ChangelogEntry>>> {
    let doc: Otherdata = serde_xml_rs::from_str(xml)?;
    Ok(doc
        .package
        .into_iter()
        .map(|p| {
            let entries = p
                .changelog
                .into_iter()
                .map(|c| ChangelogEntry {
                    author: c.author,
                    date: c.date,
                    text: c.text,
                })
                .collect();
            (p.pkgid, entries)
        })
        .collect())
}

/// `changelog(pkgKey, author, date, changelog)` joined through
/// `packages(pkgKey, pkgId)`, ordered newest-first.
pub fn query_changelog_sql(conn: &rusqlite::Connection, pkgid: &str) -> Result<Vec<ChangelogEntry>> {
    let mut stmt = conn.prepare(
        "SELECT changelog.author, changelog.date, changelog.changelog
         FROM changelog
         JOIN packages ON packages.pkgKey = changelog.pkgKey
         WHERE packages.pkgId = ?1
         ORDER BY changelog.date DESC",
    )?;
    let mut rows = stmt.query([pkgid])?;
    let mut entries = Vec::new();
    while let Some(row) = rows.next()? {
        entries.push(ChangelogEntry {
            author: row.get(0)?,
            date: row.get(1)?,
            text: row.get(2)?,
        });
    }
    Ok(entries)
}

/// Extracts the trailing `- version-release` from a changelog author line
/// (the rpm `%changelog` convention, e.g. `Dev <dev@x> - 0.0.26-21`), used
/// by [`crate::store::remote::StoreRemote::changelog_since`] to filter
/// entries against an installed EVR. `None` when the line doesn't follow
/// the convention.
pub fn entry_evr(entry: &ChangelogEntry) -> Option<crate::package::Evr> {
    let (_, evr_part) = entry.author.rsplit_once(" - ")?;
    Some(crate::package::Evr::parse(evr_part.trim()))
}
