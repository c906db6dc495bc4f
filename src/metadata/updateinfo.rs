//! `updateinfo.xml`: security/bugfix advisories, each tied to the NEVRAs
//! it updates (spec §3 Update, §2 updateinfo).
//!
//! Per the Open Question on synthesizing an `Update` when no advisory
//! covers a given NEVRA: this module only returns what `updateinfo.xml`
//! actually states. [`crate::array`]'s `get_updates` is responsible for
//! the fallback (a plain newer-EVR `Update` with `advisory: None`), kept
//! out of this parser so "no advisory" and "parse found nothing" aren't
//! conflated.
use crate::errors::*;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct IssuedField {
    date: String,
}

#[derive(Debug, Deserialize)]
struct ReferenceField {
    href: String,
    id: Option<String>,
    #[serde(rename = "type")]
    ref_type: String,
    title: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ReferenceList {
    #[serde(rename = "reference", default)]
    reference: Vec<ReferenceField>,
}

#[derive(Debug, Deserialize)]
struct PackageField {
    name: String,
    version: String,
    release: String,
    #[serde(default)]
    epoch: String,
    arch: String,
    src: Option<String>,
    filename: String,
}

#[derive(Debug, Deserialize)]
struct Collection {
    #[serde(rename = "package", default)]
    package: Vec<PackageField>,
}

#[derive(Debug, Deserialize, Default)]
struct Pkglist {
    #[serde(rename = "collection", default)]
    collection: Vec<Collection>,
}

#[derive(Debug, Deserialize)]
struct UpdateField {
    #[serde(default)]
    from: String,
    status: String,
    #[serde(rename = "type")]
    update_type: String,
    id: String,
    title: String,
    issued: IssuedField,
    #[serde(default)]
    description: String,
    #[serde(default)]
    references: ReferenceList,
    #[serde(default)]
    pkglist: Pkglist,
}

#[derive(Debug, Deserialize, Default)]
struct Updates {
    #[serde(rename = "update", default)]
    update: Vec<UpdateField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReference {
    pub href: String,
    pub id: Option<String>,
    pub kind: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePackageRef {
    pub name: String,
    pub evr: String,
    pub arch: String,
    pub filename: String,
}

/// An advisory as stated by `updateinfo.xml`. See module docs for the
/// distinction from the synthesized fallback `Update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advisory {
    pub id: String,
    pub from: String,
    pub status: String,
    pub update_type: String,
    pub title: String,
    pub issued: String,
    pub description: String,
    pub references: Vec<UpdateReference>,
    pub packages: Vec<UpdatePackageRef>,
}

pub fn parse(xml: &str) -> Result<Vec<Advisory>> {
    let doc: Updates = serde_xml_rs::from_str(xml)?;
    Ok(doc
        .update
        .into_iter()
        .map(|u| Advisory {
            id: u.id,
            from: u.from,
            status: u.status,
            update_type: u.update_type,
            title: u.title,
            issued: u.issued.date,
            description: u.description,
            references: u
                .references
                .reference
                .into_iter()
                .map(|r| UpdateReference {
                    href: r.href,
                    id: r.id,
                    kind: r.ref_type,
                    title: r.title,
                })
                .collect(),
            packages: u
                .pkglist
                .collection
                .into_iter()
                .flat_map(|c| c.package)
                .map(|p| UpdatePackageRef {
                    name: p.name,
                    evr: if p.epoch.is_empty() {
                        format!("{}-{}", p.version, p.release)
                    } else {
                        format!("{}:{}-{}", p.epoch, p.version, p.release)
                    },
                    arch: p.arch,
                    filename: p.filename,
                })
                .collect(),
        })
        .collect())
}

/// Advisories mentioning a given package name, newest `issued` first.
pub fn find_for_package<'a>(advisories: &'a [Advisory], name: &str) -> Vec<&'a Advisory> {
    let mut matches: Vec<&Advisory> = advisories
        .iter()
        .filter(|a| a.packages.iter().any(|p| p.name == name))
        .collect();
    matches.sort_by(|a, b| b.issued.cmp(&a.issued));
    matches
}
