//! `comps.xml` (the `group`/`group_gz` data type): package groups and
//! the categories that organize them (spec §3 Category, §2 group).
use crate::errors::*;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct PackageReq {
    #[serde(rename = "type", default)]
    req_type: Option<String>,
    #[serde(rename = "$value")]
    name: String,
}

#[derive(Debug, Deserialize, Default)]
struct PackageList {
    #[serde(rename = "packagereq", default)]
    packagereq: Vec<PackageReq>,
}

#[derive(Debug, Deserialize)]
struct GroupField {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    default: bool,
    #[serde(default)]
    packagelist: PackageList,
}

#[derive(Debug, Deserialize, Default)]
struct GroupIdList {
    #[serde(rename = "groupid", default)]
    groupid: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CategoryField {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    grouplist: GroupIdList,
}

#[derive(Debug, Deserialize, Default)]
struct Comps {
    #[serde(rename = "group", default)]
    group: Vec<GroupField>,
    #[serde(rename = "category", default)]
    category: Vec<CategoryField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompsGroup {
    pub id: String,
    pub name: String,
    pub description: String,
    pub is_default: bool,
    pub mandatory_packages: Vec<String>,
    pub optional_packages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: String,
    pub group_ids: Vec<String>,
}

pub struct CompsDocument {
    pub groups: Vec<CompsGroup>,
    pub categories: Vec<Category>,
}

pub fn parse(xml: &str) -> Result<CompsDocument> {
    let doc: Comps = serde_xml_rs::from_str(xml)?;
    let groups = doc
        .group
        .into_iter()
        .map(|g| {
            let mut mandatory = Vec::new();
            let mut optional = Vec::new();
            for req in g.packagelist.packagereq {
                match req.req_type.as_deref() {
                    Some("optional") => optional.push(req.name),
                    _ => mandatory.push(req.name),
                }
            }
            CompsGroup {
                id: g.id,
                name: g.name,
                description: g.description,
                is_default: g.default,
                mandatory_packages: mandatory,
                optional_packages: optional,
            }
        })
        .collect();
    let categories = doc
        .category
        .into_iter()
        .map(|c| Category {
            id: c.id,
            name: c.name,
            description: c.description,
            group_ids: c.grouplist.groupid,
        })
        .collect();
    Ok(CompsDocument { groups, categories })
}
