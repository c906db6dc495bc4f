//! Parses a metalink XML document into a flat URI list, preference order
//! preserved (spec §4.4, §6 "Media Discovery").
//!
//! Same `serde_xml_rs::from_str` over `#[derive(Deserialize)]` structs
//! pattern as [`crate::metadata::repomd`].
use crate::errors::*;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Url {
    preference: Option<u32>,
    #[serde(rename = "$value")]
    value: String,
}

#[derive(Debug, Deserialize)]
struct Resources {
    #[serde(rename = "url", default)]
    urls: Vec<Url>,
}

#[derive(Debug, Deserialize)]
struct File {
    resources: Resources,
}

#[derive(Debug, Deserialize)]
struct Files {
    #[serde(rename = "file", default)]
    file: Vec<File>,
}

#[derive(Debug, Deserialize)]
struct MetalinkDoc {
    files: Files,
}

/// URIs ordered by descending `preference` (ties keep document order),
/// stripped of their trailing filename so they can be joined with a
/// relative path the way a plain baseurl is.
pub fn parse_uris(xml: &str) -> Result<Vec<String>> {
    let doc: MetalinkDoc = serde_xml_rs::from_str(xml)
        .map_err(|e| Error::Malformed(format!("metalink: {e}")))?;
    let mut urls: Vec<Url> = doc
        .files
        .file
        .into_iter()
        .flat_map(|f| f.resources.urls)
        .collect();
    urls.sort_by(|a, b| b.preference.unwrap_or(0).cmp(&a.preference.unwrap_or(0)));
    Ok(urls
        .into_iter()
        .filter_map(|u| strip_repodata_suffix(&u.value))
        .collect())
}

fn strip_repodata_suffix(uri: &str) -> Option<String> {
    let uri = uri.trim();
    if uri.is_empty() {
        return None;
    }
    let base = uri
        .rsplit_once("/repodata/")
        .map(|(base, _)| base)
        .unwrap_or(uri);
    Some(base.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<metalink version="3.0" xmlns="http://www.metalinker.org/">
  <files>
    <file name="repomd.xml">
      <resources maxconnections="1">
        <url protocol="https" type="https" location="US" preference="100">https://mirror1.example/fedora/41/repodata/repomd.xml</url>
        <url protocol="https" type="https" location="DE" preference="50">https://mirror2.example/fedora/41/repodata/repomd.xml</url>
      </resources>
    </file>
  </files>
</metalink>
"#;

    #[test]
    fn orders_by_preference_descending() {
        let uris = parse_uris(SAMPLE).unwrap();
        assert_eq!(
            uris,
            vec![
                "https://mirror1.example/fedora/41".to_string(),
                "https://mirror2.example/fedora/41".to_string(),
            ]
        );
    }

    #[test]
    fn malformed_xml_is_reported() {
        assert!(parse_uris("not xml").is_err());
    }
}
