//! Minimal INI reader for `repocat.conf` and `*.repo` files.
//!
//! Hand-rolled rather than pulling in an INI crate: a single pass
//! producing an ordered list of sections, each an ordered list of
//! `key = value` pairs. Comments start the line with `#` or `;`.
use std::collections::HashMap;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Document {
    pub sections: Vec<Section>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub entries: Vec<(String, String)>,
}

impl Section {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn as_map(&self) -> HashMap<String, String> {
        self.entries.iter().cloned().collect()
    }
}

pub fn parse(text: &str) -> Document {
    let mut sections = Vec::new();
    let mut current: Option<Section> = None;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(stripped) = line.strip_prefix('[') {
            if let Some(name) = stripped.strip_suffix(']') {
                if let Some(section) = current.take() {
                    sections.push(section);
                }
                current = Some(Section {
                    name: name.trim().to_string(),
                    entries: Vec::new(),
                });
                continue;
            }
        }
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim().to_string();
            let value = value.trim().to_string();
            if let Some(section) = current.as_mut() {
                section.entries.push((key, value));
            }
        }
    }
    if let Some(section) = current.take() {
        sections.push(section);
    }

    Document { sections }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sections_and_entries() {
        let doc = parse(
            "# comment\n[main]\ncachedir=/var/cache/repocat\nnetwork = true\n\n[fedora]\nname=Fedora $releasever\nenabled=1\n",
        );
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.sections[0].name, "main");
        assert_eq!(doc.sections[0].get("cachedir"), Some("/var/cache/repocat"));
        assert_eq!(doc.sections[0].get("network"), Some("true"));
        assert_eq!(doc.sections[1].name, "fedora");
        assert_eq!(doc.sections[1].get("name"), Some("Fedora $releasever"));
    }

    #[test]
    fn ignores_stray_entries_before_first_section() {
        let doc = parse("stray=value\n[main]\nkey=value\n");
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].get("key"), Some("value"));
    }
}
