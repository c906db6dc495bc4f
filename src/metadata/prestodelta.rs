//! `prestodelta.xml`: delta RPMs available for a newer package built
//! against a specific older installed version (spec §2 prestodelta,
//! GLOSSARY "Delta RPM").
use crate::errors::*;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ChecksumField {
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "$value")]
    value: String,
}

#[derive(Debug, Deserialize)]
struct DeltaField {
    oldepoch: Option<String>,
    oldversion: String,
    oldrelease: String,
    filename: String,
    sequence: String,
    size: u64,
    checksum: ChecksumField,
}

#[derive(Debug, Deserialize)]
struct NewpackageField {
    name: String,
    epoch: Option<String>,
    version: String,
    release: String,
    arch: String,
    #[serde(rename = "delta", default)]
    delta: Vec<DeltaField>,
}

#[derive(Debug, Deserialize, Default)]
struct Prestodelta {
    #[serde(rename = "newpackage", default)]
    newpackage: Vec<NewpackageField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaRpm {
    pub name: String,
    pub new_evr: String,
    pub old_evr: String,
    pub arch: String,
    pub filename: String,
    pub sequence: String,
    pub size: u64,
    pub checksum_type: String,
    pub checksum: String,
}

fn evr_string(epoch: Option<&str>, version: &str, release: &str) -> String {
    match epoch {
        Some(e) if !e.is_empty() && e != "0" => format!("{e}:{version}-{release}"),
        _ => format!("{version}-{release}"),
    }
}

pub fn parse(xml: &str) -> Result<Vec<DeltaRpm>> {
    let doc: Prestodelta = serde_xml_rs::from_str(xml)?;
    let mut deltas = Vec::new();
    for pkg in doc.newpackage {
        let new_evr = evr_string(pkg.epoch.as_deref(), &pkg.version, &pkg.release);
        for d in pkg.delta {
            deltas.push(DeltaRpm {
                name: pkg.name.clone(),
                new_evr: new_evr.clone(),
                old_evr: evr_string(d.oldepoch.as_deref(), &d.oldversion, &d.oldrelease),
                arch: pkg.arch.clone(),
                filename: d.filename,
                sequence: d.sequence,
                size: d.size,
                checksum_type: d.checksum.kind,
                checksum: d.checksum.value,
            });
        }
    }
    Ok(deltas)
}

/// The delta (if any) that rebuilds `name` from `old_evr` to `new_evr`.
pub fn find_delta<'a>(deltas: &'a [DeltaRpm], name: &str, old_evr: &str, new_evr: &str) -> Option<&'a DeltaRpm> {
    deltas
        .iter()
        .find(|d| d.name == name && d.old_evr == old_evr && d.new_evr == new_evr)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<prestodelta>
  <newpackage name="bash" epoch="0" version="5.2" release="2.fc41" arch="x86_64">
    <delta oldepoch="0" oldversion="5.2" oldrelease="1.fc41">
      <filename>drpms/bash-5.2-1.fc41_5.2-2.fc41.x86_64.drpm</filename>
      <sequence>bash-5.2-1.fc41-abc123</sequence>
      <size>12345</size>
      <checksum type="sha256">deadbeef</checksum>
    </delta>
  </newpackage>
</prestodelta>
"#;

    #[test]
    fn parses_delta_with_old_and_new_evr() {
        let deltas = parse(SAMPLE).unwrap();
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].new_evr, "5.2-2.fc41");
        assert_eq!(deltas[0].old_evr, "5.2-1.fc41");
    }

    #[test]
    fn find_delta_matches_exact_transition() {
        let deltas = parse(SAMPLE).unwrap();
        assert!(find_delta(&deltas, "bash", "5.2-1.fc41", "5.2-2.fc41").is_some());
        assert!(find_delta(&deltas, "bash", "5.1-1.fc41", "5.2-2.fc41").is_none());
    }
}
