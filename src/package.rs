//! Package identity and the immutable package record (spec §3, §4.6).
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

pub const INSTALLED_SOURCE: &str = "installed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependFlag {
    Any,
    Less,
    Greater,
    Equal,
    LessEqual,
    GreaterEqual,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Depend {
    pub name: String,
    pub flag: DependFlag,
    pub evr: String,
}

impl Depend {
    pub fn new(name: impl Into<String>, flag: DependFlag, evr: impl Into<String>) -> Self {
        Depend {
            name: name.into(),
            flag,
            evr: evr.into(),
        }
    }

    pub fn any(name: impl Into<String>) -> Self {
        Depend::new(name, DependFlag::Any, "")
    }
}

/// `[epoch:]version-release`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Evr {
    pub epoch: Option<u32>,
    pub version: String,
    pub release: String,
}

impl Evr {
    pub fn parse(text: &str) -> Evr {
        let (epoch, rest) = match text.split_once(':') {
            Some((e, rest)) => (e.parse().ok(), rest),
            None => (None, text),
        };
        let (version, release) = rest.split_once('-').unwrap_or((rest, ""));
        Evr {
            epoch,
            version: version.to_string(),
            release: release.to_string(),
        }
    }
}

impl fmt::Display for Evr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.epoch {
            Some(e) => write!(f, "{e}:{}-{}", self.version, self.release),
            None => write!(f, "{}-{}", self.version, self.release),
        }
    }
}

/// RPM version comparison: numeric runs compare numerically, alphabetic
/// runs lexically, and a segment is newer than a missing one.
fn rpmvercmp(a: &str, b: &str) -> Ordering {
    fn is_alnum_split(c: char) -> bool {
        c.is_ascii_digit() || c.is_ascii_alphabetic()
    }
    let mut a = a;
    let mut b = b;
    loop {
        a = a.trim_start_matches(|c: char| !is_alnum_split(c));
        b = b.trim_start_matches(|c: char| !is_alnum_split(c));
        if a.is_empty() && b.is_empty() {
            return Ordering::Equal;
        }
        if a.is_empty() {
            return Ordering::Less;
        }
        if b.is_empty() {
            return Ordering::Greater;
        }

        let take = |s: &str| -> (&str, &str) {
            if s.starts_with(|c: char| c.is_ascii_digit()) {
                let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
                (&s[..end], &s[end..])
            } else {
                let end = s.find(|c: char| !c.is_ascii_alphabetic()).unwrap_or(s.len());
                (&s[..end], &s[end..])
            }
        };

        let (seg_a, rest_a) = take(a);
        let (seg_b, rest_b) = take(b);
        let a_numeric = seg_a.starts_with(|c: char| c.is_ascii_digit());
        let b_numeric = seg_b.starts_with(|c: char| c.is_ascii_digit());

        let ord = if a_numeric && b_numeric {
            let a_trim = seg_a.trim_start_matches('0');
            let b_trim = seg_b.trim_start_matches('0');
            a_trim.len().cmp(&b_trim.len()).then_with(|| a_trim.cmp(b_trim))
        } else if a_numeric != b_numeric {
            // a numeric segment always wins over an alphabetic one
            if a_numeric {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        } else {
            seg_a.cmp(seg_b)
        };

        if ord != Ordering::Equal {
            return ord;
        }
        a = rest_a;
        b = rest_b;
    }
}

pub fn evr_compare(a: &Evr, b: &Evr) -> Ordering {
    let epoch_a = a.epoch.unwrap_or(0);
    let epoch_b = b.epoch.unwrap_or(0);
    epoch_a
        .cmp(&epoch_b)
        .then_with(|| rpmvercmp(&a.version, &b.version))
        .then_with(|| rpmvercmp(&a.release, &b.release))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Unknown,
    System,
    Applications,
    Development,
    Documentation,
    Graphics,
    Internet,
    Multimedia,
    Office,
    Games,
}

impl std::str::FromStr for Group {
    type Err = String;

    fn from_str(text: &str) -> std::result::Result<Self, Self::Err> {
        match text.to_ascii_lowercase().as_str() {
            "system" => Ok(Group::System),
            "applications" => Ok(Group::Applications),
            "development" => Ok(Group::Development),
            "documentation" => Ok(Group::Documentation),
            "graphics" => Ok(Group::Graphics),
            "internet" => Ok(Group::Internet),
            "multimedia" => Ok(Group::Multimedia),
            "office" => Ok(Group::Office),
            "games" => Ok(Group::Games),
            "unknown" => Ok(Group::Unknown),
            other => Err(format!("unrecognised group `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageIdentity {
    pub name: String,
    pub evr: Evr,
    pub arch: String,
    pub source: String,
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{};{};{}", self.name, self.evr, self.arch, self.source)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PackageBuilder {
    pub name: String,
    pub evr: Evr,
    pub arch: String,
    pub source: String,
    pub pkgid: Option<String>,
    pub summary: String,
    pub description: String,
    pub license: String,
    pub url: String,
    pub category: String,
    pub group: Option<Group>,
    pub size: u64,
    pub files: Vec<String>,
    pub requires: Vec<Depend>,
    pub provides: Vec<Depend>,
    pub obsoletes: Vec<Depend>,
    pub conflicts: Vec<Depend>,
    pub installed: bool,
    pub location_href: Option<String>,
    pub installed_version: Option<Arc<Package>>,
}

impl PackageBuilder {
    pub fn build(self) -> Package {
        Package {
            identity: PackageIdentity {
                name: self.name,
                evr: self.evr,
                arch: self.arch,
                source: self.source,
            },
            pkgid: self.pkgid,
            summary: self.summary,
            description: self.description,
            license: self.license,
            url: self.url,
            category: self.category,
            group: self.group.unwrap_or(Group::Unknown),
            size: self.size,
            files: self.files,
            requires: self.requires,
            provides: self.provides,
            obsoletes: self.obsoletes,
            conflicts: self.conflicts,
            installed: self.installed,
            location_href: self.location_href,
            installed_version: self.installed_version,
        }
    }
}

/// Immutable after construction (spec §3).
#[derive(Debug, Clone)]
pub struct Package {
    pub identity: PackageIdentity,
    pub pkgid: Option<String>,
    pub summary: String,
    pub description: String,
    pub license: String,
    pub url: String,
    pub category: String,
    pub group: Group,
    pub size: u64,
    pub files: Vec<String>,
    pub requires: Vec<Depend>,
    pub provides: Vec<Depend>,
    pub obsoletes: Vec<Depend>,
    pub conflicts: Vec<Depend>,
    pub installed: bool,
    pub location_href: Option<String>,
    pub installed_version: Option<Arc<Package>>,
}

impl Package {
    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn evr(&self) -> &Evr {
        &self.identity.evr
    }

    pub fn arch(&self) -> &str {
        &self.identity.arch
    }

    pub fn source(&self) -> &str {
        &self.identity.source
    }

    pub fn nevra(&self) -> String {
        self.identity.to_string()
    }

    /// EVR ordering iff names are equal, `None` otherwise ("incomparable").
    pub fn compare(a: &Package, b: &Package) -> Option<Ordering> {
        if a.name() != b.name() {
            return None;
        }
        Some(evr_compare(a.evr(), b.evr()))
    }

    pub fn is_devel(&self) -> bool {
        const SUFFIXES: &[&str] = &["-debuginfo", "-devel", "-static", "-libs"];
        SUFFIXES.iter().any(|s| self.name().ends_with(s))
    }

    pub fn is_gui(&self) -> bool {
        self.requires
            .iter()
            .any(|d| d.name.contains("gtk") || d.name.contains("kde"))
    }

    /// AND-groups of OR-clauses; at least one clause per group must be
    /// in `free_licenses` (ignoring a trailing `+`) for the whole
    /// license text to pass. The vocabulary is caller-supplied, not
    /// hard-coded (spec §9 Open Question).
    pub fn is_free(&self, free_licenses: &HashSet<String>) -> bool {
        is_free_license(&self.license, free_licenses)
    }
}

/// Whether `dep` (as found in some package's requires/provides/obsoletes/
/// conflicts list) is satisfied by a candidate identified by `name`/`evr` —
/// used by `what_obsoletes` to test an installed package's exact NEVR
/// against each remote package's `Obsoletes:` entries.
pub fn depend_matches(dep: &Depend, name: &str, evr: &Evr) -> bool {
    if dep.name != name {
        return false;
    }
    if dep.evr.is_empty() {
        return matches!(dep.flag, DependFlag::Any);
    }
    let dep_evr = Evr::parse(&dep.evr);
    let ord = evr_compare(evr, &dep_evr);
    match dep.flag {
        DependFlag::Any => true,
        DependFlag::Less => ord == Ordering::Less,
        DependFlag::Greater => ord == Ordering::Greater,
        DependFlag::Equal => ord == Ordering::Equal,
        DependFlag::LessEqual => ord != Ordering::Greater,
        DependFlag::GreaterEqual => ord != Ordering::Less,
    }
}

pub fn is_free_license(license: &str, free_licenses: &HashSet<String>) -> bool {
    if license.trim().is_empty() {
        return false;
    }
    license.split(" and ").all(|group| {
        group.split(" or ").any(|clause| {
            let name = clause.trim().trim_end_matches('+').trim();
            free_licenses.contains(name)
        })
    })
}

pub const DEFAULT_FREE_LICENSES: &[&str] = &[
    "GPLv2", "GPLv3", "LGPLv2", "LGPLv3", "MIT", "BSD", "ASL 2.0", "MPLv2.0", "Python",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nevra_without_epoch() {
        let pkg = PackageBuilder {
            name: "foo".into(),
            evr: Evr::parse("1.0-1"),
            arch: "x86_64".into(),
            source: INSTALLED_SOURCE.into(),
            ..Default::default()
        }
        .build();
        assert_eq!(pkg.nevra(), "foo;1.0-1;x86_64;installed");
    }

    #[test]
    fn nevra_with_epoch() {
        let pkg = PackageBuilder {
            name: "foo".into(),
            evr: Evr::parse("2:1.0-1"),
            arch: "x86_64".into(),
            source: "fedora".into(),
            ..Default::default()
        }
        .build();
        assert_eq!(pkg.nevra(), "foo;2:1.0-1;x86_64;fedora");
    }

    #[test]
    fn compare_is_none_for_different_names() {
        let a = PackageBuilder {
            name: "foo".into(),
            evr: Evr::parse("1.0-1"),
            ..Default::default()
        }
        .build();
        let b = PackageBuilder {
            name: "bar".into(),
            evr: Evr::parse("1.0-1"),
            ..Default::default()
        }
        .build();
        assert_eq!(Package::compare(&a, &b), None);
    }

    #[test]
    fn compare_orders_by_evr() {
        let older = PackageBuilder {
            name: "foo".into(),
            evr: Evr::parse("1.0-1"),
            ..Default::default()
        }
        .build();
        let newer = PackageBuilder {
            name: "foo".into(),
            evr: Evr::parse("1.1-1"),
            ..Default::default()
        }
        .build();
        assert_eq!(Package::compare(&newer, &older), Some(Ordering::Greater));
    }

    #[test]
    fn epoch_dominates_version() {
        let a = Evr::parse("1:1.0-1");
        let b = Evr::parse("2.0-1");
        assert_eq!(evr_compare(&a, &b), Ordering::Greater);
    }

    #[test]
    fn is_devel_matches_known_suffixes() {
        let pkg = PackageBuilder {
            name: "foo-devel".into(),
            ..Default::default()
        }
        .build();
        assert!(pkg.is_devel());
    }

    #[test]
    fn depend_matches_exact_obsoletes_entry() {
        let dep = Depend::new("foo", DependFlag::Equal, "1.0-1");
        assert!(depend_matches(&dep, "foo", &Evr::parse("1.0-1")));
        assert!(!depend_matches(&dep, "foo", &Evr::parse("1.0-2")));
        assert!(!depend_matches(&dep, "bar", &Evr::parse("1.0-1")));
    }

    #[test]
    fn depend_matches_any_flag_ignores_evr() {
        let dep = Depend::any("foo");
        assert!(depend_matches(&dep, "foo", &Evr::parse("9.9-9")));
    }

    #[test]
    fn is_free_requires_one_clause_per_and_group() {
        let free: HashSet<String> = ["MIT", "GPLv2"].iter().map(|s| s.to_string()).collect();
        assert!(is_free_license("MIT", &free));
        assert!(is_free_license("GPLv2+", &free));
        assert!(is_free_license("MIT or Artistic", &free));
        assert!(!is_free_license("Artistic or Commercial", &free));
        assert!(is_free_license("MIT and GPLv2", &free));
        assert!(!is_free_license("MIT and Commercial", &free));
        assert!(!is_free_license("", &free));
    }
}
