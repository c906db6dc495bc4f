//! The result of [`crate::array::StoreArray::get_updates`]: an installed
//! package paired with a newer package found in some other store, and
//! the advisory that names the transition if one exists (spec §3
//! Update, §9 Open Question).
use crate::metadata::other::ChangelogEntry;
use crate::metadata::updateinfo::Advisory;
use crate::package::Package;

#[derive(Debug, Clone)]
pub struct Update {
    pub installed: Package,
    pub available: Package,
    pub advisory: Option<Advisory>,
    /// Changelog entries at or above `installed`'s EVR, attached by
    /// `StoreRemote::get_update_detail` (spec §4.8).
    pub changelog: Vec<ChangelogEntry>,
}

impl Update {
    pub fn name(&self) -> &str {
        self.installed.name()
    }

    pub fn is_security(&self) -> bool {
        self.advisory.as_ref().map(|a| a.update_type == "security").unwrap_or(false)
    }
}
