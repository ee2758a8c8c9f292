use std::collections::BTreeMap;

use crate::PageRecord;

/// Last-known state for one title. Entries are never deleted once a title
/// has been observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub revision: u64,
    pub status: crate::ReviewStatus,
    pub live_revision: Option<u64>,
}

impl From<&PageRecord> for SnapshotEntry {
    fn from(record: &PageRecord) -> Self {
        Self {
            revision: record.revision,
            status: record.status,
            live_revision: record.live_revision,
        }
    }
}

/// Full last-seen state, title -> entry. Key order carries no meaning; an
/// ordered map keeps persisted output deterministic.
pub type Snapshot = BTreeMap<String, SnapshotEntry>;
