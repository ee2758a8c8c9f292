use crate::{PageRecord, ReviewStatus, Snapshot, SnapshotEntry};

/// What one incoming record means relative to the stored entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// No stored entry: write the record as-is, do not notify.
    Seed,
    /// Stale upstream read: keep the stored entry, do not notify.
    StaleIgnore,
    /// Real but not reportable: overwrite the stored entry, do not notify.
    SilentUpdate,
    /// Genuine forward transition: overwrite and notify.
    NotifyUpdate,
}

/// Payload for one notify-worthy transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub revision: u64,
    pub status: ReviewStatus,
    pub live_revision: Option<u64>,
}

impl From<&PageRecord> for Notification {
    fn from(record: &PageRecord) -> Self {
        Self {
            title: record.title.clone(),
            revision: record.revision,
            status: record.status,
            live_revision: record.live_revision,
        }
    }
}

/// Pure classification of one incoming record against the stored entry.
///
/// The upstream source occasionally serves a momentarily stale read. A
/// lower revision, or an equal revision whose status moved backwards, is
/// the fingerprint of that staleness: such records must neither be
/// reported nor allowed to clobber more advanced stored state.
pub fn classify(previous: Option<&SnapshotEntry>, incoming: &PageRecord) -> Decision {
    let Some(previous) = previous else {
        return Decision::Seed;
    };

    if is_regression(previous, incoming) {
        return Decision::StaleIgnore;
    }

    let changed =
        incoming.revision != previous.revision || incoming.status != previous.status;
    // Transitions into `unsubmitted` are administrative resets, not
    // review events; they update the snapshot silently.
    if changed && incoming.status != ReviewStatus::Unsubmitted {
        Decision::NotifyUpdate
    } else {
        Decision::SilentUpdate
    }
}

fn is_regression(previous: &SnapshotEntry, incoming: &PageRecord) -> bool {
    if incoming.revision < previous.revision {
        return true;
    }
    if incoming.revision > previous.revision {
        return false;
    }
    // Equal revisions: only specific backward status moves count.
    match (previous.status, incoming.status) {
        (ReviewStatus::Live | ReviewStatus::Rejected, ReviewStatus::Awaiting) => true,
        (prev, ReviewStatus::Unsubmitted) => prev != ReviewStatus::Unsubmitted,
        _ => false,
    }
}

/// Applies one record to the snapshot, returning the decision and the
/// notification payload when one fired.
pub fn apply_record(
    snapshot: &mut Snapshot,
    incoming: &PageRecord,
) -> (Decision, Option<Notification>) {
    let decision = classify(snapshot.get(&incoming.title), incoming);
    match decision {
        Decision::StaleIgnore => (decision, None),
        Decision::Seed | Decision::SilentUpdate => {
            snapshot.insert(incoming.title.clone(), SnapshotEntry::from(incoming));
            (decision, None)
        }
        Decision::NotifyUpdate => {
            snapshot.insert(incoming.title.clone(), SnapshotEntry::from(incoming));
            (decision, Some(Notification::from(incoming)))
        }
    }
}

/// Runs one poll cycle's classification over a fetched listing, in input
/// order, returning the notify-worthy payloads.
pub fn apply_cycle(snapshot: &mut Snapshot, records: &[PageRecord]) -> Vec<Notification> {
    records
        .iter()
        .filter_map(|record| apply_record(snapshot, record).1)
        .collect()
}
