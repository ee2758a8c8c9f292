//! Watcher core: pure review-queue diffing, no IO.
mod diff;
mod record;
mod snapshot;

pub use diff::{apply_cycle, apply_record, classify, Decision, Notification};
pub use record::{MalformedRecordError, PageRecord, RawRecord, ReviewStatus};
pub use snapshot::{Snapshot, SnapshotEntry};
