use std::sync::Once;

use watcher_core::{apply_cycle, PageRecord, ReviewStatus, Snapshot, SnapshotEntry};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(watch_logging::initialize_for_tests);
}

fn record(
    title: &str,
    revision: u64,
    status: ReviewStatus,
    live_revision: Option<u64>,
) -> PageRecord {
    PageRecord {
        title: title.to_string(),
        revision,
        status,
        live_revision,
    }
}

#[test]
fn cold_start_seeds_everything_without_notifying() {
    init_logging();
    let mut snapshot = Snapshot::new();
    let listing = vec![
        record("A.js", 5, ReviewStatus::Awaiting, None),
        record("B.css", 12, ReviewStatus::Live, Some(12)),
    ];

    let notifications = apply_cycle(&mut snapshot, &listing);

    assert!(notifications.is_empty());
    assert_eq!(snapshot.len(), 2);
    assert_eq!(
        snapshot["A.js"],
        SnapshotEntry {
            revision: 5,
            status: ReviewStatus::Awaiting,
            live_revision: None,
        }
    );
}

#[test]
fn approval_notifies_and_advances_snapshot() {
    init_logging();
    let mut snapshot = Snapshot::new();
    snapshot.insert(
        "A.js".to_string(),
        SnapshotEntry {
            revision: 5,
            status: ReviewStatus::Awaiting,
            live_revision: None,
        },
    );

    let notifications = apply_cycle(
        &mut snapshot,
        &[record("A.js", 6, ReviewStatus::Live, Some(6))],
    );

    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].title, "A.js");
    assert_eq!(notifications[0].revision, 6);
    assert_eq!(notifications[0].status, ReviewStatus::Live);
    assert_eq!(notifications[0].live_revision, Some(6));
    assert_eq!(snapshot["A.js"].revision, 6);
    assert_eq!(snapshot["A.js"].status, ReviewStatus::Live);
}

#[test]
fn stale_read_leaves_snapshot_untouched() {
    init_logging();
    let mut snapshot = Snapshot::new();
    snapshot.insert(
        "A.js".to_string(),
        SnapshotEntry {
            revision: 6,
            status: ReviewStatus::Live,
            live_revision: None,
        },
    );

    let notifications = apply_cycle(
        &mut snapshot,
        &[record("A.js", 6, ReviewStatus::Awaiting, None)],
    );

    assert!(notifications.is_empty());
    assert_eq!(snapshot["A.js"].revision, 6);
    assert_eq!(snapshot["A.js"].status, ReviewStatus::Live);
}

#[test]
fn administrative_reset_updates_silently() {
    init_logging();
    let mut snapshot = Snapshot::new();
    snapshot.insert(
        "A.js".to_string(),
        SnapshotEntry {
            revision: 7,
            status: ReviewStatus::Awaiting,
            live_revision: None,
        },
    );

    let notifications = apply_cycle(
        &mut snapshot,
        &[record("A.js", 8, ReviewStatus::Unsubmitted, None)],
    );

    assert!(notifications.is_empty());
    assert_eq!(snapshot["A.js"].revision, 8);
    assert_eq!(snapshot["A.js"].status, ReviewStatus::Unsubmitted);
}

#[test]
fn identical_cycle_is_idempotent_but_refreshes_live_revision() {
    init_logging();
    let mut snapshot = Snapshot::new();
    snapshot.insert(
        "A.js".to_string(),
        SnapshotEntry {
            revision: 9,
            status: ReviewStatus::Live,
            live_revision: None,
        },
    );

    // Same (revision, status) but the live-revision column appeared.
    let notifications = apply_cycle(
        &mut snapshot,
        &[record("A.js", 9, ReviewStatus::Live, Some(9))],
    );

    assert!(notifications.is_empty());
    assert_eq!(snapshot["A.js"].live_revision, Some(9));
}

#[test]
fn mixed_cycle_only_reports_forward_transitions() {
    init_logging();
    let mut snapshot = Snapshot::new();
    snapshot.insert(
        "A.js".to_string(),
        SnapshotEntry {
            revision: 5,
            status: ReviewStatus::Awaiting,
            live_revision: None,
        },
    );
    snapshot.insert(
        "B.css".to_string(),
        SnapshotEntry {
            revision: 3,
            status: ReviewStatus::Live,
            live_revision: Some(3),
        },
    );

    let listing = vec![
        record("A.js", 5, ReviewStatus::Rejected, None),
        record("B.css", 2, ReviewStatus::Awaiting, None),
        record("C.js", 1, ReviewStatus::Awaiting, None),
    ];
    let notifications = apply_cycle(&mut snapshot, &listing);

    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].title, "A.js");
    assert_eq!(notifications[0].status, ReviewStatus::Rejected);
    // The stale B.css read was absorbed, the new C.js title was seeded.
    assert_eq!(snapshot["B.css"].revision, 3);
    assert_eq!(snapshot["C.js"].revision, 1);
    assert_eq!(snapshot.len(), 3);
}
