use watch_logging::{get_poll_cycle, watch_debug, watch_error, watch_info, watch_warn};
use watcher_core::{apply_cycle, Snapshot};
use watcher_engine::{Notifier, ReviewQueueSource, SnapshotStore};

/// Everything one poll cycle needs. Owned by the loop in `main`; cycles
/// never overlap, so the in-memory snapshot needs no locking.
pub struct PollContext {
    pub source: Box<dyn ReviewQueueSource>,
    pub store: SnapshotStore,
    pub notifier: Box<dyn Notifier>,
    pub snapshot: Snapshot,
}

impl PollContext {
    /// One cycle: fetch, classify, persist, deliver. Every failure is
    /// absorbed here; nothing recoverable propagates out of the loop.
    pub async fn run_cycle(&mut self) {
        let records = match self.source.fetch().await {
            Ok(records) => records,
            Err(err) => {
                watch_warn!(
                    "Cycle {}: fetch failed, snapshot untouched: {}",
                    get_poll_cycle(),
                    err
                );
                return;
            }
        };

        let notifications = apply_cycle(&mut self.snapshot, &records);
        for notification in &notifications {
            watch_debug!(
                "{}: now {} at revision {}",
                notification.title,
                notification.status,
                notification.revision
            );
        }

        // Persist before delivering: a crash between the two drops the
        // batch rather than re-announcing it on restart.
        if let Err(err) = self.store.save(&self.snapshot) {
            watch_error!(
                "Cycle {}: failed to persist snapshot, in-memory state remains authoritative: {}",
                get_poll_cycle(),
                err
            );
        }

        if notifications.is_empty() {
            return;
        }
        watch_info!(
            "Cycle {}: {} notify-worthy transition(s)",
            get_poll_cycle(),
            notifications.len()
        );
        if let Err(err) = self.notifier.deliver(&notifications).await {
            watch_error!(
                "Cycle {}: delivery failed, dropping batch: {}",
                get_poll_cycle(),
                err
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use watcher_core::{Notification, PageRecord, ReviewStatus};
    use watcher_engine::{DeliveryError, FailureKind, FetchError};

    use super::*;

    struct ScriptedSource {
        fetches: Mutex<Vec<Result<Vec<PageRecord>, FetchError>>>,
    }

    impl ScriptedSource {
        fn new(fetches: Vec<Result<Vec<PageRecord>, FetchError>>) -> Self {
            Self {
                fetches: Mutex::new(fetches),
            }
        }
    }

    #[async_trait::async_trait]
    impl ReviewQueueSource for ScriptedSource {
        async fn fetch(&self) -> Result<Vec<PageRecord>, FetchError> {
            self.fetches.lock().unwrap().remove(0)
        }
    }

    struct RecordingNotifier {
        batches: Arc<Mutex<Vec<Vec<Notification>>>>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl Notifier for RecordingNotifier {
        async fn deliver(&self, batch: &[Notification]) -> Result<(), DeliveryError> {
            self.batches.lock().unwrap().push(batch.to_vec());
            if self.fail {
                Err(DeliveryError::HttpStatus(500))
            } else {
                Ok(())
            }
        }
    }

    fn record(title: &str, revision: u64, status: ReviewStatus) -> PageRecord {
        PageRecord {
            title: title.to_string(),
            revision,
            status,
            live_revision: None,
        }
    }

    fn context(
        dir: &tempfile::TempDir,
        fetches: Vec<Result<Vec<PageRecord>, FetchError>>,
        batches: Arc<Mutex<Vec<Vec<Notification>>>>,
        fail_delivery: bool,
    ) -> PollContext {
        PollContext {
            source: Box::new(ScriptedSource::new(fetches)),
            store: SnapshotStore::new(dir.path().join("snapshot.json")),
            notifier: Box::new(RecordingNotifier {
                batches,
                fail: fail_delivery,
            }),
            snapshot: Snapshot::new(),
        }
    }

    #[tokio::test]
    async fn first_cycle_seeds_and_persists_without_notifying() {
        let dir = tempfile::tempdir().expect("tempdir");
        let batches = Arc::new(Mutex::new(Vec::new()));
        let mut ctx = context(
            &dir,
            vec![Ok(vec![record("A.js", 5, ReviewStatus::Awaiting)])],
            batches.clone(),
            false,
        );

        ctx.run_cycle().await;

        assert!(batches.lock().unwrap().is_empty());
        let persisted = ctx.store.load().expect("load");
        assert_eq!(persisted["A.js"].revision, 5);
    }

    #[tokio::test]
    async fn transition_is_persisted_then_delivered() {
        let dir = tempfile::tempdir().expect("tempdir");
        let batches = Arc::new(Mutex::new(Vec::new()));
        let mut ctx = context(
            &dir,
            vec![
                Ok(vec![record("A.js", 5, ReviewStatus::Awaiting)]),
                Ok(vec![record("A.js", 6, ReviewStatus::Live)]),
            ],
            batches.clone(),
            false,
        );

        ctx.run_cycle().await;
        ctx.run_cycle().await;

        let batches = batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 1);
        assert_eq!(batches[0][0].title, "A.js");
        assert_eq!(batches[0][0].status, ReviewStatus::Live);
        assert_eq!(ctx.store.load().expect("load")["A.js"].revision, 6);
    }

    #[tokio::test]
    async fn fetch_failure_leaves_persisted_snapshot_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let batches = Arc::new(Mutex::new(Vec::new()));
        let mut ctx = context(
            &dir,
            vec![
                Ok(vec![record("A.js", 5, ReviewStatus::Awaiting)]),
                Err(FetchError::new(FailureKind::Timeout, "slow upstream")),
            ],
            batches.clone(),
            false,
        );

        ctx.run_cycle().await;
        ctx.run_cycle().await;

        assert!(batches.lock().unwrap().is_empty());
        assert_eq!(ctx.snapshot["A.js"].revision, 5);
        assert_eq!(ctx.store.load().expect("load")["A.js"].revision, 5);
    }

    #[tokio::test]
    async fn delivery_failure_does_not_poison_the_next_cycle() {
        let dir = tempfile::tempdir().expect("tempdir");
        let batches = Arc::new(Mutex::new(Vec::new()));
        let mut ctx = context(
            &dir,
            vec![
                Ok(vec![record("A.js", 5, ReviewStatus::Awaiting)]),
                Ok(vec![record("A.js", 6, ReviewStatus::Live)]),
                Ok(vec![record("A.js", 7, ReviewStatus::Awaiting)]),
            ],
            batches.clone(),
            true,
        );

        ctx.run_cycle().await;
        ctx.run_cycle().await;
        ctx.run_cycle().await;

        // Both transitions were attempted; the failed batch was dropped,
        // not re-queued.
        let batches = batches.lock().unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0][0].revision, 6);
        assert_eq!(batches[1][0].revision, 7);
    }

    #[tokio::test]
    async fn quiet_cycle_still_rewrites_the_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let batches = Arc::new(Mutex::new(Vec::new()));
        let mut ctx = context(
            &dir,
            vec![
                Ok(vec![record("A.js", 5, ReviewStatus::Awaiting)]),
                Ok(vec![record("A.js", 5, ReviewStatus::Awaiting)]),
            ],
            batches.clone(),
            false,
        );

        ctx.run_cycle().await;
        std::fs::remove_file(dir.path().join("snapshot.json")).expect("remove");
        ctx.run_cycle().await;

        assert!(batches.lock().unwrap().is_empty());
        assert_eq!(ctx.store.load().expect("load")["A.js"].revision, 5);
    }
}
