//! Background rebuild worker.
//!
//! ```text
//! request(g) ──> requested = max(requested, g) ──> wake
//!                                                   │
//!        ┌──────────── worker loop ─────────────────┘
//!        │ published >= requested ? sleep until woken
//!        │ else spawn_blocking(rebuild)
//!        │      ok  → publish generation to watchers
//!        │      err → back off, retry
//!        └──────────────────────────────────────────
//! ```
//!
//! Requests coalesce: ten commits during one rebuild cause one more rebuild,
//! which reads a snapshot covering all ten.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::domain::RebuildBackoff;
use crate::ports::RebuildTrigger;
use crate::service::builder::FilterBuilder;

struct Shared {
    requested: AtomicU64,
    wake: Notify,
}

/// Handle to the rebuild worker task.
pub struct RebuildScheduler {
    shared: Arc<Shared>,
    published_rx: watch::Receiver<u64>,
    shutdown_tx: watch::Sender<bool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl RebuildScheduler {
    /// Spawn the worker on the current tokio runtime.
    pub fn spawn(builder: Arc<FilterBuilder>, backoff: RebuildBackoff) -> Self {
        let shared = Arc::new(Shared {
            requested: AtomicU64::new(0),
            wake: Notify::new(),
        });
        let (published_tx, published_rx) =
            watch::channel(builder.publisher().published_generation());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker = tokio::spawn(run_worker(
            builder,
            Arc::clone(&shared),
            backoff,
            published_tx,
            shutdown_rx,
        ));

        Self {
            shared,
            published_rx,
            shutdown_tx,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Ask for a filter covering at least `generation`. Never blocks.
    pub fn request(&self, generation: u64) {
        self.shared.requested.fetch_max(generation, Ordering::SeqCst);
        self.shared.wake.notify_one();
    }

    pub fn requested_generation(&self) -> u64 {
        self.shared.requested.load(Ordering::SeqCst)
    }

    /// Resolve once a filter covering `generation` is published.
    pub async fn wait_for_generation(&self, generation: u64) {
        let mut rx = self.published_rx.clone();
        // Err only when the worker is gone
        let _ = rx.wait_for(|published| *published >= generation).await;
    }

    /// Stop the worker, letting an in-flight rebuild finish.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                error!(error = %e, "[ha-02] Rebuild worker panicked");
            }
        }
    }
}

impl RebuildTrigger for RebuildScheduler {
    fn request_rebuild(&self, generation: u64) {
        self.request(generation);
    }
}

async fn run_worker(
    builder: Arc<FilterBuilder>,
    shared: Arc<Shared>,
    backoff: RebuildBackoff,
    published_tx: watch::Sender<u64>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    info!("[ha-02] Rebuild worker started");

    'worker: loop {
        tokio::select! {
            _ = shared.wake.notified() => {}
            _ = shutdown_rx.changed() => break 'worker,
        }

        let mut attempt: u32 = 0;
        loop {
            let target = shared.requested.load(Ordering::SeqCst);
            let published = builder.publisher().published_generation();
            if published >= target {
                published_tx.send_replace(published);
                break;
            }

            let job = Arc::clone(&builder);
            let covered = match tokio::task::spawn_blocking(move || job.rebuild()).await {
                Ok(Ok(artifact)) => {
                    published_tx.send_replace(artifact.generation);
                    artifact.generation >= target
                }
                // Logged and counted by `rebuild`
                Ok(Err(_)) => false,
                Err(e) => {
                    error!(error = %e, "[ha-02] Rebuild task panicked");
                    false
                }
            };

            if covered {
                attempt = 0;
                continue;
            }

            let delay = backoff.delay_for_attempt(attempt);
            attempt = attempt.saturating_add(1);
            debug!(
                target_generation = target,
                attempt,
                retry_in_ms = delay.as_millis() as u64,
                "[ha-02] Scheduling rebuild retry"
            );
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown_rx.changed() => break 'worker,
            }
        }
    }

    if builder.needs_rebuild(shared.requested.load(Ordering::SeqCst)) {
        warn!("[ha-02] Rebuild worker stopped with a rebuild still pending");
    }
    info!("[ha-02] Rebuild worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::CuckooBuilder;
    use crate::domain::{ContagionFilter, FilterKind};
    use crate::error::FilterError;
    use crate::metrics::FilterMetrics;
    use crate::ports::MembershipBuilder;
    use crate::service::publisher::ArtifactPublisher;
    use ha_01_epoch_store::test_utils::make_test_record;
    use ha_01_epoch_store::{EpochSeedStore, RecordSnapshot};
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    fn commit(store: &EpochSeedStore, epoch: u32) -> u64 {
        let mut tx = store.begin();
        tx.add_record(&make_test_record(epoch, epoch as u8));
        tx.commit().unwrap()
    }

    fn builder(
        store: Arc<EpochSeedStore>,
        membership: Arc<dyn MembershipBuilder>,
    ) -> Arc<FilterBuilder> {
        Arc::new(FilterBuilder::new(
            store,
            membership,
            Arc::new(ArtifactPublisher::new(Arc::new(FilterMetrics::new()))),
        ))
    }

    async fn wait(scheduler: &RebuildScheduler, generation: u64) {
        tokio::time::timeout(
            Duration::from_secs(5),
            scheduler.wait_for_generation(generation),
        )
        .await
        .expect("rebuild did not complete in time");
    }

    #[tokio::test]
    async fn test_request_publishes_covering_filter() {
        let store = Arc::new(EpochSeedStore::in_memory());
        let builder = builder(Arc::clone(&store), Arc::new(CuckooBuilder::default()));
        let scheduler = RebuildScheduler::spawn(Arc::clone(&builder), RebuildBackoff::fast());

        let generation = commit(&store, 100);
        scheduler.request_rebuild(generation);
        wait(&scheduler, generation).await;

        let artifact = builder.publisher().current();
        assert!(artifact.generation >= generation);
        let record = make_test_record(100, 100);
        assert!(artifact
            .decode_filter()
            .unwrap()
            .contains_record(record.epoch, &record.seed));

        scheduler.shutdown().await;
    }

    #[tokio::test]
    async fn test_requests_coalesce() {
        let store = Arc::new(EpochSeedStore::in_memory());
        let builder = builder(Arc::clone(&store), Arc::new(CuckooBuilder::default()));
        let scheduler = RebuildScheduler::spawn(Arc::clone(&builder), RebuildBackoff::fast());

        let mut last = 0;
        for epoch in 0..20 {
            last = commit(&store, epoch);
            scheduler.request(last);
        }
        wait(&scheduler, last).await;

        let metrics = builder.metrics().snapshot();
        assert!(metrics.rebuilds_succeeded >= 1);
        assert!(metrics.rebuilds_succeeded <= 20);
        assert_eq!(builder.publisher().current().record_count, 20);

        scheduler.shutdown().await;
    }

    #[tokio::test]
    async fn test_failures_are_retried_until_success() {
        struct FlakyBuilder {
            failures_left: AtomicU32,
        }
        impl MembershipBuilder for FlakyBuilder {
            fn kind(&self) -> FilterKind {
                FilterKind::Cuckoo
            }
            fn build(&self, snapshot: &RecordSnapshot) -> Result<ContagionFilter, FilterError> {
                let left = self.failures_left.load(Ordering::SeqCst);
                if left > 0 {
                    self.failures_left.store(left - 1, Ordering::SeqCst);
                    return Err(FilterError::InvalidParameters("transient".into()));
                }
                CuckooBuilder::default().build(snapshot)
            }
        }

        let store = Arc::new(EpochSeedStore::in_memory());
        let builder = builder(
            Arc::clone(&store),
            Arc::new(FlakyBuilder {
                failures_left: AtomicU32::new(3),
            }),
        );
        let scheduler = RebuildScheduler::spawn(Arc::clone(&builder), RebuildBackoff::fast());

        let generation = commit(&store, 1);
        scheduler.request(generation);
        wait(&scheduler, generation).await;

        let metrics = builder.metrics().snapshot();
        assert_eq!(metrics.rebuilds_failed, 3);
        assert_eq!(metrics.rebuilds_succeeded, 1);

        scheduler.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_worker() {
        let store = Arc::new(EpochSeedStore::in_memory());
        let builder = builder(store, Arc::new(CuckooBuilder::default()));
        let scheduler = RebuildScheduler::spawn(builder, RebuildBackoff::fast());

        tokio::time::timeout(Duration::from_secs(5), scheduler.shutdown())
            .await
            .expect("worker did not stop");
        // A second shutdown is a no-op
        scheduler.shutdown().await;
    }
}
