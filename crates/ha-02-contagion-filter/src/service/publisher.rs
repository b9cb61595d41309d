//! Versioned, atomically swapped filter publication.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::adapters::FilterFile;
use crate::domain::FilterArtifact;
use crate::error::FilterError;
use crate::metrics::FilterMetrics;

/// Holds the artifact clients are served.
///
/// ## Guarantees
///
/// - Readers get a complete artifact: publication is one `Arc` swap.
/// - `version` goes up by exactly one per publication.
/// - A build from a generation not newer than the published one is
///   discarded, so the served filter never regresses.
/// - With a [`FilterFile`], the artifact is durable before it is served.
pub struct ArtifactPublisher {
    current: RwLock<Arc<FilterArtifact>>,
    /// Serialises publishers so version assignment and persistence stay
    /// ordered without holding the read lock during I/O.
    publish_lock: Mutex<()>,
    file: Option<FilterFile>,
    metrics: Arc<FilterMetrics>,
}

impl ArtifactPublisher {
    /// In-memory publisher serving the empty artifact until the first build.
    pub fn new(metrics: Arc<FilterMetrics>) -> Self {
        Self::with_initial(FilterArtifact::empty(), None, metrics)
    }

    /// Publisher persisting to `file`, serving its last-known-good artifact.
    ///
    /// An unreadable or inconsistent filter file is logged and ignored.
    pub fn with_file(file: FilterFile, metrics: Arc<FilterMetrics>) -> Self {
        let initial = match file.load() {
            Ok(Some(artifact)) => {
                info!(
                    version = artifact.version,
                    generation = artifact.generation,
                    records = artifact.record_count,
                    "[ha-02] Serving last-known-good filter from {}",
                    file.path().display()
                );
                artifact
            }
            Ok(None) => {
                info!("[ha-02] No persisted filter at {}", file.path().display());
                FilterArtifact::empty()
            }
            Err(e) => {
                warn!(error = %e, "[ha-02] Ignoring unusable persisted filter");
                FilterArtifact::empty()
            }
        };
        Self::with_initial(initial, Some(file), metrics)
    }

    fn with_initial(
        initial: FilterArtifact,
        file: Option<FilterFile>,
        metrics: Arc<FilterMetrics>,
    ) -> Self {
        metrics.record_published(initial.version, initial.record_count);
        Self {
            current: RwLock::new(Arc::new(initial)),
            publish_lock: Mutex::new(()),
            file,
            metrics,
        }
    }

    /// The artifact currently served.
    pub fn current(&self) -> Arc<FilterArtifact> {
        Arc::clone(&self.current.read())
    }

    pub fn published_generation(&self) -> u64 {
        self.current.read().generation
    }

    pub fn metrics(&self) -> &Arc<FilterMetrics> {
        &self.metrics
    }

    /// Publish `candidate` under the next version.
    ///
    /// Returns `Ok(None)` when the candidate is stale. On a persistence error
    /// the previous artifact stays in place.
    pub fn publish(
        &self,
        candidate: FilterArtifact,
    ) -> Result<Option<Arc<FilterArtifact>>, FilterError> {
        let _ordering = self.publish_lock.lock();
        let current = self.current();

        if current.version > 0 && candidate.generation <= current.generation {
            self.metrics.record_stale();
            debug!(
                candidate = candidate.generation,
                published = current.generation,
                "[ha-02] Discarding stale filter build"
            );
            return Ok(None);
        }

        let artifact = Arc::new(candidate.with_version(current.version + 1));
        if let Some(file) = &self.file {
            file.save(&artifact)?;
        }

        *self.current.write() = Arc::clone(&artifact);
        self.metrics
            .record_published(artifact.version, artifact.record_count);
        Ok(Some(artifact))
    }

    /// Drop a served artifact that does not belong to the store.
    ///
    /// The artifact is kept if it was built from an older generation (the
    /// next rebuild supersedes it) or from exactly the store's contents,
    /// judged by `source_digest`. Anything else, such as a filter file that
    /// outlived its database or one built from a restored backup, is
    /// replaced by the empty artifact so the next rebuild publishes. The
    /// version counter is kept so clients still see it increase.
    pub fn reconcile_with_store(&self, store_generation: u64, source_digest: &str) {
        let _ordering = self.publish_lock.lock();
        let current = self.current();
        if current.version == 0 || current.generation < store_generation {
            return;
        }
        if current.generation == store_generation
            && !current.source_digest.is_empty()
            && current.source_digest == source_digest
        {
            return;
        }

        warn!(
            published = current.generation,
            store = store_generation,
            "[ha-02] Published filter was not built from this store, discarding it"
        );
        let reset = Arc::new(FilterArtifact::empty().with_version(current.version));
        *self.current.write() = reset;
        self.metrics.record_published(current.version, 0);
    }
}
