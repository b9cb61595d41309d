//! Filter Builder Service
//!
//! Orchestrates snapshot → build → encode → publish.

use ha_01_epoch_store::RecordSnapshot;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::domain::FilterArtifact;
use crate::error::FilterError;
use crate::metrics::FilterMetrics;
use crate::ports::{MembershipBuilder, SnapshotSource};
#[cfg(any(test, feature = "test-utils"))]
use crate::ports::RebuildTrigger;
use crate::service::publisher::ArtifactPublisher;

/// Derives the published filter from the epoch seed store.
pub struct FilterBuilder {
    source: Arc<dyn SnapshotSource>,
    membership: Arc<dyn MembershipBuilder>,
    publisher: Arc<ArtifactPublisher>,
}

impl FilterBuilder {
    /// Wire a builder. A served artifact that was not built from what
    /// `source` holds is discarded here.
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        membership: Arc<dyn MembershipBuilder>,
        publisher: Arc<ArtifactPublisher>,
    ) -> Self {
        match source.iterate_all() {
            Ok(snapshot) => {
                publisher.reconcile_with_store(snapshot.generation(), &source_digest(&snapshot))
            }
            Err(e) => {
                warn!(error = %e, "[ha-02] Cannot read the store to check the served filter");
                publisher.reconcile_with_store(source.generation(), "");
            }
        }
        Self {
            source,
            membership,
            publisher,
        }
    }

    pub fn publisher(&self) -> &Arc<ArtifactPublisher> {
        &self.publisher
    }

    pub fn metrics(&self) -> &Arc<FilterMetrics> {
        self.publisher.metrics()
    }

    /// Whether the served filter predates `generation`.
    pub fn needs_rebuild(&self, generation: u64) -> bool {
        self.publisher.published_generation() < generation
    }

    /// Build an unpublished artifact from `snapshot`.
    ///
    /// Equal snapshots give byte-identical artifacts.
    pub fn build_artifact(&self, snapshot: &RecordSnapshot) -> Result<FilterArtifact, FilterError> {
        let filter = self.membership.build(snapshot)?;
        let bytes = filter.encode()?;
        Ok(FilterArtifact::new(
            bytes,
            snapshot.generation(),
            snapshot.len() as u64,
            self.membership.kind(),
        )
        .with_source_digest(source_digest(snapshot)))
    }

    /// Rebuild from the current store contents and publish.
    ///
    /// Safe to call concurrently. Returns the artifact served afterwards,
    /// which is a newer build when this one turned out stale.
    pub fn rebuild(&self) -> Result<Arc<FilterArtifact>, FilterError> {
        let start = Instant::now();
        let result = self.try_rebuild(start);
        if let Err(e) = &result {
            self.metrics().record_failure();
            warn!(error = %e, "[ha-02] Filter rebuild failed");
        }
        result
    }

    fn try_rebuild(&self, start: Instant) -> Result<Arc<FilterArtifact>, FilterError> {
        let snapshot = self.source.iterate_all()?;
        let candidate = self.build_artifact(&snapshot)?;

        match self.publisher.publish(candidate)? {
            Some(artifact) => {
                let elapsed = start.elapsed();
                self.metrics().record_rebuild(elapsed);
                info!(
                    version = artifact.version,
                    generation = artifact.generation,
                    records = artifact.record_count,
                    bytes = artifact.len(),
                    kind = %artifact.kind,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "[ha-02] Published contagion filter"
                );
                Ok(artifact)
            }
            None => Ok(self.publisher.current()),
        }
    }
}

/// Hex SHA-256 over every record of `snapshot`, in snapshot order.
pub fn source_digest(snapshot: &RecordSnapshot) -> String {
    let mut hasher = Sha256::new();
    for record in snapshot.iter() {
        hasher.update(record.epoch.as_u32().to_le_bytes());
        hasher.update(record.seed.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Inline rebuild on the caller's thread.
///
/// A failed rebuild is not retried, so servers wire a `RebuildScheduler`
/// instead; this trigger only exists for deterministic tests.
#[cfg(any(test, feature = "test-utils"))]
impl RebuildTrigger for FilterBuilder {
    fn request_rebuild(&self, generation: u64) {
        if self.needs_rebuild(generation) {
            // Failure is logged and counted by `rebuild`
            let _ = self.rebuild();
        }
    }
}
