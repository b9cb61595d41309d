//! # Ingestion Service
//!
//! ## Write Path
//!
//! ```text
//! ReportBatch ──> validate ──> authorize ──> begin ─ add_epoch_seed* ─ commit
//!                    │             │                                   │
//!                  400 (no        401 (no                     ok: consume token,
//!                  side effects)  side effects)                   request rebuild
//!                                                             err: release token, 503
//! ```
//!
//! The token reservation is held by a [`GrantGuard`]; anything that leaves
//! `commit_batch` without consuming it, a panic included, releases it.
//!
//! Concurrent calls serialise on the store's writer lock, so two batches
//! never interleave inside one generation.

use ha_01_epoch_store::EpochSeedStore;
use shared_types::ReportBatch;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::domain::{IngestError, IngestReceipt, IngestionConfig};
use crate::metrics::IngestMetrics;
use crate::ports::{AuthGrant, Authorizer, IngestionApi, RebuildTrigger};

/// Reserved credential, released on drop unless consumed.
struct GrantGuard<'a> {
    authorizer: &'a dyn Authorizer,
    grant: Option<AuthGrant>,
}

impl<'a> GrantGuard<'a> {
    fn new(authorizer: &'a dyn Authorizer, grant: AuthGrant) -> Self {
        Self {
            authorizer,
            grant: Some(grant),
        }
    }

    fn consume(mut self) {
        if let Some(grant) = self.grant.take() {
            self.authorizer.consume(grant);
        }
    }
}

impl Drop for GrantGuard<'_> {
    fn drop(&mut self) {
        if let Some(grant) = self.grant.take() {
            self.authorizer.release(grant);
        }
    }
}

/// Accepts contagious disclosure batches.
pub struct IngestionService {
    store: Arc<EpochSeedStore>,
    authorizer: Arc<dyn Authorizer>,
    rebuild: Arc<dyn RebuildTrigger>,
    config: IngestionConfig,
    metrics: Arc<IngestMetrics>,
}

impl IngestionService {
    pub fn new(
        store: Arc<EpochSeedStore>,
        authorizer: Arc<dyn Authorizer>,
        rebuild: Arc<dyn RebuildTrigger>,
        config: IngestionConfig,
    ) -> Self {
        Self {
            store,
            authorizer,
            rebuild,
            config,
            metrics: Arc::new(IngestMetrics::new()),
        }
    }

    pub fn metrics(&self) -> &Arc<IngestMetrics> {
        &self.metrics
    }

    pub fn config(&self) -> &IngestionConfig {
        &self.config
    }

    /// Validate, authorize and atomically commit `batch`.
    pub fn commit_batch(&self, batch: ReportBatch) -> Result<IngestReceipt, IngestError> {
        if let Err(e) = batch.validate(self.config.max_batch_records) {
            self.metrics.record_validation_failure();
            warn!(error = %e, "[ha-03] Rejected invalid batch");
            return Err(e.into());
        }

        let grant = match self.authorizer.authorize(&batch.authorization) {
            Ok(grant) => GrantGuard::new(self.authorizer.as_ref(), grant),
            Err(e) => {
                self.metrics.record_authorization_failure();
                warn!(error = %e, records = batch.len(), "[ha-03] Rejected unauthorized batch");
                return Err(e.into());
            }
        };

        let records = batch.len();
        let mut tx = self.store.begin();
        for record in &batch.records {
            tx.add_record(record);
        }

        match tx.commit() {
            Ok(generation) => {
                grant.consume();
                self.metrics.record_accepted(records);
                info!(records, generation, "[ha-03] Committed contagious batch");
                self.rebuild.request_rebuild(generation);
                Ok(IngestReceipt {
                    records,
                    generation,
                })
            }
            Err(e) => {
                drop(grant);
                self.metrics.record_storage_failure();
                error!(error = %e, records, "[ha-03] Batch commit failed, nothing stored");
                Err(e.into())
            }
        }
    }
}

impl IngestionApi for IngestionService {
    fn commit_batch(&self, batch: ReportBatch) -> Result<IngestReceipt, IngestError> {
        IngestionService::commit_batch(self, batch)
    }
}
