//! Ingestion counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct IngestMetrics {
    pub batches_accepted: AtomicU64,
    pub records_accepted: AtomicU64,
    pub rejected_validation: AtomicU64,
    pub rejected_authorization: AtomicU64,
    pub failed_storage: AtomicU64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IngestMetricsSnapshot {
    pub batches_accepted: u64,
    pub records_accepted: u64,
    pub rejected_validation: u64,
    pub rejected_authorization: u64,
    pub failed_storage: u64,
}

impl IngestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_accepted(&self, records: usize) {
        self.batches_accepted.fetch_add(1, Ordering::Relaxed);
        self.records_accepted
            .fetch_add(records as u64, Ordering::Relaxed);
    }

    pub fn record_validation_failure(&self) {
        self.rejected_validation.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_authorization_failure(&self) {
        self.rejected_authorization.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_storage_failure(&self) {
        self.failed_storage.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> IngestMetricsSnapshot {
        IngestMetricsSnapshot {
            batches_accepted: self.batches_accepted.load(Ordering::Relaxed),
            records_accepted: self.records_accepted.load(Ordering::Relaxed),
            rejected_validation: self.rejected_validation.load(Ordering::Relaxed),
            rejected_authorization: self.rejected_authorization.load(Ordering::Relaxed),
            failed_storage: self.failed_storage.load(Ordering::Relaxed),
        }
    }
}
