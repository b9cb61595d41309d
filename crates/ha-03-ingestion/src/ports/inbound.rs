//! Inbound Ports (Driving Ports)

use shared_types::ReportBatch;

use crate::domain::{IngestError, IngestReceipt};

/// Write path API used by the transport layer.
pub trait IngestionApi: Send + Sync {
    /// Validate, authorize and atomically commit `batch`.
    ///
    /// On any error nothing from the batch is visible in the store.
    fn commit_batch(&self, batch: ReportBatch) -> Result<IngestReceipt, IngestError>;
}
