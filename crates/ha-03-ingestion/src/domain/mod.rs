//! Domain layer for ingestion

pub mod errors;

use serde::{Deserialize, Serialize};
use shared_types::DEFAULT_MAX_BATCH_RECORDS;

pub use errors::{AuthError, IngestError};

/// Acknowledgement of a committed batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReceipt {
    /// Records submitted in the batch
    pub records: usize,
    /// Store generation the batch was committed as
    pub generation: u64,
}

/// Ingestion limits
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IngestionConfig {
    pub max_batch_records: usize,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            max_batch_records: DEFAULT_MAX_BATCH_RECORDS,
        }
    }
}
