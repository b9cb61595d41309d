//! Error types for the contagion filter subsystem

use ha_01_epoch_store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building, encoding or publishing a filter
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Invalid filter parameters: {0}")]
    InvalidParameters(String),

    #[error("Cuckoo filter could not place {records} records within {max_buckets} buckets")]
    CapacityExhausted { records: usize, max_buckets: usize },

    #[error("Snapshot unavailable: {0}")]
    Snapshot(#[from] StoreError),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Malformed filter: {0}")]
    Malformed(String),

    #[error("Filter file {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Filter file {path} does not match its metadata: {reason}")]
    Mismatch { path: PathBuf, reason: String },
}

impl From<bincode::Error> for FilterError {
    fn from(e: bincode::Error) -> Self {
        FilterError::SerializationError(e.to_string())
    }
}
