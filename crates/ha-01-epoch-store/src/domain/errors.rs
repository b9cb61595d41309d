//! # Domain Errors
//!
//! Error types for the epoch seed store.
//!
//! Every variant of [`StoreError`] is a storage failure from the caller's
//! point of view: the transaction was aborted and nothing became visible, so
//! resubmitting the identical batch is safe.

use thiserror::Error;

/// Errors raised by a [`KeyValueStore`](crate::ports::outbound::KeyValueStore)
/// backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KVStoreError {
    /// Underlying file or device failure.
    #[error("I/O error: {message}")]
    IOError { message: String },

    /// Persisted bytes fail their integrity check.
    #[error("Corrupted database file: {message}")]
    Corruption { message: String },
}

impl From<std::io::Error> for KVStoreError {
    fn from(e: std::io::Error) -> Self {
        KVStoreError::IOError {
            message: e.to_string(),
        }
    }
}

/// Errors that can occur during store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Backend write or read failed; the transaction was rolled back.
    #[error("Storage failure: {0}")]
    Storage(#[from] KVStoreError),

    /// A persisted row does not decode to a disclosure record.
    #[error("Malformed row under key {key}: {reason}")]
    MalformedRow { key: String, reason: String },
}
