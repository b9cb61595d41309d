//! # Error Types
//!
//! Shape errors shared by every layer that turns reporter input into records.

use thiserror::Error;

/// Malformed batch or record shape.
///
/// Always raised before any store access and never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A batch must carry at least one record.
    #[error("Batch contains no records")]
    EmptyBatch,

    /// Batch exceeds the configured record limit.
    #[error("Too many records in batch: {count} > {max}")]
    TooManyRecords { count: usize, max: usize },

    /// Epoch is negative or does not fit the protocol's epoch counter.
    #[error("Epoch out of range: {value}")]
    EpochOutOfRange { value: i64 },

    /// Seed is not valid hex.
    #[error("Seed is not valid hex: {reason}")]
    SeedEncoding { reason: String },

    /// Seed does not have the protocol width.
    #[error("Seed has {actual} bytes, expected {expected}")]
    SeedLength { expected: usize, actual: usize },

    /// Instant predates the Unix epoch.
    #[error("Timestamp before 1970-01-01: {timestamp}")]
    TimestampBeforeEpoch { timestamp: i64 },

    /// Record at a given batch position failed validation.
    #[error("Record {index}: {source}")]
    Record {
        index: usize,
        #[source]
        source: Box<ValidationError>,
    },
}

impl ValidationError {
    /// Attach the position of the offending record.
    pub fn at_record(self, index: usize) -> Self {
        ValidationError::Record {
            index,
            source: Box::new(self),
        }
    }
}
