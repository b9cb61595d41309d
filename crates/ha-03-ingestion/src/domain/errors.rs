//! Ingestion error taxonomy.

use ha_01_epoch_store::StoreError;
use shared_types::ValidationError;
use thiserror::Error;

/// Why a credential was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("No authorization supplied")]
    Missing,

    #[error("Malformed authorization token: {0}")]
    Malformed(String),

    #[error("Authorization token signature is invalid")]
    BadSignature,

    #[error("Authorization token expired at {expired_at}")]
    Expired { expired_at: i64 },

    #[error("Authorization token was already used")]
    AlreadyUsed,

    #[error("Authorization token is in use by a concurrent submission")]
    InUse,
}

/// Outcome classes of a failed `commit_batch`.
///
/// Only `Storage` leaves the credential usable for a retry.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Authorization failed: {0}")]
    Authorization(#[from] AuthError),

    #[error("Storage failed: {0}")]
    Storage(#[from] StoreError),
}

impl IngestError {
    /// Whether resubmitting the identical batch may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, IngestError::Storage(_))
    }
}
