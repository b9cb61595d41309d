//! # Inbound Ports (Driving Ports)
//!
//! The read side of the store, as consumed by the filter builder.

use crate::domain::errors::StoreError;
use crate::domain::snapshot::RecordSnapshot;

/// Source of point-in-time record snapshots.
pub trait SnapshotSource: Send + Sync {
    /// All disclosure records as of the call.
    fn iterate_all(&self) -> Result<RecordSnapshot, StoreError>;

    /// Generation of the latest commit.
    fn generation(&self) -> u64;
}
