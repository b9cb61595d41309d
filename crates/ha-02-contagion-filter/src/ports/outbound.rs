//! Outbound Ports (Driven Ports)
//!
//! - `SnapshotSource`: the epoch seed store (ha-01)
//! - `MembershipBuilder`: filter construction strategy

pub use ha_01_epoch_store::SnapshotSource;
use ha_01_epoch_store::RecordSnapshot;

use crate::domain::{ContagionFilter, FilterKind};
use crate::error::FilterError;

/// Builds a membership structure holding the filter key of every record.
///
/// Implementations must be deterministic: the same snapshot always yields
/// the same filter, so the encoded bytes are reproducible.
pub trait MembershipBuilder: Send + Sync {
    fn kind(&self) -> FilterKind;

    fn build(&self, snapshot: &RecordSnapshot) -> Result<ContagionFilter, FilterError>;
}
