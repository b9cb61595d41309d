//! # Client Epoch State
//!
//! Client side bookkeeping of when the broadcast ephemeral identifier last
//! rotated. The server never writes it; it is defined here because the
//! client derives its current epoch with [`epoch_for`](crate::protocol::epoch_for)
//! from the same clock the server's filter keys use.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::entities::Epoch;
use crate::errors::ValidationError;
use crate::protocol::epoch_for;

/// Client database holding the last ephemeral identifier change.
pub trait ClientEpochStore: Send + Sync {
    /// Instant of the last rotation; 1970-01-01T00:00:00Z before the first.
    fn last_ephid_change(&self) -> DateTime<Utc>;

    /// Record a rotation.
    fn record_ephid_change(&self, at: DateTime<Utc>);

    /// Whether `now` falls in a later epoch than the last rotation.
    fn needs_rotation(&self, now: DateTime<Utc>) -> Result<bool, ValidationError> {
        let current: Epoch = epoch_for(now)?;
        Ok(current > epoch_for(self.last_ephid_change())?)
    }
}

/// In-memory client epoch store.
#[derive(Debug)]
pub struct InMemoryClientEpochStore {
    last_change: RwLock<DateTime<Utc>>,
}

impl InMemoryClientEpochStore {
    pub fn new() -> Self {
        Self {
            last_change: RwLock::new(DateTime::<Utc>::UNIX_EPOCH),
        }
    }
}

impl Default for InMemoryClientEpochStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientEpochStore for InMemoryClientEpochStore {
    fn last_ephid_change(&self) -> DateTime<Utc> {
        *self.last_change.read()
    }

    fn record_ephid_change(&self, at: DateTime<Utc>) {
        *self.last_change.write() = at;
    }
}
