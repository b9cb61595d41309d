//! # Epoch Seed Store (ha-01)
//!
//! The authoritative persistence layer for disclosed (epoch, seed) records.
//! Every other artifact of the health authority, the contagion filter
//! included, is derived from what this store holds.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Atomic Batches | A transaction's records become visible together or not at all |
//! | 2 | Rollback on Drop | A transaction dropped without `commit` leaves no trace |
//! | 3 | Idempotent Writes | Records are an (epoch, seed) set: re-adding a pair is a no-op, seeds sharing an epoch all stay |
//! | 4 | Snapshot Reads | `iterate_all` never observes commits made after the call |
//! | 5 | Single Writer | Transactions are serialised by the store's writer lock |
//! | 6 | Monotonic Generation | Every commit advances the generation by one |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Errors, key encoding and the record snapshot
//! - `ports/` - `SnapshotSource` (inbound) and `KeyValueStore` (outbound)
//! - `adapters/` - In-memory and single-file key-value stores, process lock
//! - `service.rs` - `EpochSeedStore` and its `StoreTransaction`
//!
//! ## Usage
//!
//! ```ignore
//! use ha_01_epoch_store::{EpochSeedStore, FileBackedKVStore};
//!
//! let store = EpochSeedStore::open(FileBackedKVStore::open("server-database.db")?)?;
//!
//! let mut tx = store.begin();
//! tx.add_epoch_seed(Epoch(100), seed);
//! let generation = tx.commit()?;
//!
//! for record in store.iterate_all().iter() {
//!     // ...
//! }
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use adapters::storage::{FileBackedKVStore, InMemoryKVStore};
#[cfg(feature = "locking")]
pub use adapters::lock::{DatabaseLock, LockError};
pub use domain::errors::{KVStoreError, StoreError};
pub use domain::snapshot::RecordSnapshot;
pub use ports::inbound::SnapshotSource;
pub use ports::outbound::{BatchOperation, KeyValueStore};
pub use service::{EpochSeedStore, StoreTransaction};
