//! # Epoch Seed Store Service
//!
//! Transactional facade over a [`KeyValueStore`].
//!
//! ## Write path
//!
//! ```text
//! begin() ── takes writer lock ──> StoreTransaction
//!     add_epoch_seed() ...          (staged, invisible)
//!     commit() ── one atomic_batch_write ──> backend
//!              └─ swap committed snapshot ──> readers
//! drop without commit ──> staged records discarded
//! ```
//!
//! Readers only ever clone the committed snapshot `Arc`, so they never wait
//! on a writer for longer than the pointer swap.

use parking_lot::{Mutex, MutexGuard, RwLock};
use shared_types::{DisclosureRecord, Epoch, Seed};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::adapters::storage::InMemoryKVStore;
use crate::domain::errors::StoreError;
use crate::domain::keys::{
    decode_generation, decode_seed_row, encode_generation, seed_key, GENERATION_KEY, SEED_PREFIX,
};
use crate::domain::snapshot::{RecordSnapshot, Table};
use crate::ports::inbound::SnapshotSource;
use crate::ports::outbound::{BatchOperation, KeyValueStore};

/// Durable, epoch-ordered store of disclosure records.
pub struct EpochSeedStore {
    /// Backend, doubling as the single-writer lock.
    backend: Mutex<Box<dyn KeyValueStore>>,
    /// Latest committed contents.
    committed: RwLock<RecordSnapshot>,
}

impl EpochSeedStore {
    /// Open a store over `backend`, loading every persisted record.
    pub fn open<S: KeyValueStore + 'static>(backend: S) -> Result<Self, StoreError> {
        let mut table = Table::new();
        for (key, value) in backend.prefix_scan(SEED_PREFIX)? {
            table.insert(decode_seed_row(&key, &value)?);
        }

        let generation = match backend.get(GENERATION_KEY)? {
            Some(value) => decode_generation(&value)?,
            None => 0,
        };

        info!(
            records = table.len(),
            generation, "[ha-01] Epoch seed store opened"
        );

        Ok(Self {
            backend: Mutex::new(Box::new(backend)),
            committed: RwLock::new(RecordSnapshot::new(Arc::new(table), generation)),
        })
    }

    /// Empty store over an [`InMemoryKVStore`].
    pub fn in_memory() -> Self {
        Self {
            backend: Mutex::new(Box::new(InMemoryKVStore::new())),
            committed: RwLock::new(RecordSnapshot::default()),
        }
    }

    /// Open a transaction.
    ///
    /// Blocks until any other open transaction has committed or been dropped.
    pub fn begin(&self) -> StoreTransaction<'_> {
        StoreTransaction {
            store: self,
            backend: self.backend.lock(),
            staged: BTreeSet::new(),
            finished: false,
        }
    }

    /// Snapshot of all records as of this call.
    pub fn iterate_all(&self) -> RecordSnapshot {
        self.committed.read().clone()
    }

    /// Generation of the latest commit (0 before the first).
    pub fn generation(&self) -> u64 {
        self.committed.read().generation()
    }

    pub fn len(&self) -> usize {
        self.committed.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SnapshotSource for EpochSeedStore {
    fn iterate_all(&self) -> Result<RecordSnapshot, StoreError> {
        Ok(EpochSeedStore::iterate_all(self))
    }

    fn generation(&self) -> u64 {
        EpochSeedStore::generation(self)
    }
}

/// Scoped write transaction.
///
/// Staged records are invisible to readers until [`commit`](Self::commit).
/// Dropping the transaction without committing rolls it back.
pub struct StoreTransaction<'a> {
    store: &'a EpochSeedStore,
    backend: MutexGuard<'a, Box<dyn KeyValueStore>>,
    staged: BTreeSet<DisclosureRecord>,
    finished: bool,
}

impl StoreTransaction<'_> {
    /// Stage the pair `(epoch, seed)`.
    ///
    /// Other seeds already held for `epoch` are kept; re-adding an identical
    /// pair is a no-op.
    pub fn add_epoch_seed(&mut self, epoch: Epoch, seed: Seed) {
        self.add_record(&DisclosureRecord::new(epoch, seed));
    }

    pub fn add_record(&mut self, record: &DisclosureRecord) {
        self.staged.insert(*record);
    }

    /// Number of distinct pairs staged so far.
    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Atomically publish every staged record.
    ///
    /// Returns the new generation. On error nothing was written and the
    /// committed contents are unchanged.
    pub fn commit(mut self) -> Result<u64, StoreError> {
        self.finished = true;
        let staged = std::mem::take(&mut self.staged);
        let current = self.store.committed.read().clone();

        if staged.is_empty() {
            return Ok(current.generation());
        }

        let generation = current.generation() + 1;
        let mut operations: Vec<BatchOperation> = staged
            .iter()
            .map(|record| BatchOperation::put(seed_key(record), Vec::new()))
            .collect();
        operations.push(BatchOperation::put(
            GENERATION_KEY.to_vec(),
            encode_generation(generation),
        ));

        if let Err(e) = self.backend.atomic_batch_write(operations) {
            warn!(
                records = staged.len(),
                error = %e,
                "[ha-01] Commit failed, transaction rolled back"
            );
            return Err(e.into());
        }

        let mut table = current.table().as_ref().clone();
        let written = staged.len();
        table.extend(staged);
        *self.store.committed.write() = RecordSnapshot::new(Arc::new(table), generation);

        debug!(records = written, generation, "[ha-01] Transaction committed");
        Ok(generation)
    }

    /// Discard every staged record.
    pub fn rollback(self) {}
}

impl Drop for StoreTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished && !self.staged.is_empty() {
            debug!(
                records = self.staged.len(),
                "[ha-01] Transaction dropped without commit, rolled back"
            );
        }
    }
}
