//! # Adapters Module
//!
//! ## Modules
//!
//! - `storage`: `KeyValueStore` implementations
//! - `lock`: Database process locking (singleton guard)

#[cfg(feature = "locking")]
pub mod lock;
pub mod storage;
