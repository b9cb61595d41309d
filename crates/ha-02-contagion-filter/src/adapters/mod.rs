//! Adapters Layer
//!
//! - `builders`: cuckoo and Bloom implementations of `MembershipBuilder`
//! - `persistence`: filter file plus JSON sidecar

pub mod builders;
pub mod persistence;

pub use builders::{builder_for, BloomBuilder, CuckooBuilder};
pub use persistence::FilterFile;
