//! Domain layer for the contagion filter
//!
//! Pure data structures and encoding, no I/O.

pub mod artifact;
pub mod bloom_filter;
pub mod config;
pub mod cuckoo;
pub mod filter;
pub mod hash_functions;
pub mod parameters;

pub use artifact::{ArtifactMeta, FilterArtifact};
pub use bloom_filter::BloomFilter;
pub use config::{FilterConfig, RebuildBackoff};
pub use cuckoo::CuckooFilter;
pub use filter::{ContagionFilter, FilterKind};
pub use parameters::{calculate_fpr, calculate_optimal_parameters, BloomFilterParams};
