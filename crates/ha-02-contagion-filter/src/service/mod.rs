//! Service Layer
//!
//! - `FilterBuilder`: snapshot, build, publish
//! - `ArtifactPublisher`: versioned atomic swap
//! - `RebuildScheduler`: coalescing background worker

pub mod builder;
pub mod publisher;
pub mod scheduler;

pub use builder::{source_digest, FilterBuilder};
pub use publisher::ArtifactPublisher;
pub use scheduler::RebuildScheduler;
