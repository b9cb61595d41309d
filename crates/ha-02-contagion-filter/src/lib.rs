//! # HA-02 Contagion Filter
//!
//! Derives the compact membership structure that clients download from the
//! disclosed (epoch, seed) records, and keeps a versioned copy published.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure data structures, no I/O
//!   - `CuckooFilter`: default structure, deterministic
//!   - `BloomFilter`: alternative sized for a target FPR
//!   - `ContagionFilter`: tagged, bincode-encoded union of the two
//!   - `FilterArtifact`: versioned, digested publication unit
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `RebuildTrigger`: driving port used by ingestion
//!   - `MembershipBuilder`, `SnapshotSource`: driven ports
//!
//! - **Adapters Layer** (`adapters/`): Builder implementations, filter file
//!
//! - **Service Layer** (`service/`): `FilterBuilder`, `ArtifactPublisher`,
//!   `RebuildScheduler`
//!
//! ## Invariants
//!
//! - No false negatives: every record committed at or before an artifact's
//!   generation is in its filter.
//! - Published versions strictly increase; generations never regress.
//! - The same snapshot always encodes to the same bytes.
//!
//! ## Filter Key
//!
//! The filter holds `SHA-256(ephid ‖ epoch_le32)` where
//! `ephid = SHA-256(seed)[..16]`; a client probes with the identifier it
//! observed during that epoch.
//!
//! ## Usage Example
//!
//! ```ignore
//! use ha_02_contagion_filter::{
//!     builder_for, ArtifactPublisher, FilterBuilder, FilterConfig, FilterMetrics, RebuildScheduler,
//! };
//!
//! let publisher = Arc::new(ArtifactPublisher::new(Arc::new(FilterMetrics::new())));
//! let builder = Arc::new(FilterBuilder::new(store, builder_for(&config), publisher));
//! let scheduler = RebuildScheduler::spawn(builder, config.retry.clone());
//! scheduler.request(generation);
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-exports for convenience
pub use adapters::{builder_for, BloomBuilder, CuckooBuilder, FilterFile};
pub use domain::{
    ArtifactMeta, BloomFilter, ContagionFilter, CuckooFilter, FilterArtifact, FilterConfig,
    FilterKind, RebuildBackoff,
};
pub use error::FilterError;
pub use metrics::{FilterMetrics, FilterMetricsSnapshot};
pub use ports::{MembershipBuilder, RebuildTrigger, SnapshotSource};
pub use service::{source_digest, ArtifactPublisher, FilterBuilder, RebuildScheduler};
