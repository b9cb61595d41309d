//! # HA-04 Distribution
//!
//! Read side of the health authority: hands out the currently published
//! contagion filter and the protocol version.
//!
//! Reads never touch the store and never wait for a rebuild; they clone the
//! artifact `Arc` that ha-02 last swapped in.
//!
//! ## Crate Structure
//!
//! - `ports/` - `DistributionApi` (inbound), `ArtifactSource` (outbound)
//! - `service.rs` - `DistributionService`, `DistributionMetrics`

pub mod ports;
pub mod service;

pub use ports::{ArtifactSource, DistributionApi};
pub use service::{DistributionMetrics, DistributionMetricsSnapshot, DistributionService};
