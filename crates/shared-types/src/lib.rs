//! # Shared Types Crate
//!
//! This crate contains the domain entities every health authority subsystem
//! agrees on: disclosure records, report batches, the epoch clock and the
//! derivation of filter keys from seeds.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: the seed width, epoch length and filter key
//!   derivation are defined once, here. The server builds its filter with
//!   exactly the derivation clients use to test their observations.
//! - **Validated at the edge**: a [`ReportBatch`] can only be built from
//!   records whose shape has already been checked, so the ingestion path never
//!   sees a malformed seed.
//! - **Client contract**: [`client::ClientEpochStore`] documents the client's
//!   bookkeeping that depends on the server's epoch numbering.

pub mod client;
pub mod entities;
pub mod errors;
pub mod protocol;
pub mod wire;

pub use client::{ClientEpochStore, InMemoryClientEpochStore};
pub use entities::*;
pub use errors::*;
pub use protocol::*;
pub use wire::{ContagiousReport, WireRecord};
