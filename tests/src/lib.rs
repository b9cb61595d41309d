//! # Epidose Health Authority Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs        # Wired pipelines shared by the scenarios
//! └── integration/
//!     ├── flows.rs       # ingest → rebuild → distribute, across crates
//!     ├── http.rs        # the same flows through the HTTP router
//!     └── client.rs      # client-side matching against downloaded filters
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ha-tests
//! cargo bench -p ha-tests
//! ```

pub mod fixtures;
pub mod integration;
