//! Counters and exporters for cache observability (feature `metrics`).
//!
//! Recording, snapshotting and export are split the same way as the traits
//! in [`traits`]: the cache only ever calls the recorder; tests and benches
//! read snapshots; production code hands snapshots to an exporter.

pub mod exporter;
pub mod metrics_impl;
pub mod snapshot;
pub mod traits;
