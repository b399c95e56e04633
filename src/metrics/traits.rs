//! # Metrics Trait Hierarchy
//!
//! ```text
//!   ┌─────────────────────────────┐
//!   │     CoreMetricsRecorder     │   lookups, inserts, evictions, clear
//!   └──────────────┬──────────────┘
//!                  │
//!                  ▼
//!   ┌─────────────────────────────┐
//!   │ RefCacheMetricsRecorder     │   use/unuse transitions, factory,
//!   │                             │   erase outcomes
//!   └─────────────────────────────┘
//!
//!   Consumption (decoupled from recording):
//!   ┌──────────────────────────────┐    ┌──────────────────────────────┐
//!   │ MetricsSnapshotProvider<S>   │    │ MetricsExporter<S>           │
//!   │ (bench/test)                 │    │ (production monitoring)      │
//!   └──────────────────────────────┘    └──────────────────────────────┘
//! ```
//!
//! Recorders take `&self`: the cache records from many threads at once, so
//! implementations use atomics rather than `&mut` counters.

/// Counters shared by any cache.
pub trait CoreMetricsRecorder {
    fn record_get_hit(&self);
    fn record_get_miss(&self);
    fn record_insert_new(&self);
    fn record_insert_existing(&self);
    fn record_evicted_entry(&self);
    fn record_clear(&self, removed: usize);
}

/// Signals specific to handle-driven caches.
pub trait RefCacheMetricsRecorder: CoreMetricsRecorder {
    fn record_use(&self);
    fn record_unuse(&self);
    fn record_stale_pop(&self);
    fn record_factory_call(&self);
    fn record_factory_failure(&self);
    fn record_erase(&self);
    fn record_erase_in_use(&self);
}

/// Snapshot provider for bench/testing.
pub trait MetricsSnapshotProvider<S> {
    fn snapshot(&self) -> S;
}

/// Reset metrics between tests or benchmark iterations.
pub trait MetricsReset {
    fn reset_metrics(&self);
}

/// Export/publish metrics to production monitoring backends.
pub trait MetricsExporter<S> {
    fn export(&self, snapshot: &S);
}
