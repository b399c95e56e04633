use std::sync::atomic::{AtomicU64, Ordering};

use crate::metrics::snapshot::RefCacheMetricsSnapshot;
use crate::metrics::traits::{CoreMetricsRecorder, MetricsReset, RefCacheMetricsRecorder};

/// Atomic counters recorded by [`RefCache`](crate::RefCache).
///
/// Every counter uses `Relaxed` ordering: the values are observational and
/// never feed back into cache decisions.
#[derive(Debug, Default)]
pub struct RefCacheMetrics {
    get_hits: AtomicU64,
    get_misses: AtomicU64,
    insert_new: AtomicU64,
    insert_existing: AtomicU64,
    factory_calls: AtomicU64,
    factory_failures: AtomicU64,
    use_transitions: AtomicU64,
    unuse_transitions: AtomicU64,
    evicted_entries: AtomicU64,
    stale_pops: AtomicU64,
    erases: AtomicU64,
    erase_in_use: AtomicU64,
    clear_calls: AtomicU64,
    cleared_entries: AtomicU64,
}

impl RefCacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies the counters. Gauges are left at zero for the cache to fill.
    pub fn counters(&self) -> RefCacheMetricsSnapshot {
        let get_hits = self.get_hits.load(Ordering::Relaxed);
        let get_misses = self.get_misses.load(Ordering::Relaxed);
        RefCacheMetricsSnapshot {
            get_calls: get_hits + get_misses,
            get_hits,
            get_misses,
            insert_new: self.insert_new.load(Ordering::Relaxed),
            insert_existing: self.insert_existing.load(Ordering::Relaxed),
            factory_calls: self.factory_calls.load(Ordering::Relaxed),
            factory_failures: self.factory_failures.load(Ordering::Relaxed),
            use_transitions: self.use_transitions.load(Ordering::Relaxed),
            unuse_transitions: self.unuse_transitions.load(Ordering::Relaxed),
            evicted_entries: self.evicted_entries.load(Ordering::Relaxed),
            stale_pops: self.stale_pops.load(Ordering::Relaxed),
            erases: self.erases.load(Ordering::Relaxed),
            erase_in_use: self.erase_in_use.load(Ordering::Relaxed),
            clear_calls: self.clear_calls.load(Ordering::Relaxed),
            cleared_entries: self.cleared_entries.load(Ordering::Relaxed),
            ..RefCacheMetricsSnapshot::default()
        }
    }

    #[inline]
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl CoreMetricsRecorder for RefCacheMetrics {
    fn record_get_hit(&self) {
        Self::bump(&self.get_hits);
    }

    fn record_get_miss(&self) {
        Self::bump(&self.get_misses);
    }

    fn record_insert_new(&self) {
        Self::bump(&self.insert_new);
    }

    fn record_insert_existing(&self) {
        Self::bump(&self.insert_existing);
    }

    fn record_evicted_entry(&self) {
        Self::bump(&self.evicted_entries);
    }

    fn record_clear(&self, removed: usize) {
        Self::bump(&self.clear_calls);
        self.cleared_entries
            .fetch_add(removed as u64, Ordering::Relaxed);
    }
}

impl RefCacheMetricsRecorder for RefCacheMetrics {
    fn record_use(&self) {
        Self::bump(&self.use_transitions);
    }

    fn record_unuse(&self) {
        Self::bump(&self.unuse_transitions);
    }

    fn record_stale_pop(&self) {
        Self::bump(&self.stale_pops);
    }

    fn record_factory_call(&self) {
        Self::bump(&self.factory_calls);
    }

    fn record_factory_failure(&self) {
        Self::bump(&self.factory_failures);
    }

    fn record_erase(&self) {
        Self::bump(&self.erases);
    }

    fn record_erase_in_use(&self) {
        Self::bump(&self.erase_in_use);
    }
}

impl MetricsReset for RefCacheMetrics {
    fn reset_metrics(&self) {
        for counter in [
            &self.get_hits,
            &self.get_misses,
            &self.insert_new,
            &self.insert_existing,
            &self.factory_calls,
            &self.factory_failures,
            &self.use_transitions,
            &self.unuse_transitions,
            &self.evicted_entries,
            &self.stale_pops,
            &self.erases,
            &self.erase_in_use,
            &self.clear_calls,
            &self.cleared_entries,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
