/// Point-in-time copy of a cache's counters and gauges.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefCacheMetricsSnapshot {
    pub get_calls: u64,
    pub get_hits: u64,
    pub get_misses: u64,

    pub insert_new: u64,
    pub insert_existing: u64,
    pub factory_calls: u64,
    pub factory_failures: u64,

    pub use_transitions: u64,
    pub unuse_transitions: u64,

    pub evicted_entries: u64,
    pub stale_pops: u64, // popped keys whose entry had been picked up again

    pub erases: u64,
    pub erase_in_use: u64,
    pub clear_calls: u64,
    pub cleared_entries: u64,

    // gauges captured at snapshot time
    pub cache_len: usize,
    pub unused_len: usize,
    pub max_unused: usize,
}

impl RefCacheMetricsSnapshot {
    /// Fraction of lookups that found an entry, or `0.0` before any lookup.
    pub fn hit_rate(&self) -> f64 {
        if self.get_calls == 0 {
            0.0
        } else {
            self.get_hits as f64 / self.get_calls as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_handles_zero_calls() {
        assert_eq!(RefCacheMetricsSnapshot::default().hit_rate(), 0.0);
    }

    #[test]
    fn hit_rate_divides_hits_by_calls() {
        let snapshot = RefCacheMetricsSnapshot {
            get_calls: 4,
            get_hits: 3,
            get_misses: 1,
            ..Default::default()
        };
        assert!((snapshot.hit_rate() - 0.75).abs() < f64::EPSILON);
    }
}
