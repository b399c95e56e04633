// ==============================================
// REFCACHE BEHAVIOR TESTS (integration)
// ==============================================
//
// Single-threaded scenarios exercised through the public API only: use
// pinning, release-order eviction, erase guard and clear semantics.

use refcache::prelude::*;

// ==============================================
// Use Pins
// ==============================================

mod use_pins {
    use super::*;

    #[test]
    fn held_key_survives_any_number_of_inserts() {
        let cache: RefCache<u64, u64> = RefCache::new(4);
        let pinned = cache.emplace(0, 0).0;

        for key in 1..=100 {
            cache.emplace(key, key);
        }

        assert!(cache.contains(&0));
        assert_eq!(*pinned, 0);
        assert_eq!(cache.unused_len(), 4);
        assert_eq!(cache.check_invariants(), Ok(()));
    }

    #[test]
    fn released_key_joins_back_of_queue() {
        let cache: RefCache<u64, u64> = RefCache::new(4);
        let pinned = cache.emplace(0, 0).0;
        for key in 1..=4 {
            cache.emplace(key, key);
        }
        assert!(cache.contains(&0));

        // Releasing 0 overflows the queue, so the oldest unused key goes.
        drop(pinned);
        assert_eq!(cache.unused_keys(), vec![2, 3, 4, 0]);
        assert!(!cache.contains(&1));
        assert!(cache.contains(&0));

        for key in 5..=8 {
            cache.emplace(key, key);
        }
        assert!(!cache.contains(&0));
        assert_eq!(cache.check_invariants(), Ok(()));
    }

    #[test]
    fn held_entries_do_not_count_against_capacity() {
        let cache: RefCache<u64, u64> = RefCache::new(2);
        let held: Vec<_> = (0..50).map(|key| cache.emplace(key, key).0).collect();

        assert_eq!(cache.len(), 50);
        assert_eq!(cache.unused_len(), 0);

        drop(held);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.unused_keys(), vec![48, 49]);
        assert_eq!(cache.check_invariants(), Ok(()));
    }
}

// ==============================================
// FIFO Eviction Among Unused Entries
// ==============================================

mod fifo_eviction {
    use super::*;

    #[test]
    fn evicts_in_release_order_regardless_of_insert_order() {
        let cache: RefCache<&str, u32> = RefCache::new(2);
        let handles: Vec<_> = ["a", "b", "c", "d"]
            .into_iter()
            .map(|key| cache.emplace(key, 0).0)
            .collect();

        // Release in reverse insertion order: d, c, b, a.
        for handle in handles.into_iter().rev() {
            drop(handle);
        }

        assert!(!cache.contains(&"d"));
        assert!(!cache.contains(&"c"));
        assert_eq!(cache.unused_keys(), vec!["b", "a"]);
    }

    #[test]
    fn reading_through_live_handle_does_not_refresh_position() {
        let cache: RefCache<u32, u32> = RefCache::new(2);
        let first = cache.emplace(1, 1).0;
        cache.emplace(2, 2);

        // Repeated reads while held change nothing; the release time does.
        for _ in 0..10 {
            assert_eq!(*first, 1);
        }
        cache.emplace(3, 3);
        drop(first);

        assert_eq!(cache.unused_keys(), vec![3, 1]);
        assert!(!cache.contains(&2));
    }

    #[test]
    fn refilling_evicts_late_entry_oldest_first() {
        let cache: RefCache<i32, String> = RefCache::new(10);
        for key in 0..10 {
            cache.emplace(key, "test".to_string());
        }
        cache.emplace(-1, "late".to_string());
        assert!(cache.contains(&-1));

        for key in 0..10 {
            cache.emplace(key, "test".to_string());
        }
        assert!(!cache.contains(&-1));
        assert_eq!(cache.at(&-1), Err(NotFound));
        assert_eq!(cache.check_invariants(), Ok(()));
    }
}

// ==============================================
// Erase Guard
// ==============================================

mod erase_guard {
    use super::*;

    #[test]
    fn erase_fails_while_any_clone_is_alive() {
        let cache: RefCache<u32, String> = RefCache::new(4);
        let a = cache.emplace(1, "x".to_string()).0;
        let b = a.clone();

        drop(a);
        assert_eq!(cache.erase(&1), Err(InUse));
        drop(b);
        assert_eq!(cache.erase(&1), Ok(true));
        assert!(!cache.contains(&1));
        assert_eq!(cache.unused_len(), 0);
        assert_eq!(cache.check_invariants(), Ok(()));
    }

    #[test]
    fn erase_leaves_no_stale_queue_entry() {
        let cache: RefCache<u32, u32> = RefCache::new(3);
        for key in 0..3 {
            cache.emplace(key, key);
        }
        cache.erase(&1).unwrap();
        assert_eq!(cache.unused_keys(), vec![0, 2]);

        // The freed slot lets a new key in without evicting anything.
        cache.emplace(9, 9);
        assert!(cache.contains(&0));
        assert_eq!(cache.unused_keys(), vec![0, 2, 9]);

        cache.emplace(10, 10);
        assert!(!cache.contains(&0));
        assert_eq!(cache.check_invariants(), Ok(()));
    }

    #[test]
    fn erase_error_converts_into_cache_error() {
        fn erase_twice(cache: &RefCache<u32, u32>) -> Result<(), CacheError> {
            let _held = cache.at(&1)?;
            cache.erase(&1)?;
            Ok(())
        }

        let cache: RefCache<u32, u32> = RefCache::new(2);
        assert_eq!(erase_twice(&cache), Err(CacheError::NotFound));
        cache.emplace(1, 1);
        assert_eq!(erase_twice(&cache), Err(CacheError::InUse));
    }
}

// ==============================================
// Clear Semantics
// ==============================================

mod clear_semantics {
    use super::*;

    #[test]
    fn clear_removes_only_unused_entries() {
        let cache: RefCache<u32, String> = RefCache::new(10);
        let keep = cache.emplace(1, "keep".to_string()).0;
        for key in 2..6 {
            cache.emplace(key, "drop".to_string());
        }

        cache.clear();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.unused_len(), 0);
        assert_eq!(*keep, "keep");
        assert_eq!(cache.at(&1).unwrap(), keep);
        assert_eq!(cache.check_invariants(), Ok(()));
    }

    #[test]
    fn cleared_key_can_be_recreated() {
        let cache: RefCache<u32, u32, _> =
            RefCache::with_factory(4, |key: &u32| Ok::<_, ()>(key + 100));
        cache.emplace(1, 1);
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(*cache.get_or_create(&1).unwrap(), 101);
        assert_eq!(cache.check_invariants(), Ok(()));
    }
}

// ==============================================
// Trace Sink
// ==============================================

mod trace_sink {
    use std::io::Write;
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writer_sink_receives_transition_lines() {
        let buf = SharedBuf::default();
        let cache = RefCacheBuilder::new(1)
            .trace_sink(WriterSink::new(buf.clone()))
            .build::<&str, u32>();

        let held = cache.emplace("a", 1).0;
        cache.emplace("b", 2);
        cache.emplace("c", 3);
        drop(held);

        let text = String::from_utf8(buf.0.lock().clone()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Using \"a\". 0 unused elements.",
                "Using \"b\". 0 unused elements.",
                "Unusing \"b\". 1 unused elements.",
                "Using \"c\". 1 unused elements.",
                "Unusing \"c\". 2 unused elements.",
                "Erasing \"b\". 1 unused elements.",
                "Unusing \"a\". 2 unused elements.",
                "Erasing \"c\". 1 unused elements.",
            ]
        );
    }
}
