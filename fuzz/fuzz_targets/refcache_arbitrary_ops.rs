#![no_main]

use libfuzzer_sys::fuzz_target;
use refcache::RefCache;

// Fuzz arbitrary operation sequences on RefCache
//
// Keeps a pool of live handles so entries move between used and unused,
// then checks the cache's invariants after every operation.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    // First byte picks max_unused (0-15)
    let max_unused = (data[0] as usize) % 16;
    let cache: RefCache<u8, u16> = RefCache::new(max_unused);
    let mut held = Vec::new();

    for pair in data[1..].chunks_exact(2) {
        let (op, key) = (pair[0] % 7, pair[1] % 32);

        match op {
            0 => {
                // Insert and release
                cache.emplace(key, u16::from(key));
            }
            1 => {
                // Insert and keep
                let (handle, _) = cache.emplace(key, u16::from(key));
                held.push(handle);
            }
            2 => {
                // Lookup and keep
                if let Ok(handle) = cache.at(&key) {
                    assert_eq!(*handle.key(), key);
                    held.push(handle);
                }
            }
            3 => {
                // Release one held handle
                if !held.is_empty() {
                    let idx = usize::from(key) % held.len();
                    held.swap_remove(idx);
                }
            }
            4 => {
                // Default factory
                let handle = cache.get_or_create(&key).unwrap();
                assert!(*handle == 0 || *handle == u16::from(key));
            }
            5 => {
                let was_held = held.iter().any(|h| *h.key() == key);
                match cache.erase(&key) {
                    Ok(_) => assert!(!was_held),
                    Err(_) => assert!(was_held),
                }
            }
            6 => {
                cache.clear();
                assert_eq!(cache.unused_len(), 0);
            }
            _ => unreachable!(),
        }

        cache.debug_validate_invariants();
        assert!(cache.unused_len() <= max_unused);
        for handle in &held {
            assert!(cache.contains(handle.key()));
        }
    }

    drop(held);
    cache.debug_validate_invariants();
    assert_eq!(cache.len(), cache.unused_len());
});
