#![no_main]

use std::collections::VecDeque;

use libfuzzer_sys::fuzz_target;
use refcache::ds::UnusedQueue;

// Fuzz arbitrary operation sequences on UnusedQueue
//
// Mirrors every operation on a VecDeque model and checks that order,
// membership and length agree after each step.
fuzz_target!(|data: &[u8]| {
    let mut queue: UnusedQueue<u8> = UnusedQueue::new();
    let mut model: VecDeque<u8> = VecDeque::new();

    for pair in data.chunks_exact(2) {
        let (op, key) = (pair[0] % 5, pair[1]);

        match op {
            0 => {
                let fresh = !model.contains(&key);
                assert_eq!(queue.push_back(key), fresh);
                if fresh {
                    model.push_back(key);
                }
            }
            1 => {
                let pos = model.iter().position(|k| *k == key);
                assert_eq!(queue.remove(&key), pos.is_some());
                if let Some(pos) = pos {
                    model.remove(pos);
                }
            }
            2 => {
                assert_eq!(queue.pop_front(), model.pop_front());
            }
            3 => {
                assert_eq!(queue.contains(&key), model.contains(&key));
                assert_eq!(queue.front(), model.front());
            }
            4 => {
                queue.clear();
                model.clear();
            }
            _ => unreachable!(),
        }

        queue.debug_validate_invariants();
        assert_eq!(queue.len(), model.len());
        assert!(queue.iter().eq(model.iter()));
    }
});
